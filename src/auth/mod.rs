use std::sync::Arc;

use axum::Router;

use crate::{auth::jwt::JwtKeys, state::AppState};

mod claims;
mod dto;
mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub fn router(keys: Arc<JwtKeys>) -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::protected_routes(keys))
}
