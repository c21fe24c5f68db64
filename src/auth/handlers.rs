use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, LostPasswordRequest, ProtectedResponse, SigninResponse},
        extractors::{BodyRejection, JsonOrForm},
        jwt::JwtKeys,
        middleware::{require_bearer, BearerToken},
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(signin))
        .route("/auth/signup", post(signup))
        .route("/auth/lost-password", post(lost_password))
}

pub fn protected_routes(keys: Arc<JwtKeys>) -> Router<AppState> {
    Router::new()
        .route("/protected", get(protected))
        .route_layer(middleware::from_fn_with_state(keys, require_bearer))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<CredentialsRequest>, BodyRejection>,
) -> Result<Json<SigninResponse>, AuthError> {
    let JsonOrForm(payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable signin body");
        AuthError::InvalidCredentialsFormat
    })?;

    let access_token = state
        .auth
        .signin(&payload.email, &payload.password)
        .await
        .map_err(AuthError::or_unauthorized)?;

    Ok(Json(SigninResponse { access_token }))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<CredentialsRequest>, BodyRejection>,
) -> Result<StatusCode, AuthError> {
    let JsonOrForm(payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable signup body");
        AuthError::InvalidCredentialsFormat
    })?;

    state.auth.signup(&payload.email, &payload.password).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn lost_password(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<LostPasswordRequest>, BodyRejection>,
) -> Result<StatusCode, AuthError> {
    let JsonOrForm(payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable lost-password body");
        AuthError::InvalidEmail
    })?;

    let _new_password = state.auth.lost_password(&payload.email).await?;
    // No delivery channel is wired; the generated password is dropped here.
    info!("replacement password issued, delivery not configured");
    Ok(StatusCode::OK)
}

#[instrument(skip_all)]
pub async fn protected(
    Extension(bearer): Extension<BearerToken>,
) -> Result<Json<ProtectedResponse>, AuthError> {
    let decoded = JwtKeys::decode(&bearer.raw)?;
    debug!(user_id = bearer.claims.id, "protected resource served");
    Ok(Json(ProtectedResponse { decoded }))
}
