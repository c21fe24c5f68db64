use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    auth::{claims::Claims, jwt::JwtKeys},
    error::AuthError,
};

/// Verified bearer token attached to an admitted request.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub raw: String,
    pub claims: Claims,
}

/// Pulls `<token>` out of `Authorization: Bearer <token>`.
fn bearer_value(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    // Scheme and value are the first two space-separated parts; anything after is ignored.
    let mut parts = header.split(' ');
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingToken),
    }
}

pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> Result<BearerToken, AuthError> {
    let token = bearer_value(headers)?;
    let claims = keys.verify(token)?;
    Ok(BearerToken {
        raw: token.to_owned(),
        claims,
    })
}

/// Rejects the request with 401 unless it carries a valid bearer token.
pub async fn require_bearer(
    State(keys): State<Arc<JwtKeys>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = authorize(request.headers(), &keys).map_err(|e| {
        warn!(path = %request.uri().path(), reason = %e, "access denied");
        e
    })?;
    request.extensions_mut().insert(bearer);
    Ok(next.run(request).await)
}
