use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::repo::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("INVALID_EMAIL_OR_PASSWORD")]
    InvalidCredentialsFormat,

    #[error("INVALID_EMAIL")]
    InvalidEmail,

    #[error("USER_NOT_FOUND")]
    UserNotFound,

    #[error("INCORRECT_PASSWORD")]
    IncorrectPassword,

    #[error("MISSING_ACCESS_TOKEN")]
    MissingToken,

    #[error("INVALID_ACCESS_TOKEN")]
    InvalidToken,

    /// Fallback for unexpected failures on endpoints that must not reveal them.
    #[error("UNAUTHORIZED")]
    Unauthorized,

    #[error("EMAIL_ALREADY_REGISTERED")]
    DuplicateEmail,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentialsFormat | AuthError::InvalidEmail => {
                StatusCode::BAD_REQUEST
            }
            AuthError::UserNotFound
            | AuthError::IncorrectPassword
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable reason sent to the client.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentialsFormat => "INVALID_EMAIL_OR_PASSWORD",
            AuthError::InvalidEmail => "INVALID_EMAIL",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::IncorrectPassword => "INCORRECT_PASSWORD",
            AuthError::MissingToken => "MISSING_ACCESS_TOKEN",
            AuthError::InvalidToken => "INVALID_ACCESS_TOKEN",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::DuplicateEmail => "EMAIL_ALREADY_REGISTERED",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Replaces an internal failure with a plain 401, logging the cause first.
    pub fn or_unauthorized(self) -> Self {
        match self {
            AuthError::Internal(e) => {
                error!(error = %e, "internal failure reported as unauthorized");
                AuthError::Unauthorized
            }
            other => other,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Database(e) => AuthError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AuthError::Internal(e) => error!(error = %e, status = status.as_u16(), "request failed"),
            other => warn!(message = %other, status = status.as_u16(), "request rejected"),
        }

        (status, Json(json!({ "error": self.code() }))).into_response()
    }
}
