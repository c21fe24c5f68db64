use serde::{Deserialize, Serialize};

use crate::auth::claims::Claims;

/// Request body for signin and signup. Missing fields fail validation as empty.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for lost-password.
#[derive(Debug, Deserialize)]
pub struct LostPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub decoded: Claims,
}
