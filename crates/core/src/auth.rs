//! Request/response shapes for the backend's auth endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/register` and `POST /auth/login`.
///
/// Password rules (minimum length etc.) are enforced by the backend; this
/// side forwards credentials as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

/// Successful response of both auth endpoints.
///
/// `access_token` is an opaque bearer credential -- never parsed client-side,
/// only stored and forwarded unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: String,
}
