//! Authentication errors.
//!
//! Every domain failure is a typed variant; the HTTP status mapping lives
//! only in the `IntoResponse` impl at the boundary. `Internal` is logged in
//! full server-side and returned opaque.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password missing from the request.
    #[error("email and password are required")]
    MissingInput,

    /// Email unknown to the personnel registry.
    #[error("user not found")]
    NotFound,

    /// Record exists but has no password set yet.
    #[error("user has not registered a password")]
    NotRegistered,

    /// Registration is strictly one-time.
    #[error("user is already registered")]
    AlreadyRegistered,

    /// Password mismatch.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many login attempts from this client.
    #[error("too many login attempts, try again later")]
    Throttled,

    /// Missing authorization header.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Invalid token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token expired.
    #[error("token expired")]
    TokenExpired,

    /// Role mismatch.
    #[error("insufficient permissions: {0}")]
    Forbidden(String),

    /// Internal error (store, hash, or signing failure).
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        // Full chain (context + root cause) for the server log only.
        AuthError::Internal(format!("{err:#}"))
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub ok: bool,
    pub error: String,
    pub error_code: String,
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingInput => StatusCode::BAD_REQUEST,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::NotRegistered | AuthError::AlreadyRegistered => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken(_)
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::Throttled => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingInput => "missing_input",
            AuthError::NotFound => "not_found",
            AuthError::NotRegistered => "not_registered",
            AuthError::AlreadyRegistered => "already_registered",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Throttled => "throttled",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Internal detail never reaches the response body.
        let message = if let AuthError::Internal(ref detail) = self {
            error!(error_code, detail = %detail, "internal auth error");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(AuthErrorResponse {
            ok: false,
            error: message,
            error_code: error_code.to_string(),
        });

        (status, body).into_response()
    }
}
