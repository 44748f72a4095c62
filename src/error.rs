//! Authentication Error Types
//!
//! Infrastructure and configuration failures. Rejected credentials are not
//! errors: they travel as [`ValidationError`](crate::models::ValidationError)
//! values inside an [`AuthOutcome`](crate::models::AuthOutcome).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("No role assigned to account '{0}'")]
    NoRoleAssigned(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,
}

impl AuthError {
    /// Stable machine-readable code returned to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Config(_) => "configuration_error",
            AuthError::Collaborator(_) | AuthError::NoRoleAssigned(_) | AuthError::Signing(_) => {
                "internal_error"
            }
            AuthError::InvalidToken => "invalid_token",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Forbidden => "forbidden",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error".to_string(),
            ),
            AuthError::Collaborator(_) | AuthError::NoRoleAssigned(_) | AuthError::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
            AuthError::InvalidToken | AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AuthError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
        };

        (
            status,
            Json(serde_json::json!({
                "error": self.code(),
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AuthError::Collaborator(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AuthError::Collaborator(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("JWT error: {:?}", err);
        AuthError::InvalidToken
    }
}
