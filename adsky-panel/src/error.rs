//! Panel error types

use adsky_core::{StoreError, TokenError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// The only thing a visitor learns about a refused email link
pub const INVALID_LINK_MESSAGE: &str = "This link is invalid or has expired.";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not verified")]
    EmailNotVerified,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Admin privileges required")]
    Forbidden,

    #[error("Invalid or expired link")]
    InvalidLink,

    #[error("{0} operation not found.")]
    OperationNotFound(&'static str),

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 80 characters)")]
    PasswordTooLong,

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The reset link was spent but its new password could not be mailed
    #[error("Could not send the new password: {0}")]
    ResetMailFailed(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for PanelError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Rejected(_) => PanelError::InvalidLink,
            other => PanelError::Unavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for PanelError {
    fn from(err: StoreError) -> Self {
        PanelError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for PanelError {
    fn from(err: rusqlite::Error) -> Self {
        PanelError::Internal(err.to_string())
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PanelError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            PanelError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Email already exists".to_string())
            }
            PanelError::UsernameTaken => {
                (StatusCode::CONFLICT, "Username already taken".to_string())
            }
            PanelError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            PanelError::EmailNotVerified => {
                (StatusCode::FORBIDDEN, "Email not verified".to_string())
            }
            PanelError::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
            PanelError::Forbidden => {
                (StatusCode::FORBIDDEN, "Admin privileges required".to_string())
            }
            PanelError::InvalidLink => (StatusCode::BAD_REQUEST, INVALID_LINK_MESSAGE.to_string()),
            PanelError::OperationNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            PanelError::PasswordTooShort => (
                StatusCode::BAD_REQUEST,
                "Password too short (minimum 8 characters)".to_string(),
            ),
            PanelError::PasswordTooLong => (
                StatusCode::BAD_REQUEST,
                "Password too long (maximum 80 characters)".to_string(),
            ),
            PanelError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            PanelError::ResetMailFailed(msg) => {
                tracing::error!("Reset mail failed: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Your new password could not be sent. Please request another reset."
                        .to_string(),
                )
            }
            PanelError::Unavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, please retry".to_string(),
                )
            }
            PanelError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
