//! `/api/user/{operation}` dispatch
//!
//! Operation names map onto a closed set of handlers; anything else is
//! answered with "User operation not found."

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use tower_cookies::Cookies;

use super::session::require_admin;
use super::{account, admin};
use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOperation {
    Register,
    Login,
    Logout,
    ForgotPassword,
    ResendConfirmation,
    List,
    Update,
    Delete,
}

impl UserOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserOperation::Register => "register",
            UserOperation::Login => "login",
            UserOperation::Logout => "logout",
            UserOperation::ForgotPassword => "forgot_password",
            UserOperation::ResendConfirmation => "resend_confirmation",
            UserOperation::List => "list",
            UserOperation::Update => "update",
            UserOperation::Delete => "delete",
        }
    }

    /// Hyphens are accepted in place of underscores.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.replace('-', "_").as_str() {
            "register" => Some(UserOperation::Register),
            "login" => Some(UserOperation::Login),
            "logout" => Some(UserOperation::Logout),
            "forgot_password" => Some(UserOperation::ForgotPassword),
            "resend_confirmation" => Some(UserOperation::ResendConfirmation),
            "list" => Some(UserOperation::List),
            "update" => Some(UserOperation::Update),
            "delete" => Some(UserOperation::Delete),
            _ => None,
        }
    }

    /// Whether only admins may run this operation
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            UserOperation::List | UserOperation::Update | UserOperation::Delete
        )
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, PanelError> {
    serde_json::from_slice(body)
        .map_err(|e| PanelError::ValidationError(format!("Invalid request body: {}", e)))
}

/// ANY /api/user/:operation
pub async fn dispatch<U, S, E>(
    State(state): State<Arc<AppState<U, S, E>>>,
    Path(operation): Path<String>,
    cookies: Cookies,
    body: Bytes,
) -> Result<Response, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let operation =
        UserOperation::from_str(&operation).ok_or(PanelError::OperationNotFound("User"))?;
    tracing::debug!(operation = operation.as_str(), "Dispatching user operation");

    let caller = if operation.requires_admin() {
        Some(require_admin(&state, &cookies)?)
    } else {
        None
    };

    let response = match (operation, caller) {
        (UserOperation::Register, _) => {
            Json(account::register(&state, parse_body(&body)?)?).into_response()
        }
        (UserOperation::Login, _) => {
            Json(account::login(&state, &cookies, parse_body(&body)?)?).into_response()
        }
        (UserOperation::Logout, _) => Json(account::logout(&state, &cookies)).into_response(),
        (UserOperation::ForgotPassword, _) => {
            Json(account::forgot_password(&state, parse_body(&body)?)?).into_response()
        }
        (UserOperation::ResendConfirmation, _) => {
            Json(account::resend_confirmation(&state, parse_body(&body)?)?).into_response()
        }
        (UserOperation::List, Some(_)) => Json(admin::list(&state)?).into_response(),
        (UserOperation::Update, Some(caller)) => {
            Json(admin::update(&state, &caller, parse_body(&body)?)?).into_response()
        }
        (UserOperation::Delete, Some(caller)) => {
            Json(admin::delete(&state, &caller, parse_body(&body)?)?).into_response()
        }
        (_, None) => return Err(PanelError::Forbidden),
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        for op in [
            UserOperation::Register,
            UserOperation::Login,
            UserOperation::Logout,
            UserOperation::ForgotPassword,
            UserOperation::ResendConfirmation,
            UserOperation::List,
            UserOperation::Update,
            UserOperation::Delete,
        ] {
            assert_eq!(UserOperation::from_str(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_hyphenated_names_accepted() {
        assert_eq!(
            UserOperation::from_str("forgot-password"),
            Some(UserOperation::ForgotPassword)
        );
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(UserOperation::from_str("drop_tables"), None);
        assert_eq!(UserOperation::from_str("../../etc/passwd"), None);
        assert_eq!(UserOperation::from_str(""), None);
    }

    #[test]
    fn test_admin_operations() {
        assert!(UserOperation::List.requires_admin());
        assert!(UserOperation::Delete.requires_admin());
        assert!(!UserOperation::Register.requires_admin());
        assert!(!UserOperation::ForgotPassword.requires_admin());
    }
}
