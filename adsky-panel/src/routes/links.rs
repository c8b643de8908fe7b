//! Email link endpoints
//!
//! Every refusal looks the same from outside; the reason only goes to the
//! log.

use std::sync::Arc;

use adsky_core::{Purpose, TokenError};
use axum::extract::{Path, State};
use axum::response::Redirect;

use crate::crypto::{generate_password, hash_password};
use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

/// Validate a link's token, logging and collapsing any rejection
fn validate_link<U, S, E>(
    state: &AppState<U, S, E>,
    selector: &str,
    secret: &str,
    purpose: Purpose,
) -> Result<String, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    match state.tokens.validate(selector, secret, purpose) {
        Ok(subject) => Ok(subject),
        Err(TokenError::Rejected(kind)) => {
            tracing::warn!(
                reason = kind.as_str(),
                %selector,
                %purpose,
                "Rejected email link"
            );
            Err(PanelError::InvalidLink)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /email/confirm/:selector/:secret
pub async fn confirm_registration<U, S, E>(
    State(state): State<Arc<AppState<U, S, E>>>,
    Path((selector, secret)): Path<(String, String)>,
) -> Result<Redirect, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let email = validate_link(&state, &selector, &secret, Purpose::RegistrationConfirmation)?;

    state.user_store.mark_verified(&email).map_err(|e| match e {
        PanelError::UserNotFound => {
            tracing::warn!(%selector, "Confirmation link for a vanished account");
            PanelError::InvalidLink
        }
        other => other,
    })?;

    tracing::info!(email = %email, "Email address confirmed");

    Ok(Redirect::to(
        &state.config.link("admin/?message=validation_success#home"),
    ))
}

/// GET /email/reset/:email/:selector/:secret
///
/// A valid link replaces the password with a generated one, mails it, and
/// ends every open session of the account.
pub async fn confirm_reset<U, S, E>(
    State(state): State<Arc<AppState<U, S, E>>>,
    Path((email, selector, secret)): Path<(String, String, String)>,
) -> Result<Redirect, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let subject = validate_link(&state, &selector, &secret, Purpose::PasswordReset)?;

    if subject != email.trim().to_lowercase() {
        tracing::warn!(%selector, "Reset link email does not match its token");
        return Err(PanelError::InvalidLink);
    }

    let user = match state.user_store.get_user_by_email(&subject)? {
        Some(user) => user,
        None => {
            tracing::warn!(%selector, "Reset link for a vanished account");
            return Err(PanelError::InvalidLink);
        }
    };

    let password = generate_password();
    let password_hash = hash_password(&password, state.config.tokens.hash_cost)
        .map_err(|e| PanelError::Internal(e.to_string()))?;

    // The account only changes once the new password is on its way.
    state
        .email_sender
        .send_new_password(&user.email, &password)
        .map_err(PanelError::ResetMailFailed)?;

    state.user_store.update_password(user.id, &password_hash)?;
    state.session_store.delete_for_user(user.id)?;

    tracing::info!(username = %user.username, "Password reset completed");

    Ok(Redirect::to(&state.config.link("login/?message=password_reset")))
}
