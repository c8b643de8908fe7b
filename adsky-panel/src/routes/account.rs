//! Registration, login and password recovery

use adsky_core::Purpose;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::session::{clear_session_cookie, get_session_from_cookies, set_session_cookie};
use crate::crypto::{hash_password, verify_password};
use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{NewUser, SessionStore, UserStore, UserType};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
const MAX_PASSWORD_LENGTH: usize = 80;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;

/// Generic success body carrying a human-readable message
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

pub(crate) fn validate_username(username: &str) -> Result<(), PanelError> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(PanelError::ValidationError(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PanelError::ValidationError(
            "Username may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Loose shape check; ownership is proven by the confirmation link.
///
/// The address travels as a path segment of the reset link, so only
/// characters that need no percent-encoding there are accepted.
pub(crate) fn validate_email(email: &str) -> Result<(), PanelError> {
    let invalid = || PanelError::ValidationError("Invalid email address".to_string());

    if email.len() > 254 {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+'))
    {
        return Err(invalid());
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
    {
        return Err(invalid());
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), PanelError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(PanelError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PanelError::PasswordTooLong);
    }
    Ok(())
}

/// Issue a registration token and mail its confirmation link
fn send_registration_link<U, S, E>(state: &AppState<U, S, E>, email: &str) -> Result<(), PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let issued = state.tokens.issue(email, Purpose::RegistrationConfirmation)?;
    let link = state.config.link(&format!(
        "email/confirm/{}/{}",
        issued.selector, issued.secret
    ));

    state
        .email_sender
        .send_registration_link(email, &link)
        .map_err(PanelError::Internal)
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// register: create an unverified account and mail its confirmation link.
/// The very first account becomes an admin.
pub fn register<U, S, E>(
    state: &AppState<U, S, E>,
    req: RegisterRequest,
) -> Result<MessageResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    validate_username(username)?;
    validate_email(&email)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password, state.config.tokens.hash_cost)
        .map_err(|e| PanelError::Internal(e.to_string()))?;

    let user = state.user_store.create_user(NewUser {
        username: username.to_string(),
        email: email.clone(),
        password_hash,
    })?;

    send_registration_link(state, &email)?;

    tracing::info!(
        username = %username,
        email = %email,
        user_type = user.user_type.as_str(),
        "Registered new account"
    );

    Ok(MessageResponse::new(
        "Registration successful. Check your inbox to confirm your email address.",
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// login: check credentials of a verified account and open a session
pub fn login<U, S, E>(
    state: &AppState<U, S, E>,
    cookies: &Cookies,
    req: LoginRequest,
) -> Result<LoginResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let user = state
        .user_store
        .get_user_by_email(req.email.trim())?
        .ok_or(PanelError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| PanelError::Internal(e.to_string()))?;
    if !valid {
        return Err(PanelError::InvalidCredentials);
    }

    if !user.verified {
        return Err(PanelError::EmailNotVerified);
    }

    state.user_store.record_login(user.id, Utc::now())?;

    let session = state.session_store.create(user.id)?;
    set_session_cookie(cookies, &session.id.0);

    tracing::debug!(username = %user.username, "User logged in");

    Ok(LoginResponse {
        success: true,
        username: user.username,
        user_type: user.user_type,
    })
}

/// logout: drop the current session, if any
pub fn logout<U, S, E>(state: &AppState<U, S, E>, cookies: &Cookies) -> MessageResponse
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    if let Some(session) = get_session_from_cookies(cookies, state.session_store.as_ref()) {
        let _ = state.session_store.delete(&session.id);
    }

    clear_session_cookie(cookies);

    MessageResponse::new("Logged out.")
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// forgot_password: mail a reset link if the account exists.
/// Answers the same either way.
pub fn forgot_password<U, S, E>(
    state: &AppState<U, S, E>,
    req: EmailRequest,
) -> Result<MessageResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    match state.user_store.get_user_by_email(req.email.trim())? {
        Some(user) => {
            let issued = state.tokens.issue(&user.email, Purpose::PasswordReset)?;
            let link = state.config.link(&format!(
                "email/reset/{}/{}/{}",
                user.email, issued.selector, issued.secret
            ));

            state
                .email_sender
                .send_reset_link(&user.email, &link)
                .map_err(PanelError::Internal)?;

            tracing::info!(username = %user.username, "Password reset link sent");
        }
        None => {
            tracing::info!("Password reset requested for an unknown email");
        }
    }

    Ok(MessageResponse::new(
        "If this email belongs to an account, a reset link is on its way.",
    ))
}

/// resend_confirmation: mail a fresh confirmation link to an unverified
/// account. Answers the same whether or not one exists.
pub fn resend_confirmation<U, S, E>(
    state: &AppState<U, S, E>,
    req: EmailRequest,
) -> Result<MessageResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    match state.user_store.get_user_by_email(req.email.trim())? {
        Some(user) if !user.verified => {
            send_registration_link(state, &user.email)?;
            tracing::info!(username = %user.username, "Confirmation link re-sent");
        }
        _ => {
            tracing::info!("Confirmation resend requested for no pending account");
        }
    }

    Ok(MessageResponse::new(
        "If this email belongs to an unconfirmed account, a new link is on its way.",
    ))
}
