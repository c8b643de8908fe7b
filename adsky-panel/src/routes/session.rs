//! Session cookie handling

use tower_cookies::{Cookie, Cookies};

use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{Session, SessionId, SessionStore, User, UserStore, UserType};

pub const SESSION_COOKIE: &str = "adsky_session";

/// Helper to get current session from cookies
pub fn get_session_from_cookies<S: SessionStore>(
    cookies: &Cookies,
    session_store: &S,
) -> Option<Session> {
    cookies.get(SESSION_COOKIE).and_then(|c| {
        let session_id = SessionId(c.value().to_string());
        session_store.get(&session_id).ok().flatten()
    })
}

/// The logged-in user, or `NotAuthenticated`
pub fn current_user<U, S, E>(state: &AppState<U, S, E>, cookies: &Cookies) -> Result<User, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let session = get_session_from_cookies(cookies, state.session_store.as_ref())
        .ok_or(PanelError::NotAuthenticated)?;

    // A session can outlive its account for a moment if the account was
    // deleted in between.
    state
        .user_store
        .get_user(session.user_id)?
        .ok_or(PanelError::NotAuthenticated)
}

/// The logged-in user if they are an admin
pub fn require_admin<U, S, E>(state: &AppState<U, S, E>, cookies: &Cookies) -> Result<User, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let user = current_user(state, cookies)?;
    if user.user_type != UserType::Admin {
        tracing::warn!(username = %user.username, "Non-admin attempted an admin operation");
        return Err(PanelError::Forbidden);
    }
    Ok(user)
}

/// Helper to set session cookie
pub fn set_session_cookie(cookies: &Cookies, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.add(cookie);
}

/// Helper to clear session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
