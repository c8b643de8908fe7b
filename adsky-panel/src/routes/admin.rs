//! Admin user management

use serde::{Deserialize, Serialize};

use super::account::{validate_email, MessageResponse};
use crate::email::EmailSender;
use crate::error::PanelError;
use crate::state::AppState;
use crate::store::{SessionStore, User, UserStore, UserType};

#[derive(Serialize)]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub verified: bool,
    #[serde(rename = "type")]
    pub user_type: UserType,
    /// Unix seconds
    pub last_login: Option<i64>,
    /// Unix seconds
    pub registered: i64,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            verified: user.verified,
            user_type: user.user_type,
            last_login: user.last_login.map(|t| t.timestamp()),
            registered: user.registered.timestamp(),
        }
    }
}

#[derive(Serialize)]
pub struct ListUsersResponse {
    pub success: bool,
    pub users: Vec<UserInfo>,
}

/// list: every account
pub fn list<U, S, E>(state: &AppState<U, S, E>) -> Result<ListUsersResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let users = state.user_store.list_users()?;

    Ok(ListUsersResponse {
        success: true,
        users: users.into_iter().map(UserInfo::from).collect(),
    })
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub oldemail: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: String,
}

/// update: change an account's email and role. Tokens issued for the old
/// address stop working.
pub fn update<U, S, E>(
    state: &AppState<U, S, E>,
    admin: &User,
    req: UpdateUserRequest,
) -> Result<MessageResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let user_type = UserType::from_str(req.user_type.trim()).ok_or_else(|| {
        PanelError::ValidationError(format!("Unknown user type: {}", req.user_type))
    })?;
    let email = req.email.trim().to_lowercase();
    validate_email(&email)?;

    let updated = state
        .user_store
        .update_user(req.oldemail.trim(), &email, user_type)?;

    tracing::info!(
        admin = %admin.username,
        username = %updated.username,
        email = %updated.email,
        user_type = updated.user_type.as_str(),
        "Updated account"
    );

    Ok(MessageResponse::new("User updated."))
}

#[derive(Deserialize)]
pub struct DeleteUserRequest {
    pub username: String,
}

/// delete: remove an account with its sessions and tokens
pub fn delete<U, S, E>(
    state: &AppState<U, S, E>,
    admin: &User,
    req: DeleteUserRequest,
) -> Result<MessageResponse, PanelError>
where
    U: UserStore,
    S: SessionStore,
    E: EmailSender,
{
    let user = state
        .user_store
        .get_user_by_username(req.username.trim())?
        .ok_or(PanelError::UserNotFound)?;

    state.user_store.delete_user(user.id)?;
    state.session_store.delete_for_user(user.id)?;

    tracing::info!(admin = %admin.username, username = %user.username, "Deleted account");

    Ok(MessageResponse::new("User deleted."))
}
