//! Storage abstractions for the panel

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use adsky_core::TokenStore;
use chrono::{DateTime, Utc};

use crate::error::PanelError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, PanelError>;

/// Trait for account storage.
///
/// Account stores also hold the verification tokens so that changing or
/// deleting an account can drop its tokens atomically.
pub trait UserStore: TokenStore {
    /// Create a new account. Fails if the username or email is taken.
    ///
    /// The first account ever created is an Admin and every later one a
    /// Publisher. The check and the insert happen in one step.
    fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by email address (case-insensitive)
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Get a user by username
    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// All accounts, ordered by registration
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Change an account's email and role. When the email changes, every
    /// token issued for the old address is deleted in the same step.
    fn update_user(&self, old_email: &str, new_email: &str, user_type: UserType)
        -> StoreResult<User>;

    /// Mark an email as verified
    fn mark_verified(&self, email: &str) -> StoreResult<()>;

    /// Replace a user's password hash
    fn update_password(&self, user_id: UserId, password_hash: &str) -> StoreResult<()>;

    /// Remember when a user last logged in
    fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> StoreResult<()>;

    /// Delete an account together with all of its tokens
    fn delete_user(&self, user_id: UserId) -> StoreResult<()>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user_id: UserId) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;

    /// Delete every session of a user
    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64>;
}
