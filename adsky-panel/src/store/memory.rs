//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use adsky_core::store::StoreResult as TokenResult;
use adsky_core::{MemoryTokenStore, Purpose, TokenStore, VerificationToken};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    NewUser, Session, SessionId, SessionStore, StoreResult, User, UserId, UserStore, UserType,
};
use crate::error::PanelError;

/// In-memory account store, holding the accounts' tokens alongside them
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    tokens: MemoryTokenStore,
    next_user_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            tokens: MemoryTokenStore::new(),
            next_user_id: AtomicU64::new(1),
        }
    }

    /// Number of token rows held, whatever their state
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let email = new_user.email.to_lowercase();
        let mut users = self.users.write().unwrap();

        if users.values().any(|u| u.email == email) {
            return Err(PanelError::EmailAlreadyExists);
        }
        if users.values().any(|u| u.username == new_user.username) {
            return Err(PanelError::UsernameTaken);
        }

        let user_type = if users.is_empty() {
            UserType::Admin
        } else {
            UserType::Publisher
        };

        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let user = User {
            id,
            username: new_user.username,
            email,
            password_hash: new_user.password_hash,
            user_type,
            verified: false,
            last_login: None,
            registered: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&user_id).cloned())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.email == normalized).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.id.0);
        Ok(users)
    }

    fn update_user(
        &self,
        old_email: &str,
        new_email: &str,
        user_type: UserType,
    ) -> StoreResult<User> {
        let old_email = old_email.to_lowercase();
        let new_email = new_email.to_lowercase();
        let mut users = self.users.write().unwrap();

        if new_email != old_email && users.values().any(|u| u.email == new_email) {
            return Err(PanelError::EmailAlreadyExists);
        }

        let user = users
            .values_mut()
            .find(|u| u.email == old_email)
            .ok_or(PanelError::UserNotFound)?;
        user.email = new_email.clone();
        user.user_type = user_type;
        let updated = user.clone();

        // Still under the users lock, so no token can be issued for the
        // old address in between.
        if new_email != old_email {
            self.tokens.delete_tokens_for_subject(&old_email)?;
        }

        Ok(updated)
    }

    fn mark_verified(&self, email: &str) -> StoreResult<()> {
        let normalized = email.to_lowercase();
        let mut users = self.users.write().unwrap();
        let user = users
            .values_mut()
            .find(|u| u.email == normalized)
            .ok_or(PanelError::UserNotFound)?;
        user.verified = true;
        Ok(())
    }

    fn update_password(&self, user_id: UserId, password_hash: &str) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
            Ok(())
        } else {
            Err(PanelError::UserNotFound)
        }
    }

    fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.last_login = Some(at);
            Ok(())
        } else {
            Err(PanelError::UserNotFound)
        }
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let mut users = self.users.write().unwrap();
        let user = users.remove(&user_id).ok_or(PanelError::UserNotFound)?;
        self.tokens.delete_tokens_for_subject(&user.email)?;
        Ok(())
    }
}

impl TokenStore for InMemoryUserStore {
    fn insert_token(&self, token: VerificationToken) -> TokenResult<()> {
        self.tokens.insert_token(token)
    }

    fn find_token(
        &self,
        selector: &str,
        purpose: Purpose,
    ) -> TokenResult<Option<VerificationToken>> {
        self.tokens.find_token(selector, purpose)
    }

    fn consume_token(
        &self,
        selector: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> TokenResult<bool> {
        self.tokens.consume_token(selector, purpose, now)
    }

    fn delete_token(&self, selector: &str, purpose: Purpose) -> TokenResult<()> {
        self.tokens.delete_token(selector, purpose)
    }

    fn delete_tokens_for_subject(&self, subject: &str) -> TokenResult<u64> {
        self.tokens.delete_tokens_for_subject(subject)
    }

    fn purge_tokens(&self, now: DateTime<Utc>) -> TokenResult<u64> {
        self.tokens.purge_tokens(now)
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }

    fn delete_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }
}
