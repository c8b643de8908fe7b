//! Storage abstraction for verification tokens

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::token::{Purpose, VerificationToken};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable home of verification tokens, keyed by `(selector, purpose)`.
///
/// Implementations must make [`TokenStore::consume_token`] a single atomic
/// check-and-set: of several concurrent callers presenting the same
/// selector, at most one may observe `true`.
pub trait TokenStore: Send + Sync {
    /// Store a new token. Fails with [`StoreError::Conflict`] if the
    /// `(selector, purpose)` pair is taken.
    fn insert_token(&self, token: VerificationToken) -> StoreResult<()>;

    /// Look up a token regardless of its state
    fn find_token(&self, selector: &str, purpose: Purpose)
        -> StoreResult<Option<VerificationToken>>;

    /// Set `consumed_at = now` if the token exists, is unconsumed and not
    /// expired at `now`. Returns whether this call performed the transition.
    fn consume_token(&self, selector: &str, purpose: Purpose, now: DateTime<Utc>)
        -> StoreResult<bool>;

    /// Delete a single token
    fn delete_token(&self, selector: &str, purpose: Purpose) -> StoreResult<()>;

    /// Delete every token issued for a subject, whatever its purpose or state
    fn delete_tokens_for_subject(&self, subject: &str) -> StoreResult<u64>;

    /// Delete tokens that are consumed or expired at `now`
    fn purge_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn insert_token(&self, token: VerificationToken) -> StoreResult<()> {
        (**self).insert_token(token)
    }

    fn find_token(
        &self,
        selector: &str,
        purpose: Purpose,
    ) -> StoreResult<Option<VerificationToken>> {
        (**self).find_token(selector, purpose)
    }

    fn consume_token(
        &self,
        selector: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        (**self).consume_token(selector, purpose, now)
    }

    fn delete_token(&self, selector: &str, purpose: Purpose) -> StoreResult<()> {
        (**self).delete_token(selector, purpose)
    }

    fn delete_tokens_for_subject(&self, subject: &str) -> StoreResult<u64> {
        (**self).delete_tokens_for_subject(subject)
    }

    fn purge_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        (**self).purge_tokens(now)
    }
}

/// In-memory token store
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<(String, Purpose), VerificationToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows currently held, whatever their state
    pub fn len(&self) -> usize {
        self.tokens.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn insert_token(&self, token: VerificationToken) -> StoreResult<()> {
        let mut tokens = self.tokens.write().unwrap();
        let key = (token.selector.clone(), token.purpose);
        if tokens.contains_key(&key) {
            return Err(StoreError::Conflict);
        }
        tokens.insert(key, token);
        Ok(())
    }

    fn find_token(
        &self,
        selector: &str,
        purpose: Purpose,
    ) -> StoreResult<Option<VerificationToken>> {
        let tokens = self.tokens.read().unwrap();
        Ok(tokens.get(&(selector.to_string(), purpose)).cloned())
    }

    fn consume_token(
        &self,
        selector: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tokens = self.tokens.write().unwrap();
        match tokens.get_mut(&(selector.to_string(), purpose)) {
            Some(token) if !token.is_consumed() && !token.is_expired(now) => {
                token.consumed_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete_token(&self, selector: &str, purpose: Purpose) -> StoreResult<()> {
        self.tokens
            .write()
            .unwrap()
            .remove(&(selector.to_string(), purpose));
        Ok(())
    }

    fn delete_tokens_for_subject(&self, subject: &str) -> StoreResult<u64> {
        let mut tokens = self.tokens.write().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| t.subject != subject);
        Ok((before - tokens.len()) as u64)
    }

    fn purge_tokens(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tokens = self.tokens.write().unwrap();
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_spent(now));
        Ok((before - tokens.len()) as u64)
    }
}
