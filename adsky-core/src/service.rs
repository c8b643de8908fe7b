//! Issuance, validation and cleanup of verification tokens

use chrono::{DateTime, Utc};

use crate::crypto::{generate_secret, generate_selector, hash_secret, verify_secret};
use crate::error::{Rejection, StoreError, TokenError};
use crate::store::TokenStore;
use crate::token::{IssuedToken, Purpose, TokenConfig, VerificationToken};
use crate::Result;

/// How many fresh selectors to try before giving up on a collision
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Issues and validates single-use tokens against a [`TokenStore`].
///
/// The service holds no per-request state. Everything that must be shared
/// between concurrent requests lives in the store.
pub struct VerificationTokenService<T> {
    store: T,
    config: TokenConfig,
    /// Hash checked when a selector is unknown, so that every lookup pays
    /// the same bcrypt cost
    dummy_hash: String,
}

impl<T: TokenStore> VerificationTokenService<T> {
    pub fn new(store: T, config: TokenConfig) -> Result<Self> {
        let dummy_hash = hash_secret(&generate_secret()?, config.hash_cost)?;
        Ok(Self {
            store,
            config,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    /// Issue a token for `subject`. The returned secret is not stored anywhere
    /// and must be delivered to the user out-of-band.
    pub fn issue(&self, subject: &str, purpose: Purpose) -> Result<IssuedToken> {
        self.issue_at(subject, purpose, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let secret = generate_secret()?;
        let secret_hash = hash_secret(&secret, self.config.hash_cost)?;
        let expires_at = now + self.config.ttl(purpose);

        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let selector = generate_selector()?;
            let token = VerificationToken {
                selector: selector.clone(),
                purpose,
                subject: subject.to_string(),
                secret_hash: secret_hash.clone(),
                issued_at: now,
                expires_at,
                consumed_at: None,
            };

            match self.store.insert_token(token) {
                Ok(()) => {
                    tracing::debug!(%selector, %purpose, %expires_at, "Issued verification token");
                    return Ok(IssuedToken {
                        selector,
                        secret,
                        expires_at,
                    });
                }
                Err(StoreError::Conflict) => {
                    tracing::warn!(%purpose, "Selector collision, retrying with a fresh one");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(TokenError::Storage(
            "could not allocate a unique selector".to_string(),
        ))
    }

    /// Validate and consume a token, returning the subject it was issued for.
    pub fn validate(&self, selector: &str, secret: &str, purpose: Purpose) -> Result<String> {
        self.validate_at(selector, secret, purpose, Utc::now())
    }

    pub fn validate_at(
        &self,
        selector: &str,
        secret: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let found = self.store.find_token(selector, purpose)?;

        // Always pay for one bcrypt verification, hit or miss.
        let hash = found
            .as_ref()
            .map(|t| t.secret_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let secret_matches = match verify_secret(secret, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(%selector, %purpose, error = %e, "Stored token hash is unusable");
                false
            }
        };

        let token = match found {
            Some(token) => token,
            None => return Err(Rejection::NotFound.into()),
        };

        if token.is_expired(now) {
            self.store.delete_token(selector, purpose)?;
            return Err(Rejection::Expired.into());
        }

        if token.is_consumed() {
            return Err(Rejection::AlreadyConsumed.into());
        }

        if !secret_matches {
            return Err(Rejection::Mismatch.into());
        }

        if !self.store.consume_token(selector, purpose, now)? {
            // Another request consumed it between our read and our write.
            return Err(Rejection::AlreadyConsumed.into());
        }

        tracing::debug!(%selector, %purpose, "Consumed verification token");
        Ok(token.subject)
    }

    /// Invalidate every outstanding token of a subject
    pub fn revoke_subject(&self, subject: &str) -> Result<u64> {
        Ok(self.store.delete_tokens_for_subject(subject)?)
    }

    /// Delete tokens already expired or consumed
    pub fn sweep(&self) -> Result<u64> {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.store.purge_tokens(now)?)
    }
}
