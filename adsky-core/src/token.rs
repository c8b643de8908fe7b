//! Verification token model

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lifetime of a registration confirmation link (one Julian year)
pub const DEFAULT_REGISTRATION_TTL_SECONDS: i64 = 31_557_600;

/// Default lifetime of a password reset link, also the upper bound
pub const DEFAULT_RESET_TTL_SECONDS: i64 = 86_400;

/// The account action a token authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    RegistrationConfirmation,
    PasswordReset,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::RegistrationConfirmation => "registration_confirmation",
            Purpose::PasswordReset => "password_reset",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "registration_confirmation" => Some(Purpose::RegistrationConfirmation),
            "password_reset" => Some(Purpose::PasswordReset),
            _ => None,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted token record. The secret itself is never part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken {
    pub selector: String,
    pub purpose: Purpose,
    /// Account the token was issued for (the account's email address)
    pub subject: String,
    pub secret_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    /// A token is still usable at `expires_at` itself and expired strictly after.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Whether the sweeper may delete this row
    pub fn is_spent(&self, now: DateTime<Utc>) -> bool {
        self.is_consumed() || self.is_expired(now)
    }
}

/// What the caller gets back from issuance, to be embedded in an email link.
#[derive(Clone)]
pub struct IssuedToken {
    pub selector: String,
    pub secret: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("selector", &self.selector)
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token lifetimes and hashing cost
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub registration_ttl_seconds: i64,
    pub reset_ttl_seconds: i64,
    /// bcrypt cost factor applied to token secrets
    pub hash_cost: u32,
}

impl TokenConfig {
    pub fn ttl(&self, purpose: Purpose) -> Duration {
        match purpose {
            Purpose::RegistrationConfirmation => Duration::seconds(self.registration_ttl_seconds),
            Purpose::PasswordReset => Duration::seconds(self.reset_ttl_seconds),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            registration_ttl_seconds: DEFAULT_REGISTRATION_TTL_SECONDS,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}
