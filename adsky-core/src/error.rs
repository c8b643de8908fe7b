//! Error types for AdSky token handling

use thiserror::Error;

/// Why a presented token was refused.
///
/// The distinction only exists for logging and tests. Callers facing the
/// outside world must collapse every variant into one generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no token matches the selector")]
    NotFound,

    #[error("token has expired")]
    Expired,

    #[error("token was already consumed")]
    AlreadyConsumed,

    #[error("token secret does not match")]
    Mismatch,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::NotFound => "not_found",
            Rejection::Expired => "expired",
            Rejection::AlreadyConsumed => "already_consumed",
            Rejection::Mismatch => "mismatch",
        }
    }
}

/// Errors raised by a [`TokenStore`](crate::store::TokenStore) backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("A token with this selector already exists")]
    Conflict,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Hashing error: {0}")]
    Hash(String),

    #[error("Random source error: {0}")]
    Random(String),
}

impl TokenError {
    /// The rejection kind, if this error is a refused token rather than a
    /// server-side failure.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            TokenError::Rejected(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        TokenError::Storage(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for TokenError {
    fn from(err: bcrypt::BcryptError) -> Self {
        TokenError::Hash(err.to_string())
    }
}
