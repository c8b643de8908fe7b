//! AdSky Core Library
//!
//! Single-use, time-limited verification tokens for the AdSky panel:
//! - Tokens are issued for an account and a purpose (registration or reset)
//! - Only a bcrypt hash of the secret half is ever stored
//! - Validation consumes a token at most once and never says why it failed

pub mod crypto;
pub mod error;
pub mod service;
pub mod store;
pub mod token;

pub use error::{Rejection, StoreError, TokenError};
pub use service::VerificationTokenService;
pub use store::{MemoryTokenStore, StoreResult, TokenStore};
pub use token::{IssuedToken, Purpose, TokenConfig, VerificationToken};

/// Result type for adsky-core operations
pub type Result<T> = std::result::Result<T, TokenError>;
