//! Random material and slow hashing for token secrets

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::{Result, TokenError};

/// Bytes of entropy in a selector (128 bits)
pub const SELECTOR_BYTES: usize = 16;

/// Bytes of entropy in a secret (256 bits)
pub const SECRET_BYTES: usize = 32;

/// Fill `len` bytes from the OS CSPRNG and encode them base64url without padding.
fn random_token(len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| TokenError::Random(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Generate a public, URL-safe lookup key
pub fn generate_selector() -> Result<String> {
    random_token(SELECTOR_BYTES)
}

/// Generate the secret half that is mailed to the user
pub fn generate_secret() -> Result<String> {
    random_token(SECRET_BYTES)
}

/// Hash a secret with bcrypt at the given cost
pub fn hash_secret(secret: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(secret, cost)?)
}

/// Check a secret against its bcrypt hash.
///
/// bcrypt compares the derived digests in constant time.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(secret, hash)?)
}
