//! Bearer credentials for tenants and wallets.
//!
//! Tokens are 256 random bits, base64url encoded, and handed out exactly
//! once. Only their SHA-256 digest is stored.

use sha2::{Digest, Sha256};

/// Generates a fresh bearer token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64_url::encode(&bytes)
}

/// Hashes a token for storage and lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
