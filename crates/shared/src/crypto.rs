//! Field-level encryption for sensitive columns.
//!
//! Bank account numbers are stored as `base64url(nonce || ciphertext)` using
//! AES-256-GCM with a fresh 96-bit nonce per value.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use thiserror::Error;

const NONCE_LEN: usize = 12;

/// Errors raised by [`AesGcmCipher`].
#[derive(Debug, Error)]
pub enum CipherError {
    /// Key material is not a base64url-encoded 32-byte key.
    #[error("Invalid cipher key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("Encryption failed")]
    Encrypt,

    /// Ciphertext is malformed or was produced with another key.
    #[error("Decryption failed")]
    Decrypt,
}

/// AES-256-GCM cipher for individual text fields.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl AesGcmCipher {
    /// Builds a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` unless the key is exactly 32 bytes.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKey(format!("expected 32 bytes, got {}", key.len())))?;
        Ok(Self { cipher })
    }

    /// Builds a cipher from a base64url-encoded key, as found in configuration.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` if the key cannot be decoded or has the wrong length.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = base64_url::decode(encoded.trim())
            .map_err(|e| CipherError::InvalidKey(e.to_string()))?;
        Self::from_key_bytes(&key)
    }

    /// Encrypts a plaintext value.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::Encrypt` if the AEAD operation fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(base64_url::encode(&sealed))
    }

    /// Decrypts a value produced by [`AesGcmCipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `CipherError::Decrypt` on malformed input, tampering, or a key mismatch.
    pub fn decrypt(&self, sealed: &str) -> Result<String, CipherError> {
        let bytes = base64_url::decode(sealed).map_err(|_| CipherError::Decrypt)?;
        if bytes.len() <= NONCE_LEN {
            return Err(CipherError::Decrypt);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}
