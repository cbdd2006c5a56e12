// ABOUTME: Symmetric encryption-at-rest for per-user Twenty API keys
// ABOUTME: Argon2id-derived AES-256-GCM with random IV and authenticated tag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # API Key Encryption
//!
//! Encrypts per-user upstream API keys before they are written to the
//! identity provider's user metadata. The 32-byte cipher key is derived once
//! from the configured secret with Argon2id and a constant salt; the secret
//! alone is the trust root, so every ciphertext produced by one deployment
//! shares the same key. Each `encrypt` call draws a fresh random IV, which
//! makes ciphertexts non-deterministic.
//!
//! Blob layout: `base64(iv[12] || tag[16] || ciphertext)`. Any tag mismatch
//! or truncation surfaces as a decryption error, never as garbage plaintext.

use base64::{engine::general_purpose, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::constants::auth::MIN_ENCRYPTION_SECRET_LEN;
use crate::errors::{AppError, AppResult};

/// AES-256-GCM IV length in bytes
const IV_LEN: usize = 12;
/// GCM authentication tag length in bytes
const TAG_LEN: usize = 16;

/// Constant key-derivation salt. Deliberately fixed: all ciphertexts from one
/// deployment share a key, and the configured secret is the sole trust root.
const KDF_SALT: &[u8] = b"twenty-mcp-api-key-encryption-v1";

/// Encrypts and decrypts per-user API keys with a password-derived key
pub struct ApiKeyEncryption {
    key: [u8; 32],
    rng: SystemRandom,
}

impl std::fmt::Debug for ApiKeyEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyEncryption")
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ApiKeyEncryption {
    /// Build the encryption service from the configured secret.
    ///
    /// # Errors
    /// Returns a configuration error when the secret is shorter than 32
    /// characters. Construction happens once at startup, so a bad secret
    /// refuses to serve rather than failing per request.
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.len() < MIN_ENCRYPTION_SECRET_LEN {
            return Err(AppError::config(format!(
                "API_KEY_ENCRYPTION_SECRET must be at least {MIN_ENCRYPTION_SECRET_LEN} characters"
            )));
        }

        let mut key = [0u8; 32];
        argon2::Argon2::default()
            .hash_password_into(secret.as_bytes(), KDF_SALT, &mut key)
            .map_err(|e| AppError::config(format!("Key derivation failed: {e}")))?;

        Ok(Self {
            key,
            rng: SystemRandom::new(),
        })
    }

    /// Encrypt a non-empty plaintext into a transportable blob.
    ///
    /// # Errors
    /// Returns an error if the plaintext is empty or the cipher fails.
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Err(AppError::invalid_argument("Cannot encrypt empty plaintext"));
        }

        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|e| AppError::internal(format!("Failed to create encryption key: {e}")))?;
        let key = LessSafeKey::new(unbound);

        let mut iv = [0u8; IV_LEN];
        self.rng
            .fill(&mut iv)
            .map_err(|e| AppError::internal(format!("Failed to generate IV: {e}")))?;
        let nonce = Nonce::assume_unique_for_key(iv);

        let mut buffer = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut buffer)
            .map_err(|e| AppError::internal(format!("Encryption failed: {e}")))?;

        // ring appends the tag after the ciphertext; reorder into the stored
        // iv || tag || ciphertext layout.
        let ct_len = buffer.len() - TAG_LEN;
        let mut combined = Vec::with_capacity(IV_LEN + buffer.len());
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(&buffer[ct_len..]);
        combined.extend_from_slice(&buffer[..ct_len]);

        Ok(general_purpose::STANDARD.encode(combined))
    }

    /// Decrypt a blob produced by [`Self::encrypt`].
    ///
    /// # Errors
    /// Returns a decryption error when the blob is malformed, truncated, or
    /// fails authentication-tag verification (tampering or wrong key).
    pub fn decrypt(&self, blob: &str) -> AppResult<String> {
        let combined = general_purpose::STANDARD
            .decode(blob)
            .map_err(|e| AppError::decryption(format!("Invalid ciphertext encoding: {e}")))?;

        if combined.len() < IV_LEN + TAG_LEN {
            return Err(AppError::decryption("Ciphertext too short"));
        }

        let (iv_bytes, rest) = combined.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let nonce_array: [u8; IV_LEN] = iv_bytes
            .try_into()
            .map_err(|_| AppError::decryption("Invalid IV length"))?;
        let nonce = Nonce::assume_unique_for_key(nonce_array);

        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|e| AppError::internal(format!("Failed to create decryption key: {e}")))?;
        let key = LessSafeKey::new(unbound);

        // Rebuild the ciphertext || tag order ring expects for open_in_place.
        let mut buffer = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        buffer.extend_from_slice(ciphertext);
        buffer.extend_from_slice(tag);

        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut buffer)
            .map_err(|_| AppError::decryption("Ciphertext failed integrity verification"))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|e| AppError::decryption(format!("Decrypted data is not valid UTF-8: {e}")))
    }
}
