// ABOUTME: Per-user encrypted Twenty API key persistence in identity provider metadata
// ABOUTME: Store, read, rotate, and delete operations that never expose plaintext at rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Per-User Credential Store
//!
//! Keys live in the identity provider's private user metadata under the
//! `twenty_api_key_encrypted` / `twenty_base_url` / `twenty_key_updated_at`
//! fields. The API key field is always ciphertext produced by
//! [`ApiKeyEncryption`]; plaintext is never stored or transmitted.
//!
//! A stored-but-undecryptable record is treated as "no usable credential":
//! the failure is logged and the caller sees an absent key, so recovery is
//! re-configuration rather than a crashed request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::auth::provider::IdentityProvider;
use crate::constants::auth::{META_API_KEY, META_BASE_URL, META_UPDATED_AT};
use crate::errors::{AppError, AppResult};
use crate::security::ApiKeyEncryption;

/// A user's decrypted upstream credential
#[derive(Debug, Clone)]
pub struct StoredCredential {
    /// Decrypted Twenty API key
    pub api_key: String,
    /// Optional per-user base URL override
    pub base_url: Option<String>,
}

/// Status view of a stored credential that never touches the ciphertext
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetadata {
    /// Whether an encrypted key is present
    pub has_key: bool,
    /// When the key was last stored or rotated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Stored base URL override, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Persists per-user encrypted API keys via the identity provider
pub struct KeyStore {
    provider: Arc<dyn IdentityProvider>,
    encryption: Arc<ApiKeyEncryption>,
}

impl KeyStore {
    /// Create a store over the given provider and encryption service
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, encryption: Arc<ApiKeyEncryption>) -> Self {
        Self {
            provider,
            encryption,
        }
    }

    /// Encrypt and persist a user's API key, overwriting any existing record.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty user id or key, and propagates
    /// encryption or provider failures.
    pub async fn store_api_key(
        &self,
        user_id: &str,
        api_key: &str,
        base_url: Option<&str>,
    ) -> AppResult<()> {
        if user_id.is_empty() {
            return Err(AppError::invalid_argument("userId must not be empty"));
        }
        if api_key.is_empty() {
            return Err(AppError::invalid_argument("apiKey must not be empty"));
        }

        let encrypted = self.encryption.encrypt(api_key)?;

        let mut patch = Map::new();
        patch.insert(META_API_KEY.to_owned(), Value::String(encrypted));
        patch.insert(
            META_BASE_URL.to_owned(),
            base_url.map_or(Value::Null, |url| Value::String(url.to_owned())),
        );
        patch.insert(
            META_UPDATED_AT.to_owned(),
            Value::String(Utc::now().to_rfc3339()),
        );

        self.provider.update_user_metadata(user_id, patch).await?;
        info!(user_id = %user_id, "Stored encrypted API key");
        Ok(())
    }

    /// Read and decrypt a user's stored credential.
    ///
    /// Returns `None` when no key is stored, and also when a stored record
    /// fails decryption (logged, treated as no usable credential).
    ///
    /// # Errors
    /// Propagates provider failures only; decryption failures do not error.
    pub async fn get_api_key(&self, user_id: &str) -> AppResult<Option<StoredCredential>> {
        let metadata = self.provider.get_user_metadata(user_id).await?;

        let Some(encrypted) = metadata.get(META_API_KEY).and_then(Value::as_str) else {
            return Ok(None);
        };

        match self.encryption.decrypt(encrypted) {
            Ok(api_key) => Ok(Some(StoredCredential {
                api_key,
                base_url: metadata
                    .get(META_BASE_URL)
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })),
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "Stored API key failed decryption; treating as absent"
                );
                Ok(None)
            }
        }
    }

    /// Clear a user's stored credential fields.
    ///
    /// # Errors
    /// Propagates provider failures.
    pub async fn delete_api_key(&self, user_id: &str) -> AppResult<()> {
        let mut patch = Map::new();
        patch.insert(META_API_KEY.to_owned(), Value::Null);
        patch.insert(META_BASE_URL.to_owned(), Value::Null);
        patch.insert(META_UPDATED_AT.to_owned(), Value::Null);

        self.provider.update_user_metadata(user_id, patch).await?;
        info!(user_id = %user_id, "Deleted stored API key");
        Ok(())
    }

    /// Metadata-only view for status displays; never attempts decryption.
    ///
    /// # Errors
    /// Propagates provider failures.
    pub async fn get_api_key_metadata(&self, user_id: &str) -> AppResult<KeyMetadata> {
        let metadata = self.provider.get_user_metadata(user_id).await?;

        let has_key = metadata
            .get(META_API_KEY)
            .and_then(Value::as_str)
            .is_some_and(|blob| !blob.is_empty());

        let updated_at = metadata
            .get(META_UPDATED_AT)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));

        Ok(KeyMetadata {
            has_key,
            updated_at,
            base_url: metadata
                .get(META_BASE_URL)
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }

    /// Replace a user's key. Semantically identical to [`Self::store_api_key`].
    ///
    /// # Errors
    /// Same as [`Self::store_api_key`].
    pub async fn rotate_api_key(
        &self,
        user_id: &str,
        new_key: &str,
        base_url: Option<&str>,
    ) -> AppResult<()> {
        self.store_api_key(user_id, new_key, base_url).await
    }
}
