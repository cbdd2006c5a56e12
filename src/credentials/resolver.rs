// ABOUTME: Request-time credential resolution with a declarative precedence table
// ABOUTME: Merges query parameters, stored user keys, and environment fallbacks per field
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Credential Resolver
//!
//! Produces the `{api_key, base_url}` pair one request will use. Precedence
//! is a single declarative table evaluated per field, first match wins:
//!
//! 1. Explicit query parameter on the request
//! 2. The authenticated caller's stored credential (only consulted when no
//!    query parameter supplied that field)
//! 3. The `TWENTY_API_KEY` / `TWENTY_BASE_URL` environment fallback
//! 4. For the base URL only, the hardcoded default upstream endpoint
//!
//! When no API key survives the chain, the failure message depends on the
//! caller: authenticated users are directed to the credential-management
//! endpoint, anonymous callers get a generic missing-parameter error. The
//! distinction is part of the contract.

use std::sync::Arc;

use serde::Deserialize;

use crate::auth::gate::AuthenticatedUser;
use crate::config::environment::TwentyFallbackConfig;
use crate::constants::upstream::DEFAULT_BASE_URL;
use crate::errors::{AppError, AppResult};

use super::store::{KeyStore, StoredCredential};

/// Credential-bearing query parameters accepted on `/mcp`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialQuery {
    /// `?apiKey=`: highest-precedence API key
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    /// `?baseUrl=`: highest-precedence base URL
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
}

/// The credential set a request will use against the upstream CRM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    /// Twenty API key, guaranteed non-empty
    pub api_key: String,
    /// Upstream base URL, guaranteed non-empty
    pub base_url: String,
}

/// The two independently-resolved credential fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ApiKey,
    BaseUrl,
}

/// Ordered candidate sources; the table is the precedence definition
#[derive(Debug, Clone, Copy)]
enum Source {
    QueryParam,
    StoredUserKey,
    Environment,
    DefaultEndpoint,
}

const SOURCE_ORDER: [Source; 4] = [
    Source::QueryParam,
    Source::StoredUserKey,
    Source::Environment,
    Source::DefaultEndpoint,
];

/// Resolves per-request upstream credentials
pub struct CredentialResolver {
    store: Option<Arc<KeyStore>>,
    fallback: TwentyFallbackConfig,
}

impl CredentialResolver {
    /// Create a resolver. The store is absent when authentication is
    /// disabled, which removes the stored-key source from the chain.
    #[must_use]
    pub const fn new(store: Option<Arc<KeyStore>>, fallback: TwentyFallbackConfig) -> Self {
        Self { store, fallback }
    }

    /// Resolve the credential set for one request.
    ///
    /// # Errors
    /// Returns a `MissingCredential` error (HTTP 400) when no API key
    /// survives the precedence chain; the message text differs between
    /// authenticated and anonymous callers.
    pub async fn resolve(
        &self,
        query: &CredentialQuery,
        user: Option<&AuthenticatedUser>,
    ) -> AppResult<ResolvedCredentials> {
        let stored = self.load_stored_if_needed(query, user).await?;

        let api_key = self.pick(Field::ApiKey, query, stored.as_ref());
        let base_url = self.pick(Field::BaseUrl, query, stored.as_ref());

        let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
            return Err(match user {
                Some(user) => AppError::missing_credential(format!(
                    "No Twenty API key configured for user {}. \
                     Store one via POST /api/keys before calling MCP tools.",
                    user.user_id
                )),
                None => AppError::missing_credential("Missing required apiKey parameter"),
            });
        };

        Ok(ResolvedCredentials {
            api_key,
            base_url: base_url
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }

    /// Fetch the stored credential once, and only when an authenticated
    /// caller left at least one field unspecified in the query.
    async fn load_stored_if_needed(
        &self,
        query: &CredentialQuery,
        user: Option<&AuthenticatedUser>,
    ) -> AppResult<Option<StoredCredential>> {
        let (Some(store), Some(user)) = (&self.store, user) else {
            return Ok(None);
        };
        if query.api_key.is_some() && query.base_url.is_some() {
            return Ok(None);
        }
        store.get_api_key(&user.user_id).await
    }

    fn pick(
        &self,
        field: Field,
        query: &CredentialQuery,
        stored: Option<&StoredCredential>,
    ) -> Option<String> {
        SOURCE_ORDER
            .iter()
            .find_map(|source| self.candidate(*source, field, query, stored))
    }

    fn candidate(
        &self,
        source: Source,
        field: Field,
        query: &CredentialQuery,
        stored: Option<&StoredCredential>,
    ) -> Option<String> {
        match (source, field) {
            (Source::QueryParam, Field::ApiKey) => query.api_key.clone(),
            (Source::QueryParam, Field::BaseUrl) => query.base_url.clone(),
            (Source::StoredUserKey, Field::ApiKey) => {
                stored.map(|record| record.api_key.clone())
            }
            (Source::StoredUserKey, Field::BaseUrl) => {
                stored.and_then(|record| record.base_url.clone())
            }
            (Source::Environment, Field::ApiKey) => self.fallback.api_key.clone(),
            (Source::Environment, Field::BaseUrl) => self.fallback.base_url.clone(),
            (Source::DefaultEndpoint, Field::ApiKey) => None,
            (Source::DefaultEndpoint, Field::BaseUrl) => Some(DEFAULT_BASE_URL.to_owned()),
        }
    }
}
