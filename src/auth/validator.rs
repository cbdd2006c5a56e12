// ABOUTME: Bearer-token validation with a short-lived positive-result cache
// ABOUTME: Parses Authorization headers and shields the identity provider from repeat lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Token Validator
//!
//! Sits between the auth gate and the identity provider. Successful
//! validations are cached for five minutes keyed by the raw token string;
//! failed validations are never cached. A strictly-expired entry is
//! logically absent: it is purged before being read, and other expired
//! entries are swept opportunistically whenever a fresh result is inserted.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use super::provider::{IdentityProvider, SessionValidation};
use crate::constants::auth::TOKEN_CACHE_TTL_SECS;

/// Prefix expected on the Authorization header
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone)]
struct CachedValidation {
    result: SessionValidation,
    expires_at: DateTime<Utc>,
}

/// Validates bearer tokens against the identity provider, with caching
pub struct TokenValidator {
    provider: Arc<dyn IdentityProvider>,
    cache: DashMap<String, CachedValidation>,
}

impl TokenValidator {
    /// Create a validator in front of the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
        }
    }

    /// Validate a raw `Authorization` header value.
    ///
    /// Returns a structured failure (without contacting the provider) when
    /// the header is missing or not a bearer credential. Provider transport
    /// errors are caught and reported as a generic validation failure.
    pub async fn validate_bearer_header(&self, header: Option<&str>) -> SessionValidation {
        let Some(header) = header else {
            return SessionValidation::invalid("Missing Authorization header");
        };
        let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
            return SessionValidation::invalid("Authorization header is not a Bearer credential");
        };
        if token.is_empty() {
            return SessionValidation::invalid("Empty bearer token");
        }

        self.validate_token_at(token, Utc::now()).await
    }

    /// Number of entries currently cached, expired or not. Test hook.
    #[doc(hidden)]
    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Core validation with an injected clock so expiry is testable.
    async fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> SessionValidation {
        if let Some(entry) = self.cache.get(token) {
            if now < entry.expires_at {
                debug!("Token validation served from cache");
                return entry.result.clone();
            }
            drop(entry);
            // Strictly expired: purge before read, then fall through.
            self.cache.remove(token);
        }

        match self.provider.validate_token(token).await {
            Ok(result) => {
                if result.valid {
                    self.purge_expired(now);
                    self.cache.insert(
                        token.to_owned(),
                        CachedValidation {
                            result: result.clone(),
                            expires_at: now + Duration::seconds(TOKEN_CACHE_TTL_SECS),
                        },
                    );
                }
                result
            }
            Err(e) => {
                warn!(error = %e, "Identity provider unreachable during token validation");
                SessionValidation::invalid("Token validation failed")
            }
        }
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        self.cache.retain(|_, entry| now < entry.expires_at);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::errors::{AppError, AppResult};

    struct CountingProvider {
        calls: AtomicUsize,
        accept: bool,
        fail_transport: bool,
    }

    impl CountingProvider {
        fn accepting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: true,
                fail_transport: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: false,
                fail_transport: false,
            }
        }

        fn unreachable() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept: false,
                fail_transport: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn validate_token(&self, _token: &str) -> AppResult<SessionValidation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_transport {
                return Err(AppError::internal("connection refused"));
            }
            if self.accept {
                Ok(SessionValidation::valid("user_1", "sess_1"))
            } else {
                Ok(SessionValidation::invalid("Invalid or expired token"))
            }
        }

        async fn get_user_metadata(&self, _user_id: &str) -> AppResult<Map<String, Value>> {
            Ok(Map::new())
        }

        async fn update_user_metadata(
            &self,
            _user_id: &str,
            _patch: Map<String, Value>,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_header_fails_without_provider_contact() {
        let provider = Arc::new(CountingProvider::accepting());
        let validator = TokenValidator::new(provider.clone());

        let result = validator.validate_bearer_header(None).await;
        assert!(!result.valid);

        let result = validator.validate_bearer_header(Some("Basic abc")).await;
        assert!(!result.valid);

        let result = validator.validate_bearer_header(Some("Bearer ")).await;
        assert!(!result.valid);

        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn successful_validation_is_cached_within_ttl() {
        let provider = Arc::new(CountingProvider::accepting());
        let validator = TokenValidator::new(provider.clone());
        let t0 = Utc::now();

        let first = validator.validate_token_at("tok", t0).await;
        assert!(first.valid);
        assert_eq!(first.user_id.as_deref(), Some("user_1"));

        // Four minutes later: served from cache, no second provider call.
        let cached = validator
            .validate_token_at("tok", t0 + Duration::minutes(4))
            .await;
        assert!(cached.valid);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_revalidation() {
        let provider = Arc::new(CountingProvider::accepting());
        let validator = TokenValidator::new(provider.clone());
        let t0 = Utc::now();

        validator.validate_token_at("tok", t0).await;
        let result = validator
            .validate_token_at("tok", t0 + Duration::minutes(6))
            .await;
        assert!(result.valid);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn failed_validation_is_never_cached() {
        let provider = Arc::new(CountingProvider::rejecting());
        let validator = TokenValidator::new(provider.clone());
        let t0 = Utc::now();

        let first = validator.validate_token_at("bad", t0).await;
        assert!(!first.valid);
        assert_eq!(validator.cached_entries(), 0);

        validator.validate_token_at("bad", t0).await;
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn transport_error_becomes_generic_failure() {
        let provider = Arc::new(CountingProvider::unreachable());
        let validator = TokenValidator::new(provider);

        let result = validator.validate_bearer_header(Some("Bearer tok")).await;
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some("Token validation failed"));
    }

    #[tokio::test]
    async fn insert_sweeps_other_expired_entries() {
        let provider = Arc::new(CountingProvider::accepting());
        let validator = TokenValidator::new(provider);
        let t0 = Utc::now();

        validator.validate_token_at("old", t0).await;
        assert_eq!(validator.cached_entries(), 1);

        // Validating a different token after the TTL sweeps the stale entry.
        validator
            .validate_token_at("new", t0 + Duration::minutes(6))
            .await;
        assert_eq!(validator.cached_entries(), 1);
    }
}
