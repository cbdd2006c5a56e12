// ABOUTME: Request-level authentication gate over the token validator
// ABOUTME: Implements the accept / reject / anonymous pass-through decision matrix
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Authentication Gate
//!
//! Per-request decision driven by two flags:
//!
//! | `auth_enabled` | header | `require_auth` | outcome |
//! |---|---|---|---|
//! | false | any | any | anonymous pass |
//! | true | absent | false | anonymous pass |
//! | true | absent | true | 401 + `WWW-Authenticate: Bearer` |
//! | true | invalid | any | 401 |
//! | true | valid | any | pass with `{user_id, session_id}` attached |

use std::sync::Arc;

use tracing::debug;

use super::validator::TokenValidator;
use crate::errors::{AppError, AppResult};

/// Identity attached to a request that passed the gate with a valid token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Stable user identifier from the identity provider
    pub user_id: String,
    /// Session identifier backing the presented token
    pub session_id: String,
}

/// Applies the authentication policy to inbound requests
pub struct AuthGate {
    enabled: bool,
    require_auth: bool,
    validator: Option<Arc<TokenValidator>>,
}

impl AuthGate {
    /// Gate with authentication disabled: every request passes anonymously
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            require_auth: false,
            validator: None,
        }
    }

    /// Gate with authentication enabled, backed by the given validator
    #[must_use]
    pub const fn enabled(require_auth: bool, validator: Arc<TokenValidator>) -> Self {
        Self {
            enabled: true,
            require_auth,
            validator: Some(validator),
        }
    }

    /// Whether authentication is enabled at all
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide the authentication outcome for one request.
    ///
    /// # Errors
    /// Returns `AuthRequired` when a required header is absent and
    /// `AuthInvalid` when a presented token fails validation. Both map to
    /// HTTP 401 with CORS headers so browser clients can read the body.
    pub async fn authenticate(
        &self,
        auth_header: Option<&str>,
    ) -> AppResult<Option<AuthenticatedUser>> {
        if !self.enabled {
            return Ok(None);
        }

        let Some(validator) = &self.validator else {
            // Enabled gates are always constructed with a validator.
            return Err(AppError::internal("Authentication gate misconfigured"));
        };

        if auth_header.is_none() {
            if self.require_auth {
                return Err(AppError::auth_required("Authentication required"));
            }
            debug!("No Authorization header; passing anonymously");
            return Ok(None);
        }

        let validation = validator.validate_bearer_header(auth_header).await;
        if !validation.valid {
            return Err(AppError::auth_invalid(
                validation
                    .error
                    .unwrap_or_else(|| "Invalid or expired token".to_owned()),
            ));
        }

        match (validation.user_id, validation.session_id) {
            (Some(user_id), Some(session_id)) => {
                debug!(user_id = %user_id, "Request authenticated");
                Ok(Some(AuthenticatedUser {
                    user_id,
                    session_id,
                }))
            }
            _ => Err(AppError::auth_invalid(
                "Token validated without a user identity",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::auth::provider::{IdentityProvider, SessionValidation};
    use crate::errors::ErrorCode;

    struct StaticProvider {
        accept: bool,
    }

    #[async_trait]
    impl IdentityProvider for StaticProvider {
        async fn validate_token(&self, _token: &str) -> AppResult<SessionValidation> {
            if self.accept {
                Ok(SessionValidation::valid("user_42", "sess_42"))
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

    fn gate(require_auth: bool, accept: bool) -> AuthGate {
        let validator = Arc::new(TokenValidator::new(Arc::new(StaticProvider { accept })));
        AuthGate::enabled(require_auth, validator)
    }

    #[tokio::test]
    async fn disabled_gate_passes_anonymously() {
        let gate = AuthGate::disabled();
        assert!(gate
            .authenticate(Some("Bearer anything"))
            .await
            .unwrap()
            .is_none());
        assert!(gate.authenticate(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_header_with_require_auth_is_rejected() {
        let err = gate(true, true).authenticate(None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn missing_header_without_require_auth_passes_anonymously() {
        let outcome = gate(false, true).authenticate(None).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_even_when_auth_is_optional() {
        let err = gate(false, false)
            .authenticate(Some("Bearer bad"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let user = gate(false, true)
            .authenticate(Some("Bearer good"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.user_id, "user_42");
        assert_eq!(user.session_id, "sess_42");
    }
}
