// ABOUTME: Identity provider contract and the Clerk backend API implementation
// ABOUTME: Token verification plus per-user metadata reads and writes over HTTPS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Identity Provider
//!
//! The server treats the identity provider as the sole source of truth for
//! session liveness and per-user metadata storage. The contract is the
//! [`IdentityProvider`] trait; [`ClerkProvider`] implements it against the
//! Clerk backend API. Tests substitute their own implementations.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Outcome of validating one bearer token
#[derive(Debug, Clone)]
pub struct SessionValidation {
    /// Whether the token maps to a live session
    pub valid: bool,
    /// Stable user identifier, present iff `valid`
    pub user_id: Option<String>,
    /// Session identifier, present iff `valid`
    pub session_id: Option<String>,
    /// Failure description, present iff not `valid`
    pub error: Option<String>,
}

impl SessionValidation {
    /// A successful validation
    #[must_use]
    pub fn valid(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            valid: true,
            user_id: Some(user_id.into()),
            session_id: Some(session_id.into()),
            error: None,
        }
    }

    /// A failed validation with a caller-safe description
    #[must_use]
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            user_id: None,
            session_id: None,
            error: Some(error.into()),
        }
    }
}

/// External identity provider contract: session validation and user metadata
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate a raw bearer token and resolve its session and user.
    ///
    /// # Errors
    /// Returns an error only for transport/parse failures talking to the
    /// provider; a well-formed "token is invalid" answer is an `Ok` carrying
    /// an invalid [`SessionValidation`].
    async fn validate_token(&self, token: &str) -> AppResult<SessionValidation>;

    /// Read a user's private metadata map.
    ///
    /// # Errors
    /// Returns an error when the provider call fails or the user is unknown.
    async fn get_user_metadata(&self, user_id: &str) -> AppResult<Map<String, Value>>;

    /// Merge the given fields into a user's private metadata. `null` values
    /// clear the corresponding fields.
    ///
    /// # Errors
    /// Returns an error when the provider call fails.
    async fn update_user_metadata(&self, user_id: &str, patch: Map<String, Value>)
        -> AppResult<()>;
}

/// Clerk token verification response body
#[derive(Debug, Deserialize)]
struct ClerkVerifyResponse {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// Clerk user object, reduced to the metadata we read
#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    private_metadata: Option<Map<String, Value>>,
}

/// Identity provider implementation backed by the Clerk backend API
pub struct ClerkProvider {
    http: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl ClerkProvider {
    /// Create a provider client against the given Clerk backend API base URL
    #[must_use]
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            secret_key: secret_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl IdentityProvider for ClerkProvider {
    async fn validate_token(&self, token: &str) -> AppResult<SessionValidation> {
        let response = self
            .http
            .post(self.endpoint("/v1/tokens/verify"))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "token": token }))
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Identity provider request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            debug!(%status, "Identity provider rejected token");
            return Ok(SessionValidation::invalid("Invalid or expired token"));
        }
        if !status.is_success() {
            return Err(AppError::internal(format!(
                "Identity provider returned status {status}"
            )));
        }

        let body: ClerkVerifyResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Identity provider response malformed: {e}")))?;

        match (body.user_id, body.id) {
            (Some(user_id), session_id) => Ok(SessionValidation::valid(
                user_id,
                session_id.unwrap_or_default(),
            )),
            (None, _) => Ok(SessionValidation::invalid(
                "Token did not resolve to a user",
            )),
        }
    }

    async fn get_user_metadata(&self, user_id: &str) -> AppResult<Map<String, Value>> {
        let response = self
            .http
            .get(self.endpoint(&format!("/v1/users/{user_id}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Identity provider request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "Failed to read user metadata: status {}",
                response.status()
            )));
        }

        let user: ClerkUser = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("User metadata response malformed: {e}")))?;

        Ok(user.private_metadata.unwrap_or_default())
    }

    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: Map<String, Value>,
    ) -> AppResult<()> {
        let response = self
            .http
            .patch(self.endpoint(&format!("/v1/users/{user_id}/metadata")))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "private_metadata": patch }))
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Identity provider request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "Failed to update user metadata: status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
