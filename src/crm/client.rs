// ABOUTME: Authenticated GraphQL transport to the Twenty CRM API
// ABOUTME: Posts typed operations, separates transport failures from GraphQL-level errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Twenty Client
//!
//! One client instance is bound to one resolved credential set and lives for
//! one inbound request. The underlying `reqwest` connection pool is shared
//! process-wide; binding is per request by design.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::constants::upstream::GRAPHQL_PATH;
use crate::errors::{AppError, AppResult};

use super::operations::CrmOperation;

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

/// One entry of the GraphQL `errors` array
#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Request-scoped client bound to one credential set
pub struct TwentyClient {
    http: reqwest::Client,
    graphql_url: String,
    api_key: String,
}

impl TwentyClient {
    /// Bind a client to the resolved credentials. The `http` handle shares
    /// the process-wide connection pool.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            graphql_url: format!("{}{GRAPHQL_PATH}", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    /// Execute one typed operation and return the GraphQL `data` payload.
    ///
    /// # Errors
    /// Returns `UpstreamError` for transport failures, non-success HTTP
    /// statuses, and GraphQL-level `errors[]` entries alike; the message
    /// carries the upstream description, never the API key.
    pub async fn execute(&self, operation: &CrmOperation) -> AppResult<Value> {
        let request = operation.request();
        debug!(operation = operation.name(), "Executing CRM operation");

        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": request.query,
                "variables": request.variables,
            }))
            .send()
            .await
            .map_err(|e| {
                AppError::upstream(format!("Twenty API request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "Twenty API returned status {status} for {}",
                operation.name()
            )));
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            AppError::upstream(format!("Twenty API response malformed: {e}"))
        })?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let joined = errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::upstream(format!(
                "{} failed: {joined}",
                operation.name()
            )));
        }

        body.data.ok_or_else(|| {
            AppError::upstream(format!("{} returned no data", operation.name()))
        })
    }
}
