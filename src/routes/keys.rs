// ABOUTME: Per-user credential management routes: store, inspect, delete API keys
// ABOUTME: Every handler demands a valid bearer token regardless of REQUIRE_AUTH
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # API Key Management Routes
//!
//! `GET /api/keys` returns metadata only (never the key), `POST /api/keys`
//! stores or rotates, `DELETE /api/keys` clears. All three require a valid
//! bearer token; the gate's `REQUIRE_AUTH` relaxation does not apply here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::ServerResources;
use crate::errors::{AppError, AppResult};

/// `POST /api/keys` request body
#[derive(Debug, Deserialize)]
pub struct StoreKeyRequest {
    /// The Twenty API key to encrypt and store
    #[serde(rename = "apiKey")]
    pub api_key: String,
    /// Optional per-user base URL override
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
}

fn auth_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn key_store(resources: &ServerResources) -> AppResult<&Arc<crate::credentials::KeyStore>> {
    resources
        .key_store
        .as_ref()
        .ok_or_else(|| AppError::auth_required("Authentication is not enabled on this server"))
}

/// `GET /api/keys`: metadata-only status view
pub async fn get_key_metadata(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let user = resources
        .require_authenticated(auth_header(&headers))
        .await?;
    let metadata = key_store(&resources)?
        .get_api_key_metadata(&user.user_id)
        .await?;
    Ok(Json(serde_json::to_value(metadata).map_err(|e| {
        AppError::internal(format!("Failed to serialize key metadata: {e}"))
    })?))
}

/// `POST /api/keys`: store or rotate the caller's key
pub async fn store_key(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<StoreKeyRequest>,
) -> AppResult<Json<Value>> {
    let user = resources
        .require_authenticated(auth_header(&headers))
        .await?;
    key_store(&resources)?
        .store_api_key(&user.user_id, &request.api_key, request.base_url.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "API key stored",
    })))
}

/// `DELETE /api/keys`: clear the caller's stored key
pub async fn delete_key(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let user = resources
        .require_authenticated(auth_header(&headers))
        .await?;
    key_store(&resources)?.delete_api_key(&user.user_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "API key deleted",
    })))
}
