// ABOUTME: OAuth discovery metadata routes per RFC 9728 and RFC 8414
// ABOUTME: Published only while authentication is enabled; 404 otherwise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # OAuth Discovery Metadata
//!
//! Browser and agent clients discover how to authenticate against this
//! server through two well-known documents. The authorization server itself
//! is the identity provider (Clerk); this server only publishes pointers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::ServerResources;
use crate::constants::auth::OAUTH_SCOPES;

/// Issuer URL: the Clerk frontend domain when configured, else this server
fn issuer(resources: &ServerResources) -> String {
    resources.config.auth.clerk.domain.as_ref().map_or_else(
        || resources.config.mcp_server_url.clone(),
        |domain| format!("https://{domain}"),
    )
}

/// `GET /.well-known/oauth-protected-resource` (RFC 9728)
pub async fn protected_resource(State(resources): State<Arc<ServerResources>>) -> Response {
    if !resources.auth_gate.is_enabled() {
        return StatusCode::NOT_FOUND.into_response();
    }

    Json(json!({
        "resource": resources.config.mcp_server_url,
        "authorization_servers": [issuer(&resources)],
        "scopes_supported": OAUTH_SCOPES,
        "bearer_methods_supported": ["header"],
    }))
    .into_response()
}

/// `GET /.well-known/oauth-authorization-server` (RFC 8414)
pub async fn authorization_server(State(resources): State<Arc<ServerResources>>) -> Response {
    if !resources.auth_gate.is_enabled() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let issuer = issuer(&resources);
    Json(json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "code_challenge_methods_supported": ["S256"],
        "scopes_supported": OAUTH_SCOPES,
    }))
    .into_response()
}
