// ABOUTME: The MCP JSON-RPC endpoint sequencing auth, credential resolution, and dispatch
// ABOUTME: Binds a fresh protocol server and CRM client to every inbound request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # MCP Route
//!
//! `POST /mcp[?apiKey=...&baseUrl=...]` with an optional bearer token. The
//! request path is strictly ordered: the IP filter already ran as the
//! outermost layer; this handler applies the auth gate, resolves
//! credentials, then hands the message to a fresh [`McpServer`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::debug;

use super::{with_session_header, ServerResources};
use crate::constants::protocol::SESSION_ID_HEADER;
use crate::credentials::CredentialQuery;
use crate::crm::TwentyClient;
use crate::errors::AppError;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST};
use crate::mcp::McpServer;

/// `POST /mcp`: one JSON-RPC message exchange
pub async fn handle_mcp(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    // Auth gate: reject, or attach identity, or pass anonymously.
    let user = match resources.auth_gate.authenticate(auth_header).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    // Transport: malformed JSON is an HTTP-level 400, not a JSON-RPC error.
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(_) => return AppError::transport("Invalid JSON").into_response(),
    };
    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            let response =
                JsonRpcResponse::error(Value::Null, INVALID_REQUEST, format!("Invalid request: {e}"));
            return Json(response).into_response();
        }
    };

    // Credential resolution: produces {apiKey, baseUrl} or a 400 whose text
    // depends on whether the caller is authenticated.
    let credentials = match resources.resolver.resolve(&query, user.as_ref()).await {
        Ok(credentials) => credentials,
        Err(e) => return e.into_response(),
    };

    // Fresh protocol server and CRM client per request, bound to the
    // resolved credentials.
    let client = TwentyClient::new(
        resources.http.clone(),
        &credentials.base_url,
        credentials.api_key,
    );
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let server = McpServer::new(resources.registry.clone(), client, session_id);

    debug!(method = %request.method, "Dispatching MCP request");
    let session_id = server.session_id().to_owned();

    match server.handle(request).await {
        Some(response) => {
            with_session_header(Json(response).into_response(), &session_id)
        }
        // Notifications are acknowledged without a body.
        None => with_session_header(StatusCode::ACCEPTED.into_response(), &session_id),
    }
}
