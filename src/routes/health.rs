// ABOUTME: Health check endpoint reporting service identity and security posture
// ABOUTME: Requires no authentication; only the IP filter runs ahead of it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! Health check route

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::ServerResources;
use crate::constants::service::TWENTY_MCP_SERVER;

/// `GET /health`
pub async fn health_check(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": TWENTY_MCP_SERVER,
        "authEnabled": resources.auth_gate.is_enabled(),
        "ipProtection": resources.ip_filter.is_enabled(),
    }))
}
