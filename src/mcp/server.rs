// ABOUTME: Per-request MCP server dispatching JSON-RPC methods to the tool registry
// ABOUTME: Bound to one resolved credential set; no state survives the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # MCP Server
//!
//! One instance per inbound HTTP request, bound to a [`TwentyClient`]
//! carrying that request's resolved credentials. This is a deliberate
//! statelessness tradeoff, not an accident of the transport: nothing is
//! shared between requests except the immutable tool registry.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::constants::protocol::MCP_PROTOCOL_VERSION;
use crate::constants::service::{SERVER_VERSION, TWENTY_MCP_SERVER};
use crate::crm::TwentyClient;
use crate::tools::ToolRegistry;

use super::protocol::{
    CallToolParams, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND,
};

/// Per-request protocol server
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    client: TwentyClient,
    session_id: String,
}

impl McpServer {
    /// Bind a fresh server to the shared registry and a request-scoped client.
    /// The session id is echoed to the client but carries no server state.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, client: TwentyClient, session_id: Option<String>) -> Self {
        Self {
            registry,
            client,
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Session id issued on initialize
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Handle one JSON-RPC message. Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Acknowledged notification");
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        Some(match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": self.registry.descriptors() }),
            ),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        })
    }

    fn handle_initialize(&self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": TWENTY_MCP_SERVER,
                    "version": SERVER_VERSION,
                },
            }),
        )
    }

    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing tools/call params")
            }
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid tools/call params: {e}"),
                )
            }
        };

        if !self.registry.contains(&params.name) {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        }

        let result = self
            .registry
            .call(&params.name, &params.arguments, &self.client)
            .await;

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Failed to serialize tool result: {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn server() -> McpServer {
        let client = TwentyClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            "test-key",
        );
        McpServer::new(Arc::new(ToolRegistry::new()), client, None)
    }

    fn request(method: &str, params: Option<Value>, id: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_owned(),
            method: method.to_owned(),
            params,
            id,
        }
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let response = server()
            .handle(request("initialize", None, Some(json!(1))))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], TWENTY_MCP_SERVER);
    }

    #[tokio::test]
    async fn notifications_produce_no_response() {
        let response = server()
            .handle(request("notifications/initialized", None, None))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn tools_list_advertises_the_registry() {
        let response = server()
            .handle(request("tools/list", None, Some(json!(2))))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 29);
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let response = server()
            .handle(request("resources/list", None, Some(json!(3))))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let response = server()
            .handle(request(
                "tools/call",
                Some(json!({ "name": "no_such_tool", "arguments": {} })),
                Some(json!(4)),
            ))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn failing_tool_call_is_a_normal_error_result() {
        // The client points at an unroutable address, so the upstream call
        // fails; the failure must surface as a result, not a JSON-RPC error.
        let response = server()
            .handle(request(
                "tools/call",
                Some(json!({ "name": "list_people", "arguments": {} })),
                Some(json!(5)),
            ))
            .await
            .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error"), "{text}");
    }
}
