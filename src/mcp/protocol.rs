// ABOUTME: JSON-RPC 2.0 and MCP message types shared by the server and tests
// ABOUTME: Request/response envelopes, error codes, and tool-call result shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # MCP Protocol Types
//!
//! Message envelopes for the JSON-RPC 2.0 exchange. A request without an
//! `id` is a notification and produces no response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::protocol::JSONRPC_VERSION;

/// JSON-RPC error code: malformed JSON
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC error code: not a valid request object
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC error code: unknown method
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code: invalid method parameters
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code: internal server error
pub const INTERNAL_ERROR: i64 = -32603;

/// Incoming JSON-RPC request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version marker, expected "2.0"
    #[serde(default)]
    pub jsonrpc: String,
    /// Method name (`initialize`, `tools/list`, `tools/call`, ...)
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<Value>,
    /// Request id; absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Whether this message is a notification (no response expected)
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outgoing JSON-RPC response
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Echo of the request id
    pub id: Value,
    /// Success payload, mutually exclusive with `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload, mutually exclusive with `result`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response carrying `result`
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response with a JSON-RPC error code
    #[must_use]
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i64,
    /// Human-readable message
    pub message: String,
}

/// One tool as advertised by `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Tool name clients pass to `tools/call`
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// JSON Schema of the accepted arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters of a `tools/call` request
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// Target tool name
    pub name: String,
    /// Structured arguments map
    #[serde(default)]
    pub arguments: Value,
}

/// One content block of a tool-call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContent {
    /// Content type discriminator; always "text"
    #[serde(rename = "type")]
    pub content_type: String,
    /// The payload text
    pub text: String,
}

/// Result of a `tools/call` invocation. Failures are normal results with
/// `is_error` set; a tool call never surfaces as a JSON-RPC error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content blocks (always exactly one text block here)
    pub content: Vec<ToolContent>,
    /// Whether the call failed
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(flag: &bool) -> bool {
    !*flag
}

impl CallToolResult {
    /// Successful text result
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_owned(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Failure result; the text carries the error description
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_owned(),
                text: text.into(),
            }],
            is_error: true,
        }
    }
}
