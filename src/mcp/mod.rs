// ABOUTME: Model Context Protocol module organization
// ABOUTME: JSON-RPC 2.0 message types and the per-request protocol server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # MCP Implementation
//!
//! The server speaks MCP over JSON-RPC 2.0. A fresh [`server::McpServer`]
//! is constructed for every inbound HTTP request, bound to that request's
//! resolved upstream credentials; no protocol state survives between
//! requests.

/// JSON-RPC 2.0 and MCP message types
pub mod protocol;
/// Per-request MCP server dispatching protocol methods to the tool registry
pub mod server;

pub use protocol::{JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
