// ABOUTME: Configuration module organization for the Twenty MCP server
// ABOUTME: Environment-sourced settings with fail-fast validation at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! Configuration management
//!
//! All configuration is sourced from the environment. Anything that would
//! leave the server running with broken security settings (short encryption
//! secret, malformed CIDR entries, unknown auth provider) fails at load time.

/// Environment variable parsing and server configuration
pub mod environment;

pub use environment::{AuthConfig, ClerkConfig, ServerConfig, TwentyFallbackConfig};
