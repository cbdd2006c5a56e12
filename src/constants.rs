// ABOUTME: Application constants, protocol defaults, and metadata field names
// ABOUTME: Centralizes values shared across configuration, auth, and the MCP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! Application constants shared across modules

/// Service identifiers
pub mod service {
    /// Service name reported by the health endpoint and MCP server info
    pub const TWENTY_MCP_SERVER: &str = "twenty-mcp-server";

    /// Server version reported during MCP initialization
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// MCP protocol values
pub mod protocol {
    /// JSON-RPC version string used on every response
    pub const JSONRPC_VERSION: &str = "2.0";

    /// MCP protocol revision this server implements
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

    /// Session id header issued on initialize and echoed when presented
    pub const SESSION_ID_HEADER: &str = "mcp-session-id";
}

/// Upstream CRM defaults
pub mod upstream {
    /// Hardcoded default Twenty API endpoint, lowest-precedence base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.twenty.com";

    /// Path of the GraphQL endpoint relative to the base URL
    pub const GRAPHQL_PATH: &str = "/graphql";

    /// Timeout applied to every upstream HTTP call (CRM and identity provider)
    pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;
}

/// Authentication and credential-storage values
pub mod auth {
    /// Lifetime of a cached positive token validation
    pub const TOKEN_CACHE_TTL_SECS: i64 = 300;

    /// Minimum length of the API key encryption secret
    pub const MIN_ENCRYPTION_SECRET_LEN: usize = 32;

    /// Metadata field holding the encrypted Twenty API key
    pub const META_API_KEY: &str = "twenty_api_key_encrypted";

    /// Metadata field holding the per-user base URL override
    pub const META_BASE_URL: &str = "twenty_base_url";

    /// Metadata field holding the last key update timestamp (RFC 3339)
    pub const META_UPDATED_AT: &str = "twenty_key_updated_at";

    /// OAuth scopes advertised in the protected-resource metadata
    pub const OAUTH_SCOPES: [&str; 2] = ["twenty:read", "twenty:write"];
}

/// HTTP server defaults
pub mod server {
    /// Default listen port when `PORT` is not set
    pub const DEFAULT_PORT: u16 = 3000;

    /// Timeout on inbound request handling
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
}
