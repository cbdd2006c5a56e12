// ABOUTME: Main library entry point for the Twenty CRM MCP server
// ABOUTME: Exposes the Twenty GraphQL API as typed MCP tools over authenticated HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

#![deny(unsafe_code)]

//! # Twenty MCP Server
//!
//! A Model Context Protocol (MCP) server that adapts the Twenty CRM's GraphQL
//! API into a set of typed, discoverable tools for LLM-driven agents.
//!
//! ## Features
//!
//! - **CRM tools**: CRUD and query operations over people, companies,
//!   opportunities, tasks, notes, and activity feeds
//! - **Bearer authentication**: optional Clerk-backed token validation with a
//!   short-lived positive-result cache
//! - **Encrypted credential storage**: per-user Twenty API keys encrypted at
//!   rest (AES-256-GCM, Argon2id-derived key) in the identity provider's
//!   user metadata
//! - **IP allow-listing**: CIDR-aware access filtering ahead of all routing
//! - **Stateless request path**: a fresh protocol server and CRM client are
//!   bound to resolved credentials on every inbound request
//!
//! ## Architecture
//!
//! The request path is strictly ordered: IP filter → authentication gate →
//! credential resolver → tool dispatch. Each gate's rejection short-circuits
//! everything after it.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use twenty_mcp_server::config::environment::ServerConfig;
//! use twenty_mcp_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Twenty MCP Server configured with port: {}", config.port);
//!     Ok(())
//! }
//! ```

/// Authentication gate, bearer-token validation, and identity provider clients
pub mod auth;

/// Configuration management sourced from the environment
pub mod config;

/// Application constants and protocol defaults
pub mod constants;

/// Per-user credential storage and request-time credential resolution
pub mod credentials;

/// Twenty CRM GraphQL client and typed operation builders
pub mod crm;

/// Application error types and HTTP error mapping
pub mod errors;

/// Model Context Protocol server implementation (JSON-RPC 2.0)
pub mod mcp;

/// HTTP routes and router assembly
pub mod routes;

/// Credential encryption and IP access filtering
pub mod security;

/// MCP tool trait, registry, and the CRM tool implementations
pub mod tools;
