// ABOUTME: Per-user credential storage and request-time credential resolution
// ABOUTME: Encrypted Twenty API keys at rest plus the precedence chain that picks one per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Credentials
//!
//! Two collaborating pieces:
//! - [`store::KeyStore`]: persists each user's encrypted Twenty API key in
//!   the identity provider's private metadata
//! - [`resolver::CredentialResolver`]: merges query parameters, stored
//!   keys, and environment fallbacks into the credential set one request
//!   will use, applying a fixed precedence order

/// Request-time credential resolution with explicit source precedence
pub mod resolver;
/// Encrypted per-user API key persistence
pub mod store;

pub use resolver::{CredentialQuery, CredentialResolver, ResolvedCredentials};
pub use store::{KeyMetadata, KeyStore, StoredCredential};
