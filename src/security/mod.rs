// ABOUTME: Security module for credential encryption and network access filtering
// ABOUTME: Provides AES-256-GCM secret storage and CIDR-aware IP allow-listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Security Module
//!
//! Security primitives for the Twenty MCP server:
//! - Symmetric encryption-at-rest for per-user API keys
//! - IP access filtering with allow-lists and trusted proxies

/// Symmetric encryption for per-user API keys
pub mod encryption;
/// IP allow-list filtering with CIDR support
pub mod ip_filter;

pub use encryption::ApiKeyEncryption;
pub use ip_filter::{IpAccessDecision, IpAccessFilter, IpFilterConfig};
