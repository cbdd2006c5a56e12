// ABOUTME: Authentication module for bearer-token validation and the request auth gate
// ABOUTME: Delegates session liveness to the identity provider with a positive-result cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Authentication
//!
//! Per-request authentication is a three-layer stack:
//! - [`provider::IdentityProvider`]: the external source of truth for
//!   session liveness and per-user metadata (Clerk over HTTP)
//! - [`validator::TokenValidator`]: bearer-header parsing plus a 5-minute
//!   positive-result cache in front of the provider
//! - [`gate::AuthGate`]: the accept / reject / pass-through-anonymously
//!   decision driven by `AUTH_ENABLED` and `REQUIRE_AUTH`

/// Request-level authentication gate
pub mod gate;
/// Identity provider contract and the Clerk HTTP implementation
pub mod provider;
/// Bearer-token validation with caching
pub mod validator;

pub use gate::{AuthGate, AuthenticatedUser};
pub use provider::{ClerkProvider, IdentityProvider, SessionValidation};
pub use validator::TokenValidator;
