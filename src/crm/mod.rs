// ABOUTME: Twenty CRM GraphQL adapter module organization
// ABOUTME: Typed operation builders plus the authenticated GraphQL transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Twenty CRM Adapter
//!
//! The upstream Twenty API is consumed as an opaque GraphQL endpoint
//! authenticated with a bearer token. Supported operations are a closed,
//! typed set ([`operations::CrmOperation`]); query text is constant per
//! operation and user input only ever travels through GraphQL variables.

/// Authenticated GraphQL transport to the Twenty API
pub mod client;
/// Typed GraphQL operation builders, one variant per upstream operation
pub mod operations;

pub use client::TwentyClient;
pub use operations::{CrmOperation, GraphQlRequest};
