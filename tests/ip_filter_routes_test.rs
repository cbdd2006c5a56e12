// ABOUTME: IP filter tests over the real router: deny-before-routing semantics
// ABOUTME: Covers loopback, CIDR allow, deny for health and preflight, trusted proxies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::net::SocketAddr;

use axum::http::{Method, StatusCode};
use common::{send_request, test_config, test_resources, test_router};
use twenty_mcp_server::security::IpFilterConfig;

fn filtered_app(allowlist: &[&str], block_unknown: bool) -> axum::Router {
    let mut config = test_config(false, false, Some("fallback-key"));
    let allowlist: Vec<String> = allowlist.iter().map(|s| (*s).to_owned()).collect();
    config.ip_filter =
        IpFilterConfig::from_entries(true, &allowlist, &[], block_unknown).unwrap();
    test_router(test_resources(config, None))
}

fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

#[tokio::test]
async fn loopback_is_allowed_regardless_of_allowlist() {
    let app = filtered_app(&["192.168.1.0/24"], true);

    let response = send_request(
        &app,
        Method::GET,
        "/health",
        peer("127.0.0.1:50000"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn allowlisted_cidr_member_is_allowed() {
    let app = filtered_app(&["192.168.1.0/24"], false);

    let response = send_request(
        &app,
        Method::GET,
        "/health",
        peer("192.168.1.50:50000"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn outside_cidr_is_denied_even_for_health() {
    let app = filtered_app(&["192.168.1.0/24"], false);

    let response = send_request(
        &app,
        Method::GET,
        "/health",
        peer("192.168.2.1:50000"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The deny response carries no body (no internal state leaks).
    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn preflight_is_filtered_before_cors() {
    let app = filtered_app(&["192.168.1.0/24"], false);

    let response = send_request(
        &app,
        Method::OPTIONS,
        "/mcp",
        peer("203.0.113.9:50000"),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn denied_peer_cannot_reach_mcp() {
    let app = filtered_app(&["10.0.0.0/8"], false);

    let response = send_request(
        &app,
        Method::POST,
        "/mcp?apiKey=key",
        peer("203.0.113.9:50000"),
        None,
        Some(common::initialize_request()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
