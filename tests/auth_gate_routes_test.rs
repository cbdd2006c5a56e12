// ABOUTME: End-to-end auth gate matrix tests over the real router
// ABOUTME: Covers anonymous pass-through, required auth, and invalid-token rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    assert_unauthorized, body_json, initialize_request, send, test_config, test_resources,
    test_router, MockIdentityProvider,
};

#[tokio::test]
async fn health_reports_service_and_security_posture() {
    let app = test_router(test_resources(test_config(false, false, None), None));

    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "twenty-mcp-server");
    assert_eq!(body["authEnabled"], false);
    assert_eq!(body["ipProtection"], false);
}

#[tokio::test]
async fn auth_disabled_accepts_anonymous_mcp_requests() {
    let app = test_router(test_resources(
        test_config(false, false, Some("fallback-key")),
        None,
    ));

    let response = send(&app, Method::POST, "/mcp", None, Some(initialize_request())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["result"]["serverInfo"]["name"], "twenty-mcp-server");
}

#[tokio::test]
async fn optional_auth_accepts_anonymous_requests() {
    let provider = Arc::new(MockIdentityProvider::new());
    let app = test_router(test_resources(
        test_config(true, false, Some("fallback-key")),
        Some(provider),
    ));

    let response = send(&app, Method::POST, "/mcp", None, Some(initialize_request())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn required_auth_rejects_missing_header_with_401() {
    let provider = Arc::new(MockIdentityProvider::new());
    let app = test_router(test_resources(
        test_config(true, true, Some("fallback-key")),
        Some(provider),
    ));

    let response = send(&app, Method::POST, "/mcp", None, Some(initialize_request())).await;
    assert_unauthorized(response).await;
}

#[tokio::test]
async fn invalid_token_is_rejected_even_when_auth_is_optional() {
    let provider = Arc::new(MockIdentityProvider::new());
    let app = test_router(test_resources(
        test_config(true, false, Some("fallback-key")),
        Some(provider),
    ));

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        Some("not-a-real-token"),
        Some(initialize_request()),
    )
    .await;
    assert_unauthorized(response).await;
}

#[tokio::test]
async fn valid_token_is_accepted() {
    let provider = Arc::new(MockIdentityProvider::new().with_token(
        "good-token",
        "user_1",
        "sess_1",
    ));
    let app = test_router(test_resources(
        test_config(true, true, Some("fallback-key")),
        Some(provider),
    ));

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        Some("good-token"),
        Some(initialize_request()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn discovery_documents_follow_auth_enablement() {
    let disabled = test_router(test_resources(test_config(false, false, None), None));
    let response = send(
        &disabled,
        Method::GET,
        "/.well-known/oauth-protected-resource",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let provider = Arc::new(MockIdentityProvider::new());
    let enabled = test_router(test_resources(
        test_config(true, false, None),
        Some(provider),
    ));

    let response = send(
        &enabled,
        Method::GET,
        "/.well-known/oauth-protected-resource",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["resource"], "http://localhost:3000");
    assert_eq!(
        body["authorization_servers"][0],
        "https://clerk.example.com"
    );

    let response = send(
        &enabled,
        Method::GET,
        "/.well-known/oauth-authorization-server",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["issuer"], "https://clerk.example.com");
    assert_eq!(body["code_challenge_methods_supported"][0], "S256");
}
