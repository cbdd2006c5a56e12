// ABOUTME: MCP transport tests: JSON-RPC dispatch, notifications, sessions, failure isolation
// ABOUTME: Exercises POST /mcp end-to-end including an unreachable upstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::http::{Method, StatusCode};
use common::{
    body_json, initialize_request, send, test_config, test_resources, test_router,
    tool_call_request,
};
use serde_json::json;

fn app_with_fallback_key() -> axum::Router {
    test_router(test_resources(
        test_config(false, false, Some("fallback-key")),
        None,
    ))
}

#[tokio::test]
async fn malformed_json_body_is_a_400_invalid_json() {
    let app = app_with_fallback_key();

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let mut request = request;
    request
        .extensions_mut()
        .insert(axum::extract::connect_info::ConnectInfo(
            common::loopback_peer(),
        ));
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "transport_error");
    assert_eq!(body["error_description"], "Invalid JSON");
}

#[tokio::test]
async fn initialize_issues_a_session_id_header() {
    let app = app_with_fallback_key();

    let response = send(&app, Method::POST, "/mcp", None, Some(initialize_request())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("mcp-session-id"));
}

#[tokio::test]
async fn notifications_are_accepted_without_a_body() {
    let app = app_with_fallback_key();

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        None,
        Some(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn tools_list_advertises_the_full_registry() {
    let app = app_with_fallback_key();

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        None,
        Some(json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/list" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 29);
    assert!(tools.iter().any(|tool| tool["name"] == "create_person"));
    assert!(tools
        .iter()
        .all(|tool| tool["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn failing_upstream_is_isolated_to_a_tool_result() {
    // baseUrl points at an unroutable address, so the upstream call fails
    // fast; the failure must be a normal tool result and the server must
    // keep serving afterwards.
    let app = app_with_fallback_key();
    let uri = "/mcp?apiKey=key&baseUrl=http://127.0.0.1:1";

    let response = send(
        &app,
        Method::POST,
        uri,
        None,
        Some(tool_call_request("list_people", json!({}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["error"].is_null(), "tool failure must not be a JSON-RPC error");
    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Error"), "{text}");

    // The process and router remain healthy.
    let response = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_tool_arguments_are_an_error_result() {
    let app = app_with_fallback_key();

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        None,
        Some(tool_call_request("get_person", json!({}))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Missing required argument: id"), "{text}");
}

#[tokio::test]
async fn unknown_method_maps_to_method_not_found() {
    let app = app_with_fallback_key();

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        None,
        Some(json!({ "jsonrpc": "2.0", "id": 9, "method": "resources/read" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], -32601);
}
