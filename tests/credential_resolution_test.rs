// ABOUTME: Credential precedence tests over the real resolver and key store
// ABOUTME: Query param beats stored key; distinct 400 texts for anonymous and authed callers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    body_json, initialize_request, send, test_config, test_resources, test_router,
    MockIdentityProvider,
};
use twenty_mcp_server::auth::AuthenticatedUser;
use twenty_mcp_server::credentials::CredentialQuery;

fn authed_user() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: "user_1".to_owned(),
        session_id: "sess_1".to_owned(),
    }
}

/// Build resources whose mock provider has a stored key for user_1
async fn resources_with_stored_key(
    require_auth: bool,
    fallback: Option<&str>,
) -> (Arc<twenty_mcp_server::routes::ServerResources>, Arc<MockIdentityProvider>) {
    let provider = Arc::new(MockIdentityProvider::new().with_token(
        "good-token",
        "user_1",
        "sess_1",
    ));
    let resources = test_resources(
        test_config(true, require_auth, fallback),
        Some(provider.clone()),
    );
    resources
        .key_store
        .as_ref()
        .unwrap()
        .store_api_key("user_1", "stored-key-B", Some("https://stored.example.com"))
        .await
        .unwrap();
    (resources, provider)
}

#[tokio::test]
async fn query_parameter_wins_over_stored_key() {
    let (resources, _) = resources_with_stored_key(false, None).await;

    let query = CredentialQuery {
        api_key: Some("query-key-A".to_owned()),
        base_url: None,
    };
    let resolved = resources
        .resolver
        .resolve(&query, Some(&authed_user()))
        .await
        .unwrap();

    assert_eq!(resolved.api_key, "query-key-A");
    // base_url still falls through to the stored record.
    assert_eq!(resolved.base_url, "https://stored.example.com");
}

#[tokio::test]
async fn stored_key_is_used_when_no_query_parameter() {
    let (resources, _) = resources_with_stored_key(false, Some("env-key")).await;

    let resolved = resources
        .resolver
        .resolve(&CredentialQuery::default(), Some(&authed_user()))
        .await
        .unwrap();

    // Stored key outranks the environment fallback.
    assert_eq!(resolved.api_key, "stored-key-B");
}

#[tokio::test]
async fn anonymous_caller_falls_back_to_environment() {
    let (resources, _) = resources_with_stored_key(false, Some("env-key")).await;

    let resolved = resources
        .resolver
        .resolve(&CredentialQuery::default(), None)
        .await
        .unwrap();

    assert_eq!(resolved.api_key, "env-key");
    assert_eq!(resolved.base_url, "https://api.twenty.com");
}

#[tokio::test]
async fn corrupt_stored_key_is_treated_as_absent() {
    let provider = Arc::new(MockIdentityProvider::new().with_token(
        "good-token",
        "user_1",
        "sess_1",
    ));
    let mut seeded = serde_json::Map::new();
    seeded.insert(
        "twenty_api_key_encrypted".to_owned(),
        serde_json::Value::String("not-a-valid-ciphertext-blob".to_owned()),
    );
    provider.seed_metadata("user_1", seeded);

    let resources = test_resources(test_config(true, false, Some("env-key")), Some(provider));

    // Decryption fails, so resolution falls through to the environment.
    let resolved = resources
        .resolver
        .resolve(&CredentialQuery::default(), Some(&authed_user()))
        .await
        .unwrap();
    assert_eq!(resolved.api_key, "env-key");
}

#[tokio::test]
async fn anonymous_missing_credential_message_over_http() {
    let app = test_router(test_resources(test_config(false, false, None), None));

    let response = send(&app, Method::POST, "/mcp", None, Some(initialize_request())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_credential");
    assert!(body["error_description"]
        .as_str()
        .unwrap()
        .contains("Missing required apiKey parameter"));
}

#[tokio::test]
async fn authenticated_missing_credential_message_over_http() {
    let provider = Arc::new(MockIdentityProvider::new().with_token(
        "good-token",
        "user_1",
        "sess_1",
    ));
    let app = test_router(test_resources(test_config(true, false, None), Some(provider)));

    let response = send(
        &app,
        Method::POST,
        "/mcp",
        Some("good-token"),
        Some(initialize_request()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let description = body["error_description"].as_str().unwrap();
    // Distinct text: directs the user at key management, not at a parameter.
    assert!(description.contains("/api/keys"));
    assert!(!description.contains("Missing required apiKey parameter"));
}

#[tokio::test]
async fn query_parameter_credentials_work_over_http() {
    let app = test_router(test_resources(test_config(false, false, None), None));

    let response = send(
        &app,
        Method::POST,
        "/mcp?apiKey=query-key",
        None,
        Some(initialize_request()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
