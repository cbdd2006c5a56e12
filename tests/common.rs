// ABOUTME: Shared test utilities: mock identity provider, config builders, request helpers
// ABOUTME: Exercises the real router in-process via tower::ServiceExt::oneshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors
#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `twenty_mcp_server` integration tests

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use twenty_mcp_server::auth::{IdentityProvider, SessionValidation};
use twenty_mcp_server::config::environment::{
    AuthConfig, ClerkConfig, ServerConfig, TwentyFallbackConfig,
};
use twenty_mcp_server::errors::AppResult;
use twenty_mcp_server::routes::{self, ServerResources};
use twenty_mcp_server::security::IpFilterConfig;

/// Encryption secret used by every test configuration
pub const TEST_ENCRYPTION_SECRET: &str = "integration-test-encryption-secret-0123456789";

/// Identity provider double: fixed token table plus in-memory metadata
pub struct MockIdentityProvider {
    tokens: HashMap<String, (String, String)>,
    metadata: Mutex<HashMap<String, Map<String, Value>>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
            metadata: Mutex::new(HashMap::new()),
        }
    }

    /// Register a token that validates to the given user and session
    pub fn with_token(mut self, token: &str, user_id: &str, session_id: &str) -> Self {
        self.tokens
            .insert(token.to_owned(), (user_id.to_owned(), session_id.to_owned()));
        self
    }

    /// Peek at a user's raw metadata map (what the "provider" persisted)
    pub fn raw_metadata(&self, user_id: &str) -> Map<String, Value> {
        self.metadata
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed raw metadata directly, bypassing the key store
    pub fn seed_metadata(&self, user_id: &str, fields: Map<String, Value>) {
        self.metadata
            .lock()
            .unwrap()
            .insert(user_id.to_owned(), fields);
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn validate_token(&self, token: &str) -> AppResult<SessionValidation> {
        Ok(self.tokens.get(token).map_or_else(
            || SessionValidation::invalid("Invalid or expired token"),
            |(user_id, session_id)| SessionValidation::valid(user_id, session_id),
        ))
    }

    async fn get_user_metadata(&self, user_id: &str) -> AppResult<Map<String, Value>> {
        Ok(self.raw_metadata(user_id))
    }

    async fn update_user_metadata(
        &self,
        user_id: &str,
        patch: Map<String, Value>,
    ) -> AppResult<()> {
        let mut store = self.metadata.lock().unwrap();
        let entry = store.entry(user_id.to_owned()).or_default();
        for (key, value) in patch {
            if value.is_null() {
                entry.remove(&key);
            } else {
                entry.insert(key, value);
            }
        }
        Ok(())
    }
}

/// Build a test configuration without touching process environment
pub fn test_config(
    auth_enabled: bool,
    require_auth: bool,
    fallback_key: Option<&str>,
) -> ServerConfig {
    ServerConfig {
        port: 0,
        mcp_server_url: "http://localhost:3000".to_owned(),
        twenty: TwentyFallbackConfig {
            api_key: fallback_key.map(str::to_owned),
            base_url: None,
        },
        auth: AuthConfig {
            enabled: auth_enabled,
            require_auth,
            clerk: ClerkConfig {
                secret_key: auth_enabled.then(|| "sk_test_mock".to_owned()),
                publishable_key: None,
                domain: Some("clerk.example.com".to_owned()),
                api_url: "https://api.clerk.example.com".to_owned(),
            },
            encryption_secret: auth_enabled.then(|| TEST_ENCRYPTION_SECRET.to_owned()),
        },
        ip_filter: IpFilterConfig::disabled(),
    }
}

/// Build resources over a mock provider (or none when auth is disabled)
pub fn test_resources(
    config: ServerConfig,
    provider: Option<Arc<MockIdentityProvider>>,
) -> Arc<ServerResources> {
    let provider = provider.map(|p| p as Arc<dyn IdentityProvider>);
    ServerResources::with_provider(config, provider, reqwest::Client::new()).unwrap()
}

/// Build the full application router over test resources
pub fn test_router(resources: Arc<ServerResources>) -> Router {
    routes::router(resources)
}

/// Loopback peer used by default in requests
pub fn loopback_peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// Send one request through the router with an explicit peer address
pub async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    peer: SocketAddr,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let mut request = request;
    request.extensions_mut().insert(ConnectInfo(peer));

    app.clone().oneshot(request).await.unwrap()
}

/// Convenience wrapper using the loopback peer
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    send_request(app, method, uri, loopback_peer(), bearer, body).await
}

/// Collect a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A JSON-RPC initialize request body
pub fn initialize_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "0.0.1" },
        },
    })
}

/// A JSON-RPC tools/call request body
pub fn tool_call_request(name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments },
    })
}

/// Assert a response is a 401 with the machine-readable error body
pub async fn assert_unauthorized(response: Response<Body>) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    let body = body_json(response).await;
    assert!(body.get("error").is_some());
    assert!(body.get("error_description").is_some());
}
