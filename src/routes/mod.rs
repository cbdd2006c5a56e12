// ABOUTME: Route module organization, shared server resources, and router assembly
// ABOUTME: Wires the IP filter, CORS, tracing, and timeout layers around domain routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # HTTP Routes
//!
//! Route handlers organized by domain. The [`ServerResources`] struct is the
//! explicit dependency container built once at startup and shared by every
//! handler; there are no process-wide singletons. Layer order matters: the
//! IP access filter wraps everything, including CORS preflight and `/health`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::{AuthGate, AuthenticatedUser, ClerkProvider, IdentityProvider, TokenValidator};
use crate::config::environment::ServerConfig;
use crate::constants::protocol::SESSION_ID_HEADER;
use crate::constants::server::REQUEST_TIMEOUT_SECS;
use crate::constants::upstream::UPSTREAM_TIMEOUT_SECS;
use crate::credentials::{CredentialResolver, KeyStore};
use crate::errors::{AppError, AppResult};
use crate::security::{ApiKeyEncryption, IpAccessDecision, IpAccessFilter};
use crate::tools::ToolRegistry;

/// Health check and system status routes
pub mod health;
/// Per-user credential management routes
pub mod keys;
/// MCP JSON-RPC endpoint
pub mod mcp;
/// OAuth discovery metadata routes (RFC 9728 / RFC 8414)
pub mod oauth_metadata;

/// Explicit dependency container shared by all route handlers
pub struct ServerResources {
    /// Validated startup configuration
    pub config: ServerConfig,
    /// IP access filter applied ahead of all routing
    pub ip_filter: IpAccessFilter,
    /// Per-request authentication gate
    pub auth_gate: AuthGate,
    /// Bearer-token validator; present iff auth is enabled
    pub validator: Option<Arc<TokenValidator>>,
    /// Per-user credential store; present iff auth is enabled
    pub key_store: Option<Arc<KeyStore>>,
    /// Request-time credential resolver
    pub resolver: CredentialResolver,
    /// The immutable tool registry
    pub registry: Arc<ToolRegistry>,
    /// Shared upstream connection pool
    pub http: reqwest::Client,
}

impl ServerResources {
    /// Build resources from configuration, constructing the Clerk provider.
    ///
    /// # Errors
    /// Fails on an unusable encryption secret or HTTP client construction.
    pub fn from_config(config: ServerConfig) -> AppResult<Arc<Self>> {
        let http = upstream_http_client()?;

        let provider: Option<Arc<dyn IdentityProvider>> = if config.auth.enabled {
            let secret_key = config.auth.clerk.secret_key.clone().ok_or_else(|| {
                AppError::config("CLERK_SECRET_KEY is required when AUTH_ENABLED=true")
            })?;
            Some(Arc::new(ClerkProvider::new(
                http.clone(),
                config.auth.clerk.api_url.clone(),
                secret_key,
            )))
        } else {
            None
        };

        Self::with_provider(config, provider, http)
    }

    /// Build resources with an injected identity provider. Tests substitute
    /// mock providers through this constructor.
    ///
    /// # Errors
    /// Fails on an unusable encryption secret.
    pub fn with_provider(
        config: ServerConfig,
        provider: Option<Arc<dyn IdentityProvider>>,
        http: reqwest::Client,
    ) -> AppResult<Arc<Self>> {
        let ip_filter = IpAccessFilter::new(config.ip_filter.clone());

        let (auth_gate, validator, key_store) = if config.auth.enabled {
            let provider = provider.ok_or_else(|| {
                AppError::config("Identity provider is required when AUTH_ENABLED=true")
            })?;
            let secret = config.auth.encryption_secret.as_deref().ok_or_else(|| {
                AppError::config("API_KEY_ENCRYPTION_SECRET is required when AUTH_ENABLED=true")
            })?;
            let encryption = Arc::new(ApiKeyEncryption::new(secret)?);
            let validator = Arc::new(TokenValidator::new(provider.clone()));
            let key_store = Arc::new(KeyStore::new(provider, encryption));
            (
                AuthGate::enabled(config.auth.require_auth, validator.clone()),
                Some(validator),
                Some(key_store),
            )
        } else {
            (AuthGate::disabled(), None, None)
        };

        let resolver = CredentialResolver::new(key_store.clone(), config.twenty.clone());

        Ok(Arc::new(Self {
            config,
            ip_filter,
            auth_gate,
            validator,
            key_store,
            resolver,
            registry: Arc::new(ToolRegistry::new()),
            http,
        }))
    }

    /// Authenticate a request that always requires a valid bearer token,
    /// regardless of `REQUIRE_AUTH` (the credential-management endpoints).
    ///
    /// # Errors
    /// Returns 401-mapped errors when auth is disabled, the header is
    /// missing, or the token is invalid.
    pub async fn require_authenticated(
        &self,
        auth_header: Option<&str>,
    ) -> AppResult<AuthenticatedUser> {
        let Some(validator) = &self.validator else {
            return Err(AppError::auth_required(
                "Authentication is not enabled on this server",
            ));
        };
        if auth_header.is_none() {
            return Err(AppError::auth_required("Authentication required"));
        }

        let validation = validator.validate_bearer_header(auth_header).await;
        if !validation.valid {
            return Err(AppError::auth_invalid(
                validation
                    .error
                    .unwrap_or_else(|| "Invalid or expired token".to_owned()),
            ));
        }
        match (validation.user_id, validation.session_id) {
            (Some(user_id), Some(session_id)) => Ok(AuthenticatedUser {
                user_id,
                session_id,
            }),
            _ => Err(AppError::auth_invalid(
                "Token validated without a user identity",
            )),
        }
    }
}

/// Shared upstream HTTP client with the explicit timeout policy
fn upstream_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))
}

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/.well-known/oauth-protected-resource",
            get(oauth_metadata::protected_resource),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(oauth_metadata::authorization_server),
        )
        .route(
            "/api/keys",
            get(keys::get_key_metadata)
                .post(keys::store_key)
                .delete(keys::delete_key),
        )
        .route("/mcp", post(mcp::handle_mcp))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors_layer())
        // Outermost: the IP filter runs before everything, preflight included.
        .layer(middleware::from_fn_with_state(
            resources.clone(),
            ip_filter_middleware,
        ))
        .with_state(resources)
}

/// CORS policy: browser MCP clients need the session header exposed
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(SESSION_ID_HEADER),
        ])
        .expose_headers([header::HeaderName::from_static(SESSION_ID_HEADER)])
}

/// IP access filtering ahead of all other request processing
async fn ip_filter_middleware(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    if resources.ip_filter.is_enabled() {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        let decision = match peer {
            Some(ip) => resources.ip_filter.check_access(ip, request.headers()),
            None => IpAccessDecision::Deny {
                reason: "Peer address unavailable".to_owned(),
            },
        };

        if let IpAccessDecision::Deny { reason } = decision {
            warn!(reason = %reason, "IP filter rejected connection");
            // Minimal deny response; no internal state leaks to the peer.
            return Response::builder()
                .status(StatusCode::FORBIDDEN)
                .body(axum::body::Body::empty())
                .unwrap_or_else(|_| StatusCode::FORBIDDEN.into_response());
        }
    }

    next.run(request).await
}

/// Attach the MCP session id header to a response
pub(crate) fn with_session_header(mut response: Response, session_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session_id) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static(SESSION_ID_HEADER), value);
    }
    response
}
