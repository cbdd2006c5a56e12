// ABOUTME: Central application error type with machine-readable codes and HTTP mapping
// ABOUTME: Converts every per-request failure into a structured JSON response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Error Handling
//!
//! All fallible paths in the server funnel into [`AppError`]. Configuration
//! errors abort startup; everything raised during a request is converted at
//! the router or tool boundary into a structured `{error, error_description}`
//! response. Secrets never appear in error messages.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

/// Machine-readable error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Invalid or missing startup configuration (fatal, never per-request)
    ConfigError,
    /// Request requires authentication but none was presented
    AuthRequired,
    /// Presented bearer token is missing, malformed, invalid, or expired
    AuthInvalid,
    /// Connection address rejected by the IP access filter
    AccessDenied,
    /// No upstream API key could be resolved for the request
    MissingCredential,
    /// Caller-supplied argument failed validation
    InvalidArgument,
    /// Stored ciphertext failed integrity verification or decoding
    DecryptionFailed,
    /// The upstream CRM GraphQL call failed
    UpstreamError,
    /// Malformed request body or transport-level failure
    TransportError,
    /// Unexpected internal failure
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this error category
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::AuthRequired | Self::AuthInvalid => StatusCode::UNAUTHORIZED,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::MissingCredential | Self::InvalidArgument | Self::TransportError => {
                StatusCode::BAD_REQUEST
            }
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::ConfigError | Self::DecryptionFailed | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short token used in the `error` field of response bodies
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "config_error",
            Self::AuthRequired => "auth_required",
            Self::AuthInvalid => "invalid_token",
            Self::AccessDenied => "access_denied",
            Self::MissingCredential => "missing_credential",
            Self::InvalidArgument => "invalid_argument",
            Self::DecryptionFailed => "decryption_failed",
            Self::UpstreamError => "upstream_error",
            Self::TransportError => "transport_error",
            Self::InternalError => "internal_error",
        }
    }
}

/// Application error carrying a category and a human-readable description
#[derive(Debug, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct AppError {
    /// Error category
    pub code: ErrorCode,
    /// Human-readable description (safe to return to callers)
    pub message: String,
}

impl AppError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Startup configuration failure
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Authentication required (no credentials presented)
    #[must_use]
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthRequired, message)
    }

    /// Presented credentials are invalid
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// IP access filter rejection
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessDenied, message)
    }

    /// No resolvable upstream credential
    #[must_use]
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingCredential, message)
    }

    /// Invalid caller-supplied argument
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Ciphertext failed integrity verification or decoding
    #[must_use]
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DecryptionFailed, message)
    }

    /// Upstream CRM call failure
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, message)
    }

    /// Transport-level failure (malformed body, framing)
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportError, message)
    }

    /// Unexpected internal failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Json(json!({
            "error": self.code.as_str(),
            "error_description": self.message,
        }));

        let mut response = (status, body).into_response();

        // Browser-based MCP clients need CORS headers on rejections to read
        // the error body instead of seeing an opaque network failure.
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            header::HeaderValue::from_static("*"),
        );
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_expected_status() {
        assert_eq!(ErrorCode::AuthInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AuthRequired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::MissingCredential.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::AccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::TransportError.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_response_carries_www_authenticate() {
        let response = AppError::auth_invalid("bad token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }
}
