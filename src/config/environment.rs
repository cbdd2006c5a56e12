// ABOUTME: Environment-sourced server configuration with fail-fast validation
// ABOUTME: Recognizes the TWENTY_*, AUTH_*, CLERK_*, and IP_* variable families
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # Server Configuration
//!
//! [`ServerConfig::from_env`] reads every recognized environment variable,
//! validates the combination, and refuses to produce a configuration that
//! would serve with broken security settings. Recognized variables:
//!
//! - `TWENTY_API_KEY`, `TWENTY_BASE_URL`: global fallback credentials
//! - `AUTH_ENABLED`, `REQUIRE_AUTH`, `AUTH_PROVIDER`: auth gate behavior
//! - `CLERK_SECRET_KEY`, `CLERK_PUBLISHABLE_KEY`, `CLERK_DOMAIN`,
//!   `CLERK_API_URL`: identity provider access
//! - `API_KEY_ENCRYPTION_SECRET`: ≥32 chars, required when auth is enabled
//! - `IP_PROTECTION_ENABLED`, `IP_ALLOWLIST`, `TRUSTED_PROXIES`,
//!   `IP_BLOCK_UNKNOWN`: IP access filtering
//! - `MCP_SERVER_URL`, `PORT`: server identity and listener

use std::env;

use tracing::info;

use crate::constants::auth::MIN_ENCRYPTION_SECRET_LEN;
use crate::constants::server::DEFAULT_PORT;
use crate::errors::{AppError, AppResult};
use crate::security::IpFilterConfig;

/// Default Clerk backend API base
const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com";

/// Global fallback credentials for the upstream Twenty API
#[derive(Debug, Clone, Default)]
pub struct TwentyFallbackConfig {
    /// `TWENTY_API_KEY`: lowest-precedence API key
    pub api_key: Option<String>,
    /// `TWENTY_BASE_URL`: environment-level base URL override
    pub base_url: Option<String>,
}

/// Identity provider (Clerk) access configuration
#[derive(Debug, Clone, Default)]
pub struct ClerkConfig {
    /// Backend API secret key used for token verification and metadata access
    pub secret_key: Option<String>,
    /// Publishable key surfaced in OAuth discovery metadata
    pub publishable_key: Option<String>,
    /// Clerk frontend domain (issuer for OAuth discovery metadata)
    pub domain: Option<String>,
    /// Backend API base URL
    pub api_url: String,
}

/// Authentication gate configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Master switch; when false every request passes anonymously
    pub enabled: bool,
    /// When true, requests without an Authorization header are rejected
    pub require_auth: bool,
    /// Identity provider access; only Clerk is supported
    pub clerk: ClerkConfig,
    /// Secret backing the API key encryption service
    pub encryption_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            require_auth: false,
            clerk: ClerkConfig {
                api_url: DEFAULT_CLERK_API_URL.to_owned(),
                ..ClerkConfig::default()
            },
            encryption_secret: None,
        }
    }
}

/// Complete validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,
    /// Public URL of this server (used in OAuth discovery metadata)
    pub mcp_server_url: String,
    /// Global fallback upstream credentials
    pub twenty: TwentyFallbackConfig,
    /// Authentication gate settings
    pub auth: AuthConfig,
    /// Validated IP filter settings
    pub ip_filter: IpFilterConfig,
}

impl ServerConfig {
    /// Load and validate configuration from the environment.
    ///
    /// # Errors
    /// Returns a configuration error when:
    /// - `PORT` is not a valid port number
    /// - `AUTH_PROVIDER` names an unsupported provider
    /// - auth is enabled without a usable `API_KEY_ENCRYPTION_SECRET`
    /// - auth is enabled without `CLERK_SECRET_KEY`
    /// - any `IP_ALLOWLIST` or `TRUSTED_PROXIES` entry is malformed
    pub fn from_env() -> AppResult<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::config(format!("Invalid PORT value: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let mcp_server_url =
            env::var("MCP_SERVER_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let twenty = TwentyFallbackConfig {
            api_key: non_empty_var("TWENTY_API_KEY"),
            base_url: non_empty_var("TWENTY_BASE_URL"),
        };

        let auth = Self::load_auth_config()?;
        let ip_filter = Self::load_ip_filter_config()?;

        info!(
            port,
            auth_enabled = auth.enabled,
            require_auth = auth.require_auth,
            ip_protection = ip_filter.enabled,
            "Server configuration loaded"
        );

        Ok(Self {
            port,
            mcp_server_url,
            twenty,
            auth,
            ip_filter,
        })
    }

    fn load_auth_config() -> AppResult<AuthConfig> {
        let enabled = env_flag("AUTH_ENABLED", false);
        let require_auth = env_flag("REQUIRE_AUTH", false);

        if let Some(provider) = non_empty_var("AUTH_PROVIDER") {
            if !provider.eq_ignore_ascii_case("clerk") {
                return Err(AppError::config(format!(
                    "Unsupported AUTH_PROVIDER: {provider} (only 'clerk' is supported)"
                )));
            }
        }

        let clerk = ClerkConfig {
            secret_key: non_empty_var("CLERK_SECRET_KEY"),
            publishable_key: non_empty_var("CLERK_PUBLISHABLE_KEY"),
            domain: non_empty_var("CLERK_DOMAIN"),
            api_url: non_empty_var("CLERK_API_URL")
                .unwrap_or_else(|| DEFAULT_CLERK_API_URL.to_owned()),
        };

        let encryption_secret = non_empty_var("API_KEY_ENCRYPTION_SECRET");

        if enabled {
            match &encryption_secret {
                None => {
                    return Err(AppError::config(
                        "API_KEY_ENCRYPTION_SECRET is required when AUTH_ENABLED=true",
                    ))
                }
                Some(secret) if secret.len() < MIN_ENCRYPTION_SECRET_LEN => {
                    return Err(AppError::config(format!(
                        "API_KEY_ENCRYPTION_SECRET must be at least {MIN_ENCRYPTION_SECRET_LEN} characters"
                    )))
                }
                Some(_) => {}
            }
            if clerk.secret_key.is_none() {
                return Err(AppError::config(
                    "CLERK_SECRET_KEY is required when AUTH_ENABLED=true",
                ));
            }
        }

        Ok(AuthConfig {
            enabled,
            require_auth,
            clerk,
            encryption_secret,
        })
    }

    fn load_ip_filter_config() -> AppResult<IpFilterConfig> {
        let enabled = env_flag("IP_PROTECTION_ENABLED", false);
        let allowlist = comma_list("IP_ALLOWLIST");
        let trusted_proxies = comma_list("TRUSTED_PROXIES");
        let block_unknown = env_flag("IP_BLOCK_UNKNOWN", false);

        IpFilterConfig::from_entries(enabled, &allowlist, &trusted_proxies, block_unknown)
    }
}

/// Read a boolean flag; accepts `true`/`1`/`yes` case-insensitively
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name).map_or(default, |raw| {
        matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
    })
}

/// Read a variable, treating empty/whitespace values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

/// Split a comma-separated variable into trimmed entries
fn comma_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "PORT",
            "MCP_SERVER_URL",
            "TWENTY_API_KEY",
            "TWENTY_BASE_URL",
            "AUTH_ENABLED",
            "REQUIRE_AUTH",
            "AUTH_PROVIDER",
            "CLERK_SECRET_KEY",
            "CLERK_PUBLISHABLE_KEY",
            "CLERK_DOMAIN",
            "CLERK_API_URL",
            "API_KEY_ENCRYPTION_SECRET",
            "IP_PROTECTION_ENABLED",
            "IP_ALLOWLIST",
            "TRUSTED_PROXIES",
            "IP_BLOCK_UNKNOWN",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_environment_is_empty() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.auth.enabled);
        assert!(!config.ip_filter.enabled);
        assert!(config.twenty.api_key.is_none());
    }

    #[test]
    #[serial]
    fn auth_enabled_requires_encryption_secret() {
        clear_env();
        env::set_var("AUTH_ENABLED", "true");
        env::set_var("CLERK_SECRET_KEY", "sk_test_abc");
        assert!(ServerConfig::from_env().is_err());

        env::set_var("API_KEY_ENCRYPTION_SECRET", "too short");
        assert!(ServerConfig::from_env().is_err());

        env::set_var(
            "API_KEY_ENCRYPTION_SECRET",
            "a-secret-that-is-definitely-long-enough",
        );
        assert!(ServerConfig::from_env().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn auth_enabled_requires_clerk_secret_key() {
        clear_env();
        env::set_var("AUTH_ENABLED", "1");
        env::set_var(
            "API_KEY_ENCRYPTION_SECRET",
            "a-secret-that-is-definitely-long-enough",
        );
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn unknown_auth_provider_is_rejected() {
        clear_env();
        env::set_var("AUTH_PROVIDER", "auth0");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn malformed_allowlist_entry_fails_at_load() {
        clear_env();
        env::set_var("IP_PROTECTION_ENABLED", "true");
        env::set_var("IP_ALLOWLIST", "192.168.1.0/24, 10.0.0.0/99");
        assert!(ServerConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn comma_lists_are_trimmed() {
        clear_env();
        env::set_var("IP_PROTECTION_ENABLED", "true");
        env::set_var("IP_ALLOWLIST", " 192.168.1.0/24 , 10.1.2.3 ,");
        env::set_var("TRUSTED_PROXIES", "10.0.0.1");
        let config = ServerConfig::from_env().unwrap();
        assert!(config.ip_filter.enabled);
        clear_env();
    }
}
