// ABOUTME: IP access filtering with allow-lists, CIDR ranges, and trusted proxies
// ABOUTME: Decides ahead of all routing whether an inbound connection may proceed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Twenty MCP Server Contributors

//! # IP Access Filter
//!
//! Runs before any other request processing, including CORS preflight and the
//! health endpoint. Allow-list entries are individual addresses or CIDR
//! ranges in either address family; malformed entries are rejected when the
//! configuration is loaded, not per request. The loopback address is always
//! allowed while the filter is enabled, so a misconfigured allow-list cannot
//! lock out local operators.

use std::fmt;
use std::net::IpAddr;

use axum::http::HeaderMap;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// A parsed CIDR range in either address family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    network: IpAddr,
    prefix: u8,
}

impl CidrBlock {
    /// Parse `a.b.c.d/len` or `v6::/len` notation.
    ///
    /// # Errors
    /// Returns a configuration error for malformed address or prefix parts,
    /// or a prefix length exceeding the address family's width.
    pub fn parse(text: &str) -> AppResult<Self> {
        let (addr_part, prefix_part) = text
            .split_once('/')
            .ok_or_else(|| AppError::config(format!("Invalid CIDR notation: {text}")))?;

        let network: IpAddr = addr_part
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("Invalid CIDR network address: {text}")))?;
        let prefix: u8 = prefix_part
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("Invalid CIDR prefix length: {text}")))?;

        let max_prefix = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix > max_prefix {
            return Err(AppError::config(format!(
                "CIDR prefix /{prefix} exceeds /{max_prefix} for {text}"
            )));
        }

        Ok(Self { network, prefix })
    }

    /// Whether the range contains the given address. Addresses from the other
    /// family never match.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u32::MAX << (32 - u32::from(self.prefix))
                };
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = if self.prefix == 0 {
                    0
                } else {
                    u128::MAX << (128 - u32::from(self.prefix))
                };
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// One allow-list entry: a single address or a CIDR range
#[derive(Debug, Clone, Copy)]
enum AllowlistEntry {
    Addr(IpAddr),
    Range(CidrBlock),
}

impl AllowlistEntry {
    fn parse(text: &str) -> AppResult<Self> {
        let trimmed = text.trim();
        if trimmed.contains('/') {
            Ok(Self::Range(CidrBlock::parse(trimmed)?))
        } else {
            trimmed
                .parse()
                .map(Self::Addr)
                .map_err(|_| AppError::config(format!("Invalid allowlist address: {trimmed}")))
        }
    }

    fn matches(self, addr: IpAddr) -> bool {
        match self {
            Self::Addr(entry) => entry == addr,
            Self::Range(range) => range.contains(addr),
        }
    }
}

/// Validated IP filter configuration
#[derive(Debug, Clone)]
pub struct IpFilterConfig {
    /// Whether filtering is active at all
    pub enabled: bool,
    allowlist: Vec<AllowlistEntry>,
    trusted_proxies: Vec<IpAddr>,
    /// Deny requests whose effective client address cannot be determined
    pub block_unknown: bool,
}

impl IpFilterConfig {
    /// Build the configuration from raw comma-separated entry lists.
    ///
    /// # Errors
    /// Fails fast on any malformed allowlist or trusted-proxy entry so a
    /// broken security configuration refuses to start serving.
    pub fn from_entries(
        enabled: bool,
        allowlist: &[String],
        trusted_proxies: &[String],
        block_unknown: bool,
    ) -> AppResult<Self> {
        let allowlist = allowlist
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| AllowlistEntry::parse(entry))
            .collect::<AppResult<Vec<_>>>()?;

        let trusted_proxies = trusted_proxies
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                entry.trim().parse().map_err(|_| {
                    AppError::config(format!("Invalid trusted proxy address: {entry}"))
                })
            })
            .collect::<AppResult<Vec<IpAddr>>>()?;

        Ok(Self {
            enabled,
            allowlist,
            trusted_proxies,
            block_unknown,
        })
    }

    /// Disabled filter that always allows
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            allowlist: Vec::new(),
            trusted_proxies: Vec::new(),
            block_unknown: false,
        }
    }
}

/// Verdict produced for one inbound connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpAccessDecision {
    /// Connection may proceed
    Allow,
    /// Connection is rejected before any other processing
    Deny {
        /// Why the connection was rejected (logged, never sent to the peer)
        reason: String,
    },
}

/// Applies the allow-list policy to inbound connections
#[derive(Debug, Clone)]
pub struct IpAccessFilter {
    config: IpFilterConfig,
}

impl IpAccessFilter {
    /// Create the filter from validated configuration
    #[must_use]
    pub const fn new(config: IpFilterConfig) -> Self {
        Self { config }
    }

    /// Whether filtering is enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Decide whether the connection from `peer` may proceed.
    ///
    /// When the immediate peer is a trusted proxy, the effective client
    /// address comes from `X-Forwarded-For` (first entry) or `X-Real-IP`.
    #[must_use]
    pub fn check_access(&self, peer: IpAddr, headers: &HeaderMap) -> IpAccessDecision {
        if !self.config.enabled {
            return IpAccessDecision::Allow;
        }

        let peer = peer.to_canonical();
        if peer.is_loopback() {
            return IpAccessDecision::Allow;
        }

        let effective = if self.config.trusted_proxies.contains(&peer) {
            match Self::forwarded_client_addr(headers) {
                Some(addr) => addr.to_canonical(),
                None => {
                    if self.config.block_unknown {
                        return IpAccessDecision::Deny {
                            reason: format!(
                                "Could not determine client address behind trusted proxy {peer}"
                            ),
                        };
                    }
                    warn!(
                        proxy = %peer,
                        "Could not determine forwarded client address; allowing (IP_BLOCK_UNKNOWN=false)"
                    );
                    return IpAccessDecision::Allow;
                }
            }
        } else {
            peer
        };

        if effective.is_loopback()
            || self
                .config
                .allowlist
                .iter()
                .any(|entry| entry.matches(effective))
        {
            debug!(client = %effective, "IP filter allowed connection");
            IpAccessDecision::Allow
        } else {
            IpAccessDecision::Deny {
                reason: format!("Address {effective} is not in the allowlist"),
            }
        }
    }

    /// Extract the effective client address from proxy-set headers
    fn forwarded_client_addr(headers: &HeaderMap) -> Option<IpAddr> {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
        {
            // The first entry is the originating client; later hops append.
            return forwarded
                .split(',')
                .next()
                .and_then(|first| first.trim().parse().ok());
        }

        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn filter(allowlist: &[&str], proxies: &[&str], block_unknown: bool) -> IpAccessFilter {
        let allowlist: Vec<String> = allowlist.iter().map(|s| (*s).to_owned()).collect();
        let proxies: Vec<String> = proxies.iter().map(|s| (*s).to_owned()).collect();
        IpAccessFilter::new(
            IpFilterConfig::from_entries(true, &allowlist, &proxies, block_unknown).unwrap(),
        )
    }

    fn ip(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    #[test]
    fn disabled_filter_allows_everything() {
        let filter = IpAccessFilter::new(IpFilterConfig::disabled());
        assert_eq!(
            filter.check_access(ip("203.0.113.9"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
    }

    #[test]
    fn loopback_is_always_allowed() {
        let filter = filter(&["192.168.1.0/24"], &[], true);
        assert_eq!(
            filter.check_access(ip("127.0.0.1"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
        assert_eq!(
            filter.check_access(ip("::1"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
    }

    #[test]
    fn cidr_containment_allows_inside_and_denies_outside() {
        let filter = filter(&["192.168.1.0/24"], &[], false);
        assert_eq!(
            filter.check_access(ip("192.168.1.50"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
        assert!(matches!(
            filter.check_access(ip("192.168.2.1"), &HeaderMap::new()),
            IpAccessDecision::Deny { .. }
        ));
    }

    #[test]
    fn ipv6_cidr_matches() {
        let filter = filter(&["2001:db8::/32"], &[], false);
        assert_eq!(
            filter.check_access(ip("2001:db8::42"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
        assert!(matches!(
            filter.check_access(ip("2001:db9::42"), &HeaderMap::new()),
            IpAccessDecision::Deny { .. }
        ));
    }

    #[test]
    fn exact_address_entries_match() {
        let filter = filter(&["203.0.113.7"], &[], false);
        assert_eq!(
            filter.check_access(ip("203.0.113.7"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
        assert!(matches!(
            filter.check_access(ip("203.0.113.8"), &HeaderMap::new()),
            IpAccessDecision::Deny { .. }
        ));
    }

    #[test]
    fn trusted_proxy_uses_forwarded_for() {
        let filter = filter(&["198.51.100.0/24"], &["10.0.0.1"], false);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.23, 10.0.0.1".parse().unwrap());
        assert_eq!(
            filter.check_access(ip("10.0.0.1"), &headers),
            IpAccessDecision::Allow
        );

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.99".parse().unwrap());
        assert!(matches!(
            filter.check_access(ip("10.0.0.1"), &headers),
            IpAccessDecision::Deny { .. }
        ));
    }

    #[test]
    fn untrusted_peer_headers_are_ignored() {
        let filter = filter(&["198.51.100.0/24"], &[], false);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.23".parse().unwrap());
        // Peer itself is not allowlisted and not a trusted proxy.
        assert!(matches!(
            filter.check_access(ip("203.0.113.50"), &headers),
            IpAccessDecision::Deny { .. }
        ));
    }

    #[test]
    fn unknown_client_behind_proxy_respects_block_unknown() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "not-an-address".parse().unwrap());

        let blocking = filter(&["198.51.100.0/24"], &["10.0.0.1"], true);
        assert!(matches!(
            blocking.check_access(ip("10.0.0.1"), &headers),
            IpAccessDecision::Deny { .. }
        ));

        let permissive = filter(&["198.51.100.0/24"], &["10.0.0.1"], false);
        assert_eq!(
            permissive.check_access(ip("10.0.0.1"), &headers),
            IpAccessDecision::Allow
        );
    }

    #[test]
    fn x_real_ip_is_a_fallback_for_trusted_proxies() {
        let filter = filter(&["198.51.100.0/24"], &["10.0.0.1"], true);
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.77".parse().unwrap());
        assert_eq!(
            filter.check_access(ip("10.0.0.1"), &headers),
            IpAccessDecision::Allow
        );
    }

    #[test]
    fn malformed_cidr_fails_at_config_load() {
        let entries = vec!["192.168.1.0/33".to_owned()];
        assert!(IpFilterConfig::from_entries(true, &entries, &[], false).is_err());

        let entries = vec!["not-a-network/24".to_owned()];
        assert!(IpFilterConfig::from_entries(true, &entries, &[], false).is_err());

        let entries = vec!["192.168.1.0".to_owned()];
        assert!(IpFilterConfig::from_entries(true, &entries, &[], false).is_ok());
    }

    #[test]
    fn ipv4_mapped_ipv6_peer_is_canonicalized() {
        let filter = filter(&["192.168.1.0/24"], &[], false);
        assert_eq!(
            filter.check_access(ip("::ffff:192.168.1.50"), &HeaderMap::new()),
            IpAccessDecision::Allow
        );
    }
}
