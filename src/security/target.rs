//! Outbound target policy.
//!
//! # Responsibilities
//! - Restrict the schemes the relay will forward to
//! - Optionally refuse loopback, private and link-local targets
//!
//! # Design Decisions
//! - Checked on the parsed URL before any outbound I/O
//! - Only literal addresses and `localhost` are inspected; hostnames are not
//!   resolved here

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, Url};

use crate::config::SecurityConfig;

/// Why a target URL was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetViolation {
    #[error("unsupported URL scheme `{0}`")]
    Scheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("target address {0} is not publicly routable")]
    PrivateAddress(IpAddr),

    #[error("target host `{0}` is not publicly routable")]
    LocalHost(String),
}

impl TargetViolation {
    /// Policy refusals, as opposed to URLs the client could never have used.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::PrivateAddress(_) | Self::LocalHost(_))
    }
}

/// Policy applied to every target URL.
#[derive(Debug, Clone)]
pub struct TargetPolicy {
    allowed_schemes: Vec<String>,
    block_private: bool,
}

impl TargetPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            allowed_schemes: config
                .allowed_schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            block_private: config.block_private_targets,
        }
    }

    /// Check a parsed target URL against the policy.
    pub fn check(&self, url: &Url) -> Result<(), TargetViolation> {
        if !self.allowed_schemes.iter().any(|s| s == url.scheme()) {
            return Err(TargetViolation::Scheme(url.scheme().to_string()));
        }

        let host = url.host().ok_or(TargetViolation::MissingHost)?;
        if !self.block_private {
            return Ok(());
        }

        match host {
            Host::Domain(name) => {
                let name = name.trim_end_matches('.').to_ascii_lowercase();
                if name == "localhost" || name.ends_with(".localhost") {
                    return Err(TargetViolation::LocalHost(name));
                }
            }
            Host::Ipv4(addr) => {
                if !is_public_v4(addr) {
                    return Err(TargetViolation::PrivateAddress(IpAddr::V4(addr)));
                }
            }
            Host::Ipv6(addr) => {
                if !is_public_v6(addr) {
                    return Err(TargetViolation::PrivateAddress(IpAddr::V6(addr)));
                }
            }
        }
        Ok(())
    }
}

fn is_public_v4(addr: Ipv4Addr) -> bool {
    let [a, b, ..] = addr.octets();
    let shared = a == 100 && (b & 0xc0) == 64; // 100.64.0.0/10
    !(addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast()
        || shared)
}

fn is_public_v6(addr: Ipv6Addr) -> bool {
    if let Some(v4) = addr.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = addr.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    !(addr.is_loopback() || addr.is_unspecified() || unique_local || link_local)
}
