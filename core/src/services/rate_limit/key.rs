//! Rate limiting keys

use std::fmt;
use std::net::IpAddr;

use ipnetwork::{Ipv4Network, Ipv6Network};
use serde::Serialize;

use crate::errors::{RateLimitError, RateLimitResult};

/// Identity used to scope rate limiting state.
///
/// A key combines the caller's origin address with the attempted account
/// identifier. Either part may be missing: an origin-only key throttles one
/// address across all accounts, an identity-only key is used when the caller
/// address is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RateKey {
    origin: Option<IpAddr>,
    identity: Option<String>,
}

impl RateKey {
    /// Combined `(origin, identity)` key; degrades to identity-only without an origin
    pub fn new(origin: Option<IpAddr>, identity: &str) -> Self {
        Self {
            origin: origin.map(canonical_ip),
            identity: Some(normalize_identity(identity)),
        }
    }

    pub fn origin_only(origin: IpAddr) -> Self {
        Self {
            origin: Some(canonical_ip(origin)),
            identity: None,
        }
    }

    pub fn identity_only(identity: &str) -> Self {
        Self {
            origin: None,
            identity: Some(normalize_identity(identity)),
        }
    }

    /// Origin-only key for the network containing `origin`.
    ///
    /// A /32 (IPv4) or /128 (IPv6) prefix keeps the exact address.
    pub fn origin_network(origin: IpAddr, ipv4_prefix: u8, ipv6_prefix: u8) -> RateLimitResult<Self> {
        let network = match canonical_ip(origin) {
            IpAddr::V4(addr) => Ipv4Network::new(addr, ipv4_prefix)
                .map(|net| IpAddr::V4(net.network()))
                .map_err(|e| RateLimitError::configuration("ipv4_prefix", e.to_string()))?,
            IpAddr::V6(addr) => Ipv6Network::new(addr, ipv6_prefix)
                .map(|net| IpAddr::V6(net.network()))
                .map_err(|e| RateLimitError::configuration("ipv6_prefix", e.to_string()))?,
        };
        Ok(Self::origin_only(network))
    }

    pub fn origin(&self) -> Option<IpAddr> {
        self.origin
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_origin_only(&self) -> bool {
        self.identity.is_none()
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.origin, &self.identity) {
            (Some(origin), Some(identity)) => write!(f, "ip_{}:user_{}", origin, identity),
            (Some(origin), None) => write!(f, "ip_{}", origin),
            (None, Some(identity)) => write!(f, "user_{}", identity),
            (None, None) => write!(f, "anonymous"),
        }
    }
}

/// Account identifiers compare case-insensitively and ignore surrounding whitespace
fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) share the IPv4 key
fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}
