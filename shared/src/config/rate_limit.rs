//! Login rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Login attempt rate limiting configuration
///
/// All durations are in seconds. Values are validated when the core
/// `WindowPolicy` is built from them, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRateLimitConfig {
    /// Enable login rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Span over which failed attempts are counted
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,

    /// Failures within the window that trigger a block
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long a key stays blocked once triggered
    #[serde(default = "default_block_seconds")]
    pub block_seconds: u64,

    /// How often idle keys are purged
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Extra idle time past the window before a key is purged
    #[serde(default)]
    pub idle_grace_seconds: u64,

    /// Tolerated backwards step of a reported failure timestamp, in milliseconds
    #[serde(default = "default_max_clock_skew_ms")]
    pub max_clock_skew_ms: u64,

    /// Also track failures per origin address, across all identities
    #[serde(default = "default_track_origin")]
    pub track_origin: bool,

    /// Failures per origin that block the origin itself
    #[serde(default = "default_origin_max_attempts")]
    pub origin_max_attempts: u32,

    /// IPv4 prefix length used to aggregate origin-only keys
    #[serde(default = "default_ipv4_prefix")]
    pub ipv4_prefix: u8,

    /// IPv6 prefix length used to aggregate origin-only keys
    #[serde(default = "default_ipv6_prefix")]
    pub ipv6_prefix: u8,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_seconds: default_window_seconds(),
            max_attempts: default_max_attempts(),
            block_seconds: default_block_seconds(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            idle_grace_seconds: 0,
            max_clock_skew_ms: default_max_clock_skew_ms(),
            track_origin: default_track_origin(),
            origin_max_attempts: default_origin_max_attempts(),
            ipv4_prefix: default_ipv4_prefix(),
            ipv6_prefix: default_ipv6_prefix(),
        }
    }
}

impl LoginRateLimitConfig {
    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            max_attempts: 20,
            block_seconds: 60,
            origin_max_attempts: 200,
            ..Default::default()
        }
    }

    /// Create a production configuration (stricter limits)
    pub fn production() -> Self {
        Self::default()
    }
}

fn default_enabled() -> bool {
    true
}

fn default_window_seconds() -> u64 {
    300  // 5 minutes
}

fn default_max_attempts() -> u32 {
    5
}

fn default_block_seconds() -> u64 {
    3600  // 1 hour
}

fn default_cleanup_interval_seconds() -> u64 {
    60
}

fn default_max_clock_skew_ms() -> u64 {
    1000
}

fn default_track_origin() -> bool {
    true
}

fn default_origin_max_attempts() -> u32 {
    50
}

fn default_ipv4_prefix() -> u8 {
    32
}

fn default_ipv6_prefix() -> u8 {
    128
}
