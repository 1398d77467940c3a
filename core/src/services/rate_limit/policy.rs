//! Window policy: the parameters and arithmetic that decide blocking
//!
//! Everything here is a pure function over explicit timestamps; the tracker
//! supplies "now" from its clock.

use chrono::{DateTime, Duration, Utc};
use lg_shared::LoginRateLimitConfig;

use crate::errors::{RateLimitError, RateLimitResult};

/// Validated rate limiting parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Span over which failed attempts are counted
    window_duration: Duration,
    /// Failures within the window that trigger a block
    max_attempts: u32,
    /// How long a key stays blocked once triggered
    block_duration: Duration,
    /// How often idle keys are purged
    cleanup_interval: std::time::Duration,
    /// Extra idle time past the window before a key is purged
    idle_grace: Duration,
    /// Largest backwards step of a failure timestamp that is clamped instead of rejected
    max_clock_skew: Duration,
}

impl WindowPolicy {
    /// Create a policy, failing fast on non-positive parameters
    pub fn new(
        window_duration: Duration,
        max_attempts: u32,
        block_duration: Duration,
        cleanup_interval: Duration,
    ) -> RateLimitResult<Self> {
        ensure_positive("window_duration", window_duration)?;
        ensure_positive("block_duration", block_duration)?;
        ensure_positive("cleanup_interval", cleanup_interval)?;
        if max_attempts == 0 {
            return Err(RateLimitError::configuration(
                "max_attempts",
                "must be greater than zero",
            ));
        }
        let cleanup_interval = cleanup_interval
            .to_std()
            .map_err(|e| RateLimitError::configuration("cleanup_interval", e.to_string()))?;

        Ok(Self {
            window_duration,
            max_attempts,
            block_duration,
            cleanup_interval,
            idle_grace: Duration::zero(),
            max_clock_skew: Duration::seconds(1),
        })
    }

    /// Build the policy described by the process configuration
    pub fn from_config(config: &LoginRateLimitConfig) -> RateLimitResult<Self> {
        Self::new(
            seconds("window_duration", config.window_seconds)?,
            config.max_attempts,
            seconds("block_duration", config.block_seconds)?,
            seconds("cleanup_interval", config.cleanup_interval_seconds)?,
        )?
        .with_idle_grace(seconds("idle_grace", config.idle_grace_seconds)?)?
        .with_max_clock_skew(milliseconds("max_clock_skew", config.max_clock_skew_ms)?)
    }

    /// Login preset: 5 failures in 5 minutes block for an hour
    pub fn login() -> Self {
        Self {
            window_duration: Duration::seconds(300),
            max_attempts: 5,
            block_duration: Duration::seconds(3600),
            cleanup_interval: std::time::Duration::from_secs(60),
            idle_grace: Duration::zero(),
            max_clock_skew: Duration::seconds(1),
        }
    }

    pub fn with_idle_grace(mut self, idle_grace: Duration) -> RateLimitResult<Self> {
        ensure_not_negative("idle_grace", idle_grace)?;
        self.idle_grace = idle_grace;
        Ok(self)
    }

    pub fn with_max_clock_skew(mut self, max_clock_skew: Duration) -> RateLimitResult<Self> {
        ensure_not_negative("max_clock_skew", max_clock_skew)?;
        self.max_clock_skew = max_clock_skew;
        Ok(self)
    }

    /// Same timing with a different threshold
    pub fn with_max_attempts(mut self, max_attempts: u32) -> RateLimitResult<Self> {
        if max_attempts == 0 {
            return Err(RateLimitError::configuration(
                "max_attempts",
                "must be greater than zero",
            ));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn block_duration(&self) -> Duration {
        self.block_duration
    }

    pub fn cleanup_interval(&self) -> std::time::Duration {
        self.cleanup_interval
    }

    pub fn idle_grace(&self) -> Duration {
        self.idle_grace
    }

    pub fn max_clock_skew(&self) -> Duration {
        self.max_clock_skew
    }

    /// Oldest timestamp still counted at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window_duration)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether a failure at `ts` still counts at `now` (inclusive lower bound)
    pub fn is_within_window(&self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        ts >= self.window_start(now)
    }

    /// End of a block triggered by a failure at `at`
    pub fn block_until(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        at.checked_add_signed(self.block_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn reaches_threshold(&self, failures: usize) -> bool {
        failures >= self.max_attempts as usize
    }

    pub fn remaining_attempts(&self, failures: usize) -> u32 {
        let failures = u32::try_from(failures).unwrap_or(u32::MAX);
        self.max_attempts.saturating_sub(failures)
    }

    /// Whether a key whose last failure was at `last_failure` may be evicted at `now`
    pub fn is_idle(&self, last_failure: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let deadline = self
            .window_duration
            .checked_add(&self.idle_grace)
            .and_then(|idle| last_failure.checked_add_signed(idle))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        now >= deadline
    }

    /// Validate a reported failure time against the latest one recorded for the key.
    ///
    /// Pre-epoch timestamps are rejected. A regression of at most
    /// `max_clock_skew` is clamped to `latest`; a larger one is rejected.
    pub fn admit_timestamp(
        &self,
        at: DateTime<Utc>,
        latest: Option<DateTime<Utc>>,
    ) -> RateLimitResult<DateTime<Utc>> {
        if at.timestamp() < 0 {
            return Err(RateLimitError::invalid_timestamp(format!(
                "{} is before the Unix epoch",
                at.to_rfc3339()
            )));
        }

        match latest {
            Some(latest) if at < latest => {
                if latest - at <= self.max_clock_skew {
                    Ok(latest)
                } else {
                    Err(RateLimitError::invalid_timestamp(format!(
                        "{} precedes the latest recorded failure {}",
                        at.to_rfc3339(),
                        latest.to_rfc3339()
                    )))
                }
            }
            _ => Ok(at),
        }
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::login()
    }
}

fn ensure_positive(field: &'static str, value: Duration) -> RateLimitResult<()> {
    if value <= Duration::zero() {
        return Err(RateLimitError::configuration(field, "must be positive"));
    }
    Ok(())
}

fn ensure_not_negative(field: &'static str, value: Duration) -> RateLimitResult<()> {
    if value < Duration::zero() {
        return Err(RateLimitError::configuration(field, "must not be negative"));
    }
    Ok(())
}

fn seconds(field: &'static str, secs: u64) -> RateLimitResult<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| RateLimitError::configuration(field, "is out of range"))
}

fn milliseconds(field: &'static str, ms: u64) -> RateLimitResult<Duration> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .ok_or_else(|| RateLimitError::configuration(field, "is out of range"))
}
