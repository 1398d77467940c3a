//! Login guard: the call protocol an authentication handler follows
//!
//! 1. `check` before verifying credentials; a rejection must be answered as
//!    rate limited without verifying or recording anything.
//! 2. `on_failure` when verification fails.
//! 3. `on_success` when verification succeeds.
//!
//! Two scopes are tracked. The account scope keys on `(origin, identity)`
//! and stops one source guessing one account. The optional origin scope keys
//! on the (possibly subnet-aggregated) source address alone and stops one
//! source spraying many accounts; a successful login does not clear it.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lg_shared::LoginRateLimitConfig;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::clock::Clock;
use super::key::RateKey;
use super::policy::WindowPolicy;
use super::tracker::{AttemptLimiter, AttemptStatus, AttemptTracker, FailureOutcome};
use crate::errors::RateLimitResult;

/// A login attempt refused without verifying credentials
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Too many failed login attempts for {key}, retry after {retry_after_seconds}s")]
pub struct Rejection {
    pub key: RateKey,
    pub blocked_until: DateTime<Utc>,
    pub retry_after_seconds: u64,
}

/// What recording a failure did to each tracked scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardOutcome {
    pub account: FailureOutcome,
    pub origin: Option<FailureOutcome>,
}

impl GuardOutcome {
    /// Latest block end across both scopes
    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        let account = self.account.blocked_until();
        let origin = self.origin.and_then(|o| o.blocked_until());
        account.max(origin)
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_until().is_some()
    }
}

/// Status of both scopes for one `(origin, identity)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardStatus {
    /// Absent when no identity was given
    pub account_key: Option<String>,
    pub account: Option<AttemptStatus>,
    pub origin_key: Option<String>,
    pub origin: Option<AttemptStatus>,
}

pub struct LoginGuard<L: AttemptLimiter = AttemptTracker> {
    enabled: bool,
    accounts: Arc<L>,
    origins: Option<Arc<L>>,
    ipv4_prefix: u8,
    ipv6_prefix: u8,
}

impl<L: AttemptLimiter> LoginGuard<L> {
    /// Guard tracking only the account scope
    pub fn new(accounts: Arc<L>) -> Self {
        Self {
            enabled: true,
            accounts,
            origins: None,
            ipv4_prefix: 32,
            ipv6_prefix: 128,
        }
    }

    /// Also track origin-only keys, aggregated to the given prefixes
    pub fn with_origin_tracking(
        mut self,
        origins: Arc<L>,
        ipv4_prefix: u8,
        ipv6_prefix: u8,
    ) -> RateLimitResult<Self> {
        // Reject bad prefixes now rather than on the first request
        RateKey::origin_network(IpAddr::from([0u8; 4]), ipv4_prefix, ipv6_prefix)?;
        RateKey::origin_network(IpAddr::from([0u16; 8]), ipv4_prefix, ipv6_prefix)?;

        self.origins = Some(origins);
        self.ipv4_prefix = ipv4_prefix;
        self.ipv6_prefix = ipv6_prefix;
        Ok(self)
    }

    /// A disabled guard admits everything and records nothing
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn accounts(&self) -> &Arc<L> {
        &self.accounts
    }

    pub fn origins(&self) -> Option<&Arc<L>> {
        self.origins.as_ref()
    }

    pub fn account_key(&self, origin: Option<IpAddr>, identity: &str) -> RateKey {
        RateKey::new(origin, identity)
    }

    /// Origin-scope key, if origin tracking is on and the origin is known
    pub fn origin_key(&self, origin: Option<IpAddr>) -> Option<RateKey> {
        self.origins.as_ref()?;
        origin.and_then(|ip| RateKey::origin_network(ip, self.ipv4_prefix, self.ipv6_prefix).ok())
    }

    /// Decide whether a login attempt may proceed to credential verification
    pub fn check(&self, origin: Option<IpAddr>, identity: &str) -> Result<(), Rejection> {
        if !self.enabled {
            return Ok(());
        }

        let account_key = self.account_key(origin, identity);
        reject_if_blocked(self.accounts.as_ref(), account_key)?;

        if let (Some(origins), Some(origin_key)) = (&self.origins, self.origin_key(origin)) {
            reject_if_blocked(origins.as_ref(), origin_key)?;
        }

        Ok(())
    }

    /// Record a failed credential check in every tracked scope
    pub fn on_failure(&self, origin: Option<IpAddr>, identity: &str) -> GuardOutcome {
        if !self.enabled {
            return GuardOutcome {
                account: FailureOutcome::Tracking {
                    failures: 0,
                    remaining: u32::MAX,
                },
                origin: None,
            };
        }

        let account = self.accounts.record_failure_now(&self.account_key(origin, identity));
        let origin = match (&self.origins, self.origin_key(origin)) {
            (Some(origins), Some(key)) => Some(origins.record_failure_now(&key)),
            _ => None,
        };

        GuardOutcome { account, origin }
    }

    /// Clear the account scope after a successful credential check
    pub fn on_success(&self, origin: Option<IpAddr>, identity: &str) {
        if self.enabled {
            self.accounts.record_success(&self.account_key(origin, identity));
        }
    }

    /// Operator override for one pair; returns whether any state existed.
    ///
    /// Without an identity only the origin scope is cleared.
    pub fn reset(&self, origin: Option<IpAddr>, identity: Option<&str>) -> bool {
        let account = identity
            .map(|identity| self.accounts.reset(&self.account_key(origin, identity)))
            .unwrap_or(false);
        let origin = match (&self.origins, self.origin_key(origin)) {
            (Some(origins), Some(key)) => origins.reset(&key),
            _ => false,
        };

        info!(account_cleared = account, origin_cleared = origin, "Login guard reset");
        account || origin
    }

    /// Status of each scope the arguments select: the account scope needs an
    /// identity, the origin scope needs origin tracking and an origin
    pub fn status(&self, origin: Option<IpAddr>, identity: Option<&str>) -> GuardStatus {
        let account_key = identity.map(|identity| self.account_key(origin, identity));
        let account = account_key.as_ref().map(|key| self.accounts.status(key));

        let origin_key = self.origin_key(origin);
        let origin_status = match (&self.origins, &origin_key) {
            (Some(origins), Some(key)) => Some(origins.status(key)),
            _ => None,
        };

        GuardStatus {
            account_key: account_key.map(|key| key.to_string()),
            account,
            origin_key: origin_key.map(|key| key.to_string()),
            origin: origin_status,
        }
    }
}

impl LoginGuard<AttemptTracker> {
    /// Build the guard and its trackers from process configuration
    pub fn from_config(config: &LoginRateLimitConfig, clock: Arc<dyn Clock>) -> RateLimitResult<Self> {
        let policy = WindowPolicy::from_config(config)?;
        let accounts = Arc::new(AttemptTracker::with_clock(policy, clock.clone()));
        let mut guard = Self::new(accounts);

        if config.track_origin {
            let origin_policy = policy.with_max_attempts(config.origin_max_attempts)?;
            let origins = Arc::new(AttemptTracker::with_clock(origin_policy, clock));
            guard = guard.with_origin_tracking(origins, config.ipv4_prefix, config.ipv6_prefix)?;
        }

        if !config.enabled {
            guard = guard.disabled();
        }

        debug!(
            enabled = guard.enabled,
            track_origin = guard.origins.is_some(),
            max_attempts = policy.max_attempts(),
            "Login guard configured"
        );
        Ok(guard)
    }

    /// Every tracker the guard owns, for wiring cleanup tasks
    pub fn trackers(&self) -> Vec<Arc<AttemptTracker>> {
        let mut trackers = vec![self.accounts.clone()];
        trackers.extend(self.origins.clone());
        trackers
    }
}

fn reject_if_blocked<L: AttemptLimiter + ?Sized>(limiter: &L, key: RateKey) -> Result<(), Rejection> {
    let status = limiter.status(&key);
    match (status.blocked_until, status.retry_after_seconds) {
        (Some(blocked_until), Some(retry_after_seconds)) if status.blocked => {
            debug!(key = %key, retry_after = retry_after_seconds, "Login attempt rejected");
            Err(Rejection {
                key,
                blocked_until,
                retry_after_seconds,
            })
        }
        _ => Ok(()),
    }
}
