//! Attempt tracker: per-key failure histories and block decisions
//!
//! Records live in a sharded concurrent map. Every operation on a key runs
//! while holding that key's map entry, so operations on one key are
//! serialized while keys in other shards proceed independently.

use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::key::RateKey;
use super::policy::WindowPolicy;
use super::record::AttemptRecord;
use crate::errors::RateLimitResult;

/// Result of recording one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FailureOutcome {
    /// Below the threshold
    Tracking { failures: u32, remaining: u32 },
    /// This failure reached the threshold and started a block
    Blocked { until: DateTime<Utc> },
    /// The key was already blocked; the failure was recorded, the block not extended
    AlreadyBlocked { until: DateTime<Utc> },
}

impl FailureOutcome {
    pub fn is_blocked(&self) -> bool {
        !matches!(self, FailureOutcome::Tracking { .. })
    }

    /// Whether this call performed the transition into the blocked state
    pub fn triggered_block(&self) -> bool {
        matches!(self, FailureOutcome::Blocked { .. })
    }

    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        match self {
            FailureOutcome::Tracking { .. } => None,
            FailureOutcome::Blocked { until } | FailureOutcome::AlreadyBlocked { until } => {
                Some(*until)
            }
        }
    }
}

/// Snapshot of a key's rate limiting state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptStatus {
    pub blocked: bool,
    pub blocked_until: Option<DateTime<Utc>>,
    /// Whole seconds until the block ends, rounded up
    pub retry_after_seconds: Option<u64>,
    pub failures_in_window: u32,
    pub remaining_attempts: u32,
}

/// Operations the authentication handler relies on
pub trait AttemptLimiter: Send + Sync {
    /// Whether attempts for `key` must be rejected right now
    fn is_blocked(&self, key: &RateKey) -> bool;

    /// Record a failed attempt that happened at `at`
    fn record_failure(&self, key: &RateKey, at: DateTime<Utc>) -> RateLimitResult<FailureOutcome>;

    /// Record a failed attempt at the limiter's current time
    fn record_failure_now(&self, key: &RateKey) -> FailureOutcome;

    /// Clear all state for `key` after a successful authentication
    fn record_success(&self, key: &RateKey);

    /// Operator override: clear all state for `key`; returns whether any existed
    fn reset(&self, key: &RateKey) -> bool;

    fn status(&self, key: &RateKey) -> AttemptStatus;
}

/// In-memory, concurrency-safe login attempt tracker
pub struct AttemptTracker {
    records: DashMap<RateKey, AttemptRecord>,
    policy: WindowPolicy,
    clock: Arc<dyn Clock>,
}

impl AttemptTracker {
    /// Create a tracker driven by the system clock
    pub fn new(policy: WindowPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: WindowPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Number of keys currently holding state
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `key` is blocked at the clock's current time.
    ///
    /// Compacts the key's history as a side effect; the answer is the same
    /// either way.
    pub fn is_blocked(&self, key: &RateKey) -> bool {
        let now = self.clock.now();
        match self.records.get_mut(key) {
            Some(mut record) => {
                record.compact(&self.policy, now);
                record.active_block(now).is_some()
            }
            None => false,
        }
    }

    /// Record a failure at `at`.
    ///
    /// Rejected timestamps leave the key's record exactly as it was.
    pub fn record_failure(&self, key: &RateKey, at: DateTime<Utc>) -> RateLimitResult<FailureOutcome> {
        self.record_failure_with(key, |latest| self.policy.admit_timestamp(at, latest))
    }

    /// Record a failure at the current time, read while holding the key's entry.
    ///
    /// A clock that stepped backwards is clamped to the key's latest failure,
    /// so clock-sourced failures are never rejected.
    pub fn record_failure_now(&self, key: &RateKey) -> FailureOutcome {
        let outcome = self.record_failure_with(key, |latest| {
            let now = self.clock.now();
            Ok::<_, Infallible>(latest.map_or(now, |latest| now.max(latest)))
        });
        match outcome {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    fn record_failure_with<E, F>(&self, key: &RateKey, admit: F) -> Result<FailureOutcome, E>
    where
        F: FnOnce(Option<DateTime<Utc>>) -> Result<DateTime<Utc>, E>,
    {
        match self.records.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                let at = admit(Some(record.last_failure_at()))?;
                Ok(self.apply_failure(key, record, at))
            }
            Entry::Vacant(entry) => {
                let at = admit(None)?;
                let mut record = AttemptRecord::new(at);
                let outcome = self.apply_failure(key, &mut record, at);
                entry.insert(record);
                Ok(outcome)
            }
        }
    }

    fn apply_failure(&self, key: &RateKey, record: &mut AttemptRecord, at: DateTime<Utc>) -> FailureOutcome {
        record.compact(&self.policy, at);

        if let Some(until) = record.active_block(at) {
            record.push_failure(&self.policy, at);
            debug!(key = %key, blocked_until = %until, "Failure recorded for blocked key");
            return FailureOutcome::AlreadyBlocked { until };
        }

        record.push_failure(&self.policy, at);
        let failures = record.failure_count();

        if self.policy.reaches_threshold(failures) {
            let until = self.policy.block_until(at);
            record.block(until);
            warn!(
                key = %key,
                failures = failures,
                max_attempts = self.policy.max_attempts(),
                blocked_until = %until,
                "Key blocked after too many failed login attempts"
            );
            FailureOutcome::Blocked { until }
        } else {
            debug!(key = %key, failures = failures, "Failed login attempt recorded");
            FailureOutcome::Tracking {
                failures: u32::try_from(failures).unwrap_or(u32::MAX),
                remaining: self.policy.remaining_attempts(failures),
            }
        }
    }

    /// Clear the key's history and block state after a successful login
    pub fn record_success(&self, key: &RateKey) {
        if self.records.remove(key).is_some() {
            debug!(key = %key, "Attempt history cleared after successful login");
        }
    }

    /// Operator override; returns whether the key held any state
    pub fn reset(&self, key: &RateKey) -> bool {
        let existed = self.records.remove(key).is_some();
        info!(key = %key, existed = existed, "Rate limit state reset by operator");
        existed
    }

    pub fn status(&self, key: &RateKey) -> AttemptStatus {
        let now = self.clock.now();
        let (failures, blocked_until) = match self.records.get_mut(key) {
            Some(mut record) => {
                record.compact(&self.policy, now);
                (record.failure_count(), record.active_block(now))
            }
            None => (0, None),
        };

        // A block outlives the window that triggered it
        let remaining_attempts = match blocked_until {
            Some(_) => 0,
            None => self.policy.remaining_attempts(failures),
        };

        AttemptStatus {
            blocked: blocked_until.is_some(),
            blocked_until,
            retry_after_seconds: blocked_until.map(|until| retry_after_seconds(until, now)),
            failures_in_window: u32::try_from(failures).unwrap_or(u32::MAX),
            remaining_attempts,
        }
    }

    /// Evict keys that are idle at `now`; returns how many were removed.
    ///
    /// Keys are visited one at a time and idleness is re-checked under the
    /// key's entry, so a key touched after the snapshot survives. Safe to
    /// interrupt and re-run.
    pub fn purge_idle(&self, now: DateTime<Utc>) -> usize {
        let keys: Vec<RateKey> = self.records.iter().map(|entry| entry.key().clone()).collect();

        keys.iter()
            .filter(|key| {
                self.records
                    .remove_if(*key, |_, record| record.is_idle(&self.policy, now))
                    .is_some()
            })
            .count()
    }

    pub fn purge_idle_now(&self) -> usize {
        self.purge_idle(self.clock.now())
    }
}

impl AttemptLimiter for AttemptTracker {
    fn is_blocked(&self, key: &RateKey) -> bool {
        AttemptTracker::is_blocked(self, key)
    }

    fn record_failure(&self, key: &RateKey, at: DateTime<Utc>) -> RateLimitResult<FailureOutcome> {
        AttemptTracker::record_failure(self, key, at)
    }

    fn record_failure_now(&self, key: &RateKey) -> FailureOutcome {
        AttemptTracker::record_failure_now(self, key)
    }

    fn record_success(&self, key: &RateKey) {
        AttemptTracker::record_success(self, key)
    }

    fn reset(&self, key: &RateKey) -> bool {
        AttemptTracker::reset(self, key)
    }

    fn status(&self, key: &RateKey) -> AttemptStatus {
        AttemptTracker::status(self, key)
    }
}

fn retry_after_seconds(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds().max(0);
    let seconds = (millis + 999) / 1000;
    u64::try_from(seconds.max(1)).unwrap_or(1)
}
