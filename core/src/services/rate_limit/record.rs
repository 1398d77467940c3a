//! Per-key attempt state owned by the tracker

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::policy::WindowPolicy;

/// Failure history and block state for one key
#[derive(Debug, Clone)]
pub(crate) struct AttemptRecord {
    /// Recent failure timestamps, oldest first, at most `max_attempts` long
    failures: VecDeque<DateTime<Utc>>,
    /// Set while the key is (or was, until the next compaction) blocked
    blocked_until: Option<DateTime<Utc>>,
    /// Latest admitted failure, kept after the history is purged
    last_failure_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub(crate) fn new(first_failure_at: DateTime<Utc>) -> Self {
        Self {
            failures: VecDeque::new(),
            blocked_until: None,
            last_failure_at: first_failure_at,
        }
    }

    pub(crate) fn last_failure_at(&self) -> DateTime<Utc> {
        self.last_failure_at
    }

    pub(crate) fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Drop failures that fell out of the window and a block that has elapsed
    pub(crate) fn compact(&mut self, policy: &WindowPolicy, now: DateTime<Utc>) {
        while let Some(oldest) = self.failures.front() {
            if policy.is_within_window(*oldest, now) {
                break;
            }
            self.failures.pop_front();
        }

        if matches!(self.blocked_until, Some(until) if now >= until) {
            self.blocked_until = None;
        }
    }

    /// End of the block in force at `now`, if any
    pub(crate) fn active_block(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.blocked_until.filter(|until| now < *until)
    }

    /// Append a failure; callers pass timestamps already admitted by the policy
    pub(crate) fn push_failure(&mut self, policy: &WindowPolicy, at: DateTime<Utc>) {
        self.failures.push_back(at);
        self.last_failure_at = at;
        while self.failures.len() > policy.max_attempts() as usize {
            self.failures.pop_front();
        }
    }

    pub(crate) fn block(&mut self, until: DateTime<Utc>) {
        self.blocked_until = Some(until);
    }

    /// No block in force and nothing recorded recently enough to matter
    pub(crate) fn is_idle(&self, policy: &WindowPolicy, now: DateTime<Utc>) -> bool {
        self.active_block(now).is_none() && policy.is_idle(self.last_failure_at, now)
    }
}
