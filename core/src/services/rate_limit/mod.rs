//! Login attempt rate limiting
//!
//! This module provides the in-memory login attempt limiter:
//! - `WindowPolicy`: validated parameters and window arithmetic
//! - `AttemptTracker`: concurrent per-key failure histories and blocks
//! - `AttemptCleanupService`: periodic eviction of idle keys
//! - `LoginGuard`: the check / failure / success protocol over account and origin scopes

mod cleanup;
mod clock;
mod guard;
mod key;
mod policy;
mod record;
mod tracker;

#[cfg(test)]
mod tests;

pub use cleanup::{AttemptCleanupService, CleanupHandle, CleanupResult};
pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{GuardOutcome, GuardStatus, LoginGuard, Rejection};
pub use key::RateKey;
pub use policy::WindowPolicy;
pub use tracker::{AttemptLimiter, AttemptStatus, AttemptTracker, FailureOutcome};
