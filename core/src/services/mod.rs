//! Services containing the rate limiting domain logic.

pub mod rate_limit;

// Re-export commonly used types
pub use rate_limit::{
    AttemptCleanupService, AttemptLimiter, AttemptStatus, AttemptTracker, CleanupHandle,
    CleanupResult, Clock, FailureOutcome, GuardOutcome, GuardStatus, LoginGuard, ManualClock,
    RateKey, Rejection, SystemClock, WindowPolicy,
};
