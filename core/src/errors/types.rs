//! Rate limiting error types
//!
//! The limiter performs no I/O, so the only failures are bad configuration
//! (reported once, at construction) and bad timestamps (reported per call,
//! without touching the key's record).

use thiserror::Error;

/// Errors raised by the window policy and the attempt tracker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { reason: String },

    #[error("Invalid rate limit configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },
}

impl RateLimitError {
    pub(crate) fn configuration(field: &'static str, reason: impl Into<String>) -> Self {
        RateLimitError::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_timestamp(reason: impl Into<String>) -> Self {
        RateLimitError::InvalidTimestamp {
            reason: reason.into(),
        }
    }
}

pub type RateLimitResult<T> = Result<T, RateLimitError>;
