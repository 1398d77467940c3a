//! # Login Guard Core
//!
//! Core logic for the login attempt rate limiter: the window policy, the
//! per-key attempt tracker, the idle-key cleanup task and the login guard
//! that applies the authentication handler's call protocol.

pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use errors::*;
pub use services::*;
