//! Shared configuration and response types for the login guard workspace
//!
//! This crate provides functionality used by both the core limiter and the
//! host process:
//! - Configuration types (environment, logging, server, login rate limits)
//! - The standard error response body

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, Environment, LogFormat, LoggingConfig, LoginRateLimitConfig, ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
