//! # Login Guard API
//!
//! Host process for the login attempt limiter: configuration loading, logging
//! setup, the health probe and the operator endpoints, plus the error type
//! login handlers use to answer rate limited requests.

pub mod app;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod telemetry;

pub use app::{create_app, AppState};
pub use error::{ApiError, ApiResult};
