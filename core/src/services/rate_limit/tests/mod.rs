//! Tests for login attempt rate limiting

mod cleanup_tests;
mod policy_tests;
