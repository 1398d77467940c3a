pub mod admin;
pub mod health;

pub use admin::{get_rate_limit_status, reset_rate_limit};
pub use health::health_check;
