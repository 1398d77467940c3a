// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, TimeZone, Utc};
use lg_api::AppState;
use lg_core::{LoginGuard, ManualClock};
use lg_shared::{LoginRateLimitConfig, ServerConfig};

pub const ADMIN_TOKEN: &str = "operator-secret";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// 3 failures in 15 minutes block for 30 minutes
pub fn rate_limit_config() -> LoginRateLimitConfig {
    LoginRateLimitConfig {
        window_seconds: 900,
        max_attempts: 3,
        block_seconds: 1800,
        track_origin: true,
        origin_max_attempts: 10,
        ..LoginRateLimitConfig::default()
    }
}

pub fn app_state(admin_token: Option<&str>) -> (web::Data<AppState>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let guard = LoginGuard::from_config(&rate_limit_config(), clock.clone()).unwrap();
    let server = ServerConfig {
        admin_token: admin_token.map(str::to_string),
        ..ServerConfig::default()
    };
    (web::Data::new(AppState::new(Arc::new(guard), &server)), clock)
}
