//! Unit tests for window policy construction and arithmetic

use chrono::Duration;
use lg_shared::LoginRateLimitConfig;

use super::mocks::{policy, t};
use crate::errors::RateLimitError;
use crate::services::rate_limit::WindowPolicy;

#[test]
fn test_rejects_non_positive_parameters() {
    let cases = [
        (Duration::zero(), 5, Duration::minutes(30), "window_duration"),
        (Duration::minutes(15), 0, Duration::minutes(30), "max_attempts"),
        (Duration::minutes(15), 5, Duration::seconds(-1), "block_duration"),
    ];

    for (window, max_attempts, block, expected) in cases {
        let err = WindowPolicy::new(window, max_attempts, block, Duration::minutes(1)).unwrap_err();
        match err {
            RateLimitError::Configuration { field, .. } => assert_eq!(field, expected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    let err = WindowPolicy::new(
        Duration::minutes(15),
        5,
        Duration::minutes(30),
        Duration::zero(),
    )
    .unwrap_err();
    assert!(matches!(err, RateLimitError::Configuration { field: "cleanup_interval", .. }));
}

#[test]
fn test_presets() {
    let login = WindowPolicy::login();
    assert_eq!(login.max_attempts(), 5);
    assert_eq!(login.window_duration(), Duration::seconds(300));
    assert_eq!(login.block_duration(), Duration::seconds(3600));

    assert_eq!(WindowPolicy::default(), login);
}

#[test]
fn test_from_config() {
    let config = LoginRateLimitConfig {
        window_seconds: 900,
        max_attempts: 3,
        block_seconds: 1800,
        cleanup_interval_seconds: 30,
        idle_grace_seconds: 120,
        max_clock_skew_ms: 250,
        ..LoginRateLimitConfig::default()
    };

    let policy = WindowPolicy::from_config(&config).unwrap();
    assert_eq!(policy.window_duration(), Duration::minutes(15));
    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.block_duration(), Duration::minutes(30));
    assert_eq!(policy.cleanup_interval(), std::time::Duration::from_secs(30));
    assert_eq!(policy.idle_grace(), Duration::minutes(2));
    assert_eq!(policy.max_clock_skew(), Duration::milliseconds(250));
}

#[test]
fn test_from_config_rejects_zero_threshold() {
    let config = LoginRateLimitConfig {
        max_attempts: 0,
        ..LoginRateLimitConfig::default()
    };
    assert!(WindowPolicy::from_config(&config).is_err());
}

#[test]
fn test_window_is_inclusive() {
    let policy = policy();
    assert_eq!(policy.window_start(t(20)), t(5));
    assert!(policy.is_within_window(t(5), t(20)));
    assert!(!policy.is_within_window(t(4), t(20)));
}

#[test]
fn test_threshold_and_remaining() {
    let policy = policy();
    assert!(!policy.reaches_threshold(4));
    assert!(policy.reaches_threshold(5));
    assert_eq!(policy.remaining_attempts(3), 2);
    assert_eq!(policy.remaining_attempts(7), 0);
    assert_eq!(policy.block_until(t(4)), t(34));
}

#[test]
fn test_is_idle_honours_grace() {
    let policy = policy().with_idle_grace(Duration::minutes(5)).unwrap();
    assert!(!policy.is_idle(t(0), t(15)));
    assert!(!policy.is_idle(t(0), t(19)));
    assert!(policy.is_idle(t(0), t(20)));
}

#[test]
fn test_admit_timestamp_clamps_small_regression() {
    let policy = policy();
    let latest = t(10);
    let slightly_earlier = latest - Duration::milliseconds(400);

    assert_eq!(policy.admit_timestamp(slightly_earlier, Some(latest)).unwrap(), latest);
    assert_eq!(policy.admit_timestamp(t(11), Some(latest)).unwrap(), t(11));
    assert_eq!(policy.admit_timestamp(t(3), None).unwrap(), t(3));
}

#[test]
fn test_admit_timestamp_rejects_large_regression_and_pre_epoch() {
    let policy = policy();

    let err = policy.admit_timestamp(t(5), Some(t(10))).unwrap_err();
    assert!(matches!(err, RateLimitError::InvalidTimestamp { .. }));

    let pre_epoch = chrono::DateTime::from_timestamp(-60, 0).unwrap();
    assert!(policy.admit_timestamp(pre_epoch, None).is_err());
}

#[test]
fn test_negative_grace_or_skew_rejected() {
    assert!(policy().with_idle_grace(Duration::seconds(-1)).is_err());
    assert!(policy().with_max_clock_skew(Duration::seconds(-1)).is_err());
    assert!(policy().with_max_attempts(0).is_err());
}
