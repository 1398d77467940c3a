//! Tests for idle key eviction and the background cleanup task

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use super::mocks::{policy, t, tracker_with};
use crate::services::rate_limit::{AttemptCleanupService, RateKey};

#[test]
fn test_purge_idle_evicts_only_idle_keys() {
    let (tracker, _clock) = tracker_with(policy());
    let stale = RateKey::identity_only("stale");
    let recent = RateKey::identity_only("recent");

    tracker.record_failure(&stale, t(0)).unwrap();
    tracker.record_failure(&recent, t(10)).unwrap();

    assert_eq!(tracker.purge_idle(t(15)), 1);
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.status(&recent).failures_in_window, 1);

    // A second pass at the same instant has nothing left to do
    assert_eq!(tracker.purge_idle(t(15)), 0);
}

#[test]
fn test_blocked_key_survives_until_block_ends() {
    let (tracker, _clock) = tracker_with(policy());
    let key = RateKey::identity_only("alice");
    for minute in 0..5 {
        tracker.record_failure(&key, t(minute)).unwrap();
    }

    assert_eq!(tracker.purge_idle(t(25)), 0);
    assert_eq!(tracker.purge_idle(t(33)), 0);
    assert_eq!(tracker.purge_idle(t(34)), 1);
    assert!(tracker.is_empty());
}

#[test]
fn test_idle_grace_delays_eviction() {
    let policy = policy().with_idle_grace(Duration::minutes(10)).unwrap();
    let (tracker, _clock) = tracker_with(policy);
    tracker.record_failure(&RateKey::identity_only("alice"), t(0)).unwrap();

    assert_eq!(tracker.purge_idle(t(20)), 0);
    assert_eq!(tracker.purge_idle(t(25)), 1);
}

#[test]
fn test_run_cleanup_reports_counts() {
    let (tracker, clock) = tracker_with(policy());
    tracker.record_failure(&RateKey::identity_only("a"), t(0)).unwrap();
    tracker.record_failure(&RateKey::identity_only("b"), t(0)).unwrap();
    tracker.record_failure(&RateKey::identity_only("c"), t(14)).unwrap();

    let service = AttemptCleanupService::new(Arc::clone(&tracker));
    assert_eq!(service.interval(), StdDuration::from_secs(60));

    clock.set(t(16));
    let result = service.run_cleanup();
    assert_eq!(result.keys_evicted, 2);
    assert_eq!(result.keys_remaining, 1);
}

#[tokio::test(start_paused = true)]
async fn test_background_task_sweeps_on_interval() {
    let (tracker, clock) = tracker_with(policy());
    tracker.record_failure(&RateKey::identity_only("alice"), t(0)).unwrap();
    clock.set(t(20));

    let service = Arc::new(AttemptCleanupService::new(Arc::clone(&tracker)));
    let handle = service.start_background_task();

    tokio::time::sleep(StdDuration::from_secs(30)).await;
    assert_eq!(tracker.len(), 1);

    tokio::time::sleep(StdDuration::from_secs(31)).await;
    assert!(tracker.is_empty());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_task() {
    let (tracker, clock) = tracker_with(policy());
    let service = Arc::new(AttemptCleanupService::with_interval(
        Arc::clone(&tracker),
        StdDuration::from_secs(5),
    ));
    let handle = service.start_background_task();
    assert!(!handle.is_finished());

    handle.shutdown().await;

    tracker.record_failure(&RateKey::identity_only("alice"), t(0)).unwrap();
    clock.set(t(60));
    tokio::time::sleep(StdDuration::from_secs(30)).await;
    assert_eq!(tracker.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_floored() {
    let (tracker, clock) = tracker_with(policy());
    tracker.record_failure(&RateKey::identity_only("alice"), t(0)).unwrap();
    clock.set(t(20));

    let service = Arc::new(AttemptCleanupService::with_interval(
        Arc::clone(&tracker),
        StdDuration::ZERO,
    ));
    assert_eq!(service.interval(), StdDuration::from_millis(1));

    let handle = service.start_background_task();
    tokio::time::sleep(StdDuration::from_millis(10)).await;
    assert!(tracker.is_empty());
    assert!(!handle.is_finished());

    handle.shutdown().await;
}
