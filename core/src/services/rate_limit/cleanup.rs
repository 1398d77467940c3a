//! Periodic eviction of idle attempt records
//!
//! Lazy compaction on access keeps active keys small, but a key that is never
//! touched again would stay in memory forever. This service sweeps those out
//! on a fixed interval until its handle is shut down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::tracker::AttemptTracker;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Sweeps idle keys out of one tracker
pub struct AttemptCleanupService {
    tracker: Arc<AttemptTracker>,
    interval: Duration,
}

impl AttemptCleanupService {
    /// Sweep at the tracker policy's cleanup interval
    pub fn new(tracker: Arc<AttemptTracker>) -> Self {
        let interval = tracker.policy().cleanup_interval();
        Self::with_interval(tracker, interval)
    }

    /// Sweep at a custom interval, no shorter than one millisecond
    pub fn with_interval(tracker: Arc<AttemptTracker>, interval: Duration) -> Self {
        Self {
            tracker,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single cleanup cycle at the tracker's current time
    pub fn run_cleanup(&self) -> CleanupResult {
        let keys_evicted = self.tracker.purge_idle_now();
        let result = CleanupResult {
            keys_evicted,
            keys_remaining: self.tracker.len(),
        };

        if result.keys_evicted > 0 {
            info!(
                evicted = result.keys_evicted,
                remaining = result.keys_remaining,
                "Evicted idle rate limit records"
            );
        } else {
            debug!(remaining = result.keys_remaining, "No idle rate limit records to evict");
        }

        result
    }

    /// Spawn the sweep loop on the current tokio runtime.
    ///
    /// The first sweep runs one interval after start. The loop ends when the
    /// returned handle is shut down or dropped.
    pub fn start_background_task(self: Arc<Self>) -> CleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                "Rate limit cleanup task started"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cleanup();
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Rate limit cleanup task stopped");
        });

        CleanupHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Result of a cleanup cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupResult {
    pub keys_evicted: usize,
    /// Keys still tracked after the sweep
    pub keys_remaining: usize,
}

/// Controls a running cleanup task
#[derive(Debug)]
pub struct CleanupHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signal the task to stop and wait for it to finish its current sweep
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
