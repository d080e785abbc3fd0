//! Background tick driving for async runtimes.
//!
//! The limiter is designed around opportunistic ticks on the emission path,
//! but quiet applications may go long stretches without logging. With the
//! `async` feature a tokio task can drive `tick` at the summary interval so
//! queued records and summaries are not stuck waiting for the next log call.

#[cfg(feature = "async")]
use crate::application::limiter::{RateLimiter, TickOutcome};
#[cfg(feature = "async")]
use crate::application::ports::Storage;
#[cfg(feature = "async")]
use crate::domain::bucket::TokenBucket;

use std::fmt;

/// Error returned when the background ticker fails to shut down cleanly.
#[derive(Debug)]
pub struct ShutdownError;

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ticker task did not shut down cleanly")
    }
}

impl std::error::Error for ShutdownError {}

/// Handle to a spawned background ticker.
///
/// Dropping the handle without calling [`TickerHandle::shutdown`] leaves the
/// task running until the runtime shuts down.
#[cfg(feature = "async")]
pub struct TickerHandle {
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

#[cfg(feature = "async")]
impl TickerHandle {
    /// Spawn a task that ticks the limiter at its summary interval.
    ///
    /// Each non-empty [`TickOutcome`] is handed to `emit_fn`, which is
    /// responsible for re-emitting drained records and the summary line.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S, F>(limiter: std::sync::Arc<RateLimiter<S>>, mut emit_fn: F) -> Self
    where
        S: Storage<String, TokenBucket> + Clone + Send + Sync + 'static,
        F: FnMut(TickOutcome) + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        let period = limiter.reporter().interval();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = limiter.tick(limiter.clock().now());
                        if !outcome.drained.is_empty() || outcome.summary.is_some() {
                            emit_fn(outcome);
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self { shutdown_tx, join }
    }

    /// Stop the ticker and wait for the task to finish.
    ///
    /// # Errors
    /// Returns [`ShutdownError`] if the task had already died or panicked.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        if self.shutdown_tx.send(()).is_err() {
            return Err(ShutdownError);
        }
        self.join.await.map_err(|_| ShutdownError)
    }
}

#[cfg(all(test, feature = "async"))]
mod tests {
    use super::*;
    use crate::application::config::RateLimitConfig;
    use crate::domain::record::QueuedRecord;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::storage::ShardedStorage;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_ticker_emits_summaries() {
        let config = RateLimitConfig {
            enabled: true,
            global_rate: Some(0.0),
            global_capacity: Some(1.0),
            summary_interval: Duration::from_millis(50),
            ..Default::default()
        };
        let limiter = Arc::new(
            RateLimiter::new(
                &config,
                Arc::new(ShardedStorage::new()),
                Arc::new(SystemClock::new()) as Arc<dyn crate::application::ports::Clock>,
            )
            .unwrap(),
        );

        let now = limiter.clock().now();
        limiter.admit("app", QueuedRecord::new("app", "INFO", "a"), now);
        limiter.admit("app", QueuedRecord::new("app", "INFO", "b"), now);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handle = TickerHandle::spawn(Arc::clone(&limiter), move |outcome| {
            seen_clone.lock().unwrap().push(outcome);
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.shutdown().await.unwrap();

        let outcomes = seen.lock().unwrap();
        assert!(
            outcomes.iter().any(|o| o.summary.is_some()),
            "queued record should surface in a summary"
        );
    }

    #[tokio::test]
    async fn test_shutdown_is_clean() {
        let config = RateLimitConfig {
            enabled: true,
            summary_interval: Duration::from_millis(20),
            ..Default::default()
        };
        let limiter = Arc::new(
            RateLimiter::new(
                &config,
                Arc::new(ShardedStorage::new()),
                Arc::new(SystemClock::new()) as Arc<dyn crate::application::ports::Clock>,
            )
            .unwrap(),
        );

        let handle = TickerHandle::spawn(limiter, |_| {});
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.shutdown().await.is_ok());
    }
}
