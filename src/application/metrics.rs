//! Observability metrics for admission control.
//!
//! Crate-wide totals of admission outcomes, for monitoring and debugging.
//! Per-logger accounting lives in the summary reporter; these are the
//! aggregate counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking admission outcomes.
///
/// All counters use atomic operations for thread-safe updates and reads,
/// and the struct clones cheaply by sharing the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Records admitted (directly or via queue drain)
    records_admitted: AtomicU64,
    /// Records deferred to the overflow queue
    records_queued: AtomicU64,
    /// Records dropped
    records_dropped: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                records_admitted: AtomicU64::new(0),
                records_queued: AtomicU64::new(0),
                records_dropped: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.records_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_queued(&self) {
        self.inner.records_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.inner.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total records admitted.
    pub fn records_admitted(&self) -> u64 {
        self.inner.records_admitted.load(Ordering::Relaxed)
    }

    /// Total records queued.
    pub fn records_queued(&self) -> u64 {
        self.inner.records_queued.load(Ordering::Relaxed)
    }

    /// Total records dropped.
    pub fn records_dropped(&self) -> u64 {
        self.inner.records_dropped.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_admitted: self.records_admitted(),
            records_queued: self.records_queued(),
            records_dropped: self.records_dropped(),
        }
    }

    /// Reset all counters to zero.
    ///
    /// Useful for testing or when starting a new monitoring period.
    pub fn reset(&self) {
        self.inner.records_admitted.store(0, Ordering::Relaxed);
        self.inner.records_queued.store(0, Ordering::Relaxed);
        self.inner.records_dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Records admitted (directly or via queue drain)
    pub records_admitted: u64,
    /// Records deferred to the overflow queue
    pub records_queued: u64,
    /// Records dropped
    pub records_dropped: u64,
}

impl MetricsSnapshot {
    /// Total records that went through admission.
    pub fn total_records(&self) -> u64 {
        self.records_admitted
            .saturating_add(self.records_queued)
            .saturating_add(self.records_dropped)
    }

    /// Ratio of dropped records to total records (0.0 to 1.0).
    ///
    /// Returns 0.0 if no records have been processed.
    pub fn drop_rate(&self) -> f64 {
        let total = self.total_records();
        if total == 0 {
            0.0
        } else {
            self.records_dropped as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.records_admitted(), 0);
        assert_eq!(metrics.records_queued(), 0);
        assert_eq!(metrics.records_dropped(), 0);
    }

    #[test]
    fn test_recording_outcomes() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_admitted();
        metrics.record_queued();
        metrics.record_dropped();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.records_admitted, 2);
        assert_eq!(snapshot.records_queued, 1);
        assert_eq!(snapshot.records_dropped, 1);
        assert_eq!(snapshot.total_records(), 4);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().drop_rate(), 0.0);

        metrics.record_admitted();
        metrics.record_dropped();
        assert!((metrics.snapshot().drop_rate() - 0.5).abs() < f64::EPSILON);

        metrics.record_dropped();
        metrics.record_dropped();
        assert!((metrics.snapshot().drop_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clone_shares_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_admitted();

        let metrics2 = metrics1.clone();
        metrics2.record_admitted();

        assert_eq!(metrics1.records_admitted(), 2);
        assert_eq!(metrics2.records_admitted(), 2);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_admitted();
        metrics.record_queued();
        metrics.record_dropped();

        metrics.reset();
        assert_eq!(metrics.snapshot().total_records(), 0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_admitted();
                    m.record_dropped();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.records_admitted(), 1000);
        assert_eq!(metrics.records_dropped(), 1000);
    }
}
