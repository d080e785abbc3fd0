//! Periodic summary reporting of drop/queue activity.
//!
//! Every non-bypassed admission decision is counted per logger. The
//! reporting check is opportunistic: each `tick` compares elapsed time
//! against the summary interval, so no timer thread is needed.

use crate::domain::summary::{LoggerCounts, SummaryReport};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Accumulates per-logger outcome counts and produces at most one
/// [`SummaryReport`] per interval.
///
/// Counters are maintained even when warning emission is disabled, so they
/// stay available for introspection; only the report itself is withheld.
/// Introspection via [`SummaryReporter::counts_for`] is per-window: counts
/// reset at every interval boundary whether or not a report was emitted.
/// Process-lifetime totals live in the limiter's `Metrics`, which are never
/// reset by the reporting cycle.
#[derive(Debug)]
pub struct SummaryReporter {
    interval: Duration,
    emit_warnings: bool,
    state: Mutex<ReporterState>,
}

#[derive(Debug)]
struct ReporterState {
    last_report: Instant,
    counts: BTreeMap<String, LoggerCounts>,
}

impl SummaryReporter {
    /// Create a reporter whose first window starts at `start`.
    pub fn starting_at(interval: Duration, emit_warnings: bool, start: Instant) -> Self {
        Self {
            interval,
            emit_warnings,
            state: Mutex::new(ReporterState {
                last_report: start,
                counts: BTreeMap::new(),
            }),
        }
    }

    /// Count an admitted record for `logger`.
    pub fn record_admitted(&self, logger: &str) {
        self.with_counts(logger, |c| c.admitted += 1);
    }

    /// Count a queued record for `logger`.
    pub fn record_queued(&self, logger: &str) {
        self.with_counts(logger, |c| c.queued += 1);
    }

    /// Count a dropped record for `logger`.
    pub fn record_dropped(&self, logger: &str) {
        self.with_counts(logger, |c| c.dropped += 1);
    }

    /// Close the current window if the interval has elapsed.
    ///
    /// Returns a report when the window is over, warnings are enabled, and
    /// at least one record was queued or dropped during the window. The
    /// window and its counters are reset either way, so two calls within
    /// one interval can never produce two reports.
    pub fn maybe_report(&self, now: Instant) -> Option<SummaryReport> {
        let mut state = self.lock_state();

        let window = now.saturating_duration_since(state.last_report);
        if window < self.interval {
            return None;
        }

        let per_logger = std::mem::take(&mut state.counts);
        state.last_report = now;
        drop(state);

        let had_pressure = per_logger.values().any(|c| c.has_pressure());
        if self.emit_warnings && had_pressure {
            Some(SummaryReport { window, per_logger })
        } else {
            None
        }
    }

    /// Snapshot of the current window's counts for one logger.
    pub fn counts_for(&self, logger: &str) -> LoggerCounts {
        self.lock_state()
            .counts
            .get(logger)
            .copied()
            .unwrap_or_default()
    }

    /// The configured reporting interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn with_counts(&self, logger: &str, f: impl FnOnce(&mut LoggerCounts)) {
        let mut state = self.lock_state();
        f(state.counts.entry(logger.to_string()).or_default());
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ReporterState> {
        // A poisoned lock would mean a panic mid-count; the counts are
        // advisory, so recover rather than propagate
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
