//! Aggregated drop/queue summaries.
//!
//! Instead of logging every rate-limit event, drop and queue counts are
//! accumulated per logger and reported as a single aggregated line per
//! reporting window.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Per-logger outcome counts accumulated since the last report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerCounts {
    /// Records admitted directly or via drain
    pub admitted: u64,
    /// Records deferred to the overflow queue
    pub queued: u64,
    /// Records dropped (overflow, eviction, or block timeout)
    pub dropped: u64,
}

impl LoggerCounts {
    /// Whether this logger saw any queue or drop activity.
    pub fn has_pressure(&self) -> bool {
        self.queued > 0 || self.dropped > 0
    }
}

/// One reporting window's worth of per-logger counts.
///
/// Produced at most once per summary interval, and only when at least one
/// record was queued or dropped during the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReport {
    /// Length of the reporting window
    pub window: Duration,
    /// Counts per logger name, sorted for stable output
    pub per_logger: BTreeMap<String, LoggerCounts>,
}

impl SummaryReport {
    /// Total records dropped across all loggers in this window.
    pub fn total_dropped(&self) -> u64 {
        self.per_logger.values().map(|c| c.dropped).sum()
    }

    /// Total records queued across all loggers in this window.
    pub fn total_queued(&self) -> u64 {
        self.per_logger.values().map(|c| c.queued).sum()
    }

    /// Format the report as a single aggregated message.
    ///
    /// Only loggers with queue/drop activity appear; purely-admitted loggers
    /// would just be noise in a warning line.
    pub fn format_message(&self) -> String {
        let mut message = format!(
            "log rate limit: {} dropped, {} queued over {:?}",
            self.total_dropped(),
            self.total_queued(),
            self.window
        );

        let mut first = true;
        for (logger, counts) in &self.per_logger {
            if !counts.has_pressure() {
                continue;
            }
            let sep = if first { " [" } else { "; " };
            first = false;
            let _ = write!(
                message,
                "{}{}: dropped={} queued={}",
                sep, logger, counts.dropped, counts.queued
            );
        }
        if !first {
            message.push(']');
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(entries: &[(&str, u64, u64, u64)]) -> SummaryReport {
        let per_logger = entries
            .iter()
            .map(|(name, admitted, queued, dropped)| {
                (
                    name.to_string(),
                    LoggerCounts {
                        admitted: *admitted,
                        queued: *queued,
                        dropped: *dropped,
                    },
                )
            })
            .collect();
        SummaryReport {
            window: Duration::from_secs(5),
            per_logger,
        }
    }

    #[test]
    fn test_totals() {
        let report = report(&[("app::db", 10, 2, 5), ("app::http", 3, 1, 0)]);
        assert_eq!(report.total_dropped(), 5);
        assert_eq!(report.total_queued(), 3);
    }

    #[test]
    fn test_format_message_lists_pressured_loggers() {
        let report = report(&[("app::db", 10, 2, 5), ("app::http", 3, 0, 0)]);
        let message = report.format_message();

        assert!(message.contains("5 dropped"));
        assert!(message.contains("2 queued"));
        assert!(message.contains("app::db: dropped=5 queued=2"));
        // Loggers without pressure stay out of the line
        assert!(!message.contains("app::http"));
    }

    #[test]
    fn test_format_message_stable_order() {
        let report = report(&[("zeta", 0, 1, 0), ("alpha", 0, 0, 1)]);
        let message = report.format_message();
        let alpha = message.find("alpha").unwrap();
        let zeta = message.find("zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn test_has_pressure() {
        assert!(!LoggerCounts::default().has_pressure());
        assert!(LoggerCounts {
            admitted: 0,
            queued: 1,
            dropped: 0
        }
        .has_pressure());
        assert!(LoggerCounts {
            admitted: 5,
            queued: 0,
            dropped: 2
        }
        .has_pressure());
    }
}
