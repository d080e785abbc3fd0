//! Queued log record representation.

use std::mem;

/// An owned snapshot of a log record, detailed enough to re-emit later.
///
/// Records land here when admission defers them to the overflow queue. The
/// original borrowed event data cannot outlive the emission call, so the
/// queue stores this owned form instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRecord {
    /// Logger name the record was emitted under (the tracing target)
    pub logger: String,
    /// Severity as an uppercase string ("INFO", "WARN", ...)
    pub level: String,
    /// Message text
    pub message: String,
}

impl QueuedRecord {
    /// Create a record snapshot.
    pub fn new(
        logger: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            logger: logger.into(),
            level: level.into(),
            message: message.into(),
        }
    }

    /// Rough memory footprint of this record in bytes.
    ///
    /// Struct size plus the heap capacity of the owned strings. Good enough
    /// for queue byte accounting; never used for anything load-bearing.
    pub fn estimated_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + self.logger.capacity()
            + self.level.capacity()
            + self.message.capacity()
    }
}
