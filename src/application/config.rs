//! Rate limiter configuration and validation.
//!
//! The configuration is an explicit typed struct rather than hidden module
//! state. Values are validated once, up front, and invalid values are
//! rejected with a descriptive error - never silently clamped.

use crate::domain::queue::OverflowPolicy;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Refill rate and capacity for one token bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketParams {
    /// Tokens per second (0 means a static budget that never refills)
    pub rate: f64,
    /// Maximum token level (0 means the bucket always denies)
    pub capacity: f64,
}

impl BucketParams {
    /// Create bucket parameters.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self { rate, capacity }
    }
}

/// Configuration for the log emission rate limiter.
///
/// Defaults match the documented option table: rate limiting off, summary
/// warnings on, a 5 second summary interval, a 1000-record queue, and the
/// `drop_oldest` overflow policy.
///
/// # Example
/// ```
/// use log_throttle::{BucketParams, RateLimitConfig};
///
/// let mut config = RateLimitConfig::default();
/// config.enabled = true;
/// config.global_rate = Some(100.0);
/// config.global_capacity = Some(200.0);
/// config
///     .per_logger
///     .insert("app::db".to_string(), BucketParams::new(5.0, 10.0));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Master on/off switch; off means every record is admitted untouched
    pub enabled: bool,
    /// Global tokens per second; `None` together with a missing capacity
    /// means no global bucket at all
    pub global_rate: Option<f64>,
    /// Global bucket capacity; defaults to the rate when unset
    pub global_capacity: Option<f64>,
    /// Per-logger bucket overrides, keyed by logger name
    pub per_logger: BTreeMap<String, BucketParams>,
    /// Whether to emit periodic summary warnings
    pub emit_warnings: bool,
    /// Reporting cadence for drop/queue summaries; must be non-zero
    pub summary_interval: Duration,
    /// Overflow queue bound by record count; must be non-zero
    pub max_queue_size: usize,
    /// Optional overflow queue bound by estimated memory, in megabytes
    pub max_memory_mb: Option<f64>,
    /// Behavior when the overflow queue is full
    pub overflow_policy: OverflowPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            global_rate: None,
            global_capacity: None,
            per_logger: BTreeMap::new(),
            emit_warnings: true,
            summary_interval: Duration::from_secs(5),
            max_queue_size: 1000,
            max_memory_mb: None,
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

impl RateLimitConfig {
    /// Validate all fields, rejecting rather than clamping bad values.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found: negative or non-finite
    /// rates and capacities (global or per-logger), a zero summary
    /// interval, a zero queue size, or a non-positive memory bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.global_rate {
            if !is_valid_magnitude(rate) {
                return Err(ConfigError::InvalidGlobalRate(rate));
            }
        }
        if let Some(capacity) = self.global_capacity {
            if !is_valid_magnitude(capacity) {
                return Err(ConfigError::InvalidGlobalCapacity(capacity));
            }
        }

        for (logger, params) in &self.per_logger {
            if !is_valid_magnitude(params.rate) {
                return Err(ConfigError::InvalidLoggerRate {
                    logger: logger.clone(),
                    rate: params.rate,
                });
            }
            if !is_valid_magnitude(params.capacity) {
                return Err(ConfigError::InvalidLoggerCapacity {
                    logger: logger.clone(),
                    capacity: params.capacity,
                });
            }
        }

        if self.summary_interval.is_zero() {
            return Err(ConfigError::ZeroSummaryInterval);
        }
        if self.max_queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if let Some(mb) = self.max_memory_mb {
            if !mb.is_finite() || mb <= 0.0 {
                return Err(ConfigError::InvalidMemoryLimit(mb));
            }
        }

        Ok(())
    }

    /// Global bucket parameters, if a global bucket is configured at all.
    ///
    /// The bucket exists when either the rate or the capacity is set. A
    /// missing rate defaults to 0 (static budget); a missing capacity
    /// defaults to the rate (one second of burst).
    pub fn global_bucket(&self) -> Option<BucketParams> {
        match (self.global_rate, self.global_capacity) {
            (None, None) => None,
            (rate, capacity) => {
                let rate = rate.unwrap_or(0.0);
                Some(BucketParams::new(rate, capacity.unwrap_or(rate)))
            }
        }
    }

    /// Overflow queue memory bound in bytes, derived from the MB setting.
    pub fn max_memory_bytes(&self) -> Option<usize> {
        self.max_memory_mb
            .map(|mb| (mb * 1024.0 * 1024.0) as usize)
    }
}

fn is_valid_magnitude(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Error returned when configuration validation fails.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Global refill rate is negative or not finite
    InvalidGlobalRate(f64),
    /// Global bucket capacity is negative or not finite
    InvalidGlobalCapacity(f64),
    /// A per-logger refill rate is negative or not finite
    InvalidLoggerRate {
        /// Logger the bad rate was configured for
        logger: String,
        /// The rejected value
        rate: f64,
    },
    /// A per-logger capacity is negative or not finite
    InvalidLoggerCapacity {
        /// Logger the bad capacity was configured for
        logger: String,
        /// The rejected value
        capacity: f64,
    },
    /// Summary interval must be greater than zero
    ZeroSummaryInterval,
    /// Overflow queue size must be greater than zero
    ZeroQueueSize,
    /// Memory limit must be a positive number of megabytes
    InvalidMemoryLimit(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidGlobalRate(rate) => {
                write!(f, "global rate must be a non-negative number, got {}", rate)
            }
            ConfigError::InvalidGlobalCapacity(capacity) => write!(
                f,
                "global capacity must be a non-negative number, got {}",
                capacity
            ),
            ConfigError::InvalidLoggerRate { logger, rate } => write!(
                f,
                "rate for logger '{}' must be a non-negative number, got {}",
                logger, rate
            ),
            ConfigError::InvalidLoggerCapacity { logger, capacity } => write!(
                f,
                "capacity for logger '{}' must be a non-negative number, got {}",
                logger, capacity
            ),
            ConfigError::ZeroSummaryInterval => {
                write!(f, "summary interval must be greater than 0")
            }
            ConfigError::ZeroQueueSize => {
                write!(f, "max queue size must be greater than 0")
            }
            ConfigError::InvalidMemoryLimit(mb) => {
                write!(f, "memory limit must be a positive number of MB, got {}", mb)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
