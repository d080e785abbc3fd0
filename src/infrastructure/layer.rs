//! Tracing integration layer.
//!
//! Provides a `tracing_subscriber` filter that applies admission control to
//! log events. Events are admitted, queued, or dropped per the configured
//! token buckets; queued events are re-emitted once tokens free up, and
//! drop/queue activity is reported as periodic aggregated warnings.
//!
//! The filter is also where the "opportunistic tick" lives: every emission
//! call checks whether queued records can drain and whether a summary
//! window has closed, so no timer thread is required.

use crate::application::{
    config::{BucketParams, ConfigError, RateLimitConfig},
    limiter::{Decision, RateLimiter, TickOutcome},
    metrics::Metrics,
    ports::{Clock, Storage},
};
use crate::domain::bucket::TokenBucket;
use crate::domain::queue::OverflowPolicy;
use crate::domain::record::QueuedRecord;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;
use crate::infrastructure::visitor::MessageVisitor;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};

/// Target prefix for the crate's own output (replays and summaries).
///
/// Events under this prefix bypass admission entirely, so re-emission can
/// never recurse into the filter.
const SELF_TARGET: &str = "log_throttle";

/// Target used when re-emitting drained records.
pub const REPLAY_TARGET: &str = "log_throttle::replay";

/// Target used for aggregated drop/queue summaries.
pub const SUMMARY_TARGET: &str = "log_throttle::summary";

/// Error returned when building a [`LogThrottleLayer`] fails.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// Configuration validation failed
    Config(ConfigError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

/// Builder for constructing a [`LogThrottleLayer`].
pub struct LogThrottleLayerBuilder {
    config: RateLimitConfig,
    clock: Option<Arc<dyn Clock>>,
    block_timeout: Duration,
    block_retry_interval: Duration,
}

impl LogThrottleLayerBuilder {
    /// Replace the entire configuration at once.
    pub fn with_config(mut self, config: RateLimitConfig) -> Self {
        self.config = config;
        self
    }

    /// Master switch. Defaults to off, in which case the layer is a pure
    /// pass-through with no per-event overhead.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Global refill rate in records per second.
    pub fn with_global_rate(mut self, rate: f64) -> Self {
        self.config.global_rate = Some(rate);
        self
    }

    /// Global bucket capacity (burst size). Defaults to the rate when only
    /// the rate is set.
    pub fn with_global_capacity(mut self, capacity: f64) -> Self {
        self.config.global_capacity = Some(capacity);
        self
    }

    /// Add a per-logger bucket override.
    ///
    /// Logger names are matched exactly against the event target. Names
    /// without an override answer only to the global bucket.
    pub fn with_logger_limit(mut self, logger: impl Into<String>, rate: f64, capacity: f64) -> Self {
        self.config
            .per_logger
            .insert(logger.into(), BucketParams::new(rate, capacity));
        self
    }

    /// Enable or disable the periodic summary warnings. Counters are
    /// maintained either way.
    pub fn with_emit_warnings(mut self, emit: bool) -> Self {
        self.config.emit_warnings = emit;
        self
    }

    /// Set the summary reporting cadence.
    ///
    /// The interval will be validated when `build()` is called.
    pub fn with_summary_interval(mut self, interval: Duration) -> Self {
        self.config.summary_interval = interval;
        self
    }

    /// Bound the overflow queue by record count.
    pub fn with_max_queue_size(mut self, max: usize) -> Self {
        self.config.max_queue_size = max;
        self
    }

    /// Bound the overflow queue by estimated memory, in megabytes.
    pub fn with_max_memory_mb(mut self, mb: f64) -> Self {
        self.config.max_memory_mb = Some(mb);
        self
    }

    /// Set the behavior when the overflow queue is full.
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Bound how long the `block` overflow policy may stall one log call.
    ///
    /// The configuration surface itself exposes no timeout, so the default
    /// of 500ms exists purely to guarantee forward progress.
    pub fn with_block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = timeout;
        self
    }

    /// Set the fixed backoff between admission retries while blocking.
    pub fn with_block_retry_interval(mut self, interval: Duration) -> Self {
        self.block_retry_interval = interval;
        self
    }

    /// Build the layer.
    ///
    /// # Errors
    /// Returns [`BuildError`] if the configuration is invalid.
    pub fn build(self) -> Result<LogThrottleLayer, BuildError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let buckets = Arc::new(ShardedStorage::new());

        let limiter = RateLimiter::new(&self.config, buckets, clock)?
            .with_block_timing(self.block_timeout, self.block_retry_interval);

        Ok(LogThrottleLayer {
            limiter: Arc::new(limiter),
        })
    }
}

/// A `tracing_subscriber` filter that rate limits log events.
///
/// Attach it as a per-layer filter on the emitting layer:
///
/// ```rust,no_run
/// use log_throttle::LogThrottleLayer;
/// use tracing_subscriber::prelude::*;
/// use std::time::Duration;
///
/// let throttle = LogThrottleLayer::builder()
///     .with_enabled(true)
///     .with_global_rate(100.0)
///     .with_global_capacity(200.0)
///     .with_logger_limit("myapp::db", 5.0, 10.0)
///     .with_summary_interval(Duration::from_secs(5))
///     .build()
///     .unwrap();
///
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer().with_filter(throttle))
///     .init();
/// ```
///
/// Queued events come back under the [`REPLAY_TARGET`] with their original
/// target attached as a field; summaries are single WARN events under
/// [`SUMMARY_TARGET`]. Both bypass the filter, so the crate's own output is
/// never throttled.
#[derive(Clone)]
pub struct LogThrottleLayer<S = Arc<ShardedStorage<String, TokenBucket>>>
where
    S: Storage<String, TokenBucket> + Clone,
{
    limiter: Arc<RateLimiter<S>>,
}

impl LogThrottleLayer {
    /// Create a builder for configuring the layer.
    ///
    /// Defaults mirror the configuration defaults: rate limiting disabled,
    /// warnings on, 5 second summary interval, 1000-record queue,
    /// `drop_oldest` overflow policy.
    pub fn builder() -> LogThrottleLayerBuilder {
        LogThrottleLayerBuilder {
            config: RateLimitConfig::default(),
            clock: None,
            block_timeout: crate::application::limiter::DEFAULT_BLOCK_TIMEOUT,
            block_retry_interval: crate::application::limiter::DEFAULT_BLOCK_RETRY_INTERVAL,
        }
    }

    /// Create a layer with default settings (rate limiting disabled).
    ///
    /// # Panics
    /// This method cannot panic because all default values are valid.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default configuration is always valid")
    }
}

impl Default for LogThrottleLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> LogThrottleLayer<S>
where
    S: Storage<String, TokenBucket> + Clone,
{
    /// Get a reference to the underlying limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter<S>> {
        &self.limiter
    }

    /// Get a reference to the outcome metrics.
    pub fn metrics(&self) -> &Metrics {
        self.limiter.metrics()
    }

    /// Number of records currently waiting on the overflow queue.
    pub fn queued_len(&self) -> usize {
        self.limiter.queued_len()
    }

    /// Run a maintenance tick immediately, emitting any drained records and
    /// pending summary.
    ///
    /// Ticks normally ride along on emission calls; this exists for quiet
    /// periods (shutdown paths, health checks) when no events are flowing.
    pub fn tick_now(&self) {
        let outcome = self.limiter.tick(self.limiter.clock().now());
        emit_tick_outcome(outcome);
    }

    fn handle_event(&self, event: &tracing::Event<'_>) -> bool {
        let metadata = event.metadata();
        let target = metadata.target();

        // Our own replays and summaries pass through untouched
        if target == SELF_TARGET || target.starts_with("log_throttle::") {
            return true;
        }

        // Disabled: pure bypass, skip even the field visit
        if !self.limiter.is_enabled() {
            return true;
        }

        let now = self.limiter.clock().now();

        let mut visitor = MessageVisitor::new();
        event.record(&mut visitor);
        let record = QueuedRecord::new(
            target,
            metadata.level().as_str(),
            visitor.into_message().unwrap_or_default(),
        );

        let decision = self.limiter.admit(target, record, now);

        // Opportunistic maintenance after the live decision, so a drain
        // cannot starve the event that triggered it
        emit_tick_outcome(self.limiter.tick(now));

        matches!(decision, Decision::Admit)
    }
}

impl<S, Sub> Filter<Sub> for LogThrottleLayer<S>
where
    S: Storage<String, TokenBucket> + Clone + 'static,
    Sub: Subscriber,
{
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, Sub>) -> bool {
        // Callsite-level interest must stay permissive: the decision is per
        // event, not per callsite
        true
    }

    fn event_enabled(&self, event: &tracing::Event<'_>, _cx: &Context<'_, Sub>) -> bool {
        self.handle_event(event)
    }
}

/// Emit drained records and the summary, if any, as tracing events.
fn emit_tick_outcome(outcome: TickOutcome) {
    for record in &outcome.drained {
        emit_replay(record);
    }
    if let Some(report) = outcome.summary {
        tracing::warn!(
            target: "log_throttle::summary",
            dropped = report.total_dropped(),
            queued = report.total_queued(),
            "{}",
            report.format_message()
        );
    }
}

/// Re-emit a drained record at its original level.
///
/// The `event!` macro needs a const level, so dispatch per level; unknown
/// levels downgrade to INFO rather than being lost.
fn emit_replay(record: &QueuedRecord) {
    macro_rules! replay {
        ($level:ident) => {
            tracing::$level!(
                target: "log_throttle::replay",
                original_target = %record.logger,
                replayed = true,
                "{}",
                record.message
            )
        };
    }

    match record.level.as_str() {
        "ERROR" => replay!(error),
        "WARN" => replay!(warn),
        "DEBUG" => replay!(debug),
        "TRACE" => replay!(trace),
        _ => replay!(info),
    }
}
