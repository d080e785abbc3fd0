//! # log-throttle
//!
//! Token-bucket admission control for log emission in the `tracing` ecosystem.
//!
//! This crate provides a `tracing_subscriber` filter that bounds how many log
//! events a process may emit. Each event is checked against a global token
//! bucket and, optionally, a per-logger bucket keyed by the event's target.
//! An event is **admitted**, **queued** on a bounded overflow queue for later
//! re-emission, or **dropped** - and drop/queue activity is reported as a
//! single aggregated WARN per summary interval instead of a warning per
//! suppressed record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use log_throttle::{LogThrottleLayer, OverflowPolicy};
//! use tracing_subscriber::prelude::*;
//! use std::time::Duration;
//!
//! let throttle = LogThrottleLayer::builder()
//!     .with_enabled(true)
//!     .with_global_rate(100.0)            // 100 records/sec sustained
//!     .with_global_capacity(200.0)        // bursts up to 200
//!     .with_logger_limit("myapp::db", 5.0, 10.0)
//!     .with_max_queue_size(1000)
//!     .with_overflow_policy(OverflowPolicy::DropOldest)
//!     .with_summary_interval(Duration::from_secs(5))
//!     .build()
//!     .unwrap();
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_filter(throttle))
//!     .init();
//! ```
//!
//! ## How Admission Works
//!
//! 1. The **global bucket** is consulted first. No global token means the
//!    record cannot be emitted now and goes to overflow handling.
//! 2. If the event's target has a configured **per-logger bucket**, that
//!    bucket must also grant a token. A spent global token is not refunded
//!    when the per-logger bucket declines; the global budget bounds total
//!    emission attempts, not successes.
//! 3. Records that fail admission enter a bounded **overflow queue**. When
//!    the queue is full, the [`OverflowPolicy`] decides: evict the oldest
//!    queued record (`drop_oldest`, the default), drop the incoming record
//!    (`drop_newest`), or retry admission briefly before dropping (`block`).
//! 4. Every emission call also runs an opportunistic **tick**: queued records
//!    are re-admitted in FIFO order as tokens refill, and when a summary
//!    window closes a single WARN reports per-logger drop/queue counts.
//!
//! With `rate = 0` a bucket never refills, so its capacity is a static
//! budget: exactly `capacity` records are ever admitted. With
//! `capacity = 0` the bucket admits nothing.
//!
//! ## Replayed Events
//!
//! Queued records are re-emitted as synthesized events under the
//! `log_throttle::replay` target, carrying their original target and message
//! as fields. Summaries arrive under `log_throttle::summary`. Both targets
//! bypass the filter, so the crate's own output is never throttled.
//!
//! ## Zero Overhead When Disabled
//!
//! Rate limiting is off by default. A disabled layer admits every event
//! after a single atomic load - no field visiting, no locks, no counters.
//!
//! ## Fail-Open Behavior
//!
//! Observability infrastructure must not take the application down with it.
//! If admission panics internally, the event is admitted and processing
//! continues; a poisoned internal lock is recovered rather than propagated.
//!
//! ## Testing Support
//!
//! With the `test-helpers` feature (always on in this crate's own tests),
//! [`infrastructure::mocks`] provides a `MockClock` for deterministic time
//! control and a `MockCaptureLayer` that records every event reaching it.
//!
//! ## Architecture
//!
//! The crate follows a hexagonal architecture:
//! - **Domain**: token buckets, the overflow queue, summary reports
//! - **Application**: admission logic, configuration, metrics, reporting
//! - **Infrastructure**: system clock, sharded bucket storage, the tracing
//!   layer integration

// Domain layer - core business logic
pub mod domain;

// Application layer - use cases and ports
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    bucket::TokenBucket,
    queue::{OverflowPolicy, OverflowQueue, ParseOverflowPolicyError},
    record::QueuedRecord,
    summary::{LoggerCounts, SummaryReport},
};

pub use application::{
    config::{BucketParams, ConfigError, RateLimitConfig},
    limiter::{Decision, RateLimiter, TickOutcome},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Storage},
    reporter::SummaryReporter,
};

#[cfg(feature = "async")]
pub use application::emitter::{ShutdownError, TickerHandle};

pub use infrastructure::{
    clock::SystemClock,
    layer::{BuildError, LogThrottleLayer, LogThrottleLayerBuilder, REPLAY_TARGET, SUMMARY_TARGET},
    storage::ShardedStorage,
};
