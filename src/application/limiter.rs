//! Admission control for log records.
//!
//! The rate limiter decides, per record, whether it is emitted now, queued
//! for later, or dropped. It owns all process-wide mutable state explicitly:
//! the global bucket, the lazily-created per-logger buckets, the overflow
//! queue, and the summary reporter. Callers hold it behind an `Arc` and pass
//! it into every admission call; there are no hidden module globals.

use crate::application::config::{BucketParams, ConfigError, RateLimitConfig};
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Storage};
use crate::application::reporter::SummaryReporter;
use crate::domain::bucket::TokenBucket;
use crate::domain::queue::{Enqueue, OverflowPolicy, OverflowQueue};
use crate::domain::record::QueuedRecord;
use crate::domain::summary::SummaryReport;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Decision about how to handle a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Emit the record now
    Admit,
    /// The record was placed on the overflow queue for later emission
    Queue,
    /// The record was discarded
    Drop,
}

/// Result of an opportunistic [`RateLimiter::tick`].
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Queued records that regained admission, in FIFO order
    pub drained: Vec<QueuedRecord>,
    /// Aggregated drop/queue summary, at most one per summary interval
    pub summary: Option<SummaryReport>,
}

/// How long the `block` overflow policy may stall a single log call before
/// giving up and dropping. The original configuration surface exposes no
/// timeout, so a bound is imposed here to guarantee forward progress.
pub const DEFAULT_BLOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Fixed backoff between admission retries while blocking.
pub const DEFAULT_BLOCK_RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Coordinates admission decisions for a log stream.
///
/// Generic over the per-logger bucket storage; production code uses
/// `Arc<ShardedStorage<String, TokenBucket>>`, whose entry guards serialize
/// all consults of a single bucket.
///
/// # Fail-safe behavior
/// The admission path is wrapped in panic protection: if anything inside it
/// panics, the record is admitted. Rate limiting must never be the reason a
/// log call crashes.
#[derive(Debug)]
pub struct RateLimiter<S>
where
    S: Storage<String, TokenBucket> + Clone,
{
    enabled: bool,
    global: Mutex<Option<TokenBucket>>,
    per_logger: BTreeMap<String, BucketParams>,
    buckets: S,
    queue: Mutex<OverflowQueue>,
    overflow_policy: OverflowPolicy,
    reporter: SummaryReporter,
    metrics: Metrics,
    clock: Arc<dyn Clock>,
    block_timeout: Duration,
    block_retry_interval: Duration,
}

impl<S> RateLimiter<S>
where
    S: Storage<String, TokenBucket> + Clone,
{
    /// Create a rate limiter from a validated configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration; validated before anything is built
    /// * `buckets` - Storage backend for per-logger buckets
    /// * `clock` - Time source (use `SystemClock` in production)
    ///
    /// # Errors
    /// Returns the [`ConfigError`] from [`RateLimitConfig::validate`] if the
    /// configuration is invalid.
    pub fn new(
        config: &RateLimitConfig,
        buckets: S,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let now = clock.now();
        let global = config
            .global_bucket()
            .map(|p| TokenBucket::new_at(p.rate, p.capacity, now));
        let queue = OverflowQueue::new(
            config.max_queue_size,
            config.max_memory_bytes(),
            config.overflow_policy,
        );
        let reporter =
            SummaryReporter::starting_at(config.summary_interval, config.emit_warnings, now);

        Ok(Self {
            enabled: config.enabled,
            global: Mutex::new(global),
            per_logger: config.per_logger.clone(),
            buckets,
            queue: Mutex::new(queue),
            overflow_policy: config.overflow_policy,
            reporter,
            metrics: Metrics::new(),
            clock,
            block_timeout: DEFAULT_BLOCK_TIMEOUT,
            block_retry_interval: DEFAULT_BLOCK_RETRY_INTERVAL,
        })
    }

    /// Override the bound on the `block` overflow policy.
    pub fn with_block_timing(mut self, timeout: Duration, retry_interval: Duration) -> Self {
        self.block_timeout = timeout;
        self.block_retry_interval = retry_interval;
        self
    }

    /// Decide what to do with a record.
    ///
    /// With rate limiting disabled this is a pure bypass: no buckets, no
    /// queue, no counters are touched.
    ///
    /// # Arguments
    /// * `logger` - Logger name the record was emitted under
    /// * `record` - Owned snapshot, consumed if the record is queued
    /// * `now` - Current instant from the caller's clock
    pub fn admit(&self, logger: &str, record: QueuedRecord, now: Instant) -> Decision {
        if !self.enabled {
            return Decision::Admit;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.admit_inner(logger, record, now)
        }));

        // Fail open: a broken limiter must not take the log pipeline with it
        result.unwrap_or(Decision::Admit)
    }

    /// Opportunistic maintenance: drain re-admissible queued records and
    /// flush the summary window.
    ///
    /// The pipeline calls this alongside emission; no timer thread exists.
    /// Drained records are handed back to the caller for re-emission.
    pub fn tick(&self, now: Instant) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::default();
        }

        let drained = {
            let mut queue = lock_recovering(&self.queue);
            queue.drain_ready(|record| self.try_consume(&record.logger, now))
        };
        for record in &drained {
            self.metrics.record_admitted();
            self.reporter.record_admitted(&record.logger);
        }

        TickOutcome {
            drained,
            summary: self.reporter.maybe_report(now),
        }
    }

    /// Whether rate limiting is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a reference to the outcome metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get a reference to the summary reporter.
    pub fn reporter(&self) -> &SummaryReporter {
        &self.reporter
    }

    /// Get a reference to the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Number of records currently waiting on the overflow queue.
    pub fn queued_len(&self) -> usize {
        lock_recovering(&self.queue).len()
    }

    /// Number of per-logger buckets created so far.
    pub fn tracked_loggers(&self) -> usize {
        self.buckets.len()
    }

    fn admit_inner(&self, logger: &str, record: QueuedRecord, now: Instant) -> Decision {
        if self.try_consume(logger, now) {
            self.metrics.record_admitted();
            self.reporter.record_admitted(logger);
            return Decision::Admit;
        }
        self.overflow(logger, record, now)
    }

    /// Consult the global bucket, then the per-logger bucket if one is
    /// configured for this name.
    ///
    /// A global token spent before a per-logger denial is not refunded;
    /// refunding would race with other emitters, and the inefficiency is
    /// bounded by one token per denial.
    fn try_consume(&self, logger: &str, now: Instant) -> bool {
        let global_ok = match lock_recovering(&self.global).as_mut() {
            Some(bucket) => bucket.try_consume(now),
            None => true,
        };
        if !global_ok {
            return false;
        }

        match self.per_logger.get(logger) {
            Some(params) => self.buckets.with_entry_mut(
                logger.to_string(),
                || TokenBucket::new_at(params.rate, params.capacity, now),
                |bucket| bucket.try_consume(now),
            ),
            // Names without an override answer to the global bucket only
            None => true,
        }
    }

    fn overflow(&self, logger: &str, record: QueuedRecord, now: Instant) -> Decision {
        let outcome = lock_recovering(&self.queue).enqueue(record);

        match outcome {
            Enqueue::Queued => {
                self.metrics.record_queued();
                self.reporter.record_queued(logger);
                Decision::Queue
            }
            Enqueue::Evicted(evicted) => {
                // Each evicted record is a drop charged to its own logger
                for old in &evicted {
                    self.metrics.record_dropped();
                    self.reporter.record_dropped(&old.logger);
                }
                self.metrics.record_queued();
                self.reporter.record_queued(logger);
                Decision::Queue
            }
            Enqueue::Full(_) => {
                if self.overflow_policy == OverflowPolicy::Block {
                    self.block_for_token(logger, now)
                } else {
                    self.metrics.record_dropped();
                    self.reporter.record_dropped(logger);
                    Decision::Drop
                }
            }
        }
    }

    /// Bounded synchronous wait for a token, used by the `block` policy when
    /// the queue is full.
    ///
    /// Retries the full bucket consult on a fixed backoff until the hard
    /// timeout elapses, then falls back to dropping so the logging pipeline
    /// can never stall indefinitely. The wait sleeps in real time, so the
    /// loop is additionally capped by attempt count; a clock that stands
    /// still (or runs slow) cannot turn the bound into an infinite spin.
    fn block_for_token(&self, logger: &str, start: Instant) -> Decision {
        let deadline = start + self.block_timeout;
        let max_attempts = (self.block_timeout.as_nanos()
            / self.block_retry_interval.as_nanos().max(1)) as u64;

        let mut attempts = 0;
        while attempts < max_attempts && self.clock.now() < deadline {
            attempts += 1;
            std::thread::sleep(self.block_retry_interval);
            if self.try_consume(logger, self.clock.now()) {
                self.metrics.record_admitted();
                self.reporter.record_admitted(logger);
                return Decision::Admit;
            }
        }

        self.metrics.record_dropped();
        self.reporter.record_dropped(logger);
        Decision::Drop
    }
}

/// Lock a mutex, recovering from poisoning.
///
/// A poisoned lock means some admission call panicked mid-update. The state
/// it protects is advisory (token levels, queued records), so continuing
/// with whatever is there beats crashing every subsequent log call.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
