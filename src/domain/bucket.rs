//! Token bucket primitive for admission control.
//!
//! A bucket accumulates tokens over time up to a fixed capacity and spends
//! one token per admitted record. Refill is proportional to the time elapsed
//! since the last consult, so no background timer is needed.

use std::time::Instant;

/// A token bucket with continuous refill.
///
/// Buckets never validate their own parameters; rejection of negative or
/// non-finite rates happens at configuration time. A bucket must only be
/// consulted under exclusive access (the map entry guard or a mutex), which
/// rules out double-spending a token under concurrent callers.
///
/// # Example
/// ```
/// use log_throttle::TokenBucket;
/// use std::time::Instant;
///
/// // rate = 0: a static budget of 2 tokens, never refilled
/// let mut bucket = TokenBucket::new(0.0, 2.0);
/// let now = Instant::now();
///
/// assert!(bucket.try_consume(now));
/// assert!(bucket.try_consume(now));
/// assert!(!bucket.try_consume(now));
/// ```
#[derive(Debug, Clone)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket that starts full.
    ///
    /// # Arguments
    /// * `rate` - Refill rate in tokens per second (0 means never refill)
    /// * `capacity` - Maximum token level (0 means every consume fails)
    pub fn new_at(rate: f64, capacity: f64, now: Instant) -> Self {
        Self {
            rate,
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Create a bucket that starts full, timestamped with the system clock.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self::new_at(rate, capacity, Instant::now())
    }

    /// Refill according to elapsed time, then try to spend one token.
    ///
    /// Returns true and decrements the level by one token if at least one
    /// whole token is available. On failure the only side effect is the
    /// refill bookkeeping itself.
    pub fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token level (refreshed as of `now`).
    ///
    /// Mainly useful for introspection and tests; `try_consume` performs its
    /// own refill.
    pub fn tokens(&mut self, now: Instant) -> f64 {
        self.refill(now);
        self.tokens
    }

    /// Refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum token level.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(self.capacity);
        self.last_refill = now;
    }
}
