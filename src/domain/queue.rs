//! Bounded overflow queue for records that could not be admitted.
//!
//! The queue holds records waiting for tokens to become available and applies
//! a configurable policy when it is full. Draining is strictly FIFO: the
//! first record that still fails admission stops the drain, so a queued
//! record is never overtaken by a younger one.

use crate::domain::record::QueuedRecord;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// What to do with an incoming record when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest queued record to make room (default)
    #[default]
    DropOldest,
    /// Discard the incoming record, leave the queue untouched
    DropNewest,
    /// Caller retries admission on a bounded backoff before dropping
    Block,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropOldest => write!(f, "drop_oldest"),
            OverflowPolicy::DropNewest => write!(f, "drop_newest"),
            OverflowPolicy::Block => write!(f, "block"),
        }
    }
}

/// Error returned when parsing an unrecognized overflow policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOverflowPolicyError(String);

impl fmt::Display for ParseOverflowPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized overflow policy '{}' (expected drop_oldest, drop_newest, or block)",
            self.0
        )
    }
}

impl std::error::Error for ParseOverflowPolicyError {}

impl FromStr for OverflowPolicy {
    type Err = ParseOverflowPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop_oldest" => Ok(OverflowPolicy::DropOldest),
            "drop_newest" => Ok(OverflowPolicy::DropNewest),
            "block" => Ok(OverflowPolicy::Block),
            _ => Err(ParseOverflowPolicyError(s.to_string())),
        }
    }
}

/// Outcome of an enqueue attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Enqueue {
    /// The record was appended
    Queued,
    /// The record was appended after evicting queued records, oldest first.
    /// Usually one record, but a byte-bounded queue may shed several small
    /// records to fit one large newcomer.
    Evicted(Vec<QueuedRecord>),
    /// The queue is unchanged; the record is handed back. Either the queue
    /// is full under a non-evicting policy, or the record alone exceeds the
    /// byte bound and can never be queued.
    Full(QueuedRecord),
}

/// FIFO queue of pending records, bounded by count and optionally by bytes.
///
/// Byte accounting uses [`QueuedRecord::estimated_bytes`] and is best-effort;
/// with no byte limit configured the queue is count-limited only.
#[derive(Debug)]
pub struct OverflowQueue {
    records: VecDeque<QueuedRecord>,
    max_len: usize,
    max_bytes: Option<usize>,
    current_bytes: usize,
    policy: OverflowPolicy,
}

impl OverflowQueue {
    /// Create a queue.
    ///
    /// # Arguments
    /// * `max_len` - Maximum number of queued records
    /// * `max_bytes` - Optional estimated-memory bound
    /// * `policy` - Behavior when full
    pub fn new(max_len: usize, max_bytes: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            records: VecDeque::new(),
            max_len,
            max_bytes,
            current_bytes: 0,
            policy,
        }
    }

    /// Attempt to append a record, applying the overflow policy when full.
    ///
    /// A `max_len` of 0 rejects immediately, as does a record whose own
    /// estimated size exceeds the byte bound (no amount of eviction could
    /// make it fit). `Block` behaves like `DropNewest` at this level; the
    /// bounded retry loop lives in the admission path, which owns the clock.
    pub fn enqueue(&mut self, record: QueuedRecord) -> Enqueue {
        if self.max_len == 0 {
            return Enqueue::Full(record);
        }

        let incoming_bytes = record.estimated_bytes();
        if let Some(limit) = self.max_bytes {
            if incoming_bytes > limit {
                return Enqueue::Full(record);
            }
        }

        if self.would_fit(incoming_bytes) {
            self.push_back(record, incoming_bytes);
            return Enqueue::Queued;
        }

        match self.policy {
            OverflowPolicy::DropOldest => {
                // Shed heads until the newcomer fits. The loop terminates:
                // an empty queue always fits a record that passed the
                // oversized check above.
                let mut evicted = Vec::new();
                while !self.would_fit(incoming_bytes) {
                    match self.pop_front() {
                        Some(head) => evicted.push(head),
                        None => break,
                    }
                }
                self.push_back(record, incoming_bytes);
                Enqueue::Evicted(evicted)
            }
            OverflowPolicy::DropNewest | OverflowPolicy::Block => Enqueue::Full(record),
        }
    }

    /// Drain records that are now admissible, in FIFO order.
    ///
    /// `admit_fn` re-attempts token consumption for the head record. The
    /// drain stops at the first record that still fails, preserving order
    /// instead of skipping ahead.
    pub fn drain_ready<F>(&mut self, mut admit_fn: F) -> Vec<QueuedRecord>
    where
        F: FnMut(&QueuedRecord) -> bool,
    {
        let mut drained = Vec::new();

        while let Some(head) = self.records.front() {
            if !admit_fn(head) {
                break;
            }
            // Unwrap is fine: front() just confirmed the head exists
            drained.push(self.pop_front().expect("head checked above"));
        }

        drained
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current estimated memory usage in bytes.
    pub fn estimated_bytes(&self) -> usize {
        self.current_bytes
    }

    /// The configured overflow policy.
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    fn would_fit(&self, incoming_bytes: usize) -> bool {
        if self.records.len() >= self.max_len {
            return false;
        }
        match self.max_bytes {
            Some(limit) => self.current_bytes.saturating_add(incoming_bytes) <= limit,
            None => true,
        }
    }

    fn push_back(&mut self, record: QueuedRecord, bytes: usize) {
        self.current_bytes = self.current_bytes.saturating_add(bytes);
        self.records.push_back(record);
    }

    fn pop_front(&mut self) -> Option<QueuedRecord> {
        let record = self.records.pop_front()?;
        self.current_bytes = self
            .current_bytes
            .saturating_sub(record.estimated_bytes());
        Some(record)
    }
}
