//! Domain layer - pure admission-control logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of the rate limiter:
//! - Token bucket refill and consumption
//! - Queued record representation
//! - Bounded overflow queue and overflow policies
//! - Summary report types
//!
//! All types in this layer are pure and easily testable.

pub mod bucket;
pub mod queue;
pub mod record;
pub mod summary;
