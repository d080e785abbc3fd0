//! Application layer - orchestration of the admission logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Validated configuration
//! - Rate limiter (admission decisions, opportunistic ticks)
//! - Outcome metrics
//! - Summary reporter
//! - Optional background ticker (`async` feature)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod config;
pub mod emitter;
pub mod limiter;
pub mod metrics;
pub mod ports;
pub mod reporter;
