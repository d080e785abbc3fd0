//! Infrastructure layer containing adapters for external systems.
//!
//! This layer implements the ports defined by the application layer and
//! hosts the `tracing_subscriber` integration. Following the dependency
//! rule, infrastructure depends on the application and domain layers but
//! never the other way around.

pub mod clock;
pub mod layer;
pub mod storage;

pub(crate) mod visitor;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
