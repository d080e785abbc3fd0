//! Field visitor for extracting the message text of an event.
//!
//! Queued records must outlive the borrowed `tracing::Event`, so the filter
//! layer snapshots the message field through this visitor before deciding
//! whether to queue.

use std::fmt;
use tracing::field::{Field, Visit};

/// A visitor that captures the `message` field of an event as a string.
#[derive(Debug, Default)]
pub(crate) struct MessageVisitor {
    message: Option<String>,
}

impl MessageVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the visitor and return the message, if the event had one.
    pub fn into_message(self) -> Option<String> {
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }
}
