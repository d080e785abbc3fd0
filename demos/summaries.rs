//! Per-logger limits and aggregated drop summaries.
//!
//! A chatty "db" logger is squeezed down to 2 records/sec while the rest of
//! the application logs freely; every 2 seconds a single WARN summarizes
//! what was suppressed.
//!
//! Run with: cargo run --example summaries

use log_throttle::{LogThrottleLayer, OverflowPolicy};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

fn main() {
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(100.0)
        .with_global_capacity(100.0)
        .with_logger_limit("demo::db", 2.0, 2.0)
        .with_max_queue_size(20)
        .with_overflow_policy(OverflowPolicy::DropOldest)
        .with_summary_interval(Duration::from_secs(2))
        .build()
        .expect("valid configuration");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(throttle.clone()))
        .init();

    for i in 0..100 {
        debug!(target: "demo::db", query = i, "SELECT * FROM orders");
        if i % 10 == 0 {
            info!(target: "demo::api", batch = i / 10, "batch complete");
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let snapshot = throttle.metrics().snapshot();
    println!(
        "admitted={} queued={} dropped={}",
        snapshot.records_admitted, snapshot.records_queued, snapshot.records_dropped
    );
}
