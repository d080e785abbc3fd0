//! Basic usage: bound a bursty log loop with a global token bucket.
//!
//! Run with: cargo run --example basic

use log_throttle::LogThrottleLayer;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::prelude::*;

fn main() {
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(5.0)
        .with_global_capacity(10.0)
        .with_summary_interval(Duration::from_secs(2))
        .build()
        .expect("valid configuration");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(throttle.clone()))
        .init();

    // The first 10 burst through on the initial bucket capacity; the rest
    // queue up and trickle out at 5/sec as the loop keeps ticking
    for i in 0..50 {
        info!(target: "demo::worker", iteration = i, "processing item");
        std::thread::sleep(Duration::from_millis(20));
    }

    // Let the queue drain
    for _ in 0..20 {
        throttle.tick_now();
        std::thread::sleep(Duration::from_millis(250));
    }

    let snapshot = throttle.metrics().snapshot();
    println!(
        "admitted={} queued={} dropped={} (drop rate {:.1}%)",
        snapshot.records_admitted,
        snapshot.records_queued,
        snapshot.records_dropped,
        snapshot.drop_rate() * 100.0
    );
}
