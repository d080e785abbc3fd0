//! End-to-end behavior of queue drain replays and summary warnings,
//! driven through a real subscriber stack with a controllable clock.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use log_throttle::infrastructure::mocks::{MockCaptureLayer, MockClock};
use log_throttle::{LogThrottleLayer, REPLAY_TARGET, SUMMARY_TARGET};

#[test]
fn test_queued_record_is_replayed_after_refill() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(1.0)
        .with_global_capacity(1.0)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "first");
        info!(target: "myapp::api", "second");
        assert_eq!(capture.count(), 1);
        assert_eq!(throttle.queued_len(), 1);

        clock.advance(Duration::from_secs(3));
        throttle.tick_now();
    });

    let replays: Vec<_> = capture
        .get_captured()
        .into_iter()
        .filter(|e| e.target == REPLAY_TARGET)
        .collect();
    assert_eq!(replays.len(), 1);
    assert_eq!(replays[0].message, "second");

    assert_eq!(throttle.queued_len(), 0);
    assert_eq!(throttle.metrics().snapshot().records_admitted, 2);
}

#[test]
fn test_replay_preserves_original_level() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(1.0)
        .with_global_capacity(1.0)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "uses the token");
        error!(target: "myapp::api", "disk failure");

        clock.advance(Duration::from_secs(2));
        throttle.tick_now();
    });

    let replays: Vec<_> = capture
        .get_captured()
        .into_iter()
        .filter(|e| e.target == REPLAY_TARGET)
        .collect();
    assert_eq!(replays.len(), 1);
    assert_eq!(replays[0].level, Level::ERROR);
    assert_eq!(replays[0].message, "disk failure");
}

#[test]
fn test_replayed_records_come_back_in_order() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(1.0)
        .with_global_capacity(3.0)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "admitted 1");
        info!(target: "myapp::api", "admitted 2");
        info!(target: "myapp::api", "admitted 3");
        info!(target: "myapp::api", "queued 1");
        info!(target: "myapp::api", "queued 2");
        info!(target: "myapp::api", "queued 3");

        // The bucket refills to its full capacity of 3
        clock.advance(Duration::from_secs(10));
        throttle.tick_now();
    });

    let replays: Vec<_> = capture
        .get_captured()
        .into_iter()
        .filter(|e| e.target == REPLAY_TARGET)
        .map(|e| e.message)
        .collect();
    assert_eq!(replays, vec!["queued 1", "queued 2", "queued 3"]);
}

#[test]
fn test_partial_refill_drains_partially() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(1.0)
        .with_global_capacity(1.0)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "admitted");
        info!(target: "myapp::api", "queued 1");
        info!(target: "myapp::api", "queued 2");

        // One token refills; the drain stops at the second queued record
        clock.advance(Duration::from_millis(1500));
        throttle.tick_now();
    });

    assert_eq!(capture.count_for_target(REPLAY_TARGET), 1);
    assert_eq!(throttle.queued_len(), 1);
}

#[test]
fn test_summary_warning_after_interval() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(0.0)
        .with_global_capacity(1.0)
        .with_summary_interval(Duration::from_secs(1))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "admitted");
        info!(target: "myapp::api", "queued 1");
        info!(target: "myapp::api", "queued 2");
        assert_eq!(capture.count_for_target(SUMMARY_TARGET), 0);

        clock.advance(Duration::from_millis(1500));
        throttle.tick_now();
    });

    let summaries: Vec<_> = capture
        .get_captured()
        .into_iter()
        .filter(|e| e.target == SUMMARY_TARGET)
        .collect();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].level, Level::WARN);
    assert!(summaries[0].message.contains("2 queued"));
    assert!(summaries[0].message.contains("myapp::api"));
}

#[test]
fn test_at_most_one_summary_per_interval() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(0.0)
        .with_global_capacity(1.0)
        .with_summary_interval(Duration::from_secs(1))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "admitted");
        info!(target: "myapp::api", "queued");

        clock.advance(Duration::from_millis(1500));
        throttle.tick_now();
        // Window just reset; another tick right away reports nothing
        throttle.tick_now();
        assert_eq!(capture.count_for_target(SUMMARY_TARGET), 1);

        // New pressure in a new window produces a new summary
        info!(target: "myapp::api", "queued again");
        clock.advance(Duration::from_millis(1500));
        throttle.tick_now();
    });

    assert_eq!(capture.count_for_target(SUMMARY_TARGET), 2);
}

#[test]
fn test_no_summary_when_warnings_disabled() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(0.0)
        .with_global_capacity(1.0)
        .with_emit_warnings(false)
        .with_summary_interval(Duration::from_secs(1))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "admitted");
        info!(target: "myapp::api", "queued");

        clock.advance(Duration::from_millis(1500));
        throttle.tick_now();
    });

    assert_eq!(capture.count_for_target(SUMMARY_TARGET), 0);
    // Counters are maintained regardless of warning emission
    assert_eq!(throttle.metrics().snapshot().records_queued, 1);
}

#[test]
fn test_quiet_window_produces_no_summary() {
    let clock = MockClock::new(Instant::now());
    let capture = MockCaptureLayer::new();
    let throttle = LogThrottleLayer::builder()
        .with_enabled(true)
        .with_global_rate(100.0)
        .with_global_capacity(100.0)
        .with_summary_interval(Duration::from_secs(1))
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    let subscriber =
        tracing_subscriber::registry().with(capture.clone().with_filter(throttle.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!(target: "myapp::api", "all admitted");
        info!(target: "myapp::api", "no pressure");

        clock.advance(Duration::from_secs(2));
        throttle.tick_now();
    });

    // Everything was admitted, so there is nothing to warn about
    assert_eq!(capture.count_for_target(SUMMARY_TARGET), 0);
}
