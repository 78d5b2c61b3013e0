//! Integration tests for LivenessMonitor and LinkHealth

mod common;
use common::*;

use traffic_sequencer::{LinkEvent, LinkHealth, LivenessConfig, LivenessMonitor, TimeDuration};

#[test]
fn silence_equal_to_threshold_is_alive() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    assert_eq!(monitor.check_at(60), None);
    assert!(link.is_ok());
}

#[test]
fn silence_one_past_threshold_is_lost() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    assert_eq!(monitor.check_at(61), Some(LinkEvent::Lost { silent_ms: 61 }));
    assert!(!link.is_ok());
}

#[test]
fn poll_reads_the_time_source() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    timer.advance(TestDuration(60));
    assert_eq!(monitor.poll(), None);

    timer.advance(TestDuration(10));
    assert_eq!(monitor.poll(), Some(LinkEvent::Lost { silent_ms: 70 }));
}

#[test]
fn activity_keeps_link_alive_indefinitely() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    for _ in 0..1000 {
        timer.advance(TestDuration(50));
        link.record_activity(timer.millis());
        timer.advance(TestDuration(10));
        assert_eq!(monitor.poll(), None);
    }
    assert!(link.is_ok());
}

#[test]
fn restored_activity_flips_link_back() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    timer.set_time(TestInstant(500));
    assert!(matches!(monitor.poll(), Some(LinkEvent::Lost { .. })));

    link.record_activity(510);
    timer.set_time(TestInstant(520));
    assert_eq!(monitor.poll(), Some(LinkEvent::Restored { silent_ms: 10 }));
    assert!(link.is_ok());
}

#[test]
fn link_flaps_without_hysteresis() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let mut monitor = LivenessMonitor::new(&link, &timer, LivenessConfig::DEFAULT);

    let mut events = Vec::new();
    for (now, active) in [(61, false), (62, true), (123, false), (124, true)] {
        if active {
            link.record_activity(now);
        }
        if let Some(event) = monitor.check_at(now) {
            events.push(event);
        }
    }

    assert_eq!(
        events,
        vec![
            LinkEvent::Lost { silent_ms: 61 },
            LinkEvent::Restored { silent_ms: 0 },
            LinkEvent::Lost { silent_ms: 61 },
            LinkEvent::Restored { silent_ms: 0 },
        ]
    );
}

#[test]
fn custom_threshold_is_honoured() {
    let timer = MockTimeSource::new();
    let link = LinkHealth::new();
    let config = LivenessConfig {
        poll_interval_ms: 5,
        threshold_ms: 200,
        heartbeat_interval_ms: 50,
    };
    assert!(config.validate().is_ok());
    let mut monitor = LivenessMonitor::new(&link, &timer, config);

    assert_eq!(monitor.poll_interval().as_millis(), 5);
    assert_eq!(monitor.check_at(200), None);
    assert_eq!(monitor.check_at(201), Some(LinkEvent::Lost { silent_ms: 201 }));
}
