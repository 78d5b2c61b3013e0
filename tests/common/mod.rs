//! Shared test infrastructure for traffic-sequencer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use traffic_sequencer::{
    Lamp, LampPattern, LivenessMonitor, SignalHead, StateReporter, TimeDuration, TimeInstant,
    TimeSource, TrafficLight,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }

    fn saturating_sub(self, other: Self) -> Self {
        TestDuration(self.0.saturating_sub(other.0))
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }

    fn as_millis(&self) -> u64 {
        self.0
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }

    pub fn millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Signal Head
// ============================================================================

/// A single lamp write, stamped with the mock time it happened at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LampWrite {
    pub at_ms: u64,
    pub lamp: Lamp,
    pub on: bool,
}

/// Mock signal head that records every lamp write
pub struct MockSignalHead<'a> {
    timer: &'a MockTimeSource,
    current: LampPattern,
    history: heapless::Vec<LampWrite, 1024>,
}

impl<'a> MockSignalHead<'a> {
    pub fn new(timer: &'a MockTimeSource) -> Self {
        Self {
            timer,
            current: LampPattern::DARK,
            history: heapless::Vec::new(),
        }
    }

    pub fn current(&self) -> LampPattern {
        self.current
    }

    pub fn history(&self) -> &[LampWrite] {
        &self.history
    }

    /// Writes that changed `lamp`'s level, in order
    pub fn transitions(&self, lamp: Lamp) -> Vec<LampWrite> {
        let mut level = false;
        let mut out = Vec::new();
        for write in self.history.iter().filter(|w| w.lamp == lamp) {
            if write.on != level {
                out.push(*write);
                level = write.on;
            }
        }
        out
    }
}

impl SignalHead for MockSignalHead<'_> {
    fn set_lamp(&mut self, lamp: Lamp, on: bool) {
        self.current = self.current.with(lamp, on);
        let _ = self.history.push(LampWrite {
            at_ms: self.timer.millis(),
            lamp,
            on,
        });
    }
}

// ============================================================================
// Mock Reporter
// ============================================================================

/// A reported code, stamped with the mock time it was sent at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub at_ms: u64,
    pub code: u8,
}

/// Shared record of everything a [`MockReporter`] was asked to send
pub struct ReportLog<'a> {
    timer: &'a MockTimeSource,
    online: Cell<bool>,
    reports: RefCell<heapless::Vec<Report, 4096>>,
}

impl<'a> ReportLog<'a> {
    pub fn new(timer: &'a MockTimeSource) -> Self {
        Self {
            timer,
            online: Cell::new(true),
            reports: RefCell::new(heapless::Vec::new()),
        }
    }

    /// Make subsequent transmissions succeed or fail
    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().iter().copied().collect()
    }

    /// Codes in the order they were sent, with consecutive repeats (heartbeats) collapsed
    pub fn distinct_codes(&self) -> Vec<u8> {
        let mut codes: Vec<u8> = Vec::new();
        for report in self.reports.borrow().iter() {
            if codes.last() != Some(&report.code) {
                codes.push(report.code);
            }
        }
        codes
    }

    pub fn reporter(&self) -> MockReporter<'_, 'a> {
        MockReporter { log: self }
    }
}

/// Reporter handle that appends to a [`ReportLog`]
pub struct MockReporter<'l, 'a> {
    log: &'l ReportLog<'a>,
}

impl StateReporter for MockReporter<'_, '_> {
    fn transmit(&mut self, code: u8) -> bool {
        let _ = self.log.reports.borrow_mut().push(Report {
            at_ms: self.log.timer.millis(),
            code,
        });
        self.log.online.get()
    }
}

// ============================================================================
// Mock SPI bus and chip select
// ============================================================================

/// Bus-level event seen by the mock SPI peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Select,
    Deselect,
    Write(u8),
    Flush,
}

pub type BusLog = RefCell<heapless::Vec<BusEvent, 64>>;

/// Mock SPI bus that records writes and can be told to fail
pub struct MockSpiBus<'a> {
    log: &'a BusLog,
    pub fail_writes: bool,
}

impl<'a> MockSpiBus<'a> {
    pub fn new(log: &'a BusLog) -> Self {
        Self {
            log,
            fail_writes: false,
        }
    }
}

impl embedded_hal::spi::ErrorType for MockSpiBus<'_> {
    type Error = embedded_hal::spi::ErrorKind;
}

impl embedded_hal::spi::SpiBus<u8> for MockSpiBus<'_> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(embedded_hal::spi::ErrorKind::Other);
        }
        for word in words {
            let _ = self.log.borrow_mut().push(BusEvent::Write(*word));
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let _ = self.log.borrow_mut().push(BusEvent::Flush);
        Ok(())
    }
}

/// Mock chip-select pin that records select/deselect edges
pub struct MockCsPin<'a> {
    log: &'a BusLog,
}

impl<'a> MockCsPin<'a> {
    pub fn new(log: &'a BusLog) -> Self {
        Self { log }
    }
}

impl embedded_hal::digital::ErrorType for MockCsPin<'_> {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockCsPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let _ = self.log.borrow_mut().push(BusEvent::Select);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let _ = self.log.borrow_mut().push(BusEvent::Deselect);
        Ok(())
    }
}

// ============================================================================
// Scheduling helpers
// ============================================================================

/// Pending wake-ups of the simulated sequencer and monitor tasks
pub struct Schedule {
    pub next_service: u64,
    next_poll: Option<u64>,
    poll_every: u64,
}

impl Schedule {
    /// Schedule for a light alone, whose first service is `first_wait` from now
    pub fn new(timer: &MockTimeSource, first_wait: TestDuration) -> Self {
        Self {
            next_service: timer.millis() + first_wait.0,
            next_poll: None,
            poll_every: 0,
        }
    }

    /// Schedule for a light plus a liveness monitor polled every `poll_every`
    pub fn with_monitor(
        timer: &MockTimeSource,
        first_wait: TestDuration,
        poll_every: TestDuration,
    ) -> Self {
        Self {
            next_service: timer.millis() + first_wait.0,
            next_poll: Some(timer.millis() + poll_every.0),
            poll_every: poll_every.0,
        }
    }
}

/// Runs the light (and monitor, if any) as their tasks would, until `until_ms`.
///
/// The light is serviced exactly when it asked to be. A monitor poll that
/// flips the link wakes the light immediately.
pub fn run_until<H, R>(
    light: &mut TrafficLight<'_, TestInstant, H, MockTimeSource, R>,
    mut monitor: Option<&mut LivenessMonitor<'_, TestInstant, MockTimeSource>>,
    timer: &MockTimeSource,
    schedule: &mut Schedule,
    until_ms: u64,
) where
    H: SignalHead,
    R: StateReporter,
{
    loop {
        let poll_at = schedule.next_poll.unwrap_or(u64::MAX);
        let next = schedule.next_service.min(poll_at);
        if next > until_ms {
            timer.set_time(TestInstant(until_ms));
            return;
        }
        timer.set_time(TestInstant(next));

        if next == poll_at {
            if let Some(monitor) = monitor.as_deref_mut() {
                if monitor.poll().is_some() {
                    schedule.next_service = next;
                }
            }
            schedule.next_poll = Some(next + schedule.poll_every);
        }

        if schedule.next_service == next {
            let wait = light.service().unwrap();
            assert!(wait.0 > 0, "service must always ask for a non-zero sleep");
            schedule.next_service = next + wait.0;
        }
    }
}
