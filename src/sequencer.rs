//! Traffic light sequencer with phase timing, blink patterns and fail-safe handling.
//!
//! Provides [`TrafficLight`], which drives a [`SignalHead`] through the light
//! cycle, optionally reports every phase over a [`StateReporter`], and falls
//! back to blinking yellow while the reporting link is judged dead.

use embedded_hal::delay::DelayNs;

use crate::config::{ConfigError, LivenessConfig, PhaseTiming, TimingConfig};
use crate::lamps::SignalHead;
use crate::liveness::LinkHealth;
use crate::phase::{Lamp, LampPattern, Phase};
use crate::report::{NoReporter, StateReporter};
use crate::time::{self, TimeDuration, TimeInstant, TimeSource};

/// The current state of a traffic light sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Not started yet. All lamps are dark.
    Idle,
    /// Cycling through the normal phases.
    Running,
    /// Link lost. Blinking yellow until the link is back.
    Fault,
}

/// Errors that can occur during sequencer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Operation called from an invalid state.
    InvalidState {
        /// Human-readable description of expected state(s)
        expected: &'static str,
        /// The actual current state
        actual: SequencerState,
    },

    /// The fault phase is only ever entered because the link was lost.
    FaultPhaseRequested,

    /// The timing or liveness configuration was rejected at start.
    Config(ConfigError),
}

impl From<ConfigError> for SequencerError {
    fn from(err: ConfigError) -> Self {
        SequencerError::Config(err)
    }
}

impl core::fmt::Display for SequencerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SequencerError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but sequencer is in {:?}",
                    expected, actual
                )
            }
            SequencerError::FaultPhaseRequested => {
                write!(f, "the fault phase cannot be entered directly")
            }
            SequencerError::Config(err) => write!(f, "invalid configuration: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SequencerError {}

/// Delay between retries when [`TrafficLight::run`] hits an error.
const RUN_RETRY_MS: u64 = 100;

struct Reporting<'t, R> {
    reporter: R,
    link: &'t LinkHealth,
    liveness: LivenessConfig,
}

/// Drives one signal head through the light cycle.
///
/// The sequencer never blocks. Call [`service`](Self::service) and sleep for
/// the duration it returns; every hold and every blink half-cycle is realised
/// by those sleeps. Servicing early is harmless.
///
/// Exactly one [`Phase`] is current at any time. The normal cycle is
/// `Red -> RedYellow -> Green -> GreenBlinking -> Yellow -> Red`. When
/// reporting is enabled and the shared [`LinkHealth`] says the link is down,
/// the current hold is abandoned and the light blinks yellow until the link is
/// back, then restarts the cycle at red.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source and link status references
/// * `I` - Time instant type
/// * `H` - Signal head implementation type
/// * `T` - Time source implementation type
/// * `R` - Reporter implementation type ([`NoReporter`] for plain lights)
pub struct TrafficLight<'t, I, H, T, R = NoReporter>
where
    I: TimeInstant,
    H: SignalHead,
    T: TimeSource<I>,
    R: StateReporter,
{
    head: H,
    time_source: &'t T,
    timing: TimingConfig,
    reporting: Option<Reporting<'t, R>>,
    state: SequencerState,
    phase: Phase,
    outputs: LampPattern,
    phase_start: I,
    last_toggle: I,
    half_cycles: u32,
    last_report: I,
}

impl<'t, I, H, T> TrafficLight<'t, I, H, T, NoReporter>
where
    I: TimeInstant,
    H: SignalHead,
    T: TimeSource<I>,
{
    /// Creates an idle light without a reporting link. All lamps go dark.
    ///
    /// Such a light never enters the fault phase on its own.
    pub fn new(head: H, time_source: &'t T, timing: TimingConfig) -> Self {
        Self::build(head, time_source, timing, None)
    }
}

impl<'t, I, H, T, R> TrafficLight<'t, I, H, T, R>
where
    I: TimeInstant,
    H: SignalHead,
    T: TimeSource<I>,
    R: StateReporter,
{
    /// Creates an idle light that reports every phase and heartbeat through
    /// `reporter` and consults `link` before and during every phase.
    pub fn with_reporting(
        head: H,
        reporter: R,
        link: &'t LinkHealth,
        time_source: &'t T,
        timing: TimingConfig,
        liveness: LivenessConfig,
    ) -> Self {
        let reporting = Reporting {
            reporter,
            link,
            liveness,
        };
        Self::build(head, time_source, timing, Some(reporting))
    }

    fn build(
        mut head: H,
        time_source: &'t T,
        timing: TimingConfig,
        reporting: Option<Reporting<'t, R>>,
    ) -> Self {
        head.apply(LampPattern::DARK);
        let now = time_source.now();

        Self {
            head,
            time_source,
            timing,
            reporting,
            state: SequencerState::Idle,
            phase: Phase::FIRST,
            outputs: LampPattern::DARK,
            phase_start: now,
            last_toggle: now,
            half_cycles: 0,
            last_report: now,
        }
    }

    /// Starts the cycle at red, or diverts straight to the fault phase if the
    /// link is already down.
    ///
    /// Must be called from `Idle` state. The timing table, and the liveness
    /// settings of a reporting light, are validated first so a degenerate
    /// config can never make the light ask for zero-length sleeps forever.
    ///
    /// # Returns
    /// * `Ok(duration)` - When to service next
    /// * `Err` - Already started, or the configuration is invalid
    pub fn start(&mut self) -> Result<I::Duration, SequencerError> {
        if self.state != SequencerState::Idle {
            return Err(SequencerError::InvalidState {
                expected: "Idle",
                actual: self.state,
            });
        }

        self.timing.validate()?;
        if let Some(reporting) = &self.reporting {
            reporting.liveness.validate()?;
        }

        let first = if self.link_ok() {
            Phase::FIRST
        } else {
            warn!("link down at start");
            Phase::YellowBlinking
        };
        let now = self.time_source.now();
        self.enter_at(first, now);
        self.service()
    }

    /// Makes `phase` current: applies its entry pattern, then reports its code.
    ///
    /// Blinking phases enter with their blinking lamp lit. The phase's hold
    /// starts now.
    ///
    /// Must be called on a started light. [`Phase::YellowBlinking`] is
    /// refused; only a lost link puts the light into the fault phase.
    pub fn enter(&mut self, phase: Phase) -> Result<(), SequencerError> {
        if self.state == SequencerState::Idle {
            return Err(SequencerError::InvalidState {
                expected: "Running or Fault",
                actual: self.state,
            });
        }
        if phase.is_fault() {
            return Err(SequencerError::FaultPhaseRequested);
        }

        let now = self.time_source.now();
        self.enter_at(phase, now);
        Ok(())
    }

    /// Performs everything that is due and returns when to service next.
    ///
    /// In order: diverts to the fault phase if the link dropped (abandoning
    /// the current hold), leaves the fault phase for red if the link is back,
    /// advances or toggles the current phase, and sends a heartbeat report.
    ///
    /// Must be called from `Running` or `Fault` state.
    pub fn service(&mut self) -> Result<I::Duration, SequencerError> {
        if self.state == SequencerState::Idle {
            return Err(SequencerError::InvalidState {
                expected: "Running or Fault",
                actual: self.state,
            });
        }

        let now = self.time_source.now();
        let link_ok = self.link_ok();

        match self.state {
            SequencerState::Running if !link_ok => {
                warn!("link lost during {}, abandoning phase", self.phase);
                self.enter_at(Phase::YellowBlinking, now);
            }
            SequencerState::Fault if link_ok => {
                info!("link ok, restarting cycle");
                self.enter_at(Phase::FIRST, now);
            }
            _ => {}
        }

        let complete = match self.timing.phase_timing(self.phase) {
            PhaseTiming::Steady { hold_ms } => self.hold_strict_phase(hold_ms, now),
            PhaseTiming::Blinking {
                lamp,
                interval_ms,
                half_cycles,
            } => self.hold_blinking_phase(lamp, interval_ms, half_cycles, now),
        };

        if complete {
            self.enter_at(self.phase.next(), now);
        }

        let until_event = self.until_phase_event(now);
        Ok(self.heartbeat(now, until_event))
    }

    /// Starts the light if needed and services it forever, sleeping on
    /// `delay` in between.
    ///
    /// Suits plain lights. A reporting light needs its [`LivenessMonitor`]
    /// polled from another context while this blocks. Errors are logged and
    /// retried every 100 ms.
    ///
    /// [`LivenessMonitor`]: crate::liveness::LivenessMonitor
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            let result = if self.state == SequencerState::Idle {
                self.start()
            } else {
                self.service()
            };
            let wait = match result {
                Ok(wait) => wait,
                Err(err) => {
                    error!("light not serviced: {}", err);
                    I::Duration::from_millis(RUN_RETRY_MS)
                }
            };

            let millis = u32::try_from(wait.as_millis()).unwrap_or(u32::MAX);
            delay.delay_ms(millis);
        }
    }

    fn enter_at(&mut self, phase: Phase, now: I) {
        self.phase = phase;
        self.state = if phase.is_fault() {
            SequencerState::Fault
        } else {
            SequencerState::Running
        };
        self.phase_start = now;
        self.last_toggle = now;
        self.half_cycles = 0;

        self.head.apply(phase.pattern());
        self.outputs = phase.pattern();
        info!("entered {}", phase);

        // Outputs first, then the report
        self.report(now);
    }

    /// Returns true once a steady phase has been held for `hold_ms`.
    fn hold_strict_phase(&self, hold_ms: u32, now: I) -> bool {
        now.duration_since(self.phase_start).as_millis() >= u64::from(hold_ms)
    }

    /// Toggles the blinking lamp when a half-cycle boundary has passed.
    ///
    /// Returns true once `half_cycles` periods have elapsed; unbounded blinks
    /// never complete.
    fn hold_blinking_phase(
        &mut self,
        lamp: Lamp,
        interval_ms: u32,
        half_cycles: Option<u32>,
        now: I,
    ) -> bool {
        if now.duration_since(self.last_toggle).as_millis() < u64::from(interval_ms) {
            return false;
        }

        self.half_cycles += 1;
        self.last_toggle = now;

        if half_cycles.is_some_and(|limit| self.half_cycles >= limit) {
            return true;
        }

        let lit = !self.outputs.is_lit(lamp);
        self.head.set_lamp(lamp, lit);
        self.outputs = self.outputs.with(lamp, lit);
        trace!("{} lamp {}", lamp, lit);
        false
    }

    fn until_phase_event(&self, now: I) -> I::Duration {
        match self.timing.phase_timing(self.phase) {
            PhaseTiming::Steady { hold_ms } => {
                time::remaining(hold_ms, now.duration_since(self.phase_start))
            }
            PhaseTiming::Blinking { interval_ms, .. } => {
                time::remaining(interval_ms, now.duration_since(self.last_toggle))
            }
        }
    }

    /// Re-reports the current phase when a heartbeat is due and folds the
    /// next heartbeat into the service delay.
    fn heartbeat(&mut self, now: I, until_event: I::Duration) -> I::Duration {
        let Some(heartbeat_ms) = self
            .reporting
            .as_ref()
            .map(|r| r.liveness.heartbeat_interval_ms)
        else {
            return until_event;
        };

        if now.duration_since(self.last_report).as_millis() >= u64::from(heartbeat_ms) {
            self.report(now);
        }

        let until_heartbeat = time::remaining(heartbeat_ms, now.duration_since(self.last_report));
        time::shorter(until_event, until_heartbeat)
    }

    fn report(&mut self, now: I) {
        let code = self.phase.code();
        let Some(reporting) = self.reporting.as_mut() else {
            return;
        };

        self.last_report = now;
        if reporting.reporter.transmit(code) {
            reporting.link.record_activity(now.as_millis());
            trace!("reported {=u8:#x}", code);
        } else {
            warn!("failed to report {=u8:#x}", code);
        }
    }

    fn link_ok(&self) -> bool {
        self.reporting.as_ref().is_none_or(|r| r.link.is_ok())
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the current state of the sequencer.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Returns true while blinking yellow because of a lost link.
    pub fn is_fault(&self) -> bool {
        self.state == SequencerState::Fault
    }

    /// Returns the pattern currently shown on the lamps.
    pub fn outputs(&self) -> LampPattern {
        self.outputs
    }

    /// Returns the time spent in the current phase.
    pub fn phase_elapsed(&self) -> I::Duration {
        self.time_source.now().duration_since(self.phase_start)
    }

    /// Returns true if this light reports its phases.
    pub fn is_reporting(&self) -> bool {
        self.reporting.is_some()
    }

    /// Returns the timing table in use.
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Returns a reference to the signal head.
    pub fn head(&self) -> &H {
        &self.head
    }
}
