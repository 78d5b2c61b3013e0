//! Pin assignments, timing tables and liveness thresholds.
//!
//! All durations are in milliseconds and form the external timing contract of
//! the light, so they are kept as exact integers rather than converted up front.

use crate::phase::{Lamp, Phase};

/// Board pin assignments (RP2040 GPIO numbers).
pub mod pins {
    /// Red lamp output.
    pub const RED: u8 = 2;
    /// Yellow lamp output.
    pub const YELLOW: u8 = 3;
    /// Green lamp output.
    pub const GREEN: u8 = 4;
    /// Reporting link chip select (active low).
    pub const SPI_CS: u8 = 17;
    /// Reporting link clock.
    pub const SPI_SCK: u8 = 18;
    /// Reporting link data out.
    pub const SPI_MOSI: u8 = 19;
    /// Reporting link clock rate.
    pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A steady phase was given a zero hold.
    ZeroHold(Phase),

    /// A blink interval of zero.
    ZeroBlinkInterval(Phase),

    /// The green blink phase would not blink at all.
    ZeroBlinkCycles,

    /// A liveness poll or heartbeat interval of zero.
    ZeroInterval,

    /// A liveness threshold of zero.
    ZeroThreshold,

    /// Heartbeats would arrive slower than the link is allowed to stay silent.
    HeartbeatExceedsThreshold { heartbeat_ms: u32, threshold_ms: u32 },

    /// The green blink phase or the whole cycle does not fit in `u32` milliseconds.
    DurationOverflow,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroHold(phase) => {
                write!(f, "steady phase {:?} must have a non-zero hold", phase)
            }
            ConfigError::ZeroBlinkInterval(phase) => {
                write!(f, "blinking phase {:?} must have a non-zero interval", phase)
            }
            ConfigError::ZeroBlinkCycles => {
                write!(f, "green blinking must run at least one on/off cycle")
            }
            ConfigError::ZeroInterval => {
                write!(f, "liveness poll and heartbeat intervals must be non-zero")
            }
            ConfigError::ZeroThreshold => {
                write!(f, "liveness threshold must be non-zero")
            }
            ConfigError::HeartbeatExceedsThreshold {
                heartbeat_ms,
                threshold_ms,
            } => {
                write!(
                    f,
                    "heartbeat every {} ms can never satisfy a {} ms liveness threshold",
                    heartbeat_ms, threshold_ms
                )
            }
            ConfigError::DurationOverflow => {
                write!(f, "cycle duration does not fit in u32 milliseconds")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// How a single phase spends its time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseTiming {
    /// Show the entry pattern unchanged for `hold_ms`.
    Steady { hold_ms: u32 },

    /// Toggle `lamp` every `interval_ms`. The phase ends after `half_cycles`
    /// toggle periods, or never when `None`.
    Blinking {
        lamp: Lamp,
        interval_ms: u32,
        half_cycles: Option<u32>,
    },
}

/// Hold durations and blink parameters for every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    pub red_ms: u32,
    pub red_yellow_ms: u32,
    pub green_ms: u32,
    pub yellow_ms: u32,

    /// Length of each on and each off half of a green blink.
    pub green_blink_interval_ms: u32,

    /// Number of on/off pairs before the cycle moves on to yellow.
    pub green_blink_cycles: u32,

    /// Half-cycle of the fault blink. The fault blink has no total duration.
    pub fault_blink_interval_ms: u32,
}

impl TimingConfig {
    /// Timing of the plain (non-reporting) light: 4 s per steady phase and a
    /// 4 x 1 s green blink.
    pub const CLASSIC: Self = Self {
        red_ms: 4000,
        red_yellow_ms: 4000,
        green_ms: 4000,
        yellow_ms: 4000,
        green_blink_interval_ms: 500,
        green_blink_cycles: 4,
        fault_blink_interval_ms: 500,
    };

    /// Timing of the reporting light: short red-yellow and yellow phases and a
    /// 1 s green blink at 250 ms.
    pub const REPORTING: Self = Self {
        red_ms: 3000,
        red_yellow_ms: 1000,
        green_ms: 3000,
        yellow_ms: 1000,
        green_blink_interval_ms: 250,
        green_blink_cycles: 2,
        fault_blink_interval_ms: 250,
    };

    /// Creates a builder starting from [`TimingConfig::CLASSIC`].
    pub fn builder() -> TimingBuilder {
        TimingBuilder::new(Self::CLASSIC)
    }

    /// How `phase` is held: a steady hold or a blink.
    pub const fn phase_timing(&self, phase: Phase) -> PhaseTiming {
        match phase {
            Phase::Red => PhaseTiming::Steady { hold_ms: self.red_ms },
            Phase::RedYellow => PhaseTiming::Steady {
                hold_ms: self.red_yellow_ms,
            },
            Phase::Green => PhaseTiming::Steady {
                hold_ms: self.green_ms,
            },
            Phase::Yellow => PhaseTiming::Steady {
                hold_ms: self.yellow_ms,
            },
            Phase::GreenBlinking => PhaseTiming::Blinking {
                lamp: Lamp::Green,
                interval_ms: self.green_blink_interval_ms,
                half_cycles: Some(self.green_blink_cycles.saturating_mul(2)),
            },
            Phase::YellowBlinking => PhaseTiming::Blinking {
                lamp: Lamp::Yellow,
                interval_ms: self.fault_blink_interval_ms,
                half_cycles: None,
            },
        }
    }

    /// Steady hold for `phase`, or `None` for blinking phases.
    pub const fn hold_ms(&self, phase: Phase) -> Option<u32> {
        match self.phase_timing(phase) {
            PhaseTiming::Steady { hold_ms } => Some(hold_ms),
            PhaseTiming::Blinking { .. } => None,
        }
    }

    /// Half-cycle toggle interval for blinking phases.
    pub const fn blink_interval_ms(&self, phase: Phase) -> Option<u32> {
        match self.phase_timing(phase) {
            PhaseTiming::Blinking { interval_ms, .. } => Some(interval_ms),
            PhaseTiming::Steady { .. } => None,
        }
    }

    /// Number of half-cycles after which a blinking phase ends.
    ///
    /// `None` means the phase blinks until something else ends it.
    pub const fn blink_half_cycles(&self, phase: Phase) -> Option<u32> {
        match self.phase_timing(phase) {
            PhaseTiming::Blinking { half_cycles, .. } => half_cycles,
            PhaseTiming::Steady { .. } => None,
        }
    }

    /// Total duration of the green blink phase, saturating at `u32::MAX`.
    pub const fn green_blink_total_ms(&self) -> u32 {
        self.green_blink_cycles
            .saturating_mul(2)
            .saturating_mul(self.green_blink_interval_ms)
    }

    /// Duration of one full revolution of the normal cycle, saturating at `u32::MAX`.
    ///
    /// A validated config never saturates.
    pub const fn cycle_ms(&self) -> u32 {
        self.red_ms
            .saturating_add(self.red_yellow_ms)
            .saturating_add(self.green_ms)
            .saturating_add(self.green_blink_total_ms())
            .saturating_add(self.yellow_ms)
    }

    fn checked_cycle_ms(&self) -> Option<u32> {
        let blink = self
            .green_blink_cycles
            .checked_mul(2)?
            .checked_mul(self.green_blink_interval_ms)?;
        self.red_ms
            .checked_add(self.red_yellow_ms)?
            .checked_add(self.green_ms)?
            .checked_add(blink)?
            .checked_add(self.yellow_ms)
    }

    /// Checks that every phase can actually be held and blinked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for phase in Phase::CYCLE {
            if self.hold_ms(phase) == Some(0) {
                return Err(ConfigError::ZeroHold(phase));
            }
        }

        for phase in [Phase::GreenBlinking, Phase::YellowBlinking] {
            if self.blink_interval_ms(phase) == Some(0) {
                return Err(ConfigError::ZeroBlinkInterval(phase));
            }
        }

        if self.green_blink_cycles == 0 {
            return Err(ConfigError::ZeroBlinkCycles);
        }

        if self.checked_cycle_ms().is_none() {
            return Err(ConfigError::DurationOverflow);
        }

        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Builder for validated [`TimingConfig`]s.
#[derive(Debug)]
pub struct TimingBuilder {
    config: TimingConfig,
}

impl TimingBuilder {
    /// Starts from an existing table.
    pub fn new(base: TimingConfig) -> Self {
        Self { config: base }
    }

    /// Sets the steady hold of a non-blinking phase.
    ///
    /// Blinking phases are ignored here; use [`green_blink`](Self::green_blink)
    /// and [`fault_blink_interval`](Self::fault_blink_interval).
    pub fn hold(mut self, phase: Phase, millis: u32) -> Self {
        match phase {
            Phase::Red => self.config.red_ms = millis,
            Phase::RedYellow => self.config.red_yellow_ms = millis,
            Phase::Green => self.config.green_ms = millis,
            Phase::Yellow => self.config.yellow_ms = millis,
            Phase::GreenBlinking | Phase::YellowBlinking => {}
        }
        self
    }

    /// Sets the green blink interval and how many on/off pairs it shows.
    pub fn green_blink(mut self, interval_ms: u32, cycles: u32) -> Self {
        self.config.green_blink_interval_ms = interval_ms;
        self.config.green_blink_cycles = cycles;
        self
    }

    /// Sets the half-cycle of the fault blink.
    pub fn fault_blink_interval(mut self, interval_ms: u32) -> Self {
        self.config.fault_blink_interval_ms = interval_ms;
        self
    }

    /// Builds and validates the table.
    ///
    /// # Errors
    /// * `ZeroHold` - A steady phase has a zero hold
    /// * `ZeroBlinkInterval` - A blinking phase has a zero interval
    /// * `ZeroBlinkCycles` - Green blinking has no cycles
    pub fn build(self) -> Result<TimingConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Parameters of the link liveness watchdog and the heartbeat that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LivenessConfig {
    /// How often the monitor compares the activity stamp with the clock.
    pub poll_interval_ms: u32,

    /// Longest silence still classified as a live link (inclusive).
    pub threshold_ms: u32,

    /// How often the sequencer re-reports its current phase.
    pub heartbeat_interval_ms: u32,
}

impl LivenessConfig {
    pub const DEFAULT: Self = Self {
        poll_interval_ms: 10,
        threshold_ms: 60,
        heartbeat_interval_ms: 20,
    };

    /// Checks the intervals against each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.threshold_ms == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if self.heartbeat_interval_ms > self.threshold_ms {
            return Err(ConfigError::HeartbeatExceedsThreshold {
                heartbeat_ms: self.heartbeat_interval_ms,
                threshold_ms: self.threshold_ms,
            });
        }
        Ok(())
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
