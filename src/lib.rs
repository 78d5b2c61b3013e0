#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Phase`**: One state of the light cycle, with its lamp pattern and wire code
//! - **`TimingConfig`**: Hold durations and blink parameters for every phase
//! - **`TrafficLight`**: Drives a signal head through the cycle, reports phases, handles faults
//! - **`SignalHead`**: Trait to implement for your lamp outputs
//! - **`StateReporter`**: Trait to implement for your reporting link
//! - **`LinkHealth`**: Shared "connection ok" flag and last-activity stamp
//! - **`LivenessMonitor`**: Timeout watchdog that flips the link status
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! The sequencer is non-blocking: `service()` returns how long to sleep until
//! something is due, so the same core runs under a blocking delay loop or an
//! async executor.

#[macro_use]
mod fmt;

pub mod config;
pub mod fallback;
pub mod lamps;
pub mod liveness;
pub mod phase;
pub mod report;
pub mod sequencer;
pub mod time;

pub use config::{ConfigError, LivenessConfig, PhaseTiming, TimingBuilder, TimingConfig, pins};
pub use fallback::{StartupError, blink_forever};
pub use lamps::{GpioSignalHead, SignalHead};
pub use liveness::{LinkEvent, LinkHealth, LivenessMonitor};
pub use phase::{Lamp, LampPattern, Phase, advance, decode_outputs_from_code};
pub use report::{NoReporter, SpiReporter, StateReporter};
pub use sequencer::{SequencerError, SequencerState, TrafficLight};
pub use time::{TimeDuration, TimeInstant, TimeSource};
