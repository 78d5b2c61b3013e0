//! Terminal fail-safe for startup failures.
//!
//! A traffic light must never go dark or freeze on a single colour. When the
//! light cannot be brought up at all it blinks yellow for the rest of its life.

use embedded_hal::delay::DelayNs;

use crate::lamps::SignalHead;
use crate::phase::{Lamp, Phase};

/// Failures while bringing the light up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupError {
    /// A static resource (queue, cell, peripheral) could not be claimed.
    ///
    /// Startup is aborted; running with a missing resource is undefined.
    ResourceAllocation(&'static str),

    /// A task could not be handed to the scheduler.
    ///
    /// The light falls back to [`blink_forever`].
    TaskSpawn(&'static str),
}

impl StartupError {
    /// Returns true if the light should fall back to blinking yellow rather
    /// than abort.
    pub fn falls_back_to_blink(&self) -> bool {
        matches!(self, StartupError::TaskSpawn(_))
    }
}

impl core::fmt::Display for StartupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StartupError::ResourceAllocation(name) => {
                write!(f, "could not allocate {}", name)
            }
            StartupError::TaskSpawn(name) => {
                write!(f, "could not spawn task {}", name)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StartupError {}

/// Blinks yellow with everything else dark, forever.
///
/// No further state transitions happen once this is called.
pub fn blink_forever<H: SignalHead, D: DelayNs>(head: &mut H, delay: &mut D, interval_ms: u32) -> ! {
    error!("entering terminal fail-safe blink");
    head.apply(Phase::YellowBlinking.pattern());

    let mut lit = true;
    loop {
        delay.delay_ms(interval_ms);
        lit = !lit;
        head.set_lamp(Lamp::Yellow, lit);
    }
}
