//! Lamp output abstraction and a GPIO implementation.

use crate::phase::{Lamp, LampPattern};
use embedded_hal::digital::OutputPin;

/// Trait for abstracting the three lamp outputs of a signal head.
///
/// Implement this for your output hardware (GPIO, shift register, relay board)
/// so the sequencer can drive it.
pub trait SignalHead {
    /// Switches one lamp on or off.
    ///
    /// Handle any hardware errors internally - this method cannot fail.
    fn set_lamp(&mut self, lamp: Lamp, on: bool);

    /// Shows a whole pattern.
    ///
    /// Lamps that go dark are switched before lamps that light up, so two
    /// phases never show at the same time.
    fn apply(&mut self, pattern: LampPattern) {
        for lamp in [Lamp::Red, Lamp::Yellow, Lamp::Green] {
            if !pattern.is_lit(lamp) {
                self.set_lamp(lamp, false);
            }
        }
        for lamp in [Lamp::Red, Lamp::Yellow, Lamp::Green] {
            if pattern.is_lit(lamp) {
                self.set_lamp(lamp, true);
            }
        }
    }
}

impl<H: SignalHead + ?Sized> SignalHead for &mut H {
    fn set_lamp(&mut self, lamp: Lamp, on: bool) {
        (**self).set_lamp(lamp, on);
    }
}

/// Signal head wired to three push-pull output pins, lamp lit when high.
pub struct GpioSignalHead<R, Y, G> {
    red: R,
    yellow: Y,
    green: G,
}

impl<R: OutputPin, Y: OutputPin, G: OutputPin> GpioSignalHead<R, Y, G> {
    /// Takes ownership of the pins and switches every lamp off.
    pub fn new(red: R, yellow: Y, green: G) -> Self {
        let mut head = Self { red, yellow, green };
        head.apply(LampPattern::DARK);
        head
    }

    /// Releases the pins.
    pub fn release(self) -> (R, Y, G) {
        (self.red, self.yellow, self.green)
    }
}

impl<R: OutputPin, Y: OutputPin, G: OutputPin> SignalHead for GpioSignalHead<R, Y, G> {
    fn set_lamp(&mut self, lamp: Lamp, on: bool) {
        let result = match lamp {
            Lamp::Red => self.red.set_state(on.into()).map_err(|_| ()),
            Lamp::Yellow => self.yellow.set_state(on.into()).map_err(|_| ()),
            Lamp::Green => self.green.set_state(on.into()).map_err(|_| ()),
        };
        if result.is_err() {
            warn!("failed to drive {} lamp", lamp);
        }
    }
}
