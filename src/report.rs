//! Reporting of the current phase over a synchronous serial link.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Trait for abstracting the phase reporting channel.
pub trait StateReporter {
    /// Sends one phase code.
    ///
    /// Returns `true` when the byte was handed to the peer. Only successful
    /// transmissions count as link activity.
    fn transmit(&mut self, code: u8) -> bool;
}

impl<R: StateReporter + ?Sized> StateReporter for &mut R {
    fn transmit(&mut self, code: u8) -> bool {
        (**self).transmit(code)
    }
}

/// Reporter for lights without a reporting link.
///
/// Never called by a light built without reporting; transmitting through it
/// always fails so it can never fake link activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporter;

impl StateReporter for NoReporter {
    fn transmit(&mut self, _code: u8) -> bool {
        false
    }
}

/// Reporter that frames each code with a GPIO-driven chip select.
///
/// Every transmission asserts chip select (low), clocks out exactly one byte,
/// waits for the bus to drain and deasserts chip select (high).
pub struct SpiReporter<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI: SpiBus<u8>, CS: OutputPin> SpiReporter<SPI, CS> {
    /// Takes ownership of the bus and chip select and deselects the peer.
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        if cs.set_high().is_err() {
            warn!("failed to deselect reporting peer");
        }
        Self { spi, cs }
    }

    /// Releases the bus and chip select.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI: SpiBus<u8>, CS: OutputPin> StateReporter for SpiReporter<SPI, CS> {
    fn transmit(&mut self, code: u8) -> bool {
        if self.cs.set_low().is_err() {
            return false;
        }

        let sent = self.spi.write(&[code]).and_then(|()| self.spi.flush()).is_ok();

        // Always release the peer, even after a failed write
        let released = self.cs.set_high().is_ok();

        sent && released
    }
}
