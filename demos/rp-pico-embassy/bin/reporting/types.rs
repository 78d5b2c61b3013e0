use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::signal::Signal;
use traffic_sequencer::{
    GpioSignalHead, LinkEvent, LinkHealth, LivenessMonitor, SpiReporter, TrafficLight,
};

// Re-export the time types from the library
pub use rp_pico_embassy::time_wrapper::{EmbassyDuration, EmbassyInstant, EmbassyTimeSource};

/// Red, yellow and green lamps on push-pull GPIO
pub type Lamps = GpioSignalHead<Output<'static>, Output<'static>, Output<'static>>;

/// Transmit-only SPI0 with a GPIO chip select
pub type Reporter = SpiReporter<Spi<'static, SPI0, Blocking>, Output<'static>>;

pub type ReportingLight =
    TrafficLight<'static, EmbassyInstant, Lamps, EmbassyTimeSource, Reporter>;

pub type Monitor = LivenessMonitor<'static, EmbassyInstant, EmbassyTimeSource>;

pub static TIME_SOURCE: EmbassyTimeSource = EmbassyTimeSource::new();

/// Connection flag and activity stamp shared by both tasks
pub static LINK: LinkHealth = LinkHealth::new();

/// Signal from monitor_task to sequencer_task when the link status flips
pub static LINK_CHANGED: Signal<ThreadModeRawMutex, LinkEvent> = Signal::new();
