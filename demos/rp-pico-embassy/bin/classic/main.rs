//! Plain traffic light without a reporting link, 4 s per phase.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::Delay;
use rp_pico_embassy::time_wrapper::{EmbassyInstant, EmbassyTimeSource};
use traffic_sequencer::{GpioSignalHead, TimingConfig, TrafficLight, pins};
use {defmt_rtt as _, panic_probe as _};

static TIME_SOURCE: EmbassyTimeSource = EmbassyTimeSource::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Starting...");

    let p = embassy_rp::init(Default::default());
    info!(
        "Lamps on GPIO {}/{}/{}",
        pins::RED,
        pins::YELLOW,
        pins::GREEN
    );

    let lamps = GpioSignalHead::new(
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_4, Level::Low),
    );
    let mut light =
        TrafficLight::<EmbassyInstant, _, _>::new(lamps, &TIME_SOURCE, TimingConfig::CLASSIC);

    info!("Ready!");

    // Nothing else runs on this board, so the light may own the core
    light.run(&mut Delay);
}
