//! Reporting traffic light: cycles the lamps, reports every phase over SPI0
//! and blinks yellow while the reporting link is silent.

#![no_std]
#![no_main]

use core::future::pending;
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::Peripherals;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::{self, Spi};
use embassy_time::Delay;
use static_cell::StaticCell;
use traffic_sequencer::{
    GpioSignalHead, LivenessConfig, LivenessMonitor, SpiReporter, StartupError, TimingConfig,
    TrafficLight, blink_forever, pins,
};
use {defmt_rtt as _, panic_probe as _};

mod monitor_task;
mod sequencer_task;
mod types;

use monitor_task::monitor_task;
use sequencer_task::sequencer_task;
use types::{LINK, Lamps, Reporter, ReportingLight, TIME_SOURCE};

static LIGHT: StaticCell<ReportingLight> = StaticCell::new();

/// Initialize the lamp outputs (GPIO 2, 3, 4), all dark
fn setup_lamps(p: &mut Peripherals) -> Lamps {
    let red = unsafe { p.PIN_2.clone_unchecked() };
    let yellow = unsafe { p.PIN_3.clone_unchecked() };
    let green = unsafe { p.PIN_4.clone_unchecked() };

    GpioSignalHead::new(
        Output::new(red, Level::Low),
        Output::new(yellow, Level::Low),
        Output::new(green, Level::Low),
    )
}

/// Initialize the reporting link (SPI0: SCK 18, MOSI 19, CS 17)
fn setup_reporter(p: &mut Peripherals) -> Reporter {
    let spi0 = unsafe { p.SPI0.clone_unchecked() };
    let sck = unsafe { p.PIN_18.clone_unchecked() };
    let mosi = unsafe { p.PIN_19.clone_unchecked() };
    let cs = unsafe { p.PIN_17.clone_unchecked() };

    let mut config = spi::Config::default();
    config.frequency = pins::SPI_FREQUENCY_HZ;

    let spi = Spi::new_blocking_txonly(spi0, sck, mosi, config);
    SpiReporter::new(spi, Output::new(cs, Level::High))
}

fn start(spawner: &Spawner, p: &mut Peripherals) -> Result<(), StartupError> {
    let liveness = LivenessConfig::DEFAULT;

    // Stamps the link as alive before the first report goes out
    let monitor = LivenessMonitor::new(&LINK, &TIME_SOURCE, liveness);

    let light = TrafficLight::with_reporting(
        setup_lamps(p),
        setup_reporter(p),
        &LINK,
        &TIME_SOURCE,
        TimingConfig::REPORTING,
        liveness,
    );
    let light = LIGHT
        .try_init(light)
        .ok_or(StartupError::ResourceAllocation("light"))?;

    spawner
        .spawn(monitor_task(monitor))
        .map_err(|_| StartupError::TaskSpawn("monitor"))?;
    spawner
        .spawn(sequencer_task(light))
        .map_err(|_| StartupError::TaskSpawn("sequencer"))?;

    Ok(())
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting...");

    let mut p = embassy_rp::init(Default::default());
    info!(
        "Lamps on GPIO {}/{}/{}, report link on CS {} SCK {} MOSI {} at {} Hz",
        pins::RED,
        pins::YELLOW,
        pins::GREEN,
        pins::SPI_CS,
        pins::SPI_SCK,
        pins::SPI_MOSI,
        pins::SPI_FREQUENCY_HZ
    );

    if let Err(e) = start(&spawner, &mut p) {
        error!("Startup failed: {}", e);
        if !e.falls_back_to_blink() {
            defmt::panic!("Aborting startup");
        }

        let mut lamps = setup_lamps(&mut p);
        blink_forever(
            &mut lamps,
            &mut Delay,
            TimingConfig::REPORTING.fault_blink_interval_ms,
        );
    }

    info!("Ready!");

    // Main task has no more work to do - all logic is in spawned tasks
    pending::<()>().await;
}
