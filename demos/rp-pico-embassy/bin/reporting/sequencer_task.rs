use defmt::{debug, error, info};
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use traffic_sequencer::{SequencerError, TimingConfig};

use crate::types::{EmbassyDuration, LINK_CHANGED, ReportingLight};

// ============================================================================
// Sequencer Task
// ============================================================================

#[embassy_executor::task]
pub async fn sequencer_task(light: &'static mut ReportingLight) {
    info!("Sequencer task started");

    let mut next_service_delay = delay_or_retry(light.start());

    loop {
        // Sleep until the light asks for service, or until the link flips
        match select(LINK_CHANGED.wait(), Timer::after(next_service_delay)).await {
            Either::First(event) => {
                debug!("Woken by {}", event);
            }
            Either::Second(_) => {}
        }

        next_service_delay = delay_or_retry(light.service());
    }
}

/// Unwraps the delay the light asked for.
///
/// Errors come from calling the light out of order or from a config rejected
/// at start. They are logged and retried at the fault blink rate.
fn delay_or_retry(result: Result<EmbassyDuration, SequencerError>) -> Duration {
    match result {
        Ok(delay) => delay.0,
        Err(e) => {
            error!("Sequencer error: {}", e);
            Duration::from_millis(u64::from(
                TimingConfig::REPORTING.fault_blink_interval_ms,
            ))
        }
    }
}
