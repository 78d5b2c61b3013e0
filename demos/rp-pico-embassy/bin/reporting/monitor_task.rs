use defmt::info;
use embassy_time::Ticker;

use crate::types::{LINK_CHANGED, Monitor};

// ============================================================================
// Monitor Task
// ============================================================================

/// Polls the link liveness and wakes the sequencer on every status change.
#[embassy_executor::task]
pub async fn monitor_task(mut monitor: Monitor) {
    info!("Monitor task started");

    let mut ticker = Ticker::every(monitor.poll_interval().0);

    loop {
        ticker.next().await;

        if let Some(event) = monitor.poll() {
            LINK_CHANGED.signal(event);
        }
    }
}
