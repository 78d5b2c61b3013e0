//! Link liveness watchdog.
//!
//! [`LinkHealth`] is the only state shared between the sequencer and the
//! monitor. It holds two scalars, each in its own atomic:
//!
//! - the "connection ok" flag, written only by [`LivenessMonitor`] and read by
//!   the sequencer before and during every phase
//! - the last-activity stamp, written by the sequencer after every successful
//!   transmission and read by the monitor
//!
//! Only plain loads and stores are used, so this also works on cores without
//! compare-and-swap (e.g. Cortex-M0+).

use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::LivenessConfig;
use crate::time::{TimeDuration, TimeInstant, TimeSource};

/// Shared link status.
///
/// Lives for the whole program; usually placed in a `static`.
#[derive(Debug)]
pub struct LinkHealth {
    connection_ok: AtomicBool,
    last_activity_ms: AtomicU32,
}

impl LinkHealth {
    /// Creates a healthy link with an activity stamp at the epoch.
    pub const fn new() -> Self {
        Self {
            connection_ok: AtomicBool::new(true),
            last_activity_ms: AtomicU32::new(0),
        }
    }

    /// Returns the monitor's latest verdict.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.connection_ok.load(Ordering::Acquire)
    }

    /// Records a successful transmission at `now_ms`.
    #[inline]
    pub fn record_activity(&self, now_ms: u64) {
        // Stamps are compared with wrapping arithmetic, truncation is fine
        self.last_activity_ms.store(now_ms as u32, Ordering::Relaxed);
    }

    /// Low 32 bits of the millisecond stamp of the last successful transmission.
    #[inline]
    pub fn last_activity_ms(&self) -> u32 {
        self.last_activity_ms.load(Ordering::Relaxed)
    }

    /// Milliseconds of silence as seen at `now_ms`.
    ///
    /// A stamp ahead of `now_ms` (recorded after the caller read its clock)
    /// counts as no silence at all.
    #[inline]
    pub fn silence_ms(&self, now_ms: u64) -> u32 {
        let silent = (now_ms as u32).wrapping_sub(self.last_activity_ms());
        if silent > u32::MAX / 2 { 0 } else { silent }
    }

    pub(crate) fn set_ok(&self, ok: bool) {
        self.connection_ok.store(ok, Ordering::Release);
    }
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// One-time notification of a change in link status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// The link has been silent for longer than the threshold.
    Lost { silent_ms: u32 },

    /// Activity is back within the threshold.
    Restored { silent_ms: u32 },
}

/// Timeout watchdog over the reporting link.
///
/// Call [`poll`](Self::poll) every [`poll_interval`](Self::poll_interval).
/// A poll classifies the link as lost when the silence is strictly greater
/// than the threshold and as alive otherwise. There is no hysteresis; a link
/// hovering around the threshold flaps.
///
/// # Type Parameters
/// * `'t` - Lifetime of the shared link status and time source references
/// * `I` - Time instant type
/// * `T` - Time source implementation type
pub struct LivenessMonitor<'t, I: TimeInstant, T: TimeSource<I>> {
    link: &'t LinkHealth,
    time_source: &'t T,
    config: LivenessConfig,
    _instant: PhantomData<I>,
}

impl<'t, I: TimeInstant, T: TimeSource<I>> LivenessMonitor<'t, I, T> {
    /// Creates a monitor and marks the link healthy as of now.
    pub fn new(link: &'t LinkHealth, time_source: &'t T, config: LivenessConfig) -> Self {
        link.record_activity(time_source.now().as_millis());
        link.set_ok(true);

        Self {
            link,
            time_source,
            config,
            _instant: PhantomData,
        }
    }

    /// Compares the activity stamp with the current time.
    ///
    /// # Returns
    /// * `Some(event)` - The link status flipped during this poll
    /// * `None` - Status unchanged
    pub fn poll(&mut self) -> Option<LinkEvent> {
        let now_ms = self.time_source.now().as_millis();
        self.check_at(now_ms)
    }

    /// Performs one poll as if the clock read `now_ms`.
    pub fn check_at(&mut self, now_ms: u64) -> Option<LinkEvent> {
        let silent_ms = self.link.silence_ms(now_ms);
        let alive = silent_ms <= self.config.threshold_ms;

        match (self.link.is_ok(), alive) {
            (true, false) => {
                warn!(
                    "link lost: no activity for {} ms (limit {} ms)",
                    silent_ms, self.config.threshold_ms
                );
                self.link.set_ok(false);
                Some(LinkEvent::Lost { silent_ms })
            }
            (false, true) => {
                info!("link restored");
                self.link.set_ok(true);
                Some(LinkEvent::Restored { silent_ms })
            }
            _ => None,
        }
    }

    /// How long to wait between polls.
    pub fn poll_interval(&self) -> I::Duration {
        I::Duration::from_millis(u64::from(self.config.poll_interval_ms))
    }

    /// Returns the shared link status.
    pub fn link(&self) -> &'t LinkHealth {
        self.link
    }

    /// Returns the configured thresholds.
    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }
}
