//! Time abstraction traits for platform-agnostic timing.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Saturating subtraction (returns ZERO on underflow).
    fn saturating_sub(self, other: Self) -> Self;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Milliseconds since the time source's epoch.
    ///
    /// Only differences between two stamps are ever used, so the epoch itself
    /// does not matter.
    fn as_millis(&self) -> u64;
}

/// Returns whichever of two durations is shorter.
#[inline]
pub(crate) fn shorter<D: TimeDuration>(a: D, b: D) -> D {
    if b.as_millis() < a.as_millis() { b } else { a }
}

/// Time left of a `total_ms` window that began `elapsed` ago.
#[inline]
pub(crate) fn remaining<D: TimeDuration>(total_ms: u32, elapsed: D) -> D {
    D::from_millis(u64::from(total_ms)).saturating_sub(elapsed)
}
