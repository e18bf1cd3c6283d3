//! Monotonic time abstraction for bounded waits and light cadences.
//!
//! Wall-clock time (hour, minute, weekday) used by alarms is a separate concern
//! and comes in as `chrono::NaiveDateTime`.

/// Trait for abstracting monotonic time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

/// Returns true once at least `limit_ms` milliseconds separate `earlier` and `now`.
#[inline]
pub(crate) fn elapsed_at_least<I: TimeInstant>(now: I, earlier: I, limit_ms: u64) -> bool {
    now.duration_since(earlier).as_millis() >= limit_ms
}
