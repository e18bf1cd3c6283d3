//! Bounded-wait scoped locking for shared hardware.
//!
//! The preference store and the LED strip live behind one [`TimedMutex`];
//! each sprite and the display have their own. Callers never block
//! indefinitely: an acquisition that does not succeed within its timeout is
//! abandoned and reported as [`LockTimeout`].

use crate::time::{TimeDuration, TimeInstant, TimeSource, elapsed_at_least};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

/// A lock could not be acquired within its bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LockTimeout {
    /// The wait that expired, in milliseconds.
    pub waited_ms: u64,
}

impl core::fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "lock not acquired within {} ms", self.waited_ms)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LockTimeout {}

/// Mutex whose only blocking acquisition is bounded by a timeout.
///
/// The protected value is reached through a closure, so the lock is released
/// on every exit path of the caller.
pub struct TimedMutex<M: RawMutex, T> {
    inner: Mutex<M, T>,
}

impl<M: RawMutex, T> TimedMutex<M, T> {
    /// Wraps `value` in a new unlocked mutex.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with exclusive access, waiting at most `timeout` for the lock.
    ///
    /// The lock is polled until it becomes free or `clock` reports that the
    /// timeout has passed. At least one attempt is made even with a zero
    /// timeout.
    pub fn lock_within<I, C, R>(
        &self,
        clock: &C,
        timeout: I::Duration,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, LockTimeout>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        let start = clock.now();
        let limit = timeout.as_millis();
        loop {
            if let Ok(mut guard) = self.inner.try_lock() {
                return Ok(f(&mut *guard));
            }
            if elapsed_at_least(clock.now(), start, limit) {
                return Err(LockTimeout { waited_ms: limit });
            }
            core::hint::spin_loop();
        }
    }

    /// Same as [`lock_within`](Self::lock_within) with the timeout in milliseconds.
    pub fn lock_within_ms<I, C, R>(
        &self,
        clock: &C,
        timeout_ms: u64,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, LockTimeout>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        self.lock_within(clock, I::Duration::from_millis(timeout_ms), f)
    }

    /// Direct access while the mutex is exclusively borrowed, e.g. while
    /// loading preferences at startup before any other task holds a reference.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}
