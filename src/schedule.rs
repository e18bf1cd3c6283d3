//! Periodic work and the set of alarms checked on every clock tick.

use crate::alarm::Alarm;
use crate::config::{NOT_SOON_SECONDS, SUNRISE_LEAD_SECS};
use crate::display_state::DisplayState;
use crate::lock::{LockTimeout, TimedMutex};
use crate::prefs::PreferenceStore;
use crate::time::{TimeDuration, TimeInstant, TimeSource, elapsed_at_least};
use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

/// Fixed-period trigger for polled work such as
/// [`LightController::advance`](crate::LightController::advance).
///
/// The first poll is always due. After that a poll is due once a full period
/// has passed since the last due poll.
#[derive(Debug, Clone, Copy)]
pub struct Cadence<I: TimeInstant> {
    period_ms: u64,
    last_run: Option<I>,
}

impl<I: TimeInstant> Cadence<I> {
    pub fn new(period: I::Duration) -> Self {
        Self {
            period_ms: period.as_millis(),
            last_run: None,
        }
    }

    /// Returns true, and starts a new period, if the work should run at `now`.
    pub fn is_due(&mut self, now: I) -> bool {
        let due = match self.last_run {
            None => true,
            Some(last) => elapsed_at_least(now, last, self.period_ms),
        };
        if due {
            self.last_run = Some(now);
        }
        due
    }

    /// Makes the next poll due immediately.
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}

/// Schedule operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScheduleError {
    /// No room for another alarm.
    Full,
}

impl core::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScheduleError::Full => write!(f, "alarm schedule is full"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScheduleError {}

/// Up to `N` alarms, checked together on each wall-clock tick.
///
/// The ringing alarm is reported through [`DisplayState`] as its index plus
/// one, so only the first 255 alarms can ring.
#[derive(Debug, Clone)]
pub struct AlarmSchedule<const N: usize> {
    alarms: Vec<Alarm, N>,
    /// Epoch minute of each alarm's last trigger, by index.
    fired: Vec<Option<i64>, N>,
}

impl<const N: usize> AlarmSchedule<N> {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self {
            alarms: Vec::new(),
            fired: Vec::new(),
        }
    }

    /// Adds an alarm and returns its index.
    pub fn push(&mut self, alarm: Alarm) -> Result<usize, ScheduleError> {
        self.alarms.push(alarm).map_err(|_| ScheduleError::Full)?;
        // Same capacity as `alarms`, so this cannot fail once the alarm fit.
        let _ = self.fired.push(None);
        Ok(self.alarms.len() - 1)
    }

    /// Alarm at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Alarm> {
        self.alarms.get(index)
    }

    /// Mutable alarm at `index`, e.g. to snooze or edit it.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Alarm> {
        self.alarms.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    /// Number of alarms in the schedule.
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Index of the first alarm that should be ringing at `now`.
    pub fn ringing(&self, now: &NaiveDateTime) -> Option<usize> {
        self.alarms.iter().position(|alarm| alarm.should_ring(now))
    }

    /// Checks the alarms for the current wall-clock time.
    ///
    /// When an alarm starts ringing and no other alarm is already ringing,
    /// its index plus one is stored in `state` and the index is returned.
    /// Each alarm fires at most once per minute, so dismissing it within the
    /// trigger minute does not start it again. Another alarm set for the same
    /// minute rings on the next tick.
    pub fn tick(&mut self, now: &NaiveDateTime, state: &DisplayState) -> Option<usize> {
        if state.alarm_ringing() != 0 {
            return None;
        }

        let minute = now.and_utc().timestamp().div_euclid(60);
        let index = self
            .alarms
            .iter()
            .zip(self.fired.iter())
            .position(|(alarm, fired)| *fired != Some(minute) && alarm.should_ring(now))?;

        let Ok(marker) = u8::try_from(index + 1) else {
            warn!("alarm {} cannot be reported as ringing", self.alarms[index].id());
            return None;
        };

        self.fired[index] = Some(minute);
        state.set_alarm_ringing(marker);
        info!("alarm {} ringing", self.alarms[index].id());
        Some(index)
    }

    /// The active alarm due soonest within the next two days, with the
    /// seconds remaining.
    pub fn next_due(&self, now: &NaiveDateTime) -> Option<(usize, u32)> {
        self.alarms
            .iter()
            .enumerate()
            .filter(|(_, alarm)| alarm.is_active())
            .map(|(index, alarm)| (index, alarm.seconds_until(now)))
            .filter(|(_, seconds)| *seconds != NOT_SOON_SECONDS)
            .min_by_key(|(_, seconds)| *seconds)
    }

    /// How far along the sunrise ramp is, from 0.0 to 1.0, for the soonest
    /// active alarm with sunrise enabled. `None` outside the ramp window.
    pub fn sunrise_progress(&self, now: &NaiveDateTime) -> Option<f32> {
        let remaining = self
            .alarms
            .iter()
            .filter(|alarm| alarm.is_active() && alarm.is_sunrise_enabled())
            .map(|alarm| alarm.seconds_until(now))
            .filter(|seconds| *seconds <= SUNRISE_LEAD_SECS)
            .min()?;

        Some(1.0 - remaining as f32 / SUNRISE_LEAD_SECS as f32)
    }

    /// Persists every alarm. All alarms are attempted; the first lock
    /// timeout, if any, is returned.
    pub fn persist_all<M, S, I, C>(
        &self,
        bus: &TimedMutex<M, S>,
        clock: &C,
    ) -> Result<(), LockTimeout>
    where
        M: RawMutex,
        S: PreferenceStore,
        I: TimeInstant,
        C: TimeSource<I>,
    {
        self.alarms
            .iter()
            .map(|alarm| alarm.persist(bus, clock))
            .fold(Ok(()), |first, result| first.and(result))
    }
}

impl<const N: usize> Default for AlarmSchedule<N> {
    fn default() -> Self {
        Self::new()
    }
}
