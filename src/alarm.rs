//! A single alarm: schedule, snooze state, trigger test and display strings.
//!
//! Hours run from 1 to 24, where 24 is midnight and 12 is noon. The weekday
//! set and the active flag share one byte, which is also the persisted form.

use crate::config::{NOT_SOON_SECONDS, SNOOZE_MINUTES, timeouts};
use crate::lock::{LockTimeout, TimedMutex};
use crate::prefs::{PrefKey, PreferenceStore, compose_key};
use crate::time::{TimeInstant, TimeSource};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use core::fmt::Write;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

/// Longest accepted alarm id, in bytes.
pub const MAX_ID_LEN: usize = 9;

/// Number of weekday bits in the day mask.
pub const DAYS_PER_WEEK: usize = 7;

/// Day mask with every weekday set and the alarm inactive.
pub const ALL_DAYS: u8 = 0x7F;

const ACTIVE: u8 = 1 << 7;

const DAY_CODES: [&str; DAYS_PER_WEEK] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

const DEFAULT_HOUR: i8 = 12;
const DEFAULT_MINUTE: i8 = 0;

const MAX_HOUR_DELTA: i32 = 12;
const MAX_MINUTE_DELTA: i32 = 30;

const SECONDS_PER_DAY: i32 = 24 * 3600;

/// Alarm validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Alarm id longer than [`MAX_ID_LEN`].
    IdTooLong {
        /// Length of the rejected id.
        len: usize,
    },

    /// Time adjustment larger than the allowed step.
    DeltaOutOfRange {
        /// Requested change.
        delta: i32,
        /// Largest accepted magnitude.
        limit: i32,
    },

    /// Day list did not contain exactly seven entries.
    InvalidDayCount(usize),
}

impl core::fmt::Display for AlarmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AlarmError::IdTooLong { len } => {
                write!(f, "alarm id is {} bytes, at most {} allowed", len, MAX_ID_LEN)
            }
            AlarmError::DeltaOutOfRange { delta, limit } => {
                write!(f, "adjustment {} exceeds the limit of {}", delta, limit)
            }
            AlarmError::InvalidDayCount(count) => {
                write!(f, "expected {} days, got {}", DAYS_PER_WEEK, count)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AlarmError {}

struct AlarmKeys {
    hour: PrefKey,
    minute: PrefKey,
    days: PrefKey,
    sunrise: PrefKey,
}

impl AlarmKeys {
    fn for_id(id: &str) -> Option<Self> {
        Some(Self {
            hour: compose_key(id, "Hour")?,
            minute: compose_key(id, "Min")?,
            days: compose_key(id, "Days")?,
            sunrise: compose_key(id, "Sunrise")?,
        })
    }
}

/// One alarm schedule with its snooze state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    id: String<MAX_ID_LEN>,
    hour: i8,
    minute: i8,
    days: u8,
    sunrise: bool,
    snooze_hour: i8,
    snooze_minute: i8,
    snooze_count: u8,
}

impl Alarm {
    /// Creates an alarm with the factory defaults: 12:00, every day, inactive,
    /// sunrise off.
    pub fn new(id: &str) -> Result<Self, AlarmError> {
        let mut owned = String::new();
        owned
            .push_str(id)
            .map_err(|_| AlarmError::IdTooLong { len: id.len() })?;

        Ok(Self {
            id: owned,
            hour: DEFAULT_HOUR,
            minute: DEFAULT_MINUTE,
            days: ALL_DAYS,
            sunrise: false,
            snooze_hour: DEFAULT_HOUR,
            snooze_minute: DEFAULT_MINUTE,
            snooze_count: 0,
        })
    }

    /// Creates an alarm from its persisted fields, falling back to the
    /// defaults of [`new`](Self::new) for missing keys.
    ///
    /// Out-of-range stored times are replaced by the defaults.
    ///
    /// The store is read directly. At startup reach it through
    /// [`TimedMutex::get_mut`], or call this from inside
    /// [`TimedMutex::lock_within`] once the store is shared.
    pub fn load<S: PreferenceStore>(id: &str, store: &mut S) -> Result<Self, AlarmError> {
        let mut alarm = Self::new(id)?;
        let keys = AlarmKeys::for_id(id).ok_or(AlarmError::IdTooLong { len: id.len() })?;

        let hour = store.get_i8(&keys.hour, DEFAULT_HOUR);
        let minute = store.get_i8(&keys.minute, DEFAULT_MINUTE);
        if (1..=24).contains(&hour) {
            alarm.hour = hour;
        } else {
            warn!("alarm {}: stored hour {} out of range", id, hour);
        }
        if (0..=59).contains(&minute) {
            alarm.minute = minute;
        } else {
            warn!("alarm {}: stored minute {} out of range", id, minute);
        }
        alarm.days = store.get_u8(&keys.days, ALL_DAYS);
        alarm.sunrise = store.get_bool(&keys.sunrise, false);
        alarm.reset_snooze();

        debug!("alarm {} loaded", id);
        Ok(alarm)
    }

    /// Writes changed fields to the preference store.
    ///
    /// Waits at most one second for the shared lock. On timeout nothing is
    /// written and the error is returned; the caller decides whether to try
    /// again later.
    pub fn persist<M, S, I, C>(&self, bus: &TimedMutex<M, S>, clock: &C) -> Result<(), LockTimeout>
    where
        M: RawMutex,
        S: PreferenceStore,
        I: TimeInstant,
        C: TimeSource<I>,
    {
        let Some(keys) = AlarmKeys::for_id(&self.id) else {
            return Ok(());
        };

        // Read defaults are chosen so that a missing key always differs.
        bus.lock_within_ms(clock, timeouts::ALARM_PERSIST_MS, |store| {
            if store.get_i8(&keys.hour, 0) != self.hour {
                store.put_i8(&keys.hour, self.hour);
            }
            if store.get_i8(&keys.minute, -1) != self.minute {
                store.put_i8(&keys.minute, self.minute);
            }
            if store.get_u8(&keys.days, !self.days) != self.days {
                store.put_u8(&keys.days, self.days);
            }
            if store.get_bool(&keys.sunrise, !self.sunrise) != self.sunrise {
                store.put_bool(&keys.sunrise, self.sunrise);
            }
        })
        .inspect_err(|_| {
            warn!(
                "alarm {}: preference store busy, settings NOT written",
                self.id.as_str()
            );
        })
    }

    /// Name used as the prefix of the persisted keys.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Alarm hour, 1-24.
    pub fn hour(&self) -> i8 {
        self.hour
    }

    /// Alarm minute, 0-59.
    pub fn minute(&self) -> i8 {
        self.minute
    }

    /// Hour the alarm will next fire at, after any snoozes.
    pub fn snooze_hour(&self) -> i8 {
        self.snooze_hour
    }

    pub fn snooze_minute(&self) -> i8 {
        self.snooze_minute
    }

    /// Sets the alarm time from a wall-clock time. Clock hour 0 becomes 24.
    pub fn set_time(&mut self, time: NaiveTime) {
        self.hour = match time.hour() {
            0 => 24,
            h => h as i8,
        };
        self.minute = time.minute() as i8;
        self.reset_snooze();
    }

    /// Moves the alarm by up to twelve hours in either direction.
    ///
    /// Any snooze in progress is discarded.
    pub fn adjust_hours(&mut self, delta: i32) -> Result<(), AlarmError> {
        if delta.unsigned_abs() > MAX_HOUR_DELTA.unsigned_abs() {
            return Err(AlarmError::DeltaOutOfRange {
                delta,
                limit: MAX_HOUR_DELTA,
            });
        }

        let mut hour = self.hour as i32 + delta;
        if hour > 24 {
            hour -= 24;
        } else if hour < 1 {
            hour += 24;
        }
        self.hour = hour as i8;
        self.reset_snooze();
        Ok(())
    }

    /// Moves the alarm by up to thirty minutes in either direction.
    ///
    /// The minute wraps within the hour; the hour is not carried. Any snooze
    /// in progress is discarded.
    pub fn adjust_minutes(&mut self, delta: i32) -> Result<(), AlarmError> {
        if delta.unsigned_abs() > MAX_MINUTE_DELTA.unsigned_abs() {
            return Err(AlarmError::DeltaOutOfRange {
                delta,
                limit: MAX_MINUTE_DELTA,
            });
        }

        let mut minute = self.minute as i32 + delta;
        if minute > 59 {
            minute -= 60;
        } else if minute < 0 {
            minute += 60;
        }
        self.minute = minute as i8;
        self.reset_snooze();
        Ok(())
    }

    /// Adds the days marked `true` to the schedule, Sunday first.
    ///
    /// Days marked `false` are left as they are. Anything other than seven
    /// entries is rejected without touching the schedule.
    pub fn set_days(&mut self, days: &[bool]) -> Result<(), AlarmError> {
        if days.len() != DAYS_PER_WEEK {
            warn!(
                "alarm {}: day list must hold 7 values, got {}",
                self.id.as_str(),
                days.len()
            );
            return Err(AlarmError::InvalidDayCount(days.len()));
        }

        for (bit, _) in days.iter().enumerate().filter(|(_, set)| **set) {
            self.days |= 1 << bit;
        }
        Ok(())
    }

    /// Adds `day` to the schedule, or removes it if already set.
    pub fn toggle_day(&mut self, day: Weekday) {
        self.days ^= day_bit(day);
    }

    /// Whether `day` is part of the weekly schedule.
    pub fn is_scheduled_on(&self, day: Weekday) -> bool {
        self.days & day_bit(day) != 0
    }

    /// The weekly schedule, Sunday first.
    pub fn days(&self) -> [bool; DAYS_PER_WEEK] {
        core::array::from_fn(|bit| self.days & (1 << bit) != 0)
    }

    /// Raw day mask as persisted: weekday bits 0-6 and the active flag in bit 7.
    pub fn day_mask(&self) -> u8 {
        self.days
    }

    /// Arms the alarm.
    pub fn activate(&mut self) {
        self.days |= ACTIVE;
    }

    /// Disarms the alarm and drops any snooze in progress.
    pub fn deactivate(&mut self) {
        self.days &= !ACTIVE;
        self.reset_snooze();
    }

    /// Flips the active flag and returns the new state.
    pub fn toggle_active(&mut self) -> bool {
        if self.is_active() {
            self.deactivate();
        } else {
            self.activate();
        }
        self.is_active()
    }

    /// Whether the alarm is armed.
    pub fn is_active(&self) -> bool {
        self.days & ACTIVE != 0
    }

    /// Whether the alarm should be ringing at `now`.
    ///
    /// True while the alarm is active, the wall clock shows the snooze time and
    /// either today is scheduled or the alarm has been snoozed. A snoozed alarm
    /// keeps firing across midnight into unscheduled days.
    pub fn should_ring(&self, now: &NaiveDateTime) -> bool {
        self.is_active()
            && now.hour() == clock_hour(self.snooze_hour)
            && now.minute() == self.snooze_minute as u32
            && (self.is_scheduled_on(now.weekday()) || self.snooze_count > 0)
    }

    /// Seconds until the alarm next fires, looking at most two days ahead.
    ///
    /// Returns [`NOT_SOON_SECONDS`] when neither today (later than `now`) nor
    /// tomorrow is scheduled. The active flag is not consulted.
    pub fn seconds_until(&self, now: &NaiveDateTime) -> u32 {
        let now_hour = now.hour() as i32;
        let now_minute = now.minute() as i32;
        let now_secs = now_hour * 3600 + now_minute * 60 + now.second() as i32;

        let alarm_hour = self.snooze_hour as i32;
        let alarm_minute = self.snooze_minute as i32;
        let alarm_secs = alarm_hour * 3600 + alarm_minute * 60;

        let today = now.weekday();
        let later_today =
            alarm_hour > now_hour || (alarm_hour == now_hour && alarm_minute > now_minute);
        if self.is_scheduled_on(today) && later_today {
            return (alarm_secs - now_secs) as u32;
        }

        if self.is_scheduled_on(today.succ()) {
            return (alarm_secs + SECONDS_PER_DAY - now_secs) as u32;
        }

        NOT_SOON_SECONDS
    }

    /// Pushes the next trigger back by [`SNOOZE_MINUTES`].
    pub fn snooze(&mut self) {
        self.snooze_minute += SNOOZE_MINUTES;
        self.snooze_count = self.snooze_count.saturating_add(1);

        if self.snooze_minute > 59 {
            self.snooze_hour += 1;
            self.snooze_minute -= 60;
            if self.snooze_hour > 24 {
                self.snooze_hour -= 24;
            }
        }
        debug!(
            "alarm {} snoozed to {}:{}",
            self.id.as_str(),
            self.snooze_hour,
            self.snooze_minute
        );
    }

    /// Number of snoozes since the last reset; zero when not snoozed.
    pub fn snooze_count(&self) -> u8 {
        self.snooze_count
    }

    /// Moves the next ring back to the configured time.
    pub fn reset_snooze(&mut self) {
        self.snooze_hour = self.hour;
        self.snooze_minute = self.minute;
        self.snooze_count = 0;
    }

    /// Enables the sunrise ramp ahead of this alarm.
    pub fn set_sunrise(&mut self, enabled: bool) {
        self.sunrise = enabled;
    }

    pub fn toggle_sunrise(&mut self) {
        self.sunrise = !self.sunrise;
    }

    pub fn is_sunrise_enabled(&self) -> bool {
        self.sunrise
    }

    /// Twelve hour display time, e.g. `"7:05 AM"` or `"12:00 PM"`.
    pub fn format_time(&self) -> String<8> {
        let (hour, meridiem) = match self.hour {
            24 => (12, "AM"),
            12 => (12, "PM"),
            h if h > 12 => (h - 12, "PM"),
            h => (h, "AM"),
        };

        let mut out = String::new();
        // Fits by construction: at most "12:59 PM".
        let _ = write!(out, "{}:{:02} {}", hour, self.minute, meridiem);
        out
    }

    /// Fourteen character weekday strip, e.g. `"__Mo__We______"`.
    pub fn format_days(&self) -> String<14> {
        let mut out = String::new();
        for (code, set) in DAY_CODES.iter().zip(self.days()) {
            let _ = out.push_str(if set { *code } else { "__" });
        }
        out
    }
}

#[inline]
fn day_bit(day: Weekday) -> u8 {
    1 << day.num_days_from_sunday()
}

/// Alarm hour 24 is shown by the wall clock as hour 0.
#[inline]
fn clock_hour(alarm_hour: i8) -> u32 {
    (alarm_hour as u32) % 24
}
