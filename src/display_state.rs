//! Flags shared between the UI, touch, network and alarm tasks.
//!
//! Every accessor is a single atomic load or store, so one [`DisplayState`]
//! can be shared by reference between tasks without a lock.

use crate::config::DEFAULT_BACKLIGHT_TIMEOUT_SECS;
use chrono::NaiveDateTime;
use portable_atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32, Ordering};

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    #[default]
    Main = 0,
    CurrentWeather = 1,
    Forecast = 2,
    AlarmDisplay = 3,
    AlarmSet = 4,
    LightControl = 5,
}

impl Mode {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Mode::CurrentWeather,
            2 => Mode::Forecast,
            3 => Mode::AlarmDisplay,
            4 => Mode::AlarmSet,
            5 => Mode::LightControl,
            _ => Mode::Main,
        }
    }
}

/// Light being edited on the light control screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LightSubMode {
    #[default]
    Read = 0,
    Room = 1,
    Night = 2,
}

impl LightSubMode {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => LightSubMode::Room,
            2 => LightSubMode::Night,
            _ => LightSubMode::Read,
        }
    }
}

/// Shared UI and status flags.
pub struct DisplayState {
    wifi_connected: AtomicBool,
    weather_valid: AtomicBool,
    draw_lower_screen: AtomicBool,
    draw_time_section: AtomicBool,
    full_redraw: AtomicBool,
    sprite_enabled: AtomicBool,
    screen_touch_active: AtomicBool,
    alarm_ringing: AtomicU8,
    mode: AtomicU8,
    alarm_edit: AtomicU8,
    light_sub_mode: AtomicU8,
    last_touch: AtomicU32,
    backlight_timeout: AtomicU16,
}

impl DisplayState {
    /// Main screen, full redraw pending, no touch seen yet.
    ///
    /// The last touch starts at the Unix epoch, so the backlight counts as
    /// timed out until [`touch`](Self::touch) runs. Use
    /// [`booted_at`](Self::booted_at) to keep it lit after power-up.
    pub const fn new() -> Self {
        Self {
            wifi_connected: AtomicBool::new(false),
            weather_valid: AtomicBool::new(false),
            draw_lower_screen: AtomicBool::new(false),
            draw_time_section: AtomicBool::new(false),
            full_redraw: AtomicBool::new(true),
            sprite_enabled: AtomicBool::new(false),
            screen_touch_active: AtomicBool::new(false),
            alarm_ringing: AtomicU8::new(0),
            mode: AtomicU8::new(Mode::Main as u8),
            alarm_edit: AtomicU8::new(0),
            light_sub_mode: AtomicU8::new(LightSubMode::Read as u8),
            last_touch: AtomicU32::new(0),
            backlight_timeout: AtomicU16::new(DEFAULT_BACKLIGHT_TIMEOUT_SECS),
        }
    }

    /// Same as [`new`](Self::new) with a touch recorded at `now`.
    pub fn booted_at(now: &NaiveDateTime) -> Self {
        let state = Self::new();
        state.touch(now);
        state
    }

    pub fn set_wifi_connected(&self, value: bool) {
        self.wifi_connected.store(value, Ordering::Relaxed);
    }

    pub fn wifi_connected(&self) -> bool {
        self.wifi_connected.load(Ordering::Relaxed)
    }

    pub fn set_weather_valid(&self, value: bool) {
        self.weather_valid.store(value, Ordering::Relaxed);
    }

    /// Whether the last weather fetch succeeded.
    pub fn weather_valid(&self) -> bool {
        self.weather_valid.load(Ordering::Relaxed)
    }

    /// Requests a redraw of the area below the clock.
    pub fn set_draw_lower_screen(&self, value: bool) {
        self.draw_lower_screen.store(value, Ordering::Relaxed);
    }

    pub fn draw_lower_screen(&self) -> bool {
        self.draw_lower_screen.load(Ordering::Relaxed)
    }

    pub fn set_draw_time_section(&self, value: bool) {
        self.draw_time_section.store(value, Ordering::Relaxed);
    }

    pub fn draw_time_section(&self) -> bool {
        self.draw_time_section.load(Ordering::Relaxed)
    }

    /// Requests a redraw of the whole screen on the next UI pass.
    pub fn set_full_redraw(&self, value: bool) {
        self.full_redraw.store(value, Ordering::Relaxed);
    }

    pub fn full_redraw(&self) -> bool {
        self.full_redraw.load(Ordering::Relaxed)
    }

    pub fn set_sprite_enabled(&self, value: bool) {
        self.sprite_enabled.store(value, Ordering::Relaxed);
    }

    /// Whether the scrolling message should be animated.
    pub fn sprite_enabled(&self) -> bool {
        self.sprite_enabled.load(Ordering::Relaxed)
    }

    /// Set while a finger is on the screen.
    pub fn set_screen_touch_active(&self, value: bool) {
        self.screen_touch_active.store(value, Ordering::Relaxed);
    }

    pub fn screen_touch_active(&self) -> bool {
        self.screen_touch_active.load(Ordering::Relaxed)
    }

    /// Records which alarm is ringing: its index plus one, or 0 for none.
    pub fn set_alarm_ringing(&self, value: u8) {
        self.alarm_ringing.store(value, Ordering::Release);
    }

    /// Index plus one of the ringing alarm, 0 when silent.
    pub fn alarm_ringing(&self) -> u8 {
        self.alarm_ringing.load(Ordering::Acquire)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Screen currently shown.
    pub fn mode(&self) -> Mode {
        Mode::from_raw(self.mode.load(Ordering::Acquire))
    }

    /// Which field of the alarm set screen has focus.
    pub fn set_alarm_edit(&self, value: u8) {
        self.alarm_edit.store(value, Ordering::Relaxed);
    }

    pub fn alarm_edit(&self) -> u8 {
        self.alarm_edit.load(Ordering::Relaxed)
    }

    pub fn set_light_sub_mode(&self, sub_mode: LightSubMode) {
        self.light_sub_mode.store(sub_mode as u8, Ordering::Relaxed);
    }

    pub fn light_sub_mode(&self) -> LightSubMode {
        LightSubMode::from_raw(self.light_sub_mode.load(Ordering::Relaxed))
    }

    /// Restarts the backlight timeout from `now`.
    pub fn touch(&self, now: &NaiveDateTime) {
        self.last_touch.store(epoch_seconds(now), Ordering::Relaxed);
    }

    /// Seconds without a touch before the backlight dims.
    pub fn set_backlight_timeout(&self, seconds: u16) {
        self.backlight_timeout.store(seconds, Ordering::Relaxed);
    }

    pub fn backlight_timeout(&self) -> u16 {
        self.backlight_timeout.load(Ordering::Relaxed)
    }

    /// Whether the screen was touched within the backlight timeout.
    pub fn has_recent_touch(&self, now: &NaiveDateTime) -> bool {
        let since = epoch_seconds(now).saturating_sub(self.last_touch.load(Ordering::Relaxed));
        since <= u32::from(self.backlight_timeout())
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_seconds(now: &NaiveDateTime) -> u32 {
    u32::try_from(now.and_utc().timestamp()).unwrap_or(0)
}
