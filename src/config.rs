//! Build-time configuration.
//!
//! The `demo` feature shortens the snooze increment and switches to a ten pixel
//! bench strip. Everything else is fixed for the product.

use core::ops::Range;

/// Minutes added to the trigger time by each snooze.
#[cfg(not(feature = "demo"))]
pub const SNOOZE_MINUTES: i8 = 5;
/// Minutes added to the trigger time by each snooze.
#[cfg(feature = "demo")]
pub const SNOOZE_MINUTES: i8 = 1;

/// Returned by [`Alarm::seconds_until`](crate::Alarm::seconds_until) when no
/// trigger falls within the next two days.
pub const NOT_SOON_SECONDS: u32 = 1_000_000;

/// Length of the dawn ramp before a sunrise alarm, in seconds.
pub const SUNRISE_LEAD_SECS: u32 = 20 * 60;

/// Fraction of the remaining distance covered by each light blend step.
pub const BLEND_FACTOR: f32 = 0.45;

/// Period of the read light flash (white/black toggle).
pub const FLASH_INTERVAL_MS: u64 = 250;

/// Colour components are quantised to multiples of `1 / HSB_STEPS`.
pub const HSB_STEPS: f32 = 20.0;

/// Hue values this close to 0.0 or 1.0 are wrapped around.
pub const HUE_EPSILON: f32 = 0.00001;

/// Lowest brightness accepted for a configured (user) colour.
pub const MIN_CONFIGURED_BRIGHTNESS: f32 = 0.1;

/// Default touch inactivity, in seconds, before the backlight times out.
pub const DEFAULT_BACKLIGHT_TIMEOUT_SECS: u16 = 30;

/// Bounded waits on the shared locks, in milliseconds.
pub mod timeouts {
    /// Writing alarm settings to the preference store.
    pub const ALARM_PERSIST_MS: u64 = 1000;
    /// Writing light colours to the preference store.
    pub const LIGHT_PERSIST_MS: u64 = 100;
    /// Filling a pixel range on the strip.
    pub const PIXEL_PUSH_MS: u64 = 10;
    /// Showing the strip.
    pub const STRIP_SHOW_MS: u64 = 10;
    /// Building a scrolling sprite.
    pub const SPRITE_CREATE_MS: u64 = 30;
    /// Releasing a scrolling sprite.
    pub const SPRITE_DESTROY_MS: u64 = 50;
    /// Drawing one scroll frame.
    pub const SPRITE_DRAW_MS: u64 = 5;
    /// Pushing a sprite to the screen.
    pub const DISPLAY_PUSH_MS: u64 = 40;
}

/// Placement of the light channels on the LED strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripLayout {
    /// Total number of pixels on the strip.
    pub pixel_count: usize,
    /// Pixels lit by the read light.
    pub read: Range<usize>,
    /// Pixels lit by the room, night and sunrise lights.
    pub room: Range<usize>,
}

impl StripLayout {
    /// 156 pixel strip in the finished clock.
    pub const FULL: StripLayout = StripLayout {
        pixel_count: 156,
        read: 0..66,
        room: 66..156,
    };

    /// Ten pixel bench strip.
    pub const DEMO: StripLayout = StripLayout {
        pixel_count: 10,
        read: 0..5,
        room: 5..10,
    };
}

impl Default for StripLayout {
    fn default() -> Self {
        if cfg!(feature = "demo") {
            Self::DEMO
        } else {
            Self::FULL
        }
    }
}
