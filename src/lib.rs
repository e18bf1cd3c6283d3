#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Alarm`**: One alarm time with a weekday schedule, snooze state and display strings
//! - **`AlarmSchedule`**: The alarms checked together on every wall-clock tick
//! - **`Cadence`**: Fixed-period trigger for polled work
//! - **`LightController`**: Read, room, night and sunrise lights eased toward their target colours
//! - **`Hsb`**: Hue/saturation/brightness colour, each 0.0-1.0
//! - **`DisplayState`**: UI mode and redraw flags shared between tasks
//! - **`ScrollingText`**: Two-copy marquee on an off-screen sprite
//! - **`TimedMutex`**: Lock whose every acquisition is bounded by a timeout
//! - **`PreferenceStore`**, **`LedStrip`**, **`SpriteSurface`**: Traits to implement for your hardware
//! - **`TimeSource`**: Trait to implement for your monotonic timer
//!
//! Wall-clock time for alarms is a `chrono::NaiveDateTime`; lock waits and
//! light cadences use the monotonic [`TimeSource`].

// This must go first so the diagnostic macros are visible everywhere else.
mod fmt;

pub mod alarm;
pub mod color;
pub mod config;
pub mod display_state;
pub mod light;
pub mod lock;
pub mod prefs;
pub mod schedule;
pub mod scrolling;
pub mod time;

pub use alarm::{Alarm, AlarmError};
pub use color::Hsb;
pub use config::StripLayout;
pub use display_state::{DisplayState, LightSubMode, Mode};
pub use light::{Channel, LedStrip, LightController, Zone};
pub use lock::{LockTimeout, TimedMutex};
pub use prefs::PreferenceStore;
pub use schedule::{AlarmSchedule, Cadence, ScheduleError};
pub use scrolling::{ScrollingText, SpriteConfig, SpriteError, SpriteState, SpriteSurface};
pub use time::{TimeDuration, TimeInstant, TimeSource};

// Re-exported for implementors of the hardware traits.
pub use chrono;
pub use embedded_graphics::pixelcolor::Rgb565;
pub use smart_leds::RGB8;
