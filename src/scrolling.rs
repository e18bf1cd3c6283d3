//! Marquee text on an off-screen sprite.
//!
//! Two copies of the message scroll left one behind the other, separated by a
//! gap. When a copy leaves the sprite on the left it is moved back behind the
//! other copy, so the loop runs without a visible jump.

use crate::config::timeouts;
use crate::lock::{LockTimeout, TimedMutex};
use crate::time::{TimeInstant, TimeSource};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::{Point, RgbColor, Size};
use heapless::String;
use portable_atomic::{AtomicU8, Ordering};

/// Trait for abstracting an off-screen drawing surface.
///
/// Implement this over your display driver's sprite or frame buffer type.
pub trait SpriteSurface {
    /// Screen the sprite is pushed to.
    type Target;

    /// Allocates the drawing area.
    fn create(&mut self, size: Size);

    /// Releases the drawing area.
    fn delete(&mut self);

    /// Fills the whole area with one colour.
    fn fill(&mut self, color: Rgb565);

    /// Draws `text` with its top-left corner at `position`. Text outside the
    /// area is clipped.
    fn draw_text(&mut self, text: &str, position: Point, color: Rgb565);

    /// Width of `text` in pixels when drawn.
    fn text_width(&self, text: &str) -> i32;

    /// Copies the area onto `target` with its top-left corner at `position`.
    fn push(&self, target: &mut Self::Target, position: Point);
}

/// Lifecycle of a [`ScrollingText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpriteState {
    /// Never created.
    Uninitialized = 0,
    /// Created and ready to scroll.
    Valid = 1,
    /// Destroyed; may be created again.
    Invalid = 2,
}

impl SpriteState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SpriteState::Valid,
            2 => SpriteState::Invalid,
            _ => SpriteState::Uninitialized,
        }
    }
}

/// Errors from scrolling text operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpriteError {
    /// The sprite's own lock was not acquired in time.
    SpriteBusy(LockTimeout),

    /// The display lock was not acquired in time; the frame was drawn but not shown.
    DisplayBusy(LockTimeout),

    /// The message does not fit the text buffer.
    MessageTooLong { len: usize, capacity: usize },
}

impl core::fmt::Display for SpriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SpriteError::SpriteBusy(timeout) => write!(f, "sprite busy: {}", timeout),
            SpriteError::DisplayBusy(timeout) => write!(f, "display busy: {}", timeout),
            SpriteError::MessageTooLong { len, capacity } => {
                write!(f, "message of {} bytes exceeds capacity of {}", len, capacity)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SpriteError {}

/// Parameters for [`ScrollingText::create`].
#[derive(Debug, Clone, Copy)]
pub struct SpriteConfig<'a> {
    pub text: &'a str,
    /// Size of the sprite in pixels.
    pub size: Size,
    /// Pixels moved per frame.
    pub speed: i32,
    /// Blank pixels between the two copies.
    pub gap: i32,
    pub color: Rgb565,
    /// Top-left corner of the sprite on screen.
    pub position: Point,
}

struct Marquee<S, const L: usize> {
    surface: S,
    message: String<L>,
    speed: i32,
    gap: i32,
    color: Rgb565,
    position: Point,
    text_width: i32,
    cursor_a: i32,
    cursor_b: i32,
}

impl<S: SpriteSurface, const L: usize> Marquee<S, L> {
    fn draw_frame(&mut self) {
        self.cursor_a -= self.speed;
        self.cursor_b -= self.speed;

        self.surface.fill(Rgb565::BLACK);
        self.surface
            .draw_text(&self.message, Point::new(self.cursor_a, 0), self.color);
        self.surface
            .draw_text(&self.message, Point::new(self.cursor_b, 0), self.color);

        let period = 2 * (self.text_width + self.gap);
        if self.cursor_a < -self.text_width {
            self.cursor_a += period;
        }
        if self.cursor_b < -self.text_width {
            self.cursor_b += period;
        }
    }
}

/// Scrolling text sprite with its own bounded-wait lock.
///
/// # Type Parameters
/// * `M` - Raw mutex flavour of the sprite lock
/// * `S` - Drawing surface implementation type
/// * `L` - Maximum message length in bytes
pub struct ScrollingText<M: RawMutex, S: SpriteSurface, const L: usize> {
    inner: TimedMutex<M, Marquee<S, L>>,
    state: AtomicU8,
}

impl<M: RawMutex, S: SpriteSurface, const L: usize> ScrollingText<M, S, L> {
    /// Wraps a surface. Nothing is allocated until [`create`](Self::create).
    pub fn new(surface: S) -> Self {
        Self {
            inner: TimedMutex::new(Marquee {
                surface,
                message: String::new(),
                speed: 0,
                gap: 0,
                color: Rgb565::WHITE,
                position: Point::zero(),
                text_width: 0,
                cursor_a: 0,
                cursor_b: 0,
            }),
            state: AtomicU8::new(SpriteState::Uninitialized as u8),
        }
    }

    /// Allocates the surface and starts the message at the left edge, with the
    /// second copy one gap behind it.
    ///
    /// A sprite that is already valid is released first.
    pub fn create<I, C>(&self, clock: &C, config: &SpriteConfig<'_>) -> Result<(), SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        let mut message = String::new();
        message
            .push_str(config.text)
            .map_err(|_| SpriteError::MessageTooLong {
                len: config.text.len(),
                capacity: L,
            })?;

        let recreate = self.state() == SpriteState::Valid;
        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_CREATE_MS, |marquee| {
                if recreate {
                    marquee.surface.delete();
                }
                marquee.surface.create(config.size);
                marquee.surface.fill(Rgb565::BLACK);

                marquee.text_width = marquee.surface.text_width(&message);
                marquee.message = message;
                marquee.speed = config.speed;
                marquee.gap = config.gap;
                marquee.color = config.color;
                marquee.position = config.position;
                marquee.cursor_a = 0;
                marquee.cursor_b = config.gap + marquee.text_width;
                self.state.store(SpriteState::Valid as u8, Ordering::Release);
            })
            .map_err(|timeout| {
                warn!("scrolling text: unable to create sprite");
                SpriteError::SpriteBusy(timeout)
            })
    }

    /// Releases the surface. Does nothing if the sprite was never created.
    pub fn destroy<I, C>(&self, clock: &C) -> Result<(), SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        if self.state() == SpriteState::Uninitialized {
            return Ok(());
        }

        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_DESTROY_MS, |marquee| {
                self.state.store(SpriteState::Invalid as u8, Ordering::Release);
                marquee.position = Point::zero();
                marquee.cursor_a = 0;
                marquee.cursor_b = 0;
                marquee.message.clear();
                marquee.surface.delete();
            })
            .map_err(|timeout| {
                warn!("scrolling text: unable to delete sprite");
                SpriteError::SpriteBusy(timeout)
            })
    }

    /// Scrolls one frame and pushes the sprite to `display`.
    ///
    /// Does nothing unless the sprite is valid.
    pub fn advance<I, C, DM>(
        &self,
        clock: &C,
        display: &TimedMutex<DM, S::Target>,
    ) -> Result<(), SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
        DM: RawMutex,
    {
        if self.state() != SpriteState::Valid {
            return Ok(());
        }

        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_DRAW_MS, |marquee| {
                // Destroyed while waiting for the lock
                if self.state() != SpriteState::Valid {
                    return Ok(());
                }
                marquee.draw_frame();
                display.lock_within_ms(clock, timeouts::DISPLAY_PUSH_MS, |screen| {
                    marquee.surface.push(screen, marquee.position)
                })
            })
            .map_err(|timeout| {
                warn!("scrolling text: unable to update sprite");
                SpriteError::SpriteBusy(timeout)
            })?
            .map_err(|timeout| {
                warn!("scrolling text: unable to push sprite");
                SpriteError::DisplayBusy(timeout)
            })
    }

    pub fn state(&self) -> SpriteState {
        SpriteState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_valid(&self) -> bool {
        self.state() == SpriteState::Valid
    }

    /// Copy of the current message. Empty once destroyed.
    pub fn message<I, C>(&self, clock: &C) -> Result<String<L>, SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_DRAW_MS, |marquee| {
                marquee.message.clone()
            })
            .map_err(SpriteError::SpriteBusy)
    }

    /// Horizontal positions of the two message copies.
    pub fn cursors<I, C>(&self, clock: &C) -> Result<(i32, i32), SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_DRAW_MS, |marquee| {
                (marquee.cursor_a, marquee.cursor_b)
            })
            .map_err(SpriteError::SpriteBusy)
    }

    /// Measured width of the message in pixels.
    pub fn text_width<I, C>(&self, clock: &C) -> Result<i32, SpriteError>
    where
        I: TimeInstant,
        C: TimeSource<I>,
    {
        self.inner
            .lock_within_ms(clock, timeouts::SPRITE_DRAW_MS, |marquee| marquee.text_width)
            .map_err(SpriteError::SpriteBusy)
    }
}
