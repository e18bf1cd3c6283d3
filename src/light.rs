//! Read, room, night and sunrise lighting on a shared LED strip.
//!
//! Provides [`LightController`], which keeps the configured and active colour
//! of each channel and eases the strip toward the active colours a little on
//! every [`advance`](LightController::advance). Also defines the [`LedStrip`]
//! trait for hardware abstraction.
//!
//! The strip is split into two zones. The read light owns the first; room,
//! night and sunrise share the second, so only one of them is lit at a time.

use crate::color::Hsb;
use crate::config::{BLEND_FACTOR, FLASH_INTERVAL_MS, StripLayout, timeouts};
use crate::lock::{LockTimeout, TimedMutex};
use crate::prefs::{PreferenceStore, sync_f32};
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use core::ops::Range;
use embassy_sync::blocking_mutex::raw::RawMutex;
use smart_leds::RGB8;

/// Trait for abstracting an addressable LED strip driver.
///
/// The driver owns the pixel buffer and tracks whether it changed since the
/// last [`show`](LedStrip::show).
pub trait LedStrip {
    /// Number of pixels in the buffer.
    fn pixel_count(&self) -> usize;

    /// Sets every pixel in `pixels` to `color` and marks the buffer dirty.
    fn fill(&mut self, pixels: Range<usize>, color: RGB8);

    /// Whether the buffer changed since the last refresh.
    fn is_dirty(&self) -> bool;

    /// Whether the hardware is ready for another refresh.
    fn can_show(&self) -> bool;

    /// Sends the buffer to the strip.
    fn show(&mut self);
}

/// User-selectable light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Bedside reading light.
    Read,
    /// Whole-room light.
    Room,
    /// Dim light on the room zone.
    Night,
}

impl Channel {
    /// Preference keys for hue, saturation and brightness.
    fn keys(self) -> [&'static str; 3] {
        match self {
            Channel::Read => ["ReadH", "ReadS", "ReadB"],
            Channel::Room => ["RoomH", "RoomS", "RoomB"],
            Channel::Night => ["NightH", "NightS", "NightB"],
        }
    }

    fn default_color(self) -> Hsb {
        match self {
            Channel::Read => Hsb::new(0.0, 0.0, 0.5),
            Channel::Room | Channel::Night => Hsb::new(0.1, 0.5, 1.0),
        }
    }

    fn zone(self) -> Zone {
        match self {
            Channel::Read => Zone::Read,
            Channel::Room | Channel::Night => Zone::Room,
        }
    }
}

/// A contiguous pixel range on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Zone {
    Read,
    Room,
}

#[derive(Debug, Clone, Copy)]
struct ZoneOutput {
    /// Last blended colour, start point of the next blend.
    rendered: Hsb,
    /// Last pixel value that reached the strip.
    pushed: RGB8,
}

impl ZoneOutput {
    const DARK: ZoneOutput = ZoneOutput {
        rendered: Hsb::BLACK,
        pushed: RGB8 { r: 0, g: 0, b: 0 },
    };
}

/// Drives the light channels on one LED strip.
///
/// The strip lives behind the shared hardware lock; every pixel push waits
/// at most a few milliseconds for it and is skipped otherwise.
///
/// # Type Parameters
/// * `'t` - Lifetime of the shared lock and time source references
/// * `M` - Raw mutex flavour of the shared lock
/// * `B` - Hardware behind the lock, at least an [`LedStrip`]
/// * `I` - Time instant type
/// * `C` - Time source implementation type
pub struct LightController<'t, M, B, I, C>
where
    M: RawMutex,
    B: LedStrip,
    I: TimeInstant,
    C: TimeSource<I>,
{
    bus: &'t TimedMutex<M, B>,
    clock: &'t C,
    layout: StripLayout,

    read_on: bool,
    room_on: bool,
    night_on: bool,
    sunrise_on: bool,

    flashing: bool,
    flash_lit: bool,
    last_flash: Option<I>,

    read_color: Hsb,
    room_color: Hsb,
    night_color: Hsb,

    active_read: Hsb,
    active_room: Hsb,

    read_out: ZoneOutput,
    room_out: ZoneOutput,
}

impl<'t, M, B, I, C> LightController<'t, M, B, I, C>
where
    M: RawMutex,
    B: LedStrip,
    I: TimeInstant,
    C: TimeSource<I>,
{
    /// Creates a controller with all lights off and default colours.
    pub fn new(bus: &'t TimedMutex<M, B>, clock: &'t C, layout: StripLayout) -> Self {
        Self {
            bus,
            clock,
            layout,
            read_on: false,
            room_on: false,
            night_on: false,
            sunrise_on: false,
            flashing: false,
            flash_lit: false,
            last_flash: None,
            read_color: Channel::Read.default_color(),
            room_color: Channel::Room.default_color(),
            night_color: Channel::Night.default_color(),
            active_read: Hsb::BLACK,
            active_room: Hsb::BLACK,
            read_out: ZoneOutput::DARK,
            room_out: ZoneOutput::DARK,
        }
    }

    /// Reads the configured colours from the preference store.
    ///
    /// Missing keys keep the defaults. Stored values are normalised like any
    /// other configured colour.
    pub fn load(&mut self) -> Result<(), LockTimeout>
    where
        B: PreferenceStore,
    {
        let colors = self
            .bus
            .lock_within_ms(self.clock, timeouts::LIGHT_PERSIST_MS, |store| {
                [Channel::Read, Channel::Room, Channel::Night].map(|channel| {
                    let [h, s, b] = channel.keys();
                    let default = channel.default_color();
                    Hsb::configured(
                        store.get_f32(h, default.hue),
                        store.get_f32(s, default.saturation),
                        store.get_f32(b, default.brightness),
                    )
                })
            })
            .inspect_err(|_| warn!("lights: preference store busy, using default colours"))?;

        let [read, room, night] = colors;
        self.read_color = read;
        self.room_color = room;
        self.night_color = night;
        Ok(())
    }

    /// Writes changed colour components to the preference store.
    pub fn persist(&self) -> Result<(), LockTimeout>
    where
        B: PreferenceStore,
    {
        self.bus
            .lock_within_ms(self.clock, timeouts::LIGHT_PERSIST_MS, |store| {
                for channel in [Channel::Room, Channel::Read, Channel::Night] {
                    let [h, s, b] = channel.keys();
                    let color = self.color(channel);
                    sync_f32(store, h, color.hue);
                    sync_f32(store, s, color.saturation);
                    sync_f32(store, b, color.brightness);
                }
            })
            .inspect_err(|_| warn!("lights: preference store busy, colours NOT written"))
    }

    /// Turns a channel on at its configured colour.
    ///
    /// Room and night exclude each other and the sunrise.
    pub fn turn_on(&mut self, channel: Channel) {
        match channel {
            Channel::Read => {
                self.read_on = true;
                self.active_read = self.read_color;
            }
            Channel::Room => {
                self.night_on = false;
                self.sunrise_on = false;
                self.room_on = true;
                self.active_room = self.room_color;
            }
            Channel::Night => {
                self.room_on = false;
                self.sunrise_on = false;
                self.night_on = true;
                self.active_room = self.night_color;
            }
        }
    }

    /// Turns a channel off and fades its zone to black.
    pub fn turn_off(&mut self, channel: Channel) {
        match channel {
            Channel::Read => {
                self.read_on = false;
                self.active_read = Hsb::BLACK;
            }
            Channel::Room => {
                self.room_on = false;
                self.active_room = Hsb::BLACK;
            }
            Channel::Night => {
                self.night_on = false;
                self.active_room = Hsb::BLACK;
            }
        }
    }

    /// Flips a channel and returns its new state.
    pub fn toggle(&mut self, channel: Channel) -> bool {
        if self.is_on(channel) {
            self.turn_off(channel);
        } else {
            self.turn_on(channel);
        }
        self.is_on(channel)
    }

    /// Whether `channel` is switched on. Sunrise is tracked separately.
    pub fn is_on(&self, channel: Channel) -> bool {
        match channel {
            Channel::Read => self.read_on,
            Channel::Room => self.room_on,
            Channel::Night => self.night_on,
        }
    }

    /// Hands the room zone to the sunrise ramp, switching room and night off.
    pub fn sunrise_on(&mut self) {
        self.room_on = false;
        self.night_on = false;
        self.sunrise_on = true;
    }

    /// Ends the sunrise ramp. The room zone keeps its last sunrise colour
    /// until another channel takes over.
    pub fn sunrise_off(&mut self) {
        self.sunrise_on = false;
    }

    pub fn is_sunrise_on(&self) -> bool {
        self.sunrise_on
    }

    /// Sets the configured colour of a channel.
    ///
    /// If the channel is on, the colour is shown right away.
    pub fn set_color(&mut self, channel: Channel, hue: f32, saturation: f32, brightness: f32) {
        let color = Hsb::configured(hue, saturation, brightness);
        match channel {
            Channel::Read => self.read_color = color,
            Channel::Room => self.room_color = color,
            Channel::Night => self.night_color = color,
        }

        if self.is_on(channel) {
            self.apply_active(channel, color);
        }
    }

    /// Sets the colour a channel is currently showing, without changing its
    /// configured colour. Unlike [`set_color`](Self::set_color), brightness may
    /// go down to zero.
    pub fn set_active_color(
        &mut self,
        channel: Channel,
        hue: f32,
        saturation: f32,
        brightness: f32,
    ) {
        let color = Hsb::active(hue, saturation, brightness);
        match channel {
            Channel::Read => self.active_read = color,
            Channel::Room | Channel::Night => self.active_room = color,
        }

        if self.is_on(channel) {
            let _ = self.render(channel.zone(), color);
        }
    }

    /// Sets the room zone colour for the sunrise ramp. Taken as given.
    pub fn set_sunrise_color(&mut self, color: Hsb) {
        self.active_room = color;
        if self.sunrise_on {
            let _ = self.render(Zone::Room, color);
        }
    }

    /// Configured colour of a channel.
    pub fn color(&self, channel: Channel) -> Hsb {
        match channel {
            Channel::Read => self.read_color,
            Channel::Room => self.room_color,
            Channel::Night => self.night_color,
        }
    }

    /// Colour a zone is blending toward.
    pub fn active_color(&self, zone: Zone) -> Hsb {
        match zone {
            Zone::Read => self.active_read,
            Zone::Room => self.active_room,
        }
    }

    /// Colour last computed for a zone.
    pub fn rendered_color(&self, zone: Zone) -> Hsb {
        self.zone_output(zone).rendered
    }

    /// Gamma-corrected pixel last written to a zone.
    pub fn pushed_pixel(&self, zone: Zone) -> RGB8 {
        self.zone_output(zone).pushed
    }

    /// Blinks the read zone while the read light is off.
    pub fn start_flashing(&mut self) {
        self.flashing = true;
    }

    /// Stops blinking; the read zone blends back to its active colour.
    pub fn stop_flashing(&mut self) {
        self.flashing = false;
    }

    pub fn toggle_flashing(&mut self) {
        self.flashing = !self.flashing;
    }

    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    /// Pixels in the configured layout.
    pub fn pixel_count(&self) -> usize {
        self.layout.pixel_count
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    /// Moves both zones one step toward their active colours.
    ///
    /// Call at a fixed rate. While flashing with the read light off, the
    /// read zone jumps between white and black every [`FLASH_INTERVAL_MS`]
    /// instead of blending.
    ///
    /// # Returns
    /// * `Ok(())` - Every needed push went through
    /// * `Err` - A zone was skipped because the strip was busy
    pub fn advance(&mut self) -> Result<(), LockTimeout> {
        let read = if self.flashing && !self.read_on {
            self.advance_flash()
        } else {
            self.render(Zone::Read, self.active_read).map(|_| ())
        };
        let room = self.render(Zone::Room, self.active_room).map(|_| ());
        read.and(room)
    }

    /// Shows the strip if anything changed and the driver is ready.
    ///
    /// Returns whether a refresh was sent.
    pub fn show(&self) -> Result<bool, LockTimeout> {
        self.bus
            .lock_within_ms(self.clock, timeouts::STRIP_SHOW_MS, |strip| {
                if strip.is_dirty() && strip.can_show() {
                    strip.show();
                    true
                } else {
                    false
                }
            })
            .inspect_err(|_| debug!("lights: strip busy, show skipped"))
    }

    fn apply_active(&mut self, channel: Channel, color: Hsb) {
        match channel.zone() {
            Zone::Read => self.active_read = color,
            Zone::Room => self.active_room = color,
        }
        let _ = self.render(channel.zone(), color);
    }

    fn advance_flash(&mut self) -> Result<(), LockTimeout> {
        let now = self.clock.now();
        let due = match self.last_flash {
            None => true,
            Some(last) => now.duration_since(last).as_millis() > FLASH_INTERVAL_MS,
        };
        if !due {
            return Ok(());
        }

        self.flash_lit = !self.flash_lit;
        self.last_flash = Some(now);
        let color = if self.flash_lit { Hsb::WHITE } else { Hsb::BLACK };
        // Jump straight to the flash colour; the blend toward itself is a no-op.
        self.read_out.rendered = color;
        self.render(Zone::Read, color).map(|_| ())
    }

    /// Blends a zone toward `target` and pushes the result if the pixel changed.
    ///
    /// Returns whether the strip was written.
    fn render(&mut self, zone: Zone, target: Hsb) -> Result<bool, LockTimeout> {
        let (output, pixels) = match zone {
            Zone::Read => (&mut self.read_out, self.layout.read.clone()),
            Zone::Room => (&mut self.room_out, self.layout.room.clone()),
        };

        let blended = output.rendered.blend_toward(target, BLEND_FACTOR);
        output.rendered = blended;

        let pixel = blended.to_corrected_pixel();
        if pixel == output.pushed {
            return Ok(false);
        }

        self.bus
            .lock_within(
                self.clock,
                I::Duration::from_millis(timeouts::PIXEL_PUSH_MS),
                |strip| {
                    // Never write past the end of a shorter strip
                    let end = pixels.end.min(strip.pixel_count());
                    strip.fill(pixels.start.min(end)..end, pixel)
                },
            )
            .inspect_err(|_| warn!("lights: strip busy, zone update skipped"))?;
        output.pushed = pixel;
        Ok(true)
    }

    fn zone_output(&self, zone: Zone) -> &ZoneOutput {
        match zone {
            Zone::Read => &self.read_out,
            Zone::Room => &self.room_out,
        }
    }
}
