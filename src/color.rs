//! HSB colour handling for the light channels.
//!
//! Hue, saturation and brightness are all expressed in the 0.0-1.0 range.
//! Conversion to pixels goes through `palette` (HSV to sRGB) and the gamma
//! table of `smart_leds`.

use crate::config::{HSB_STEPS, HUE_EPSILON, MIN_CONFIGURED_BRIGHTNESS};
use palette::{FromColor, Hsv, Srgb};
use smart_leds::RGB8;

/// A colour in hue, saturation, brightness form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hsb {
    /// Hue, 0.0 (inclusive) to 1.0 (exclusive).
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    pub const BLACK: Hsb = Hsb::new(0.0, 0.0, 0.0);
    pub const WHITE: Hsb = Hsb::new(0.0, 0.0, 1.0);

    /// Creates a colour as given, without normalisation.
    #[inline]
    pub const fn new(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    /// Normalises a user colour. Brightness never drops below
    /// [`MIN_CONFIGURED_BRIGHTNESS`], so a configured light is never fully dark.
    pub fn configured(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self::new(hue, saturation, brightness).normalized(MIN_CONFIGURED_BRIGHTNESS)
    }

    /// Normalises a colour requested for immediate display. Brightness may reach zero.
    pub fn active(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self::new(hue, saturation, brightness).normalized(0.0)
    }

    /// Dawn colour for a sunrise ramp at `progress` (0.0 to 1.0): deep red
    /// at zero brightness warming to a soft full-brightness yellow.
    pub fn sunrise(progress: f32) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        Self::new(0.1 * progress, 1.0 - 0.5 * progress, progress)
    }

    /// Wraps the hue into [0, 1), clamps saturation to [0, 1] and brightness to
    /// [`min_brightness`, 1], then snaps every component to the 1/20 grid.
    pub fn normalized(self, min_brightness: f32) -> Self {
        let mut hue = wrap_hue(self.hue);
        let saturation = self.saturation.clamp(0.0, 1.0);
        let brightness = self.brightness.clamp(min_brightness, 1.0);

        hue = quantize(hue);
        // Folds both ends of the wheel onto a positive zero
        if hue >= 1.0 || hue <= 0.0 {
            hue = 0.0;
        }

        Self::new(hue, quantize(saturation), quantize(brightness))
    }

    /// Moves `progress` of the way toward `target`.
    ///
    /// Hue travels the shorter way round the colour wheel.
    pub fn blend_toward(self, target: Hsb, progress: f32) -> Self {
        let mut delta = target.hue - self.hue;
        if delta > 0.5 {
            delta -= 1.0;
        } else if delta < -0.5 {
            delta += 1.0;
        }

        let mut hue = self.hue + delta * progress;
        if hue < 0.0 {
            hue += 1.0;
        } else if hue >= 1.0 {
            hue -= 1.0;
        }

        Self::new(
            hue,
            self.saturation + (target.saturation - self.saturation) * progress,
            self.brightness + (target.brightness - self.brightness) * progress,
        )
    }

    /// Converts to sRGB, each channel 0.0-1.0.
    #[inline]
    pub fn to_srgb(self) -> Srgb {
        let hsv: Hsv = Hsv::new(self.hue * 360.0, self.saturation, self.brightness);
        Srgb::from_color(hsv)
    }

    /// Converts to an 8-bit pixel without gamma correction.
    pub fn to_pixel(self) -> RGB8 {
        let rgb: Srgb<u8> = self.to_srgb().into_format();
        RGB8::new(rgb.red, rgb.green, rgb.blue)
    }

    /// Converts to the 8-bit pixel sent to the strip.
    pub fn to_corrected_pixel(self) -> RGB8 {
        gamma_correct(self.to_pixel())
    }
}

/// Snaps a component to the nearest multiple of 1/20.
#[inline]
pub fn quantize(value: f32) -> f32 {
    libm::roundf(value * HSB_STEPS) / HSB_STEPS
}

/// Applies the LED gamma table to a pixel.
#[inline]
pub fn gamma_correct(pixel: RGB8) -> RGB8 {
    smart_leds::gamma(core::iter::once(pixel))
        .next()
        .unwrap_or(pixel)
}

fn wrap_hue(hue: f32) -> f32 {
    if !hue.is_finite() {
        return 0.0;
    }
    let wrapped = hue - libm::floorf(hue);
    // A tiny negative hue rounds up to exactly 1.0
    if wrapped >= 1.0 {
        1.0 - HUE_EPSILON
    } else {
        wrapped
    }
}
