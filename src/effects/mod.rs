//! Audio-reactive effects on a still image.
//!
//! [`ImageEffectsProcessor::apply_image_effects`] draws the image and runs
//! the enabled effects in a fixed order: geometric setup, one draw pass
//! (mirror, wave strips or plain), color effects (color shift, chromatic
//! aberration, glitch), static overlays (scanlines, vignette), then the
//! structural effects (circle rotation, rain, slice shift, ripple, pixel
//! sort, tunnel zoom, shatter, liquid morph).

mod creative;
mod filters;
mod geometry;
mod ken_burns;
pub mod pixel;

use tracing::debug;

use crate::audio::AudioFeatureFrame;
use crate::settings::ImageEffectSettings;
use crate::surface::{Color, PixelBuffer, Surface};

pub use geometry::Placement;
pub use ken_burns::{KenBurns, PanDirection, MAX_PAN};

/// Per-frame rotation step at `rotation_speed = 1`.
pub const IMAGE_ROTATION_STEP: f32 = 0.01;

/// Inputs shared by every effect in one call.
pub(crate) struct EffectCtx<'a> {
    pub t: f32,
    pub w: f32,
    pub h: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub fx: &'a ImageEffectSettings,
}

impl EffectCtx<'_> {
    pub fn center(&self) -> (f32, f32) {
        (self.w * 0.5, self.h * 0.5)
    }

    /// Half the canvas diagonal.
    pub fn reach(&self) -> f32 {
        (self.w * self.w + self.h * self.h).sqrt() * 0.5
    }
}

/// Owns the image rotation accumulator and the glitch RNG.
pub struct ImageEffectsProcessor {
    rotation: f32,
    rng: fastrand::Rng,
}

impl Default for ImageEffectsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEffectsProcessor {
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rotation: 0.0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Call whenever the source image changes.
    pub fn reset_image_rotation(&mut self) {
        self.rotation = 0.0;
    }

    pub fn apply_image_effects(
        &mut self,
        surface: &mut Surface,
        audio: &AudioFeatureFrame,
        image: &PixelBuffer,
        effects: &ImageEffectSettings,
        time: f32,
    ) {
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        if w < 1.0 || h < 1.0 || image.is_empty() {
            return;
        }
        let ctx = EffectCtx {
            t: if time.is_finite() { time } else { 0.0 },
            w,
            h,
            bass: audio.bass(),
            mid: audio.mid(),
            treble: audio.treble(),
            fx: effects,
        };

        if effects.rotation && effects.rotation_speed.is_finite() {
            self.rotation += effects.rotation_speed * IMAGE_ROTATION_STEP * (1.0 + ctx.bass);
        }
        let placement = Placement::new(&ctx, image, self.rotation);

        surface.save();
        surface.fill_rect(0.0, 0.0, w, h, Color::BLACK);
        geometry::draw_pass(surface, &ctx, image, &placement);
        surface.restore();

        if effects.blur {
            let radius = (effects.blur_intensity.clamp(0.0, 1.0) * (2.0 + ctx.bass * 6.0)).round() as usize;
            with_pixels(surface, "blur", |buf| pixel::box_blur(buf, radius));
        }

        if effects.color_shift {
            filters::color_shift(surface, &ctx);
        }
        if effects.chromatic {
            filters::chromatic(surface, &ctx);
        }
        if effects.glitch {
            filters::glitch(surface, &ctx, &mut self.rng);
        }

        if effects.scanlines {
            filters::scanlines(surface, &ctx);
        }
        if effects.vignette {
            filters::vignette(surface, &ctx);
        }

        if effects.circle_rotation {
            creative::circle_rotation(surface, &ctx);
        }
        if effects.rain_mask {
            creative::rain_mask(surface, &ctx);
        }
        if effects.slice_shift {
            let amp = w.max(h) * 0.06 * effects.slice_shift_intensity.clamp(0.0, 1.0) * (0.4 + ctx.bass);
            with_pixels(surface, "slice_shift", |buf| {
                pixel::slice_shift(buf, effects.slice_shift_direction, amp, ctx.t)
            });
        }
        if effects.ripple {
            creative::ripple(surface, &ctx);
        }
        if effects.pixel_sort {
            let k = effects.pixel_sort_intensity.clamp(0.0, 1.0);
            let threshold = 255.0 * (0.75 - k * 0.45);
            let rows = (h * k * (0.25 + ctx.bass * 0.75)) as usize;
            let start = ((ctx.t * 40.0 + ctx.mid * h) as usize) % surface.height();
            with_pixels(surface, "pixel_sort", |buf| pixel::pixel_sort(buf, threshold, start, rows));
        }
        if effects.tunnel_zoom {
            creative::tunnel_zoom(surface, &ctx);
        }
        if effects.shatter {
            creative::shatter(surface, &ctx);
        }
        if effects.liquid_morph {
            let amp = effects.liquid_morph_intensity.clamp(0.0, 1.0) * (4.0 + ctx.bass * 18.0);
            with_pixels(surface, "liquid_morph", |buf| pixel::liquid_morph(buf, amp, ctx.mid, ctx.t));
        }
    }
}

/// Runs a pixel-buffer effect, or skips it for this frame when the surface
/// cannot be read back.
pub(crate) fn with_pixels(surface: &mut Surface, effect: &'static str, f: impl FnOnce(&mut PixelBuffer)) {
    match surface.pixels_mut() {
        Ok(buf) => f(buf),
        Err(err) => debug!(effect, %err, "skipping pixel effect"),
    }
}
