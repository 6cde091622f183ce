use super::EffectCtx;
use crate::settings::MirrorMode;
use crate::surface::{PixelBuffer, Surface};
use crate::visual::cover_rect;

/// Extra margin so rotated or zoomed images still cover the canvas.
pub const COVER_OVERSIZE: f32 = 1.2;
const WAVE_STRIPS: usize = 20;

/// Where the image lands: a cover-fit rectangle centered on the canvas,
/// scaled and rotated about the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub rotation: f32,
    /// Image width and height on the canvas before `scale`.
    pub width: f32,
    pub height: f32,
}

impl Placement {
    pub(crate) fn new(ctx: &EffectCtx, image: &PixelBuffer, rotation: f32) -> Self {
        let fx = ctx.fx;
        let mut scale = 1.0;
        if fx.pulse {
            scale += ctx.bass * fx.pulse_intensity.clamp(0.0, 1.0) * 0.3;
        }
        if fx.zoom {
            scale += ctx.mid * fx.zoom_intensity.clamp(0.0, 1.0) * 0.2;
        }
        let (_, _, width, height) = cover_rect(
            image.width() as f32,
            image.height() as f32,
            ctx.w,
            ctx.h,
            COVER_OVERSIZE,
        );
        Self {
            scale,
            rotation: if fx.rotation { rotation } else { 0.0 },
            width,
            height,
        }
    }

    /// Moves the origin to the canvas center with rotation and scale applied.
    fn enter(&self, s: &mut Surface, ctx: &EffectCtx) {
        let (cx, cy) = ctx.center();
        s.translate(cx, cy);
        s.rotate(self.rotation);
        s.scale(self.scale, self.scale);
    }

    fn draw(&self, s: &mut Surface, ctx: &EffectCtx, image: &PixelBuffer) {
        s.save();
        self.enter(s, ctx);
        s.draw_image(image, -self.width * 0.5, -self.height * 0.5, self.width, self.height);
        s.restore();
    }
}

pub(crate) fn draw_pass(s: &mut Surface, ctx: &EffectCtx, image: &PixelBuffer, place: &Placement) {
    let fx = ctx.fx;
    if fx.mirror && fx.mirror_mode != MirrorMode::Unknown {
        mirrored(s, ctx, image, place, fx.mirror_mode);
    } else if fx.wave {
        wave_strips(s, ctx, image, place);
    } else {
        place.draw(s, ctx, image);
    }
}

/// Draws the image into each region, flipping the copies so the halves or
/// quadrants reflect the first one.
fn mirrored(s: &mut Surface, ctx: &EffectCtx, image: &PixelBuffer, place: &Placement, mode: MirrorMode) {
    let (w, h) = (ctx.w, ctx.h);
    let (hw, hh) = (w * 0.5, h * 0.5);
    let regions: Vec<([f32; 4], bool, bool)> = match mode {
        MirrorMode::Horizontal => vec![([0.0, 0.0, hw, h], false, false), ([hw, 0.0, hw, h], true, false)],
        MirrorMode::Vertical => vec![([0.0, 0.0, w, hh], false, false), ([0.0, hh, w, hh], false, true)],
        MirrorMode::Quad => vec![
            ([0.0, 0.0, hw, hh], false, false),
            ([hw, 0.0, hw, hh], true, false),
            ([0.0, hh, hw, hh], false, true),
            ([hw, hh, hw, hh], true, true),
        ],
        MirrorMode::Unknown => Vec::new(),
    };
    for ([x, y, rw, rh], flip_x, flip_y) in regions {
        s.save();
        s.clip_rect(x, y, rw, rh);
        s.translate(if flip_x { w } else { 0.0 }, if flip_y { h } else { 0.0 });
        s.scale(if flip_x { -1.0 } else { 1.0 }, if flip_y { -1.0 } else { 1.0 });
        place.draw(s, ctx, image);
        s.restore();
    }
}

/// Horizontal strips, each shifted sideways by a sine of its index.
fn wave_strips(s: &mut Surface, ctx: &EffectCtx, image: &PixelBuffer, place: &Placement) {
    let amp = ctx.w * 0.04 * ctx.fx.wave_intensity.clamp(0.0, 1.0) * (0.3 + ctx.mid);
    let (iw, ih) = (image.width() as f32, image.height() as f32);
    let src_h = ih / WAVE_STRIPS as f32;
    let dst_h = place.height / WAVE_STRIPS as f32;
    s.save();
    place.enter(s, ctx);
    for i in 0..WAVE_STRIPS {
        let offset = (i as f32 * 0.6 + ctx.t * 3.0).sin() * amp;
        let y = -place.height * 0.5 + i as f32 * dst_h;
        // Overlap by a pixel so strips leave no seams; the source grows to
        // match so the scale stays the same.
        let extra = src_h / dst_h.max(1e-3);
        s.draw_image_region(
            image,
            [0.0, i as f32 * src_h, iw, src_h + extra],
            [-place.width * 0.5 + offset, y, place.width, dst_h + 1.0],
        );
    }
    s.restore();
}
