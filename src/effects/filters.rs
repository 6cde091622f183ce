use super::{pixel, with_pixels, EffectCtx};
use crate::color::hsl;
use crate::surface::{BlendMode, Color, Gradient, Surface};

/// Treble level (0..1) above which the color shift fires.
pub const COLOR_SHIFT_TREBLE: f32 = 0.25;
/// Bass level (0..1) above which glitching may trigger.
pub const GLITCH_BASS: f32 = 0.55;

/// Hue-rotating tint blended with the overlay operator.
pub(crate) fn color_shift(s: &mut Surface, ctx: &EffectCtx) {
    if ctx.treble <= COLOR_SHIFT_TREBLE {
        return;
    }
    let k = ctx.fx.color_shift_intensity.clamp(0.0, 1.0);
    let hue = (ctx.t * 60.0 + ctx.treble * 180.0).rem_euclid(360.0);
    s.save();
    s.set_blend(BlendMode::Overlay);
    s.set_alpha(k * (0.3 + ctx.treble * 0.5));
    s.fill_rect(0.0, 0.0, ctx.w, ctx.h, hsl(hue, 1.0, 0.5));
    s.restore();
}

/// Self-composite offset left and right with additive blending.
pub(crate) fn chromatic(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.chromatic_intensity.clamp(0.0, 1.0);
    let offset = k * (2.0 + ctx.bass * 12.0);
    if offset < 0.5 {
        return;
    }
    let snap = s.snapshot();
    s.save();
    s.set_blend(BlendMode::Lighter);
    s.set_alpha(0.15 + k * 0.2);
    s.draw_image(&snap, -offset, 0.0, ctx.w, ctx.h);
    s.draw_image(&snap, offset, 0.0, ctx.w, ctx.h);
    s.restore();
}

/// Random band displacement on bass hits plus a red/cyan fringe flash.
pub(crate) fn glitch(s: &mut Surface, ctx: &EffectCtx, rng: &mut fastrand::Rng) {
    let k = ctx.fx.glitch_intensity.clamp(0.0, 1.0);
    if ctx.bass <= GLITCH_BASS || rng.f32() > k {
        return;
    }
    let bands = 2 + (k * 8.0) as usize;
    let max_shift = (ctx.w * 0.12 * k).max(1.0) as usize;
    with_pixels(s, "glitch", |buf| pixel::glitch_bands(buf, rng, bands, max_shift));

    let y = rng.f32() * ctx.h;
    let bh = ctx.h * (0.02 + rng.f32() * 0.08);
    let fringe = ctx.w * 0.01 * (1.0 + ctx.bass * 2.0);
    s.save();
    s.set_blend(BlendMode::Lighter);
    s.set_alpha(0.25 * k);
    s.fill_rect(-fringe, y, ctx.w, bh, Color::rgb(255, 0, 40));
    s.fill_rect(fringe, y + bh * 0.5, ctx.w, bh, Color::rgb(0, 255, 255));
    s.restore();
}

pub(crate) fn scanlines(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.scanlines_intensity.clamp(0.0, 1.0);
    if k <= 0.0 {
        return;
    }
    let line = Color::BLACK.with_alpha(0.15 + k * 0.45);
    let mut y = 0.0;
    while y < ctx.h {
        s.fill_rect(0.0, y, ctx.w, 1.0, line);
        y += 3.0;
    }
}

/// Radial darkening; the clear center shrinks as intensity grows and
/// breathes with the bass.
pub(crate) fn vignette(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.vignette_intensity.clamp(0.0, 1.0);
    let (cx, cy) = ctx.center();
    let outer = ctx.reach();
    let inner = outer * (0.75 - k * 0.5) * (1.0 + ctx.bass * 0.15);
    let g = Gradient::radial(cx, cy, inner.min(outer * 0.95), outer)
        .stop(0.0, Color::BLACK.with_alpha(0.0))
        .stop(1.0, Color::BLACK.with_alpha((0.4 + k * 0.6).min(1.0)));
    s.fill_rect(0.0, 0.0, ctx.w, ctx.h, g);
}
