use std::f32::consts::{PI, TAU};

use super::EffectCtx;
use crate::noise::hash01;
use crate::surface::{BlendMode, Color, Path, PixelBuffer, Surface};

pub const MAX_RINGS: usize = 20;
pub const TUNNEL_LAYERS: usize = 8;
pub const MAX_SHARDS: usize = 32;
const RIPPLE_RINGS: usize = 5;

/// Rotates the snapshot about the canvas center inside one clip region.
fn draw_rotated(s: &mut Surface, ctx: &EffectCtx, snap: &PixelBuffer, angle: f32) {
    let (cx, cy) = ctx.center();
    s.translate(cx, cy);
    s.rotate(angle);
    s.translate(-cx, -cy);
    s.draw_image(snap, 0.0, 0.0, ctx.w, ctx.h);
}

/// Concentric annuli of the current frame, each spun independently.
pub(crate) fn circle_rotation(s: &mut Surface, ctx: &EffectCtx) {
    let rings = ctx.fx.circle_rotation_count.clamp(1, MAX_RINGS);
    let k = ctx.fx.circle_rotation_intensity.clamp(0.0, 1.0);
    let (cx, cy) = ctx.center();
    let reach = ctx.reach();
    let snap = s.snapshot();
    for i in 0..rings {
        let inner = reach * i as f32 / rings as f32;
        let outer = reach * (i + 1) as f32 / rings as f32;
        let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
        let speed = 0.2 + i as f32 * 0.12;
        let angle = dir * (ctx.t * speed * k + ctx.bass * k * 0.3);

        let mut ring = Path::new();
        ring.circle(cx, cy, outer);
        if inner > 0.5 {
            ring.arc(cx, cy, inner, 0.0, -TAU, true).close();
        }
        s.save();
        s.clip(&ring);
        draw_rotated(s, ctx, &snap, angle);
        s.restore();
    }
}

/// Looping falling drops in two additive layers plus a sparse splash layer.
/// Drop placement comes from a seeded per-index hash so it is identical
/// every frame.
pub(crate) fn rain_mask(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.rain_mask_intensity.clamp(0.0, 1.0);
    let speed = if ctx.fx.rain_mask_speed.is_finite() { ctx.fx.rain_mask_speed.clamp(0.0, 10.0) } else { 1.0 };
    s.save();
    s.set_blend(BlendMode::Lighter);
    for layer in 0..2u32 {
        let drops = 60 + layer as usize * 40;
        let fall = ctx.h * (0.35 + layer as f32 * 0.3) * (1.0 + ctx.bass * 0.5);
        s.set_line_width(1.0 + layer as f32 * 0.5);
        let color = Color::rgb(200, 220, 255).with_alpha((0.15 + layer as f32 * 0.1) * k);
        for i in 0..drops as u32 {
            let x = hash01(i, 11 + layer) * ctx.w;
            let len = 8.0 + hash01(i, 23 + layer) * 22.0;
            let span = ctx.h + len;
            let y = (hash01(i, 37 + layer) * span + ctx.t * speed * fall).rem_euclid(span) - len;
            s.stroke_line(x, y, x - len * 0.1, y + len, color);
        }
    }
    s.set_line_width(1.0);
    for i in 0..24u32 {
        let x = hash01(i, 71) * ctx.w;
        let y = hash01(i, 83) * ctx.h;
        let phase = (ctx.t * speed * 0.8 + hash01(i, 97)).fract();
        let r = 2.0 + phase * 14.0;
        let mut arc = Path::new();
        arc.arc(x, y, r, PI, TAU, false);
        s.stroke_path(&arc, Color::WHITE.with_alpha((1.0 - phase) * 0.4 * k));
    }
    s.restore();
}

/// Expanding rings from the center, fading as they grow.
pub(crate) fn ripple(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.ripple_intensity.clamp(0.0, 1.0);
    let speed = if ctx.fx.ripple_speed.is_finite() { ctx.fx.ripple_speed.clamp(0.0, 10.0) } else { 1.0 };
    let (cx, cy) = ctx.center();
    let reach = ctx.reach();
    s.save();
    s.set_blend(BlendMode::Overlay);
    s.set_line_width(2.0 + ctx.bass * 6.0);
    for i in 0..RIPPLE_RINGS {
        let phase = (ctx.t * speed * 0.4 + i as f32 / RIPPLE_RINGS as f32).fract();
        let r = phase * reach;
        if r < 1.0 {
            continue;
        }
        let mut ring = Path::new();
        ring.circle(cx, cy, r);
        let alpha = (1.0 - phase) * k * (0.5 + ctx.bass * 0.5);
        s.stroke_path(&ring, Color::WHITE.with_alpha(alpha));
    }
    s.restore();
}

/// Nested scaled copies of the frame receding into the center.
pub(crate) fn tunnel_zoom(s: &mut Surface, ctx: &EffectCtx) {
    let k = ctx.fx.tunnel_zoom_intensity.clamp(0.0, 1.0);
    let (cx, cy) = ctx.center();
    let snap = s.snapshot();
    let base = (ctx.t * 0.25 * (1.0 + ctx.bass)).fract();
    let mut layers: Vec<f32> = (0..TUNNEL_LAYERS)
        .map(|i| (base + i as f32 / TUNNEL_LAYERS as f32).fract())
        .collect();
    // Largest first so smaller copies land on top.
    layers.sort_by(|a, b| b.total_cmp(a));
    s.save();
    for phase in layers {
        let scale = 0.15 + phase * 0.85;
        let alpha = (1.0 - phase) * k * 0.6;
        if alpha <= 0.01 {
            continue;
        }
        s.set_alpha(alpha);
        let (w, h) = (ctx.w * scale, ctx.h * scale);
        s.draw_image(&snap, cx - w * 0.5, cy - h * 0.5, w, h);
    }
    s.restore();
}

/// Pie-slice shards of the frame pushed outward over black, each with a
/// slight twist and a highlighted edge.
pub(crate) fn shatter(s: &mut Surface, ctx: &EffectCtx) {
    let pieces = ctx.fx.shatter_pieces.clamp(3, MAX_SHARDS);
    let k = ctx.fx.shatter_intensity.clamp(0.0, 1.0);
    let (cx, cy) = ctx.center();
    let reach = ctx.reach();
    let seg = TAU / pieces as f32;
    let snap = s.snapshot();
    s.fill_rect(0.0, 0.0, ctx.w, ctx.h, Color::BLACK);
    for p in 0..pieces {
        let a0 = p as f32 * seg;
        let mid = a0 + seg * 0.5;
        let push = reach * (0.01 + k * ctx.bass * 0.12);
        let twist = (p as f32 * 1.7 + ctx.t).sin() * 0.06 * k;
        let mut wedge = Path::new();
        wedge.move_to(cx, cy).arc(cx, cy, reach * 1.05, a0, a0 + seg, false).close();

        s.save();
        s.translate(cx + mid.cos() * push, cy + mid.sin() * push);
        s.rotate(twist);
        s.translate(-cx, -cy);
        s.save();
        s.clip(&wedge);
        s.draw_image(&snap, 0.0, 0.0, ctx.w, ctx.h);
        s.restore();
        s.set_line_width(1.5);
        s.stroke_path(&wedge, Color::WHITE.with_alpha(0.25 + k * 0.35));
        s.restore();
    }
}
