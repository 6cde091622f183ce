use std::f32::consts::{PI, TAU};

use super::{Style, StyleCtx};
use crate::noise::ValueNoise;
use crate::surface::{BlendMode, Color, Gradient, Path, Surface};

/// Spokes around a pulsing core, rotated by the accumulator.
pub struct Circular;

impl Style for Circular {
    fn name(&self) -> &'static str {
        "circular"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars();
        if n == 0 {
            return;
        }
        let cx = ctx.w * 0.5;
        let cy = ctx.h * 0.5;
        let m = ctx.min_side();
        let bass = ctx.audio.bass() * ctx.gain;
        let inner = m * 0.18;
        s.set_line_width((TAU * inner / n as f32 * 0.6).clamp(1.0, 8.0));
        for i in 0..n {
            let v = ctx.level(i).min(1.2);
            let len = v * m * 0.3;
            if len < 0.5 {
                continue;
            }
            let a = i as f32 / n as f32 * TAU + ctx.rotation;
            let (dy, dx) = a.sin_cos();
            let color = ctx.palette.pick(i, n);
            s.set_shadow(ctx.glow(v), color);
            s.stroke_line(cx + dx * inner, cy + dy * inner, cx + dx * (inner + len), cy + dy * (inner + len), color);
            if ctx.config.mirror_mode {
                s.stroke_line(cx - dx * inner, cy - dy * inner, cx - dx * (inner + len), cy - dy * (inner + len), color);
            }
        }
        s.clear_shadow();

        let core = inner * (0.5 + bass.min(1.0) * 0.45);
        let c = ctx.palette.cycle(0);
        let g = Gradient::radial(cx, cy, 0.0, core)
            .stop(0.0, Color::WHITE.with_alpha(0.9))
            .stop(0.6, c.with_alpha(0.7))
            .stop(1.0, c.with_alpha(0.0));
        s.fill_circle(cx, cy, core, g);
    }
}

/// Gradient rays from the center at double rotation speed.
pub struct RadialBurst;

impl Style for RadialBurst {
    fn name(&self) -> &'static str {
        "radialBurst"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars();
        if n == 0 {
            return;
        }
        let cx = ctx.w * 0.5;
        let cy = ctx.h * 0.5;
        let m = ctx.min_side();
        let r0 = m * 0.04;
        s.set_line_width(2.0 + ctx.audio.treble() * 3.0);
        for i in 0..n {
            let v = ctx.level(i).min(1.2);
            let len = v * m * 0.5;
            if len < 0.5 {
                continue;
            }
            let a = i as f32 / n as f32 * TAU + ctx.rotation * 2.0;
            let (dy, dx) = a.sin_cos();
            let color = ctx.palette.pick(i, n);
            let (x0, y0) = (cx + dx * r0, cy + dy * r0);
            let (x1, y1) = (cx + dx * (r0 + len), cy + dy * (r0 + len));
            let g = Gradient::linear(x0, y0, x1, y1)
                .stop(0.0, color)
                .stop(1.0, color.with_alpha(0.0));
            s.set_shadow(ctx.glow(v), color);
            let mut p = Path::new();
            p.move_to(x0, y0).line_to(x1, y1);
            s.stroke_path(&p, g.clone());
            if ctx.config.mirror_mode {
                let mut q = Path::new();
                q.move_to(2.0 * cx - x0, y0).line_to(2.0 * cx - x1, y1);
                let gm = Gradient::linear(2.0 * cx - x0, y0, 2.0 * cx - x1, y1)
                    .stop(0.0, color)
                    .stop(1.0, color.with_alpha(0.0));
                s.stroke_path(&q, gm);
            }
        }
        s.clear_shadow();
    }
}

const SLICES: usize = 8;

/// Eight rotationally mirrored pie slices of shapes and a waveform ring.
pub struct Kaleidoscope;

impl Style for Kaleidoscope {
    fn name(&self) -> &'static str {
        "kaleidoscope"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let cx = ctx.w * 0.5;
        let cy = ctx.h * 0.5;
        let radius = (ctx.w * ctx.w + ctx.h * ctx.h).sqrt() * 0.5;
        let seg = TAU / SLICES as f32;
        let shapes = 7usize;
        for k in 0..SLICES {
            s.save();
            s.translate(cx, cy);
            if k % 2 == 0 {
                s.rotate(k as f32 * seg + ctx.rotation);
            } else {
                s.rotate((k + 1) as f32 * seg + ctx.rotation);
                s.scale(1.0, -1.0);
            }
            let mut wedge = Path::new();
            wedge.move_to(0.0, 0.0).arc(0.0, 0.0, radius, 0.0, seg, false).close();
            s.clip(&wedge);

            let reach = ctx.min_side() * 0.5;
            for j in 0..shapes {
                let pos = j as f32 / shapes as f32;
                let v = ctx.mag(ctx.audio.freq_at(pos));
                let r = reach * (0.15 + pos * 0.8);
                let a = seg * 0.5 + (ctx.t * 0.8 + j as f32).sin() * seg * 0.3;
                let (x, y) = (a.cos() * r, a.sin() * r);
                let size = 4.0 + v.min(1.5) * reach * 0.12;
                let color = ctx.palette.pick(j, shapes).with_alpha(0.75);
                s.set_shadow(ctx.glow(v), color);
                let mut p = Path::new();
                match j % 3 {
                    0 => p.circle(x, y, size),
                    1 => p.regular_polygon(x, y, size, 6, ctx.t),
                    _ => p.regular_polygon(x, y, size, 4, 0.0),
                };
                s.fill_path(&p, color);
            }
            s.clear_shadow();

            let ring_r = reach * 0.6;
            let steps = 24;
            let mut ring = Path::new();
            for q in 0..=steps {
                let f = q as f32 / steps as f32;
                let wv = (ctx.audio.wave_at(f) as f32 - 128.0) / 128.0;
                let r = ring_r + wv * ring_r * 0.25 * ctx.gain;
                let a = f * seg;
                if q == 0 {
                    ring.move_to(a.cos() * r, a.sin() * r);
                } else {
                    ring.line_to(a.cos() * r, a.sin() * r);
                }
            }
            s.set_line_width(2.0);
            s.stroke_path(&ring, ctx.palette.cycle(k).with_alpha(0.8));
            s.restore();
        }
    }
}

const BLOB_POINTS: usize = 128;

/// Three noisy concentric blobs around a glowing core.
pub struct AudioBlob {
    noise: ValueNoise,
}

impl AudioBlob {
    pub fn new() -> Self {
        Self {
            noise: ValueNoise::new(),
        }
    }
}

impl Style for AudioBlob {
    fn name(&self) -> &'static str {
        "audioBlob"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let cx = ctx.w * 0.5;
        let cy = ctx.h * 0.5;
        let m = ctx.min_side();
        let a = ctx.audio;
        let (bass, mid, treble) = (a.bass() * ctx.gain, a.mid() * ctx.gain, a.treble() * ctx.gain);
        let t = ctx.t;

        s.save();
        s.set_blend(BlendMode::Screen);
        for layer in (0..3).rev() {
            let lf = layer as f32;
            let base = m * (0.14 + lf * 0.07) * (1.0 + bass.min(1.5) * 0.3);
            let mut p = Path::new();
            for i in 0..BLOB_POINTS {
                let ang = i as f32 / BLOB_POINTS as f32 * TAU;
                let n = self.noise.noise2(ang.cos() * 1.5 + lf * 3.1 + t * 0.3, ang.sin() * 1.5 + t * 0.4);
                let disp = (ang * 3.0 + t * 2.0 + lf).sin() * bass * 0.15
                    + (ang * 5.0 - t * 1.5).sin() * mid * 0.1
                    + (ang * 8.0 + t * 3.0 + lf * PI).sin() * treble * 0.06
                    + (n - 0.5) * 0.25;
                let r = base * (1.0 + disp);
                let (x, y) = (cx + ang.cos() * r, cy + ang.sin() * r);
                if i == 0 {
                    p.move_to(x, y);
                } else {
                    p.line_to(x, y);
                }
            }
            p.close();
            let c = ctx.palette.pick(layer, 3);
            let g = Gradient::radial(cx, cy, 0.0, base * 1.3)
                .stop(0.0, c.with_alpha(0.65))
                .stop(0.7, c.with_alpha(0.35))
                .stop(1.0, c.with_alpha(0.05));
            s.fill_path(&p, g);
        }
        s.restore();

        let core = m * 0.04 * (1.0 + bass.min(1.5));
        let c = ctx.palette.cycle(1);
        s.set_shadow(ctx.glow(bass.max(0.3)), c);
        s.fill_circle(cx, cy, core, Color::WHITE.lerp(c, 0.3));
        s.clear_shadow();
    }
}
