use std::f32::consts::PI;

use super::{Style, StyleCtx};
use crate::noise::ValueNoise;
use crate::surface::{BlendMode, Gradient, Path, Surface};

/// Stroked time-domain trace; mirrored copy flipped about the midline.
pub struct Waveform;

impl Style for Waveform {
    fn name(&self) -> &'static str {
        "waveform"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let data = &ctx.audio.time_domain_data;
        if data.is_empty() {
            return;
        }
        let step = ((data.len() as f32 / ctx.w).ceil() as usize).max(1);
        let count = data.len().div_ceil(step);
        let slice = ctx.w / (count.max(2) - 1) as f32;
        let mid = ctx.h * 0.5;
        let mut p = Path::new();
        for (k, &v) in data.iter().step_by(step).enumerate() {
            let y = mid + (v as f32 / 128.0 - 1.0) * mid * ctx.gain;
            let x = k as f32 * slice;
            if k == 0 {
                p.move_to(x, y);
            } else {
                p.line_to(x, y);
            }
        }
        let mut g = Gradient::linear(0.0, 0.0, ctx.w, 0.0);
        let n = ctx.palette.len();
        for (i, c) in ctx.palette.colors().iter().enumerate() {
            g = g.stop(i as f32 / (n.max(2) - 1) as f32, *c);
        }
        s.set_line_width(2.0 + ctx.audio.bass() * 4.0);
        s.set_shadow(ctx.glow(ctx.audio.energy()), ctx.palette.cycle(0));
        s.stroke_path(&p, g.clone());
        if ctx.config.mirror_mode {
            s.save();
            s.translate(0.0, ctx.h);
            s.scale(1.0, -1.0);
            s.set_alpha(0.5);
            s.stroke_path(&p, g);
            s.restore();
        }
        s.clear_shadow();
    }
}

/// Three translucent waves, phase shifted per layer.
pub struct Fluid;

impl Style for Fluid {
    fn name(&self) -> &'static str {
        "fluid"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let segments = 96;
        for layer in 0..3 {
            let lf = layer as f32;
            let amp = ctx.mag(ctx.audio.freq_at(lf * 0.15 + 0.02)).min(1.5) * ctx.h * 0.25;
            let base = ctx.h * (0.45 + lf * 0.1);
            let mut p = Path::new();
            p.move_to(0.0, ctx.h);
            for i in 0..=segments {
                let x = i as f32 / segments as f32 * ctx.w;
                let phase = x * 0.01 + ctx.t * (1.0 + lf * 0.5) + lf * PI / 3.0;
                let y = base + phase.sin() * amp + (phase * 2.3).cos() * amp * 0.3;
                p.line_to(x, y);
            }
            p.line_to(ctx.w, ctx.h).close();
            let c = ctx.palette.pick(layer, 3);
            let g = Gradient::linear(0.0, base - amp, 0.0, ctx.h)
                .stop(0.0, c.with_alpha(0.45))
                .stop(1.0, c.with_alpha(0.1));
            s.set_shadow(ctx.glow(ctx.audio.mid()), c);
            s.fill_path(&p, g);
        }
        s.clear_shadow();
    }
}

/// Four parallax silhouettes built from smoothed spectrum peaks.
pub struct MountainRange;

impl Style for MountainRange {
    fn name(&self) -> &'static str {
        "mountainRange"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let peaks = 24usize;
        let data = &ctx.audio.frequency_data;
        let len = data.len();
        for layer in (0..4).rev() {
            let lf = layer as f32;
            let max_h = ctx.h * (0.65 - lf * 0.12);
            let offset = layer * 7;
            let pts: Vec<(f32, f32)> = (0..=peaks)
                .map(|i| {
                    let v = if len == 0 {
                        0
                    } else {
                        data[((i + offset) * len / (peaks * 3)).min(len - 1)]
                    };
                    let x = i as f32 / peaks as f32 * ctx.w;
                    (x, ctx.h - ctx.mag(v).min(1.2) * max_h)
                })
                .collect();
            let mut p = Path::new();
            p.move_to(0.0, ctx.h).line_to(pts[0].0, pts[0].1);
            for w in pts.windows(2) {
                let (x0, y0) = w[0];
                let (x1, y1) = w[1];
                p.quad_to(x0, y0, (x0 + x1) * 0.5, (y0 + y1) * 0.5);
            }
            let last = pts[pts.len() - 1];
            p.line_to(last.0, last.1).line_to(ctx.w, ctx.h).close();
            let c = ctx.palette.pick(3 - layer, 4);
            let alpha = 1.0 - lf * 0.2;
            let g = Gradient::linear(0.0, ctx.h - max_h, 0.0, ctx.h)
                .stop(0.0, c.with_alpha(alpha))
                .stop(1.0, c.with_alpha(alpha * 0.3));
            s.fill_path(&p, g);
        }
    }
}

/// Value-noise color field plus three noise-driven additive strokes.
pub struct PerlinFluid {
    noise: ValueNoise,
}

impl PerlinFluid {
    pub fn new() -> Self {
        Self {
            noise: ValueNoise::new(),
        }
    }
}

impl Style for PerlinFluid {
    fn name(&self) -> &'static str {
        "perlinFluid"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let a = ctx.audio;
        let bass = (a.bass() * ctx.gain).min(1.5);
        let mid = (a.mid() * ctx.gain).min(1.5);
        let cell = (ctx.w.max(ctx.h) / 48.0).max(4.0);
        let cols = (ctx.w / cell).ceil() as usize;
        let rows = (ctx.h / cell).ceil() as usize;
        let t = ctx.t;

        s.save();
        s.set_blend(BlendMode::Lighter);
        for gy in 0..rows {
            for gx in 0..cols {
                let x = gx as f32 * cell;
                let y = gy as f32 * cell;
                let n = self.noise.noise2(x * 0.006 + t * 0.15, y * 0.006 - t * 0.1);
                let alpha = n * 0.25 * (0.4 + bass * 0.6);
                if alpha < 0.01 {
                    continue;
                }
                let c = ctx.palette.gradient_at(n);
                s.fill_rect(x, y, cell, cell, c.with_alpha(alpha));
            }
        }

        s.set_line_width(2.0 + mid * 2.0);
        for layer in 0..3 {
            let lf = layer as f32;
            let mut p = Path::new();
            let steps = 80;
            for i in 0..=steps {
                let x = i as f32 / steps as f32 * ctx.w;
                let n = self.noise.noise2(x * 0.004 + lf * 10.0, t * 0.3 + lf);
                let y = ctx.h * (0.3 + lf * 0.2) + (n - 0.5) * ctx.h * 0.4 * (0.5 + mid);
                if i == 0 {
                    p.move_to(x, y);
                } else {
                    p.line_to(x, y);
                }
            }
            let c = ctx.palette.pick(layer, 3);
            s.set_shadow(ctx.glow(mid), c);
            s.stroke_path(&p, c.with_alpha(0.6));
        }
        s.restore();
    }
}
