use super::{Style, StyleCtx};
use crate::surface::{Color, Gradient, Path, Surface};

/// Vertical bars from the bottom edge, or split around the middle when
/// mirrored.
pub struct Bars;

impl Style for Bars {
    fn name(&self) -> &'static str {
        "bars"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars();
        if n == 0 {
            return;
        }
        let bar_w = ctx.w / n as f32;
        let gap = (bar_w * 0.15).min(2.0);
        let mirror = ctx.config.mirror_mode;
        for i in 0..n {
            let v = ctx.level(i).min(1.0);
            let full = if mirror { ctx.h * 0.5 } else { ctx.h };
            let bh = v * full * 0.95;
            if bh < 0.5 {
                continue;
            }
            let x = i as f32 * bar_w + gap * 0.5;
            let bw = (bar_w - gap).max(1.0);
            let c0 = ctx.palette.pick(i, n);
            let c1 = ctx.palette.cycle(i + 1);
            s.set_shadow(ctx.glow(ctx.audio.bass()), c0);
            if mirror {
                let mid = ctx.h * 0.5;
                let up = Gradient::linear(0.0, mid, 0.0, mid - bh).stop(0.0, c0).stop(1.0, c1);
                s.fill_rect(x, mid - bh, bw, bh, up);
                let down = Gradient::linear(0.0, mid, 0.0, mid + bh).stop(0.0, c0).stop(1.0, c1);
                s.fill_rect(x, mid, bw, bh, down);
            } else {
                let g = Gradient::linear(0.0, ctx.h, 0.0, ctx.h - bh).stop(0.0, c0).stop(1.0, c1);
                s.fill_rect(x, ctx.h - bh, bw, bh, g);
            }
        }
        s.clear_shadow();
        if let Some(peaks) = ctx.peaks {
            for (i, &p) in peaks.iter().enumerate().take(n) {
                let p = p.min(1.0);
                if p <= 0.01 {
                    continue;
                }
                let x = i as f32 * bar_w + gap * 0.5;
                let bw = (bar_w - gap).max(1.0);
                let color = Color::WHITE.with_alpha(0.85);
                if mirror {
                    let off = p * ctx.h * 0.5 * 0.95;
                    s.fill_rect(x, ctx.h * 0.5 - off - 2.0, bw, 2.0, color);
                    s.fill_rect(x, ctx.h * 0.5 + off, bw, 2.0, color);
                } else {
                    s.fill_rect(x, ctx.h - p * ctx.h * 0.95 - 2.0, bw, 2.0, color);
                }
            }
        }
    }
}

/// Bars receding into depth, drawn back to front.
pub struct Spectrum3d;

impl Style for Spectrum3d {
    fn name(&self) -> &'static str {
        "spectrum3d"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars();
        if n == 0 {
            return;
        }
        let rows = 4usize;
        let per_row = n.div_ceil(rows);
        let cx = ctx.w * 0.5;
        let base_w = ctx.w * 0.8 / per_row as f32;
        // Farthest row first so nearer bars cover it.
        for row in (0..rows).rev() {
            let depth = row as f32 / rows as f32;
            let persp = 1.0 / (1.0 + depth * 1.6);
            let base_y = ctx.h * (0.88 - depth * 0.35);
            let alpha = 1.0 - depth * 0.7;
            let bw = base_w * persp;
            for k in 0..per_row {
                let i = row * per_row + k;
                if i >= n {
                    break;
                }
                let v = ctx.level(i).min(1.0);
                let bh = v * ctx.h * 0.55 * persp;
                if bh < 0.5 {
                    continue;
                }
                let x = cx + (k as f32 - per_row as f32 * 0.5) * bw;
                let color = ctx.palette.pick(i, n).with_alpha(alpha);
                s.set_shadow(ctx.glow(v) * persp, color);
                s.fill_rect(x, base_y - bh, bw * 0.8, bh, color);
                s.clear_shadow();
                let top_depth = bw * 0.35;
                let mut top = Path::new();
                top.move_to(x, base_y - bh)
                    .line_to(x + bw * 0.8, base_y - bh)
                    .line_to(x + bw * 0.8 + top_depth, base_y - bh - top_depth)
                    .line_to(x + top_depth, base_y - bh - top_depth)
                    .close();
                s.fill_path(&top, color.lerp(Color::WHITE, 0.35).with_alpha(alpha * 0.9));
            }
        }
    }
}

const LED_SEGMENTS: usize = 20;

/// LED meter columns with a bright cap on the highest lit segment.
pub struct SpectrumAnalyzer;

impl Style for SpectrumAnalyzer {
    fn name(&self) -> &'static str {
        "spectrumAnalyzer"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars().min(128);
        if n == 0 {
            return;
        }
        let col_w = ctx.w / n as f32;
        let seg_h = ctx.h * 0.85 / LED_SEGMENTS as f32;
        let bottom = ctx.h * 0.95;
        for i in 0..n {
            let v = ctx.level(i * ctx.bars() / n).min(1.0);
            let lit = (v * LED_SEGMENTS as f32).round() as usize;
            let x = i as f32 * col_w + col_w * 0.1;
            let bw = (col_w * 0.8).max(1.0);
            for seg in 0..lit {
                let y = bottom - (seg + 1) as f32 * seg_h;
                let color = if seg + 1 == lit {
                    Color::WHITE
                } else {
                    ctx.palette.gradient_at(seg as f32 / (LED_SEGMENTS - 1) as f32)
                };
                s.fill_rect(x, y + 1.0, bw, (seg_h - 2.0).max(1.0), color);
            }
            if let Some(peaks) = ctx.peaks {
                let p = peaks.get(i * ctx.bars() / n).copied().unwrap_or(0.0).min(1.0);
                let seg = (p * LED_SEGMENTS as f32).round() as usize;
                if seg > lit {
                    let y = bottom - seg as f32 * seg_h;
                    s.fill_rect(x, y + 1.0, bw, (seg_h - 2.0).max(1.0), Color::WHITE.with_alpha(0.6));
                }
            }
        }
    }
}

/// Ten fixed bands derived from the bass/mid/treble scalars.
pub struct Equalizer;

pub const EQ_BANDS: usize = 10;

/// Band `k` of ten, interpolated across bass → mid → treble, 0..=255.
pub fn equalizer_band(k: usize, bass: f32, mid: f32, treble: f32) -> f32 {
    let t = k.min(EQ_BANDS - 1) as f32 / (EQ_BANDS - 1) as f32 * 2.0;
    if t <= 1.0 {
        bass + (mid - bass) * t
    } else {
        mid + (treble - mid) * (t - 1.0)
    }
}

impl Style for Equalizer {
    fn name(&self) -> &'static str {
        "equalizer"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let a = ctx.audio;
        let slot = ctx.w / EQ_BANDS as f32;
        let bw = slot * 0.7;
        for k in 0..EQ_BANDS {
            let v = equalizer_band(k, a.bass_level, a.mid_level, a.treble_level);
            let bh = (ctx.mag(v.clamp(0.0, 255.0) as u8) * ctx.h * 0.8).min(ctx.h * 0.9);
            if bh < 0.5 {
                continue;
            }
            let x = k as f32 * slot + (slot - bw) * 0.5;
            let y = (ctx.h - bh) * 0.5;
            let color = ctx.palette.pick(k, EQ_BANDS);
            s.set_shadow(ctx.glow(v / 255.0), color);
            let mut p = Path::new();
            p.rounded_rect(x, y, bw, bh, bw.min(bh) * 0.25);
            let g = Gradient::linear(0.0, y, 0.0, y + bh)
                .stop(0.0, color)
                .stop(0.5, color.lerp(Color::WHITE, 0.3))
                .stop(1.0, color);
            s.fill_path(&p, g);
        }
        s.clear_shadow();
    }
}

/// Bars mixing spectrum and waveform, centered with a fade at both ends.
pub struct AudioBars;

impl Style for AudioBars {
    fn name(&self) -> &'static str {
        "audioBars"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let n = ctx.bars();
        if n == 0 {
            return;
        }
        let bar_w = ctx.w / n as f32;
        let mid = ctx.h * 0.5;
        for i in 0..n {
            let f = ctx.level(i);
            let td = (ctx.audio.wave_at(i as f32 / n as f32) as f32 - 128.0).abs() / 128.0;
            let v = (f * 0.7 + td * ctx.gain * 0.3).min(1.0);
            let bh = v * ctx.h * 0.8;
            if bh < 0.5 {
                continue;
            }
            let color = ctx.palette.pick(i, n);
            let g = Gradient::linear(0.0, mid - bh * 0.5, 0.0, mid + bh * 0.5)
                .stop(0.0, color.with_alpha(0.0))
                .stop(0.5, color)
                .stop(1.0, color.with_alpha(0.0));
            s.fill_rect(i as f32 * bar_w + 1.0, mid - bh * 0.5, (bar_w - 2.0).max(1.0), bh, g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equalizer_bands_span_the_three_scalars() {
        assert_eq!(equalizer_band(0, 200.0, 100.0, 50.0), 200.0);
        assert!((equalizer_band(9, 200.0, 100.0, 50.0) - 50.0).abs() < 1e-4);
        let mid = equalizer_band(4, 200.0, 100.0, 50.0);
        assert!(mid > 100.0 && mid < 200.0);
    }
}
