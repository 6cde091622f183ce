mod flow;
mod maze;
mod particles;
mod radial;
mod spectrum;

use tracing::trace;

use crate::audio::AudioFeatureFrame;
use crate::color::{saturate, ColorScheme, Palette};
use crate::settings::{VisualStyle, VisualizerConfig};
use crate::surface::{BlendMode, Color, PixelBuffer, Surface};

pub use flow::{Fluid, MountainRange, PerlinFluid, Waveform};
pub use maze::EndlessMaze;
pub use particles::{Particle, ParticleField};
pub use radial::{AudioBlob, Circular, Kaleidoscope, RadialBurst};
pub use spectrum::{AudioBars, Bars, Equalizer, Spectrum3d, SpectrumAnalyzer};

/// Accumulator step per frame for `rotation_speed = 1`.
pub const ROTATION_STEP: f32 = 0.01;
/// Shadow blur in pixels at `glow_intensity = 1` and full band energy.
pub const MAX_GLOW_PX: f32 = 30.0;
const FADE_ALPHA: f32 = 0.2;
const BACKGROUND_ALPHA: f32 = 0.3;

/// Everything a style needs for one frame.
pub struct StyleCtx<'a> {
    pub t: f32,
    pub w: f32,
    pub h: f32,
    pub audio: &'a AudioFeatureFrame,
    /// Per-bar magnitudes after gain, `bar_count` entries, 0 = silent and
    /// 1 = full scale (may exceed 1 with high sensitivity).
    pub levels: &'a [f32],
    /// Held peaks per bar when peak hold is on.
    pub peaks: Option<&'a [f32]>,
    pub palette: &'a Palette,
    pub config: &'a VisualizerConfig,
    /// Sensitivity with ducking applied.
    pub gain: f32,
    pub rotation: f32,
}

impl StyleCtx<'_> {
    /// Byte magnitude scaled by gain, 0..=1+.
    #[inline]
    pub fn mag(&self, v: u8) -> f32 {
        v as f32 / 255.0 * self.gain
    }

    /// Shadow blur radius for a given band energy (0..1).
    #[inline]
    pub fn glow(&self, energy: f32) -> f32 {
        let g = self.config.glow_intensity;
        if !g.is_finite() || g <= 0.0 {
            return 0.0;
        }
        g.min(1.0) * MAX_GLOW_PX * energy.clamp(0.0, 1.0)
    }

    pub fn min_side(&self) -> f32 {
        self.w.min(self.h)
    }

    pub fn bars(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, i: usize) -> f32 {
        self.levels.get(i).copied().unwrap_or(0.0)
    }
}

pub trait Style {
    fn name(&self) -> &'static str;
    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx);
    /// Drops persistent simulation state (particles, pulses).
    fn clear_particles(&mut self) {}
    fn particle_count(&self) -> usize {
        0
    }
}

/// One boxed style per [`VisualStyle::all`] entry, in the same order.
pub fn make_styles(seed: u64) -> Vec<Box<dyn Style>> {
    vec![
        Box::new(Bars),
        Box::new(Waveform),
        Box::new(Circular),
        Box::new(ParticleField::new(seed)),
        Box::new(Fluid),
        Box::new(Spectrum3d),
        Box::new(RadialBurst),
        Box::new(MountainRange),
        Box::new(SpectrumAnalyzer),
        Box::new(Equalizer),
        Box::new(AudioBars),
        Box::new(PerlinFluid::new()),
        Box::new(AudioBlob::new()),
        Box::new(Kaleidoscope),
        Box::new(EndlessMaze::new(seed ^ 0x4D41_5A45)),
    ]
}

/// Per-call inputs to [`VisualizationRenderer::render`].
pub struct RenderRequest<'a> {
    /// Seconds since the animation started.
    pub time: f32,
    pub audio: &'a AudioFeatureFrame,
    pub style: VisualStyle,
    pub color_scheme: ColorScheme,
    pub config: &'a VisualizerConfig,
    pub background: Option<&'a PixelBuffer>,
    pub custom_palette: &'a [String],
    pub skip_background_fill: bool,
}

/// Draws one visualization style per call and owns all per-style state.
pub struct VisualizationRenderer {
    styles: Vec<Box<dyn Style>>,
    rotation: f32,
    levels: Vec<f32>,
    peaks: Vec<f32>,
}

impl Default for VisualizationRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizationRenderer {
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            styles: make_styles(seed),
            rotation: 0.0,
            levels: Vec::new(),
            peaks: Vec::new(),
        }
    }

    pub fn style_names(&self) -> Vec<&'static str> {
        self.styles.iter().map(|s| s.name()).collect()
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn reset_rotation(&mut self) {
        self.rotation = 0.0;
    }

    pub fn clear_particles(&mut self) {
        for style in &mut self.styles {
            style.clear_particles();
        }
    }

    /// Live particles across every style's pool.
    pub fn particle_count(&self) -> usize {
        self.styles.iter().map(|s| s.particle_count()).sum()
    }

    pub fn render(&mut self, surface: &mut Surface, req: &RenderRequest) {
        let Some(idx) = VisualStyle::all().iter().position(|s| *s == req.style) else {
            trace!(style = ?req.style, "unknown style, nothing drawn");
            return;
        };
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        if w < 1.0 || h < 1.0 {
            return;
        }
        let config = req.config;

        surface.save();
        if !req.skip_background_fill {
            let fade = if config.motion_blur {
                FADE_ALPHA * (1.0 - 0.85 * config.motion_blur_intensity.clamp(0.0, 1.0))
            } else {
                FADE_ALPHA
            };
            surface.fill_rect(0.0, 0.0, w, h, Color::BLACK.with_alpha(fade.max(0.02)));
        }
        if let Some(bg) = req.background.filter(|b| !b.is_empty()) {
            let (dx, dy, dw, dh) = cover_rect(bg.width() as f32, bg.height() as f32, w, h, 1.0);
            surface.set_alpha(BACKGROUND_ALPHA);
            surface.draw_image(bg, dx, dy, dw, dh);
            surface.set_alpha(1.0);
        }

        let rs = if config.rotation_speed.is_finite() { config.rotation_speed } else { 0.0 };
        self.rotation += rs * ROTATION_STEP;

        let gain = ducked_gain(config, req.audio);
        self.sample_levels(req.audio, config, gain);

        let mut palette = Palette::resolve(req.color_scheme, req.custom_palette);
        let ci = config.color_intensity;
        if ci.is_finite() && (ci - 1.0).abs() > 1e-3 {
            palette = Palette::from_colors(palette.colors().iter().map(|c| saturate(*c, ci)).collect());
        }

        let ctx = StyleCtx {
            t: req.time,
            w,
            h,
            audio: req.audio,
            levels: &self.levels,
            peaks: config.peak_hold.then_some(self.peaks.as_slice()),
            palette: &palette,
            config,
            gain,
            rotation: self.rotation,
        };
        self.styles[idx].draw(surface, &ctx);
        surface.restore();

        if config.bloom {
            apply_bloom(surface, config.bloom_intensity);
        }
    }

    fn sample_levels(&mut self, audio: &AudioFeatureFrame, config: &VisualizerConfig, gain: f32) {
        let n = config.bar_count();
        self.levels.resize(n, 0.0);
        let data = &audio.frequency_data;
        let step = (data.len() / n).max(1);
        for (i, level) in self.levels.iter_mut().enumerate() {
            let v = data.get(i * step).copied().unwrap_or(0);
            *level = v as f32 / 255.0 * gain;
        }
        if self.peaks.len() != n {
            self.peaks = self.levels.clone();
        }
        let decay = config.peak_hold_decay.clamp(0.0, 1.0);
        for (p, l) in self.peaks.iter_mut().zip(&self.levels) {
            *p = (*p - decay).max(*l).max(0.0);
        }
    }
}

/// Sensitivity, reduced while bass dominates when ducking is on.
fn ducked_gain(config: &VisualizerConfig, audio: &AudioFeatureFrame) -> f32 {
    let base = config.sensitivity();
    if !config.ducking {
        return base;
    }
    let dominance = ((audio.bass_level - audio.mid_level.max(audio.treble_level)) / 255.0).clamp(0.0, 1.0);
    base * (1.0 - 0.6 * config.ducking_intensity.clamp(0.0, 1.0) * dominance)
}

/// Additive re-composite of a quarter-resolution copy.
fn apply_bloom(surface: &mut Surface, intensity: f32) {
    let (w, h) = (surface.width(), surface.height());
    let (sw, sh) = ((w / 4).max(1), (h / 4).max(1));
    let snapshot = surface.snapshot();
    let mut small = Surface::new(sw, sh);
    small.draw_image(&snapshot, 0.0, 0.0, sw as f32, sh as f32);
    surface.save();
    surface.set_blend(BlendMode::Lighter);
    surface.set_alpha(0.6 * intensity.clamp(0.0, 1.0));
    surface.draw_image(small.pixels(), 0.0, 0.0, w as f32, h as f32);
    surface.restore();
}

/// Aspect-preserving rectangle that covers `(w, h)`, centered, enlarged by
/// `oversize`. Returns `(x, y, width, height)`.
pub fn cover_rect(img_w: f32, img_h: f32, w: f32, h: f32, oversize: f32) -> (f32, f32, f32, f32) {
    if img_w <= 0.0 || img_h <= 0.0 {
        return (0.0, 0.0, w, h);
    }
    let scale = (w / img_w).max(h / img_h) * oversize;
    let dw = img_w * scale;
    let dh = img_h * scale;
    ((w - dw) * 0.5, (h - dh) * 0.5, dw, dh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_rect_fills_and_centers() {
        let (x, y, w, h) = cover_rect(200.0, 100.0, 100.0, 100.0, 1.0);
        assert_eq!((w, h), (200.0, 100.0));
        assert_eq!((x, y), (-50.0, 0.0));
    }

    #[test]
    fn ducking_only_reduces_gain_when_bass_dominates() {
        let mut cfg = VisualizerConfig {
            ducking: true,
            ducking_intensity: 1.0,
            sensitivity: 1.0,
            ..VisualizerConfig::default()
        };
        let mut frame = AudioFeatureFrame::silent(64);
        frame.bass_level = 255.0;
        assert!(ducked_gain(&cfg, &frame) < 0.5);
        frame.mid_level = 255.0;
        assert_eq!(ducked_gain(&cfg, &frame), 1.0);
        cfg.ducking = false;
        frame.mid_level = 0.0;
        assert_eq!(ducked_gain(&cfg, &frame), 1.0);
    }
}
