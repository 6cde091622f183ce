//! Configuration records supplied wholesale by the host on every change.
//! The renderer only reads them. Field names serialise in camelCase to match
//! persisted projects, every field has a default so partial JSON loads, and
//! unknown enum values deserialise to an `Unknown` variant instead of failing.

use serde::{Deserialize, Serialize};

use crate::color::ColorScheme;
use crate::surface::BlendMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum VisualStyle {
    #[default]
    Bars,
    Waveform,
    Circular,
    Particles,
    Fluid,
    Spectrum3d,
    #[value(alias = "radialBurst")]
    RadialBurst,
    #[value(alias = "mountainRange")]
    MountainRange,
    #[value(alias = "spectrumAnalyzer")]
    SpectrumAnalyzer,
    Equalizer,
    #[value(alias = "audioBars")]
    AudioBars,
    #[value(alias = "perlinFluid")]
    PerlinFluid,
    #[value(alias = "audioBlob")]
    AudioBlob,
    Kaleidoscope,
    #[value(alias = "endlessMaze")]
    EndlessMaze,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl VisualStyle {
    pub fn all() -> [Self; 15] {
        [
            Self::Bars,
            Self::Waveform,
            Self::Circular,
            Self::Particles,
            Self::Fluid,
            Self::Spectrum3d,
            Self::RadialBurst,
            Self::MountainRange,
            Self::SpectrumAnalyzer,
            Self::Equalizer,
            Self::AudioBars,
            Self::PerlinFluid,
            Self::AudioBlob,
            Self::Kaleidoscope,
            Self::EndlessMaze,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Waveform => "waveform",
            Self::Circular => "circular",
            Self::Particles => "particles",
            Self::Fluid => "fluid",
            Self::Spectrum3d => "spectrum3d",
            Self::RadialBurst => "radialBurst",
            Self::MountainRange => "mountainRange",
            Self::SpectrumAnalyzer => "spectrumAnalyzer",
            Self::Equalizer => "equalizer",
            Self::AudioBars => "audioBars",
            Self::PerlinFluid => "perlinFluid",
            Self::AudioBlob => "audioBlob",
            Self::Kaleidoscope => "kaleidoscope",
            Self::EndlessMaze => "endlessMaze",
            Self::Unknown => "unknown",
        }
    }

    /// Case-insensitive lookup by camelCase name; unrecognised names map to
    /// `Unknown`.
    pub fn from_name(raw: &str) -> Self {
        let needle = raw.trim();
        Self::all()
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(needle))
            .unwrap_or(Self::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizerConfig {
    /// Linear gain on magnitudes.
    pub sensitivity: f32,
    /// Temporal smoothing of sampled magnitudes, 0 = none.
    pub smoothing: f32,
    pub bar_count: usize,
    pub particle_count: usize,
    /// 0..1, mapped to a shadow blur of up to 30 px scaled by band energy.
    pub glow_intensity: f32,
    pub rotation_speed: f32,
    /// Saturation multiplier applied to palette colors.
    pub color_intensity: f32,
    pub mirror_mode: bool,
    pub motion_blur: bool,
    pub motion_blur_intensity: f32,
    pub bloom: bool,
    pub bloom_intensity: f32,
    pub ducking: bool,
    pub ducking_intensity: f32,
    pub peak_hold: bool,
    /// Fraction of full scale a held peak falls per frame.
    pub peak_hold_decay: f32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.5,
            smoothing: 0.8,
            bar_count: 64,
            particle_count: 100,
            glow_intensity: 0.5,
            rotation_speed: 1.0,
            color_intensity: 1.0,
            mirror_mode: false,
            motion_blur: false,
            motion_blur_intensity: 0.5,
            bloom: false,
            bloom_intensity: 0.5,
            ducking: false,
            ducking_intensity: 0.5,
            peak_hold: false,
            peak_hold_decay: 0.01,
        }
    }
}

impl VisualizerConfig {
    pub fn bar_count(&self) -> usize {
        self.bar_count.clamp(1, 512)
    }

    pub fn sensitivity(&self) -> f32 {
        if self.sensitivity.is_finite() { self.sensitivity.max(0.0) } else { 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorMode {
    #[default]
    Horizontal,
    Vertical,
    Quad,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceDirection {
    #[default]
    Horizontal,
    Vertical,
    Both,
    #[serde(other)]
    Unknown,
}

/// Independent audio-reactive image effects. Intensities are 0..1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageEffectSettings {
    pub enabled: bool,
    pub hide_visualization: bool,

    pub pulse: bool,
    pub pulse_intensity: f32,
    pub wave: bool,
    pub wave_intensity: f32,
    pub color_shift: bool,
    pub color_shift_intensity: f32,
    pub glitch: bool,
    pub glitch_intensity: f32,
    pub zoom: bool,
    pub zoom_intensity: f32,
    pub blur: bool,
    pub blur_intensity: f32,
    pub chromatic: bool,
    pub chromatic_intensity: f32,
    pub rotation: bool,
    pub rotation_speed: f32,
    pub mirror: bool,
    pub mirror_mode: MirrorMode,
    pub scanlines: bool,
    pub scanlines_intensity: f32,
    pub vignette: bool,
    pub vignette_intensity: f32,
    pub circle_rotation: bool,
    pub circle_rotation_intensity: f32,
    pub circle_rotation_count: usize,
    pub rain_mask: bool,
    pub rain_mask_intensity: f32,
    pub rain_mask_speed: f32,
    pub slice_shift: bool,
    pub slice_shift_intensity: f32,
    pub slice_shift_direction: SliceDirection,
    pub ripple: bool,
    pub ripple_intensity: f32,
    pub ripple_speed: f32,
    pub pixel_sort: bool,
    pub pixel_sort_intensity: f32,
    pub tunnel_zoom: bool,
    pub tunnel_zoom_intensity: f32,
    pub shatter: bool,
    pub shatter_intensity: f32,
    pub shatter_pieces: usize,
    pub liquid_morph: bool,
    pub liquid_morph_intensity: f32,

    pub ken_burns: bool,
    pub ken_burns_speed: f32,
}

impl Default for ImageEffectSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hide_visualization: false,
            pulse: false,
            pulse_intensity: 0.5,
            wave: false,
            wave_intensity: 0.5,
            color_shift: false,
            color_shift_intensity: 0.5,
            glitch: false,
            glitch_intensity: 0.5,
            zoom: false,
            zoom_intensity: 0.5,
            blur: false,
            blur_intensity: 0.5,
            chromatic: false,
            chromatic_intensity: 0.5,
            rotation: false,
            rotation_speed: 0.5,
            mirror: false,
            mirror_mode: MirrorMode::Horizontal,
            scanlines: false,
            scanlines_intensity: 0.5,
            vignette: false,
            vignette_intensity: 0.5,
            circle_rotation: false,
            circle_rotation_intensity: 0.5,
            circle_rotation_count: 5,
            rain_mask: false,
            rain_mask_intensity: 0.5,
            rain_mask_speed: 1.0,
            slice_shift: false,
            slice_shift_intensity: 0.5,
            slice_shift_direction: SliceDirection::Horizontal,
            ripple: false,
            ripple_intensity: 0.5,
            ripple_speed: 1.0,
            pixel_sort: false,
            pixel_sort_intensity: 0.5,
            tunnel_zoom: false,
            tunnel_zoom_intensity: 0.5,
            shatter: false,
            shatter_intensity: 0.5,
            shatter_pieces: 8,
            liquid_morph: false,
            liquid_morph_intensity: 0.5,
            ken_burns: false,
            ken_burns_speed: 1.0,
        }
    }
}

/// How the visualization layer combines with the image layer beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerSettings {
    pub blend_mode: BlendMode,
    pub opacity: f32,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
        }
    }
}

/// Nine placement points on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    #[serde(other)]
    Unknown,
}

impl Anchor {
    pub fn all() -> [Self; 9] {
        [
            Self::TopLeft,
            Self::TopCenter,
            Self::TopRight,
            Self::CenterLeft,
            Self::Center,
            Self::CenterRight,
            Self::BottomLeft,
            Self::BottomCenter,
            Self::BottomRight,
        ]
    }

    /// Horizontal and vertical alignment factors (0 = start, 0.5 = middle,
    /// 1 = end). `None` for `Unknown`.
    pub fn factors(self) -> Option<(f32, f32)> {
        Some(match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
            Self::Unknown => return None,
        })
    }

    /// Top-left corner of a `w x h` box placed at this anchor inside a
    /// `cw x ch` canvas with `padding` from every edge.
    pub fn place(self, cw: f32, ch: f32, w: f32, h: f32, padding: f32) -> Option<(f32, f32)> {
        let (fx, fy) = self.factors()?;
        let x = padding + (cw - w - 2.0 * padding) * fx;
        let y = padding + (ch - h - 2.0 * padding) * fy;
        Some((x, y))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    #[default]
    Sparkles,
    Bokeh,
    Confetti,
    Snow,
    Fireflies,
    Bubbles,
    Stars,
    #[serde(other)]
    Unknown,
}

impl ParticleKind {
    pub fn all() -> [Self; 7] {
        [
            Self::Sparkles,
            Self::Bokeh,
            Self::Confetti,
            Self::Snow,
            Self::Fireflies,
            Self::Bubbles,
            Self::Stars,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleOverlayConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ParticleKind,
    pub count: usize,
    pub speed: f32,
    /// Size multiplier.
    pub size: f32,
    pub opacity: f32,
    pub color: String,
    pub audio_reactive: bool,
}

impl Default for ParticleOverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: ParticleKind::Sparkles,
            count: 50,
            speed: 1.0,
            size: 1.0,
            opacity: 0.8,
            color: "#ffffff".to_string(),
            audio_reactive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStyle {
    #[default]
    Line,
    Dots,
    Wave,
    Glow,
    Minimal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarPosition {
    Top,
    #[default]
    Bottom,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressBarConfig {
    pub enabled: bool,
    pub style: ProgressStyle,
    pub position: BarPosition,
    pub height: f32,
    pub color: String,
    pub background_color: String,
    pub show_time: bool,
    pub opacity: f32,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            style: ProgressStyle::Line,
            position: BarPosition::Bottom,
            height: 6.0,
            color: "#ff00ff".to_string(),
            background_color: "#ffffff".to_string(),
            show_time: true,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnimation {
    #[default]
    None,
    Pulse,
    Bounce,
    Glow,
    Wave,
    Fade,
    #[serde(other)]
    Unknown,
}

impl TextAnimation {
    pub fn all() -> [Self; 6] {
        [Self::None, Self::Pulse, Self::Bounce, Self::Glow, Self::Wave, Self::Fade]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextOverlayConfig {
    pub enabled: bool,
    pub text: String,
    pub font_size: f32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: f32,
    pub position: Anchor,
    pub padding: f32,
    pub animation: TextAnimation,
    pub audio_reactive: bool,
    pub opacity: f32,
}

impl Default for TextOverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text: String::new(),
            font_size: 48.0,
            color: "#ffffff".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 2.0,
            position: Anchor::Center,
            padding: 40.0,
            animation: TextAnimation::None,
            audio_reactive: true,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkConfig {
    pub enabled: bool,
    /// Image file, loaded once and cached by the overlay.
    pub image: Option<String>,
    pub position: Anchor,
    /// Percentage of the shorter canvas side.
    pub size: f32,
    pub opacity: f32,
    pub padding: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image: None,
            position: Anchor::BottomRight,
            size: 15.0,
            opacity: 0.8,
            padding: 20.0,
        }
    }
}

/// Single-line caption from older projects, drawn last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptionConfig {
    pub text: String,
    pub position: Anchor,
    pub font_size: f32,
    pub color: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: Anchor::BottomCenter,
            font_size: 32.0,
            color: "#ffffff".to_string(),
        }
    }
}

/// Every overlay layer's configuration, in drawing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlaySettings {
    pub particles: ParticleOverlayConfig,
    pub progress_bar: ProgressBarConfig,
    pub text: TextOverlayConfig,
    pub watermark: WatermarkConfig,
    pub caption: CaptionConfig,
}

/// Everything the host supplies to draw a frame: style selection, palette,
/// visualizer tuning, image effects, layer blending and overlays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    #[serde(rename = "visualizationType")]
    pub style: VisualStyle,
    pub color_scheme: ColorScheme,
    pub custom_palette: Vec<String>,
    #[serde(rename = "settings")]
    pub visualizer: VisualizerConfig,
    #[serde(rename = "imageEffects")]
    pub effects: ImageEffectSettings,
    pub layer: LayerSettings,
    pub overlays: OverlaySettings,
}
