//! Layers drawn over the main image/visualization composite.

mod particles;
mod progress;
mod text;
mod watermark;

use crate::audio::AudioFeatureFrame;
use crate::settings::OverlaySettings;
use crate::surface::Surface;

pub use particles::{OverlayParticle, ParticleOverlay};
pub use progress::{active_dots, draw_progress_bar, progress_fraction, ProgressLayout, TRACK_MARGIN};
pub use text::{draw_caption, draw_text_overlay, text_motion, TextMotion};
pub use watermark::{watermark_rect, WatermarkOverlay};

/// Playback position handed to the progress bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Playhead {
    pub current: f32,
    pub duration: f32,
}

/// Stateful overlay passes (particle pool, cached watermark) plus the
/// stateless ones, run in a fixed order.
#[derive(Default)]
pub struct OverlayCompositor {
    pub particles: ParticleOverlay,
    pub watermark: WatermarkOverlay,
}

impl OverlayCompositor {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            particles: ParticleOverlay::new(seed),
            watermark: WatermarkOverlay::new(),
        }
    }

    /// Particles, progress bar, text, watermark, then the legacy caption.
    pub fn draw(&mut self, s: &mut Surface, audio: &AudioFeatureFrame, settings: &OverlaySettings, playhead: Playhead, t: f32) {
        self.particles.draw(s, audio, &settings.particles, t);
        draw_progress_bar(s, &settings.progress_bar, playhead.current, playhead.duration, t);
        draw_text_overlay(s, &settings.text, audio, t);
        self.watermark.draw(s, &settings.watermark);
        draw_caption(s, &settings.caption);
    }
}
