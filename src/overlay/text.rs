use crate::audio::AudioFeatureFrame;
use crate::color::parse_hex;
use crate::font::{measure, text_path};
use crate::settings::{CaptionConfig, TextAnimation, TextOverlayConfig};
use crate::surface::Color;
use crate::surface::Surface;

/// Per-frame modulation produced by a text animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMotion {
    pub scale: f32,
    pub dy: f32,
    pub glow: f32,
    pub alpha: f32,
}

impl Default for TextMotion {
    fn default() -> Self {
        Self {
            scale: 1.0,
            dy: 0.0,
            glow: 0.0,
            alpha: 1.0,
        }
    }
}

/// Modulation for `animation` at time `t`. Audio-reactive modes follow the
/// bass (pulse, bounce) or overall energy (glow) instead of a clock sine.
/// `None` for an unknown animation.
pub fn text_motion(animation: TextAnimation, size: f32, t: f32, audio: Option<&AudioFeatureFrame>) -> Option<TextMotion> {
    let bass = audio.map(|a| a.bass());
    let mut m = TextMotion::default();
    match animation {
        TextAnimation::None => {}
        TextAnimation::Pulse => {
            m.scale = match bass {
                Some(b) => 1.0 + b * 0.3,
                None => 1.0 + (t * 3.0).sin() * 0.1,
            };
        }
        TextAnimation::Bounce => {
            let amp = size * 0.25 * bass.map_or(1.0, |b| 0.4 + b);
            m.dy = -(t * 4.0).sin().abs() * amp;
        }
        TextAnimation::Glow => {
            m.glow = match audio {
                Some(a) => 5.0 + a.energy() * 25.0,
                None => 12.0 + (t * 3.0).sin() * 8.0,
            };
        }
        TextAnimation::Wave => m.dy = (t * 2.0).sin() * size * 0.1,
        TextAnimation::Fade => m.alpha = 0.55 + 0.45 * (t * 2.0).sin(),
        TextAnimation::Unknown => return None,
    }
    Some(m)
}

pub fn draw_text_overlay(s: &mut Surface, config: &TextOverlayConfig, audio: &AudioFeatureFrame, t: f32) {
    let text = config.text.trim();
    if !config.enabled || text.is_empty() || !(config.font_size.is_finite() && config.font_size > 0.0) {
        return;
    }
    let audio = config.audio_reactive.then_some(audio);
    let Some(motion) = text_motion(config.animation, config.font_size, t, audio) else {
        return;
    };
    let size = config.font_size * motion.scale;
    let (w, h) = (s.width() as f32, s.height() as f32);
    let (tw, th) = measure(text, size);
    let Some((x, y)) = config.position.place(w, h, tw, th, config.padding.max(0.0)) else {
        return;
    };
    let path = text_path(text, x, y + motion.dy, size);
    let fill = parse_hex(&config.color).unwrap_or(Color::WHITE);

    s.save();
    s.set_alpha(config.opacity.clamp(0.0, 1.0) * motion.alpha.clamp(0.0, 1.0));
    if motion.glow > 0.0 {
        s.set_shadow(motion.glow, fill);
    }
    if config.stroke_width > 0.0 {
        if let Some(stroke) = parse_hex(&config.stroke_color) {
            s.set_line_width(config.stroke_width * 2.0);
            s.stroke_path(&path, stroke);
        }
    }
    s.fill_path(&path, fill);
    s.restore();
}

/// Plain single-line caption kept for older projects.
pub fn draw_caption(s: &mut Surface, config: &CaptionConfig) {
    let text = config.text.trim();
    if text.is_empty() || !(config.font_size.is_finite() && config.font_size > 0.0) {
        return;
    }
    let (w, h) = (s.width() as f32, s.height() as f32);
    let (tw, th) = measure(text, config.font_size);
    let Some((x, y)) = config.position.place(w, h, tw, th, 20.0) else {
        return;
    };
    let color = parse_hex(&config.color).unwrap_or(Color::WHITE);
    s.save();
    s.set_shadow(4.0, Color::BLACK.with_alpha(0.8));
    s.fill_path(&text_path(text, x, y, config.font_size), color);
    s.restore();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_animation_but_unknown_yields_motion() {
        for a in TextAnimation::all() {
            let m = text_motion(a, 40.0, 0.7, None).expect("known animation");
            assert!(m.scale > 0.0 && (0.0..=1.0).contains(&m.alpha));
        }
        assert!(text_motion(TextAnimation::Unknown, 40.0, 0.0, None).is_none());
    }

    #[test]
    fn pulse_follows_bass_when_reactive() {
        let mut frame = AudioFeatureFrame::silent(64);
        frame.bass_level = 255.0;
        let m = text_motion(TextAnimation::Pulse, 40.0, 0.0, Some(&frame)).expect("pulse");
        assert!((m.scale - 1.3).abs() < 1e-4);
    }
}
