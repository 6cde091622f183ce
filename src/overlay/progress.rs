use crate::color::parse_hex;
use crate::font::{format_time, measure, text_path};
use crate::settings::{BarPosition, ProgressBarConfig, ProgressStyle};
use crate::surface::{Color, Path, Surface};

/// Horizontal inset of the track from the canvas edges.
pub const TRACK_MARGIN: f32 = 20.0;
const TIME_TEXT_SIZE: f32 = 12.0;
const INACTIVE_ALPHA: f32 = 0.3;

/// Track rectangle for a given canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ProgressLayout {
    /// `None` for an unknown bar position.
    pub fn new(config: &ProgressBarConfig, w: f32, h: f32) -> Option<Self> {
        let height = if config.height.is_finite() { config.height.clamp(1.0, h.max(1.0)) } else { 6.0 };
        let text_band = if config.show_time { TIME_TEXT_SIZE + 8.0 } else { 0.0 };
        let y = match config.position {
            BarPosition::Top => TRACK_MARGIN + text_band,
            BarPosition::Bottom => h - TRACK_MARGIN - height,
            BarPosition::Unknown => return None,
        };
        Some(Self {
            x: TRACK_MARGIN,
            y,
            width: (w - 2.0 * TRACK_MARGIN).max(0.0),
            height,
        })
    }

    /// Number of dots in the dots style. Always even, at least 2.
    pub fn dot_count(&self) -> usize {
        let n = (self.width / (self.height * 2.5).max(4.0)) as usize;
        (n.max(2) / 2) * 2
    }

    /// `(cx, cy, radius)` of every dot, left to right.
    pub fn dots(&self) -> Vec<(f32, f32, f32)> {
        let n = self.dot_count();
        let step = self.width / n as f32;
        let r = (self.height * 0.5).min(step * 0.4);
        (0..n)
            .map(|i| (self.x + step * (i as f32 + 0.5), self.y + self.height * 0.5, r))
            .collect()
    }
}

/// Playback progress in 0..1; zero for a zero or invalid duration.
pub fn progress_fraction(current: f32, duration: f32) -> f32 {
    if !(duration.is_finite() && duration > 0.0 && current.is_finite()) {
        return 0.0;
    }
    (current / duration).clamp(0.0, 1.0)
}

/// Dots lit for a given progress.
pub fn active_dots(count: usize, progress: f32) -> usize {
    ((progress.clamp(0.0, 1.0) * count as f32).floor() as usize).min(count)
}

pub fn draw_progress_bar(s: &mut Surface, config: &ProgressBarConfig, current: f32, duration: f32, t: f32) {
    if !config.enabled || config.style == ProgressStyle::Unknown {
        return;
    }
    let (w, h) = (s.width() as f32, s.height() as f32);
    let Some(layout) = ProgressLayout::new(config, w, h) else {
        return;
    };
    if layout.width <= 0.0 {
        return;
    }
    let progress = progress_fraction(current, duration);
    let fg = parse_hex(&config.color).unwrap_or(Color::WHITE);
    let bg = parse_hex(&config.background_color).unwrap_or(Color::WHITE);
    let ProgressLayout { x, y, width, height } = layout;
    let filled = width * progress;

    s.save();
    s.set_alpha(config.opacity.clamp(0.0, 1.0));
    match config.style {
        ProgressStyle::Line => {
            track(s, &layout, bg);
            if filled > 0.0 {
                let mut bar = Path::new();
                bar.rounded_rect(x, y, filled, height, height * 0.5);
                s.fill_path(&bar, fg);
            }
        }
        ProgressStyle::Dots => {
            let dots = layout.dots();
            let lit = active_dots(dots.len(), progress);
            for (i, (cx, cy, r)) in dots.into_iter().enumerate() {
                let c = if i < lit { fg } else { bg.with_alpha(INACTIVE_ALPHA) };
                s.fill_circle(cx, cy, r, c);
            }
        }
        ProgressStyle::Wave => {
            track(s, &layout, bg);
            if filled > 1.0 {
                let mut wave = Path::new();
                wave.move_to(x, y + height);
                let steps = ((filled / 3.0) as usize).max(2);
                for i in 0..=steps {
                    let px = x + filled * i as f32 / steps as f32;
                    let py = y + (px * 0.08 + t * 4.0).sin() * height * 0.4;
                    wave.line_to(px, py);
                }
                wave.line_to(x + filled, y + height).close();
                s.fill_path(&wave, fg);
            }
        }
        ProgressStyle::Glow => {
            track(s, &layout, bg);
            if filled > 0.0 {
                s.set_shadow(15.0, fg);
                let mut bar = Path::new();
                bar.rounded_rect(x, y, filled, height, height * 0.5);
                s.fill_path(&bar, fg);
                s.clear_shadow();
            }
        }
        ProgressStyle::Minimal => {
            let line_y = y + height - 2.0;
            s.fill_rect(x, line_y, width, 2.0, bg.with_alpha(0.15));
            if filled > 0.0 {
                s.fill_rect(x, line_y, filled, 2.0, fg);
            }
        }
        ProgressStyle::Unknown => {}
    }

    if config.show_time {
        let elapsed = format_time(current);
        let remaining = format!("-{}", format_time(duration - current));
        let ty = y - TIME_TEXT_SIZE - 6.0;
        let (rw, _) = measure(&remaining, TIME_TEXT_SIZE);
        let label = Color::WHITE.with_alpha(0.85);
        s.fill_path(&text_path(&elapsed, x, ty, TIME_TEXT_SIZE), label);
        s.fill_path(&text_path(&remaining, x + width - rw, ty, TIME_TEXT_SIZE), label);
    }
    s.restore();
}

fn track(s: &mut Surface, layout: &ProgressLayout, bg: Color) {
    let mut p = Path::new();
    p.rounded_rect(layout.x, layout.y, layout.width, layout.height, layout.height * 0.5);
    s.fill_path(&p, bg.with_alpha(0.2));
}
