use std::f32::consts::{PI, TAU};

use crate::audio::AudioFeatureFrame;
use crate::color::parse_hex;
use crate::settings::{ParticleKind, ParticleOverlayConfig};
use crate::surface::{Color, Gradient, Path, Surface};

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParticle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    /// Remaining life, 1 at spawn.
    pub life: f32,
    pub decay: f32,
    pub angle: f32,
    pub spin: f32,
    pub phase: f32,
    pub hue: usize,
}

const CONFETTI: [Color; 5] = [
    Color::rgb(255, 82, 82),
    Color::rgb(255, 214, 0),
    Color::rgb(0, 230, 118),
    Color::rgb(41, 121, 255),
    Color::rgb(213, 0, 249),
];

/// Decorative particle layer whose pool always holds exactly
/// `config.count` particles.
pub struct ParticleOverlay {
    rng: fastrand::Rng,
    pool: Vec<OverlayParticle>,
    kind: ParticleKind,
}

impl Default for ParticleOverlay {
    fn default() -> Self {
        Self::new(fastrand::u64(..))
    }
}

impl ParticleOverlay {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            pool: Vec::new(),
            kind: ParticleKind::Sparkles,
        }
    }

    pub fn particles(&self) -> &[OverlayParticle] {
        &self.pool
    }

    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// Fresh particle for `kind`. `initial` scatters it over the whole canvas
    /// instead of its spawn edge so a new pool does not arrive as one wave.
    fn spawn(&mut self, kind: ParticleKind, w: f32, h: f32, initial: bool) -> OverlayParticle {
        let r = &mut self.rng;
        let (x, y) = (r.f32() * w, r.f32() * h);
        let mut p = OverlayParticle {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            size: 1.0,
            life: 1.0,
            decay: 0.0,
            angle: r.f32() * TAU,
            spin: 0.0,
            phase: r.f32() * TAU,
            hue: r.usize(..CONFETTI.len()),
        };
        match kind {
            ParticleKind::Sparkles => {
                p.vx = (r.f32() - 0.5) * 1.0;
                p.vy = (r.f32() - 0.5) * 1.0;
                p.size = 1.5 + r.f32() * 3.0;
                p.decay = 0.01 + r.f32() * 0.02;
                p.life = if initial { r.f32() } else { 1.0 };
            }
            ParticleKind::Bokeh => {
                p.vx = (r.f32() - 0.5) * 0.4;
                p.vy = (r.f32() - 0.5) * 0.4;
                p.size = 15.0 + r.f32() * 35.0;
                p.decay = 0.002 + r.f32() * 0.003;
            }
            ParticleKind::Confetti => {
                if !initial {
                    p.y = -10.0;
                }
                p.vx = (r.f32() - 0.5) * 2.0;
                p.vy = 1.5 + r.f32() * 2.5;
                p.size = 4.0 + r.f32() * 5.0;
                p.spin = (r.f32() - 0.5) * 0.3;
            }
            ParticleKind::Snow => {
                if !initial {
                    p.y = -5.0;
                }
                p.vx = (r.f32() - 0.5) * 0.5;
                p.vy = 0.5 + r.f32() * 1.5;
                p.size = 1.5 + r.f32() * 3.5;
            }
            ParticleKind::Fireflies => {
                p.vx = (r.f32() - 0.5) * 0.8;
                p.vy = (r.f32() - 0.5) * 0.8;
                p.size = 2.0 + r.f32() * 2.5;
                p.decay = 0.003 + r.f32() * 0.004;
            }
            ParticleKind::Bubbles => {
                if !initial {
                    p.y = h + 10.0;
                }
                p.vx = (r.f32() - 0.5) * 0.6;
                p.vy = -(0.8 + r.f32() * 1.7);
                p.size = 5.0 + r.f32() * 15.0;
            }
            ParticleKind::Stars => {
                p.size = 1.0 + r.f32() * 2.5;
                p.decay = 0.001 + r.f32() * 0.002;
            }
            ParticleKind::Unknown => {}
        }
        p
    }

    /// Advances and draws the layer.
    pub fn draw(&mut self, s: &mut Surface, audio: &AudioFeatureFrame, config: &ParticleOverlayConfig, t: f32) {
        let kind = config.kind;
        if !config.enabled || kind == ParticleKind::Unknown {
            return;
        }
        let w = s.width() as f32;
        let h = s.height() as f32;
        if w < 1.0 || h < 1.0 {
            return;
        }
        if kind != self.kind {
            self.pool.clear();
            self.kind = kind;
        }
        self.pool.truncate(config.count);
        while self.pool.len() < config.count {
            let p = self.spawn(kind, w, h, true);
            self.pool.push(p);
        }

        let energy = audio.energy();
        let (speed_k, alpha_k) = if config.audio_reactive {
            (1.0 + energy * 2.0, 0.5 + energy * 0.5)
        } else {
            (1.0, 1.0)
        };
        let speed = if config.speed.is_finite() { config.speed.max(0.0) } else { 1.0 } * speed_k;
        let margin = 60.0;
        for i in 0..self.pool.len() {
            let p = &mut self.pool[i];
            let sway = match kind {
                ParticleKind::Snow | ParticleKind::Confetti => (t * 1.5 + p.phase).sin() * 0.5,
                ParticleKind::Bubbles => (t * 2.0 + p.phase).sin() * 0.3,
                _ => 0.0,
            };
            p.x += (p.vx + sway) * speed;
            p.y += p.vy * speed;
            p.angle += p.spin * speed;
            p.life -= p.decay * speed.max(0.2);
            let gone = p.life <= 0.0
                || p.x < -margin
                || p.x > w + margin
                || p.y < -margin
                || p.y > h + margin;
            if gone {
                self.pool[i] = self.spawn(kind, w, h, false);
            }
        }

        let base = parse_hex(&config.color).unwrap_or(Color::WHITE);
        let opacity = config.opacity.clamp(0.0, 1.0) * alpha_k;
        let size_k = if config.size.is_finite() { config.size.max(0.0) } else { 1.0 };
        s.save();
        for p in &self.pool {
            draw_particle(s, kind, p, base, opacity, size_k, t);
        }
        s.restore();
    }
}

/// Fade-in/fade-out envelope over a particle's life.
fn envelope(life: f32) -> f32 {
    (life * 4.0).min(1.0).min((1.0 - life) * 8.0 + 0.25).clamp(0.0, 1.0)
}

fn draw_particle(s: &mut Surface, kind: ParticleKind, p: &OverlayParticle, base: Color, opacity: f32, size_k: f32, t: f32) {
    let size = p.size * size_k;
    if size <= 0.0 {
        return;
    }
    match kind {
        ParticleKind::Sparkles => {
            let a = opacity * envelope(p.life) * (0.6 + 0.4 * (t * 8.0 + p.phase).sin());
            let c = base.with_alpha(a);
            let mut star = Path::new();
            star.regular_polygon(p.x, p.y, size * 0.35, 4, p.angle);
            s.fill_path(&star, c);
            s.set_line_width((size * 0.25).max(0.5));
            s.stroke_line(p.x - size, p.y, p.x + size, p.y, c);
            s.stroke_line(p.x, p.y - size, p.x, p.y + size, c);
        }
        ParticleKind::Bokeh => {
            let a = opacity * 0.35 * envelope(p.life);
            let g = Gradient::radial(p.x, p.y, 0.0, size)
                .stop(0.0, base.with_alpha(a))
                .stop(0.7, base.with_alpha(a * 0.6))
                .stop(1.0, base.with_alpha(0.0));
            s.fill_circle(p.x, p.y, size, g);
        }
        ParticleKind::Confetti => {
            s.save();
            s.translate(p.x, p.y);
            s.rotate(p.angle);
            s.scale(1.0, (t * 5.0 + p.phase).cos().abs().max(0.15));
            s.fill_rect(-size * 0.5, -size * 0.3, size, size * 0.6, CONFETTI[p.hue].with_alpha(opacity));
            s.restore();
        }
        ParticleKind::Snow => {
            s.fill_circle(p.x, p.y, size, base.with_alpha(opacity * 0.85));
        }
        ParticleKind::Fireflies => {
            let blink = 0.5 + 0.5 * (t * 3.0 + p.phase).sin();
            let c = base.lerp(Color::rgb(255, 240, 120), 0.6).with_alpha(opacity * blink * envelope(p.life));
            s.set_shadow(size * 4.0, c);
            s.fill_circle(p.x, p.y, size, c);
            s.clear_shadow();
        }
        ParticleKind::Bubbles => {
            s.set_line_width(1.5);
            let mut ring = Path::new();
            ring.circle(p.x, p.y, size);
            s.stroke_path(&ring, base.with_alpha(opacity * 0.7));
            s.fill_circle(p.x - size * 0.35, p.y - size * 0.35, size * 0.2, Color::WHITE.with_alpha(opacity * 0.6));
        }
        ParticleKind::Stars => {
            let twinkle = 0.4 + 0.6 * (t * 2.0 + p.phase).sin().abs();
            let mut star = Path::new();
            for i in 0..10 {
                let r = if i % 2 == 0 { size * 2.0 } else { size * 0.8 };
                let a = -PI / 2.0 + i as f32 * PI / 5.0;
                let (x, y) = (p.x + a.cos() * r, p.y + a.sin() * r);
                if i == 0 {
                    star.move_to(x, y);
                } else {
                    star.line_to(x, y);
                }
            }
            star.close();
            s.fill_path(&star, base.with_alpha(opacity * twinkle * envelope(p.life)));
        }
        ParticleKind::Unknown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_tracks_configured_count() {
        let mut overlay = ParticleOverlay::new(1);
        let mut s = Surface::new(64, 48);
        let audio = AudioFeatureFrame::silent(64);
        let mut cfg = ParticleOverlayConfig {
            enabled: true,
            count: 30,
            ..ParticleOverlayConfig::default()
        };
        for kind in ParticleKind::all() {
            cfg.kind = kind;
            for f in 0..40 {
                overlay.draw(&mut s, &audio, &cfg, f as f32 / 60.0);
                assert_eq!(overlay.particles().len(), 30);
            }
        }
        cfg.count = 5;
        overlay.draw(&mut s, &audio, &cfg, 1.0);
        assert_eq!(overlay.particles().len(), 5);
    }
}
