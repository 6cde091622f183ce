use std::f32::consts::TAU;

use super::{Style, StyleCtx};
use crate::surface::Surface;

/// Bass energy (0..1) times this many new particles per frame.
const SPAWN_PER_FRAME: f32 = 5.0;
const LIFE_DECAY: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub life: f32,
    pub color: usize,
}

/// Bass-spawned particles bursting from the center.
pub struct ParticleField {
    rng: fastrand::Rng,
    pool: Vec<Particle>,
}

impl ParticleField {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            pool: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.pool
    }

    /// Advances, drops dead or off-canvas particles, then spawns up to `cap`.
    pub fn step(&mut self, w: f32, h: f32, bass: f32, speed: f32, cap: usize) {
        for p in &mut self.pool {
            p.x += p.vx * speed;
            p.y += p.vy * speed;
            p.life -= LIFE_DECAY;
        }
        self.pool
            .retain(|p| p.life > 0.0 && p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h);
        self.pool.truncate(cap);

        let wanted = (bass.clamp(0.0, 1.0) * SPAWN_PER_FRAME).floor() as usize;
        let room = cap.saturating_sub(self.pool.len());
        for _ in 0..wanted.min(room) {
            let a = self.rng.f32() * TAU;
            let v = 1.0 + self.rng.f32() * 4.0;
            self.pool.push(Particle {
                x: w * 0.5,
                y: h * 0.5,
                vx: a.cos() * v,
                vy: a.sin() * v,
                size: 2.0 + self.rng.f32() * 4.0,
                life: 1.0,
                color: self.rng.usize(..64),
            });
        }
    }
}

impl Style for ParticleField {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let bass = ctx.audio.bass();
        self.step(ctx.w, ctx.h, bass, ctx.gain, ctx.config.particle_count);
        let glow = ctx.glow(bass);
        for p in &self.pool {
            let color = ctx.palette.cycle(p.color).with_alpha(p.life);
            s.set_shadow(glow, color);
            s.fill_circle(p.x, p.y, (p.size * p.life).max(0.5), color);
        }
        s.clear_shadow();
    }

    fn clear_particles(&mut self) {
        self.pool.clear();
    }

    fn particle_count(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_never_exceeds_cap() {
        let mut f = ParticleField::new(3);
        for _ in 0..300 {
            f.step(200.0, 100.0, 1.0, 1.0, 20);
            assert!(f.particles().len() <= 20);
        }
        f.step(200.0, 100.0, 1.0, 1.0, 5);
        assert!(f.particles().len() <= 5);
    }

    #[test]
    fn silence_spawns_nothing_and_pool_drains() {
        let mut f = ParticleField::new(3);
        for _ in 0..10 {
            f.step(200.0, 100.0, 1.0, 1.0, 50);
        }
        assert!(!f.particles().is_empty());
        for _ in 0..200 {
            f.step(200.0, 100.0, 0.0, 1.0, 50);
        }
        assert!(f.particles().is_empty());
    }

    #[test]
    fn survivors_are_alive_and_on_canvas() {
        let mut f = ParticleField::new(9);
        for _ in 0..50 {
            f.step(64.0, 64.0, 0.8, 2.0, 100);
            for p in f.particles() {
                assert!(p.life > 0.0);
                assert!((0.0..=64.0).contains(&p.x) && (0.0..=64.0).contains(&p.y));
            }
        }
    }
}
