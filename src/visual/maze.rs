use std::f32::consts::{FRAC_PI_6, TAU};

use tracing::debug;

use super::{Style, StyleCtx};
use crate::surface::{BlendMode, Color, Path, Surface};

pub const REBUILD_SECS: f32 = 10.0;
pub const MAX_PULSES: usize = 100;
const RING_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub energy: f32,
    pub target_energy: f32,
    pub phase: f32,
    pub neighbors: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    pub from: usize,
    pub to: usize,
    pub progress: f32,
    pub color: usize,
}

/// Hex-grid energy network: nodes glow with spectrum energy and bass spikes
/// launch pulses that travel along edges.
pub struct EndlessMaze {
    rng: fastrand::Rng,
    nodes: Vec<Node>,
    pulses: Vec<Pulse>,
    built_at: f32,
    built_size: (f32, f32),
    last_bass: f32,
}

impl EndlessMaze {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            nodes: Vec::new(),
            pulses: Vec::new(),
            built_at: 0.0,
            built_size: (0.0, 0.0),
            last_bass: 0.0,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    fn needs_rebuild(&self, t: f32, w: f32, h: f32) -> bool {
        self.nodes.is_empty()
            || t - self.built_at >= REBUILD_SECS
            || t < self.built_at
            || (self.built_size.0 - w).abs() > 0.5
            || (self.built_size.1 - h).abs() > 0.5
    }

    fn rebuild(&mut self, t: f32, w: f32, h: f32) {
        let spacing = (w.min(h) / 9.0).max(12.0);
        let row_h = spacing * 0.866;
        let jitter = spacing * 0.12;
        let cols = (w / spacing).ceil() as i32 + 1;
        let rows = (h / row_h).ceil() as i32 + 1;
        let mut nodes = Vec::with_capacity((cols * rows).max(0) as usize);
        for r in 0..rows {
            let off = if r % 2 == 0 { 0.0 } else { spacing * 0.5 };
            for c in 0..cols {
                nodes.push(Node {
                    x: c as f32 * spacing + off + (self.rng.f32() - 0.5) * jitter,
                    y: r as f32 * row_h + (self.rng.f32() - 0.5) * jitter,
                    energy: 0.0,
                    target_energy: 0.0,
                    phase: self.rng.f32() * TAU,
                    neighbors: Vec::new(),
                });
            }
        }
        let reach2 = (spacing * 1.25) * (spacing * 1.25);
        for i in 0..nodes.len() {
            for j in 0..nodes.len() {
                if i == j {
                    continue;
                }
                let dx = nodes[i].x - nodes[j].x;
                let dy = nodes[i].y - nodes[j].y;
                if dx * dx + dy * dy <= reach2 {
                    nodes[i].neighbors.push(j);
                }
            }
        }
        debug!(nodes = nodes.len(), "rebuilt hex network");
        self.nodes = nodes;
        self.pulses.clear();
        self.built_at = t;
        self.built_size = (w, h);
    }

    fn spawn_pulse(&mut self, from: usize, color: usize) {
        if self.pulses.len() >= MAX_PULSES {
            return;
        }
        let Some(node) = self.nodes.get(from) else {
            return;
        };
        if node.neighbors.is_empty() {
            return;
        }
        let to = node.neighbors[self.rng.usize(..node.neighbors.len())];
        self.pulses.push(Pulse {
            from,
            to,
            progress: 0.0,
            color,
        });
    }

    /// Advances node energy and pulses by one frame.
    pub fn update(&mut self, t: f32, w: f32, h: f32, freq: &[u8], bass: f32, mid: f32, gain: f32) {
        if self.needs_rebuild(t, w, h) {
            self.rebuild(t, w, h);
        }
        let n = self.nodes.len();
        if n == 0 {
            return;
        }
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let v = if freq.is_empty() {
                0.0
            } else {
                freq[(i * freq.len() / n).min(freq.len() - 1)] as f32 / 255.0
            };
            node.target_energy = (v * gain).min(1.0).max(node.target_energy * 0.95);
            node.energy += (node.target_energy - node.energy) * 0.1;
            node.phase += 0.05 + mid * 0.1;
        }

        let spike = bass - self.last_bass;
        self.last_bass = bass;
        if bass > 0.55 && (spike > 0.04 || self.rng.f32() < bass * 0.3) {
            let bursts = 1 + (bass * 3.0) as usize;
            for _ in 0..bursts {
                let from = self.rng.usize(..n);
                let color = self.rng.usize(..64);
                self.spawn_pulse(from, color);
            }
        }

        let speed = 0.02 + mid * 0.05;
        let mut arrived = Vec::new();
        self.pulses.retain_mut(|p| {
            p.progress += speed;
            if p.progress >= 1.0 {
                arrived.push((p.to, p.color));
                false
            } else {
                true
            }
        });
        for (to, color) in arrived {
            if let Some(node) = self.nodes.get_mut(to) {
                node.target_energy = (node.target_energy + 0.3).min(1.0);
            }
            if self.rng.f32() < 0.5 {
                self.spawn_pulse(to, color);
            }
        }
    }
}

impl Style for EndlessMaze {
    fn name(&self) -> &'static str {
        "endlessMaze"
    }

    fn draw(&mut self, s: &mut Surface, ctx: &StyleCtx) {
        let a = ctx.audio;
        self.update(ctx.t, ctx.w, ctx.h, &a.frequency_data, a.bass(), a.mid(), ctx.gain);
        if self.nodes.is_empty() {
            return;
        }

        s.set_line_width(1.5);
        for (i, node) in self.nodes.iter().enumerate() {
            for &j in &node.neighbors {
                if j <= i {
                    continue;
                }
                let other = &self.nodes[j];
                let e = (node.energy + other.energy) * 0.5;
                let c = ctx.palette.pick(i, self.nodes.len()).with_alpha(0.05 + e * 0.8);
                s.stroke_line(node.x, node.y, other.x, other.y, c);
            }
        }

        s.save();
        s.set_blend(BlendMode::Lighter);
        for p in &self.pulses {
            let (Some(from), Some(to)) = (self.nodes.get(p.from), self.nodes.get(p.to)) else {
                continue;
            };
            let x = from.x + (to.x - from.x) * p.progress;
            let y = from.y + (to.y - from.y) * p.progress;
            let c = ctx.palette.cycle(p.color);
            s.set_shadow(ctx.glow(1.0).max(4.0), c);
            s.fill_circle(x, y, 3.0, c);
        }
        s.restore();

        let spacing = (ctx.w.min(ctx.h) / 9.0).max(12.0);
        for (i, node) in self.nodes.iter().enumerate() {
            let pulse = node.phase.sin() * 0.5 + 0.5;
            let r = spacing * 0.06 * (1.0 + node.energy * 1.5 + pulse * 0.3);
            let c = ctx.palette.pick(i, self.nodes.len());
            let mut glyph = Path::new();
            glyph.regular_polygon(node.x, node.y, r, 6, FRAC_PI_6);
            s.fill_path(&glyph, c.with_alpha(0.3 + node.energy * 0.7));
            if node.energy > RING_THRESHOLD {
                let mut ring = Path::new();
                ring.regular_polygon(node.x, node.y, r * 2.2, 6, FRAC_PI_6 + node.phase * 0.2);
                s.set_line_width(1.0);
                s.stroke_path(&ring, Color::WHITE.lerp(c, 0.5).with_alpha(node.energy));
                s.set_line_width(1.5);
            }
        }
    }

    fn clear_particles(&mut self) {
        self.pulses.clear();
        self.nodes.clear();
    }

    fn particle_count(&self) -> usize {
        self.pulses.len()
    }
}
