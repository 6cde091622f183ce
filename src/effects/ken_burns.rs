use crate::surface::Surface;

/// Pan directions the Ken Burns move cycles through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanDirection {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl PanDirection {
    fn next(self) -> Self {
        match self {
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::Up => Self::Right,
        }
    }

    fn vector(self) -> (f32, f32) {
        match self {
            Self::Right => (1.0, 0.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Up => (0.0, -1.0),
        }
    }
}

/// Pan offset (fraction of the canvas) at which the move turns.
pub const MAX_PAN: f32 = 0.08;
const BASE_ZOOM: f32 = 1.1;
const MAX_ZOOM: f32 = 1.3;

/// Slow pan/zoom accumulator applied around the image layer.
#[derive(Debug, Clone, PartialEq)]
pub struct KenBurns {
    pub x_offset: f32,
    pub y_offset: f32,
    pub zoom: f32,
    pub direction: PanDirection,
}

impl Default for KenBurns {
    fn default() -> Self {
        Self {
            x_offset: 0.0,
            y_offset: 0.0,
            zoom: BASE_ZOOM,
            direction: PanDirection::Right,
        }
    }
}

impl KenBurns {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One frame of motion. When the pan reaches its limit along the
    /// current direction the move turns to the next one.
    pub fn advance(&mut self, speed: f32) {
        let speed = if speed.is_finite() { speed.clamp(0.0, 10.0) } else { 0.0 };
        let step = 0.0004 * speed;
        let (vx, vy) = self.direction.vector();
        self.x_offset += vx * step;
        self.y_offset += vy * step;
        self.zoom = (self.zoom + 0.0002 * speed).min(MAX_ZOOM);
        let along = self.x_offset * vx + self.y_offset * vy;
        if along >= MAX_PAN {
            self.x_offset = self.x_offset.clamp(-MAX_PAN, MAX_PAN);
            self.y_offset = self.y_offset.clamp(-MAX_PAN, MAX_PAN);
            self.direction = self.direction.next();
            if self.zoom >= MAX_ZOOM {
                self.zoom = BASE_ZOOM;
            }
        }
    }

    /// Scales about the canvas center and pans by the current offsets.
    pub fn apply(&self, surface: &mut Surface) {
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        surface.translate(w * 0.5 + self.x_offset * w, h * 0.5 + self.y_offset * h);
        surface.scale(self.zoom, self.zoom);
        surface.translate(-w * 0.5, -h * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_cycles_and_offsets_stay_bounded() {
        let mut kb = KenBurns::default();
        let mut seen = vec![kb.direction];
        for _ in 0..20_000 {
            kb.advance(2.0);
            assert!(kb.x_offset.abs() <= MAX_PAN + 1e-3 && kb.y_offset.abs() <= MAX_PAN + 1e-3);
            assert!((BASE_ZOOM..=MAX_ZOOM).contains(&kb.zoom));
            if seen.last() != Some(&kb.direction) {
                seen.push(kb.direction);
            }
        }
        assert!(seen.len() >= 5);
        assert_eq!(seen[4], PanDirection::Right);
        kb.reset();
        assert_eq!(kb, KenBurns::default());
    }
}
