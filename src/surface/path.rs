use std::f32::consts::{FRAC_PI_2, PI, TAU};

use tiny_skia::PathBuilder;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Verb {
    Move(f32, f32),
    Line(f32, f32),
    Quad(f32, f32, f32, f32),
    Cubic(f32, f32, f32, f32, f32, f32),
    Close,
}

/// Canvas-style path recorder. Verbs are replayed into a
/// [`tiny_skia::PathBuilder`] when the path is drawn or clipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    verbs: Vec<Verb>,
    start: Option<[f32; 2]>,
    last: Option<[f32; 2]>,
    closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.verbs.iter().any(|v| !matches!(v, Verb::Move(..) | Verb::Close))
    }

    /// `None` when nothing was recorded or the geometry is degenerate.
    pub(crate) fn to_skia(&self) -> Option<tiny_skia::Path> {
        let mut pb = PathBuilder::with_capacity(self.verbs.len(), self.verbs.len() * 2);
        for verb in &self.verbs {
            match *verb {
                Verb::Move(x, y) => pb.move_to(x, y),
                Verb::Line(x, y) => pb.line_to(x, y),
                Verb::Quad(x1, y1, x, y) => pb.quad_to(x1, y1, x, y),
                Verb::Cubic(x1, y1, x2, y2, x, y) => pb.cubic_to(x1, y1, x2, y2, x, y),
                Verb::Close => pb.close(),
            }
        }
        pb.finish()
    }

    fn finite(points: &[f32]) -> bool {
        points.iter().all(|v| v.is_finite())
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        if !Self::finite(&[x, y]) {
            return self;
        }
        self.verbs.push(Verb::Move(x, y));
        self.start = Some([x, y]);
        self.last = Some([x, y]);
        self.closed = false;
        self
    }

    /// Like a canvas `lineTo`, the first point of an empty path moves there.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        if !Self::finite(&[x, y]) {
            return self;
        }
        if self.last.is_none() {
            return self.move_to(x, y);
        }
        self.reopen();
        self.verbs.push(Verb::Line(x, y));
        self.last = Some([x, y]);
        self
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        if !Self::finite(&[cx, cy, x, y]) {
            return self;
        }
        if self.last.is_none() {
            return self.move_to(x, y);
        }
        self.reopen();
        self.verbs.push(Verb::Quad(cx, cy, x, y));
        self.last = Some([x, y]);
        self
    }

    fn cubic_to(&mut self, c1: [f32; 2], c2: [f32; 2], x: f32, y: f32) {
        self.verbs.push(Verb::Cubic(c1[0], c1[1], c2[0], c2[1], x, y));
        self.last = Some([x, y]);
    }

    /// After a close, drawing continues from the closed subpath's start.
    fn reopen(&mut self) {
        if self.closed {
            if let Some([x, y]) = self.start {
                self.verbs.push(Verb::Move(x, y));
            }
            self.closed = false;
        }
    }

    /// Appends a circular arc; like a canvas `arc`, a line joins the current
    /// point to the arc start.
    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, start: f32, end: f32, ccw: bool) -> &mut Self {
        if !(r.is_finite() && r > 0.0 && Self::finite(&[cx, cy, start, end])) {
            return self;
        }
        let raw = end - start;
        let sweep = if ccw {
            if raw <= -TAU {
                -TAU
            } else if raw > 0.0 {
                raw - TAU * (raw / TAU).ceil()
            } else {
                raw
            }
        } else if raw >= TAU {
            TAU
        } else if raw < 0.0 {
            raw + TAU * (-raw / TAU).ceil()
        } else {
            raw
        };
        let first = [cx + start.cos() * r, cy + start.sin() * r];
        if self.last.is_some() && !self.closed {
            self.line_to(first[0], first[1]);
        } else {
            self.move_to(first[0], first[1]);
        }
        // Quarter turns or less per cubic keep the error under 0.03%.
        let pieces = ((sweep.abs() / FRAC_PI_2).ceil() as usize).max(1);
        let step = sweep / pieces as f32;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        for i in 0..pieces {
            let a0 = start + step * i as f32;
            let a1 = a0 + step;
            let (s0, c0) = a0.sin_cos();
            let (s1, c1) = a1.sin_cos();
            self.cubic_to(
                [cx + r * (c0 - k * s0), cy + r * (s0 + k * c0)],
                [cx + r * (c1 + k * s1), cy + r * (s1 - k * c1)],
                cx + r * c1,
                cy + r * s1,
            );
        }
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.last.is_some() && !self.closed {
            self.verbs.push(Verb::Close);
            self.closed = true;
            self.last = self.start;
        }
        self
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + w, y)
            .line_to(x + w, y + h)
            .line_to(x, y + h)
            .close()
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) -> &mut Self {
        if !(r.is_finite() && r > 0.0) {
            return self;
        }
        self.move_to(cx + r, cy);
        self.arc(cx, cy, r, 0.0, TAU, false);
        self.close()
    }

    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32) -> &mut Self {
        let r = r.min(w.abs() * 0.5).min(h.abs() * 0.5).max(0.0);
        if r <= 0.5 {
            return self.rect(x, y, w, h);
        }
        self.move_to(x + r, y);
        self.arc(x + w - r, y + r, r, -FRAC_PI_2, 0.0, false);
        self.arc(x + w - r, y + h - r, r, 0.0, FRAC_PI_2, false);
        self.arc(x + r, y + h - r, r, FRAC_PI_2, PI, false);
        self.arc(x + r, y + r, r, PI, PI + FRAC_PI_2, false);
        self.close()
    }

    /// Regular polygon with `sides` vertices, first vertex at `rotation`.
    pub fn regular_polygon(&mut self, cx: f32, cy: f32, r: f32, sides: usize, rotation: f32) -> &mut Self {
        let sides = sides.max(3);
        for i in 0..sides {
            let a = rotation + TAU * i as f32 / sides as f32;
            let (x, y) = (cx + a.cos() * r, cy + a.sin() * r);
            if i == 0 {
                self.move_to(x, y);
            } else {
                self.line_to(x, y);
            }
        }
        self.close()
    }
}
