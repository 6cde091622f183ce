use serde::{Deserialize, Serialize};

use tiny_skia::{GradientStop, LinearGradient, Point, RadialGradient, Shader, SpreadMode, Transform};

/// Straight-alpha color with components in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::rgb(r, g, b).with_alpha(a)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (self.g.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (self.b.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (self.a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        ]
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.to_rgba8();
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Compositing operator applied when a source pixel lands on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    #[serde(alias = "source-over")]
    Normal,
    /// Additive ("lighter").
    Lighter,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl BlendMode {
    pub(crate) fn to_skia(self) -> tiny_skia::BlendMode {
        use tiny_skia::BlendMode as Sk;
        match self {
            Self::Normal | Self::Unknown => Sk::SourceOver,
            Self::Lighter => Sk::Plus,
            Self::Multiply => Sk::Multiply,
            Self::Screen => Sk::Screen,
            Self::Overlay => Sk::Overlay,
            Self::Darken => Sk::Darken,
            Self::Lighten => Sk::Lighten,
            Self::ColorDodge => Sk::ColorDodge,
            Self::ColorBurn => Sk::ColorBurn,
            Self::HardLight => Sk::HardLight,
            Self::SoftLight => Sk::SoftLight,
            Self::Difference => Sk::Difference,
            Self::Exclusion => Sk::Exclusion,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    Linear { x0: f32, y0: f32, x1: f32, y1: f32 },
    Radial { cx: f32, cy: f32, r0: f32, r1: f32 },
}

/// Gradient defined in user space; resolved against the transform in effect
/// when it is painted.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    stops: Vec<(f32, Color)>,
}

impl Gradient {
    pub fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            kind: GradientKind::Linear { x0, y0, x1, y1 },
            stops: Vec::new(),
        }
    }

    pub fn radial(cx: f32, cy: f32, r0: f32, r1: f32) -> Self {
        Self {
            kind: GradientKind::Radial { cx, cy, r0, r1 },
            stops: Vec::new(),
        }
    }

    pub fn stop(mut self, offset: f32, color: Color) -> Self {
        let offset = if offset.is_finite() { offset.clamp(0.0, 1.0) } else { 0.0 };
        let at = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(at, (offset, color));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

impl From<Color> for Paint {
    fn from(value: Color) -> Self {
        Self::Solid(value)
    }
}

impl From<Gradient> for Paint {
    fn from(value: Gradient) -> Self {
        Self::Gradient(value)
    }
}

impl Paint {
    /// tiny-skia shader for this paint with the global `alpha` folded into
    /// every color. `None` when the paint cannot produce any coverage.
    pub(crate) fn to_shader(&self, alpha: f32) -> Option<Shader<'static>> {
        match self {
            Self::Solid(c) => {
                let c = c.with_alpha(c.a * alpha);
                (c.a > 0.0).then(|| Shader::SolidColor(c.to_skia()))
            }
            Self::Gradient(g) => g.to_shader(alpha),
        }
    }
}

impl Gradient {
    fn to_shader(&self, alpha: f32) -> Option<Shader<'static>> {
        let stop = |offset: f32, c: Color| GradientStop::new(offset, c.with_alpha(c.a * alpha).to_skia());
        match self.kind {
            GradientKind::Linear { x0, y0, x1, y1 } => {
                let stops = self.stops.iter().map(|&(o, c)| stop(o, c)).collect();
                LinearGradient::new(
                    Point::from_xy(x0, y0),
                    Point::from_xy(x1, y1),
                    stops,
                    SpreadMode::Pad,
                    Transform::identity(),
                )
            }
            GradientKind::Radial { cx, cy, r0, r1 } => {
                // tiny-skia radials start at the center, so the inner radius
                // becomes an offset into the outer one.
                let outer = r0.max(r1);
                if !(outer.is_finite() && outer > 0.0) {
                    return None;
                }
                let mut placed: Vec<(f32, Color)> = self
                    .stops
                    .iter()
                    .map(|&(o, c)| (((r0 + o * (r1 - r0)) / outer).clamp(0.0, 1.0), c))
                    .collect();
                placed.sort_by(|a, b| a.0.total_cmp(&b.0));
                let stops = placed.into_iter().map(|(o, c)| stop(o, c)).collect();
                let center = Point::from_xy(cx, cy);
                RadialGradient::new(center, center, outer, stops, SpreadMode::Pad, Transform::identity())
            }
        }
    }
}
