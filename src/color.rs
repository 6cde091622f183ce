use serde::{Deserialize, Serialize};

use crate::surface::Color;

pub const MAX_CUSTOM_COLORS: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Neon,
    Sunset,
    Ocean,
    Galaxy,
    Fire,
    Matrix,
    Pastel,
    Monochrome,
    /// Unrecognised scheme name from persisted configuration.
    #[serde(other)]
    #[value(skip)]
    Unknown,
}

impl ColorScheme {
    pub fn all() -> [Self; 8] {
        [
            Self::Neon,
            Self::Sunset,
            Self::Ocean,
            Self::Galaxy,
            Self::Fire,
            Self::Matrix,
            Self::Pastel,
            Self::Monochrome,
        ]
    }

    pub fn hex_colors(self) -> [&'static str; 5] {
        match self {
            Self::Neon | Self::Unknown => ["#ff00ff", "#00ffff", "#ff0080", "#80ff00", "#ffff00"],
            Self::Sunset => ["#ff6b35", "#f7931e", "#ffd23f", "#ee4266", "#540d6e"],
            Self::Ocean => ["#003459", "#0077be", "#00a8e8", "#00c9ff", "#92dff3"],
            Self::Galaxy => ["#4a148c", "#7b1fa2", "#9c27b0", "#e040fb", "#ea80fc"],
            Self::Fire => ["#ff0000", "#ff4500", "#ff8c00", "#ffd700", "#ffff66"],
            Self::Matrix => ["#003b00", "#008f11", "#00cc00", "#00ff41", "#ccffcc"],
            Self::Pastel => ["#ffb3ba", "#ffdfba", "#ffffba", "#baffc9", "#bae1ff"],
            Self::Monochrome => ["#ffffff", "#cccccc", "#999999", "#666666", "#333333"],
        }
    }
}

/// Parses `#rgb` or `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(raw: &str) -> Option<Color> {
    let s = raw.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&s[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        3 => {
            let (r, g, b) = (nibble(0)?, nibble(1)?, nibble(2)?);
            Some(Color::rgb(r * 17, g * 17, b * 17))
        }
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        _ => None,
    }
}

pub fn to_hex(c: Color) -> String {
    let [r, g, b, _] = c.to_rgba8();
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Resolved list of colors a style indexes cyclically. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// A non-empty custom palette overrides the scheme entirely. Unparseable
    /// entries are dropped; if none survive, the scheme is used.
    pub fn resolve(scheme: ColorScheme, custom: &[String]) -> Self {
        let colors: Vec<Color> = custom
            .iter()
            .take(MAX_CUSTOM_COLORS)
            .filter_map(|h| parse_hex(h))
            .collect();
        if !colors.is_empty() {
            return Self { colors };
        }
        Self::scheme(scheme)
    }

    pub fn scheme(scheme: ColorScheme) -> Self {
        let colors = scheme
            .hex_colors()
            .iter()
            .filter_map(|h| parse_hex(h))
            .collect();
        Self { colors }
    }

    pub fn from_colors(colors: Vec<Color>) -> Self {
        if colors.is_empty() {
            return Self::scheme(ColorScheme::default());
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// `colors[i % len]`.
    pub fn cycle(&self, i: usize) -> Color {
        self.colors[i % self.colors.len()]
    }

    /// Color for element `i` of `total`: `floor(i / total * len) % len`.
    pub fn pick(&self, i: usize, total: usize) -> Color {
        self.colors[palette_index(i, total, self.colors.len())]
    }

    /// Smoothly interpolated color at `t` in 0..1 across the palette.
    pub fn gradient_at(&self, t: f32) -> Color {
        let n = self.colors.len();
        if n == 1 {
            return self.colors[0];
        }
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let pos = t * (n - 1) as f32;
        let i = (pos.floor() as usize).min(n - 2);
        self.colors[i].lerp(self.colors[i + 1], pos - i as f32)
    }
}

#[inline]
pub fn palette_index(i: usize, total: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let total = total.max(1);
    let idx = (i as f64 / total as f64 * len as f64).floor() as usize;
    idx % len
}

/// `h` in degrees, `s`/`l` in 0..1.
pub fn hsl(h: f32, s: f32, l: f32) -> Color {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s <= 0.0 {
        return Color { r: l, g: l, b: l, a: 1.0 };
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let ch = |mut t: f32| {
        t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Color {
        r: ch(h + 1.0 / 3.0),
        g: ch(h),
        b: ch(h - 1.0 / 3.0),
        a: 1.0,
    }
}

/// Inverse of [`hsl`]: (hue degrees, saturation, lightness).
pub fn to_hsl(c: Color) -> (f32, f32, f32) {
    let max = c.r.max(c.g).max(c.b);
    let min = c.r.min(c.g).min(c.b);
    let l = (max + min) * 0.5;
    let d = max - min;
    if d <= 1e-6 {
        return (0.0, 0.0, l);
    }
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == c.r {
        (c.g - c.b) / d + if c.g < c.b { 6.0 } else { 0.0 }
    } else if max == c.g {
        (c.b - c.r) / d + 2.0
    } else {
        (c.r - c.g) / d + 4.0
    };
    (h * 60.0, s, l)
}

pub fn hue_rotate(c: Color, degrees: f32) -> Color {
    let (h, s, l) = to_hsl(c);
    hsl(h + degrees, s, l).with_alpha(c.a)
}

/// Scales saturation by `intensity` (0..2, 1 = unchanged).
pub fn saturate(c: Color, intensity: f32) -> Color {
    let (h, s, l) = to_hsl(c);
    hsl(h, s * intensity.max(0.0), l).with_alpha(c.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing_accepts_short_and_long_forms() {
        assert_eq!(parse_hex("#fff"), Some(Color::WHITE));
        assert_eq!(parse_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn custom_palette_overrides_scheme() {
        let p = Palette::resolve(ColorScheme::Fire, &["#000000".into(), "#ffffff".into()]);
        assert_eq!(p.len(), 2);
        let p = Palette::resolve(ColorScheme::Fire, &["nope".into()]);
        assert_eq!(p, Palette::scheme(ColorScheme::Fire));
    }

    #[test]
    fn palette_index_stays_in_bounds() {
        for len in 1..=8 {
            for total in [0usize, 1, 7, 64, 256] {
                for i in 0..total + 3 {
                    assert!(palette_index(i, total, len) < len);
                }
            }
        }
    }

    #[test]
    fn hsl_round_trips() {
        let c = Color::rgb(200, 80, 30);
        let (h, s, l) = to_hsl(c);
        let back = hsl(h, s, l);
        assert!((back.r - c.r).abs() < 1e-3 && (back.g - c.g).abs() < 1e-3 && (back.b - c.b).abs() < 1e-3);
    }
}
