//! Export sizing: aspect ratio presets, quality presets and frame math.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output aspect ratio. Parsed from the usual `"W:H"` notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ExportRatio {
    #[default]
    #[value(name = "16:9")]
    #[serde(rename = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    #[serde(rename = "9:16")]
    Portrait,
    #[value(name = "1:1")]
    #[serde(rename = "1:1")]
    Square,
    #[value(name = "4:5")]
    #[serde(rename = "4:5")]
    Feed,
    #[value(name = "4:3")]
    #[serde(rename = "4:3")]
    Classic,
}

impl ExportRatio {
    pub fn all() -> [Self; 5] {
        [
            Self::Landscape,
            Self::Portrait,
            Self::Square,
            Self::Feed,
            Self::Classic,
        ]
    }

    /// `(width, height)` terms of the ratio.
    pub fn terms(self) -> (u32, u32) {
        match self {
            Self::Landscape => (16, 9),
            Self::Portrait => (9, 16),
            Self::Square => (1, 1),
            Self::Feed => (4, 5),
            Self::Classic => (4, 3),
        }
    }

    pub fn as_f32(self) -> f32 {
        let (w, h) = self.terms();
        w as f32 / h as f32
    }
}

impl fmt::Display for ExportRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.terms();
        write!(f, "{w}:{h}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported aspect ratio '{0}' (expected one of 16:9, 9:16, 1:1, 4:5, 4:3)")]
pub struct RatioParseError(pub String);

impl FromStr for ExportRatio {
    type Err = RatioParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let (w, h) = compact
            .split_once([':', 'x', '/'])
            .ok_or_else(|| RatioParseError(raw.to_string()))?;
        let w: u32 = w.parse().map_err(|_| RatioParseError(raw.to_string()))?;
        let h: u32 = h.parse().map_err(|_| RatioParseError(raw.to_string()))?;
        Self::all()
            .into_iter()
            .find(|r| r.terms() == (w, h))
            .ok_or_else(|| RatioParseError(raw.to_string()))
    }
}

/// Resolution preset; names the length of the shorter output side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum ExportQuality {
    #[value(name = "720p")]
    #[serde(rename = "720p")]
    Hd,
    #[default]
    #[value(name = "1080p")]
    #[serde(rename = "1080p")]
    FullHd,
    #[value(name = "4k")]
    #[serde(rename = "4k")]
    Uhd,
}

impl ExportQuality {
    pub fn short_side(self) -> u32 {
        match self {
            Self::Hd => 720,
            Self::FullHd => 1080,
            Self::Uhd => 2160,
        }
    }
}

/// Output size for an export of a `source_w` x `source_h` surface.
///
/// The shorter side comes from `quality`, or from the source's shorter side
/// when no preset is given; the longer side follows `ratio` (or the source's
/// own aspect). Both sides are rounded to even values for yuv420p encoders.
pub fn target_dimensions(
    source_w: u32,
    source_h: u32,
    ratio: Option<ExportRatio>,
    quality: Option<ExportQuality>,
) -> (u32, u32) {
    let source_short = source_w.min(source_h).max(2);
    let short = quality.map_or(source_short, ExportQuality::short_side) as f32;

    let aspect = match ratio {
        Some(r) => r.as_f32(),
        None if source_w > 0 && source_h > 0 => source_w as f32 / source_h as f32,
        None => ExportRatio::default().as_f32(),
    };

    let (w, h) = if aspect >= 1.0 {
        (short * aspect, short)
    } else {
        (short, short / aspect)
    };
    (round_even(w), round_even(h))
}

fn round_even(v: f32) -> u32 {
    let v = (v / 2.0).round() as u32 * 2;
    v.max(2)
}

/// Export length: the audio length, optionally capped.
pub fn compute_export_duration(audio_duration_s: f32, duration_cap_s: Option<f32>) -> f32 {
    let base = audio_duration_s.max(0.0);
    match duration_cap_s {
        Some(cap) => base.min(cap.max(0.0)),
        None => base,
    }
}

/// Whole frames that fit in `duration_s`; never zero.
pub fn compute_frame_count(duration_s: f32, fps: u32) -> usize {
    ((duration_s.max(0.0) * fps as f32).floor() as usize).max(1)
}
