use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::color::ColorScheme;
use crate::settings::VisualStyle;
use crate::surface::BlendMode;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "canvas_visualizer",
    version,
    about = "Audio-reactive canvas visualizer (WAV input -> PNG frame snapshots)"
)]
pub struct Config {
    #[arg(long, value_name = "WAV")]
    pub audio: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "frames")]
    pub out_dir: PathBuf,

    /// Project JSON supplying the scene; flags below override it.
    #[arg(long, value_name = "JSON")]
    pub project: Option<PathBuf>,

    /// Write the effective scene back out as a project file.
    #[arg(long, value_name = "JSON")]
    pub save_project: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub style: Option<VisualStyle>,

    #[arg(long, value_enum)]
    pub color_scheme: Option<ColorScheme>,

    /// Comma separated hex colors, e.g. `#ff0000,#00ff00`.
    #[arg(long, value_delimiter = ',')]
    pub palette: Vec<String>,

    /// Image drawn through the effects pipeline under the visualization.
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    #[arg(long, value_name = "IMAGE")]
    pub background: Option<PathBuf>,

    #[arg(long, value_name = "IMAGE")]
    pub watermark: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub blend: Option<BlendMode>,

    #[arg(long, default_value_t = false)]
    pub ken_burns: bool,

    #[arg(long, default_value_t = 1280)]
    pub width: usize,

    #[arg(long, default_value_t = 720)]
    pub height: usize,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Save every Nth rendered frame.
    #[arg(long, default_value_t = 30)]
    pub every: u32,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Pace frames against the wall clock instead of stepping offline.
    #[arg(long, default_value_t = false)]
    pub realtime: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("--width and --height must be >= 1");
        }
        if self.fps == 0 {
            bail!("--fps must be >= 1");
        }
        if self.every == 0 {
            bail!("--every must be >= 1");
        }
        if let Some(cap) = self.duration {
            if cap <= 0.0 {
                bail!("--duration must be > 0 seconds");
            }
        }
        Ok(())
    }
}
