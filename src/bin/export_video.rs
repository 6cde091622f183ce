use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use canvas_visualizer::audio::{AudioSource, AudioTrack, FeatureAnalyzer, TrackSource};
use canvas_visualizer::export::{target_dimensions, ExportQuality, ExportRatio};
use canvas_visualizer::overlay::Playhead;
use canvas_visualizer::project::ProjectSnapshot;
use canvas_visualizer::scheduler::{FrameScheduler, ManualClock, MIN_FRAME_INTERVAL};
use canvas_visualizer::settings::{Scene, VisualStyle};
use canvas_visualizer::surface::PixelBuffer;

pub(crate) use canvas_visualizer::export::{compute_export_duration, compute_frame_count};

const ANALYZER_FFT_SIZE: usize = 2048;
const DEFAULT_OUTPUT: &str = "export.mp4";
const DEFAULT_SEED: u64 = 0xF15D_2026;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_video",
    version,
    about = "Offline visualizer export (WAV input -> MP4 output via ffmpeg)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "WAV")]
    pub(crate) audio: PathBuf,

    #[arg(long, value_name = "MP4", default_value = DEFAULT_OUTPUT)]
    pub(crate) out: PathBuf,

    /// Size of the source surface the export is derived from.
    #[arg(long, default_value_t = 1280)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 720)]
    pub(crate) height: usize,

    #[arg(long, value_enum)]
    pub(crate) ratio: Option<ExportRatio>,

    #[arg(long, value_enum)]
    pub(crate) quality: Option<ExportQuality>,

    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    #[arg(long, value_name = "SECONDS")]
    pub(crate) duration: Option<f32>,

    #[arg(long, value_name = "INDEX_OR_SUBSTRING")]
    pub(crate) style: Option<String>,

    #[arg(long, value_name = "JSON")]
    pub(crate) project: Option<PathBuf>,

    #[arg(long, value_name = "IMAGE")]
    pub(crate) image: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    let max_fps = (1000 / MIN_FRAME_INTERVAL.as_millis()) as u32;
    if args.fps > max_fps {
        bail!("--fps must be <= {max_fps} (frames are at least {MIN_FRAME_INTERVAL:?} apart)");
    }
    if let Some(cap) = args.duration {
        if cap <= 0.0 {
            bail!("--duration must be > 0 seconds");
        }
    }
    Ok(())
}

/// Output size; an explicit ratio or quality runs the dimension calculator,
/// otherwise the source size is used as is.
pub(crate) fn output_dimensions(args: &Cli) -> (usize, usize) {
    if args.ratio.is_none() && args.quality.is_none() {
        return (args.width, args.height);
    }
    let (w, h) = target_dimensions(args.width as u32, args.height as u32, args.ratio, args.quality);
    (w as usize, h as usize)
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .try_init();
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    FfmpegSink::ensure_available()?;

    let track = AudioTrack::load_wav(&args.audio).with_context(|| format!("read wav {}", args.audio.display()))?;
    let audio_duration_s = track.duration().as_secs_f32();
    let export_duration_s = compute_export_duration(audio_duration_s, args.duration);
    if export_duration_s <= 0.0 {
        bail!("audio duration is zero after applying --duration");
    }
    let frame_count = compute_frame_count(export_duration_s, args.fps);

    let mut scene = match args.project.as_deref() {
        Some(path) => {
            ProjectSnapshot::load(path)
                .with_context(|| format!("load project {}", path.display()))?
                .scene
        }
        None => Scene::default(),
    };
    if args.style.is_some() {
        let names = VisualStyle::all().map(VisualStyle::name);
        let idx = resolve_style_index(args.style.as_deref(), &names)?;
        scene.style = VisualStyle::all()[idx];
    }
    if args.image.is_some() {
        scene.effects.enabled = true;
    }

    let (width, height) = output_dimensions(&args);

    let mut parent = args.out.parent().unwrap_or_else(|| Path::new(""));
    if parent == Path::new("") {
        parent = Path::new(".");
    }
    fs::create_dir_all(parent).with_context(|| format!("create output directory {}", parent.display()))?;

    let mut source = TrackSource::new(track, FeatureAnalyzer::new(ANALYZER_FFT_SIZE, scene.visualizer.smoothing));
    let clock = ManualClock::new();
    let mut scheduler = FrameScheduler::with_seed(clock.clone(), width, height, args.seed);
    if let Some(path) = args.image.as_deref() {
        let image = PixelBuffer::open(path).with_context(|| format!("load image {}", path.display()))?;
        scheduler.set_image(Some(image));
    }
    if let Some(source) = scene.overlays.watermark.image.as_deref().filter(|s| !s.is_empty()) {
        let image = PixelBuffer::open(Path::new(source)).with_context(|| format!("load watermark {source}"))?;
        scheduler.overlays_mut().watermark.set_image(source, image);
    }

    let encoded_duration_s = frame_count as f32 / args.fps as f32;
    info!(
        style = scene.style.name(),
        width,
        height,
        fps = args.fps,
        frames = frame_count,
        "exporting"
    );

    let mut sink = FfmpegSink::open(&Encoding {
        audio: args.audio.clone(),
        out: args.out.clone(),
        width,
        height,
        fps: args.fps,
        duration_s: encoded_duration_s,
    })?;

    scheduler.set_exporting(true);
    let rendered = render_frames(
        &mut scheduler,
        &clock,
        &mut source,
        &scene,
        (width, height),
        args.fps,
        frame_count,
        &mut sink,
    );
    scheduler.set_exporting(false);
    // The pipe is closed even after a render error, which is reported first.
    let finished = sink.finish();
    rendered?;
    let written = finished?;

    println!(
        "exported {} frames @ {} fps (duration {:.3}s, {}x{}) -> {}",
        written,
        args.fps,
        encoded_duration_s,
        width,
        height,
        args.out.display()
    );
    Ok(())
}

/// Index into `names` for a numeric index, an exact name or a substring,
/// compared case-insensitively.
pub(crate) fn resolve_style_index(selection: Option<&str>, names: &[&str]) -> Result<usize> {
    if names.is_empty() {
        bail!("no styles available");
    }
    let Some(raw) = selection else {
        return Ok(0);
    };

    if let Ok(idx) = raw.parse::<usize>() {
        if idx < names.len() {
            return Ok(idx);
        }
        bail!("style index {} out of range (0..{})", idx, names.len().saturating_sub(1));
    }

    let needle = raw.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Ok(0);
    }

    if let Some(idx) = names.iter().position(|name| name.to_ascii_lowercase() == needle) {
        return Ok(idx);
    }
    if let Some(idx) = names.iter().position(|name| name.to_ascii_lowercase().contains(&needle)) {
        return Ok(idx);
    }

    bail!("style '{}' not found", raw)
}

/// Destination for rendered frames, in presentation order.
pub(crate) trait FrameSink {
    fn push(&mut self, frame: &PixelBuffer) -> Result<()>;
}

/// What the encoder is asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Encoding {
    pub(crate) audio: PathBuf,
    pub(crate) out: PathBuf,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) fps: u32,
    pub(crate) duration_s: f32,
}

impl Encoding {
    /// ffmpeg arguments: raw RGBA video on stdin muxed with the WAV track
    /// into H.264/AAC, cut to the exported duration.
    pub(crate) fn ffmpeg_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y"]
            .into_iter()
            .chain(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .map(OsString::from)
            .collect();
        args.push("-video_size".into());
        args.push(format!("{}x{}", self.width, self.height).into());
        args.push("-framerate".into());
        args.push(self.fps.to_string().into());
        args.extend(["-i", "-", "-i"].map(OsString::from));
        args.push(self.audio.clone().into_os_string());
        args.extend(
            ["-map", "0:v:0", "-map", "1:a:0", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-t"]
                .map(OsString::from),
        );
        args.push(format!("{:.6}", self.duration_s).into());
        args.extend(["-shortest", "-movflags", "+faststart"].map(OsString::from));
        args.push(self.out.clone().into_os_string());
        args
    }

    fn frame_bytes(&self) -> usize {
        self.width * self.height * 4
    }
}

/// Pipes straight-alpha RGBA frames into a child ffmpeg process.
pub(crate) struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_bytes: usize,
    frames: usize,
}

impl FfmpegSink {
    pub(crate) fn ensure_available() -> Result<()> {
        let status = Command::new("ffmpeg")
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                bail!("ffmpeg not found in PATH (install ffmpeg and retry)")
            }
            Err(err) => Err(anyhow!("failed to run ffmpeg: {err}")),
        }
    }

    pub(crate) fn open(encoding: &Encoding) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(encoding.ffmpeg_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawn ffmpeg for {}", encoding.out.display()))?;
        let stdin = child.stdin.take().context("ffmpeg stdin is not piped")?;
        Ok(Self {
            child,
            stdin: Some(stdin),
            frame_bytes: encoding.frame_bytes(),
            frames: 0,
        })
    }

    /// Closes the pipe and waits for ffmpeg; returns the frames written.
    pub(crate) fn finish(mut self) -> Result<usize> {
        drop(self.stdin.take());
        let status = self.child.wait().context("wait for ffmpeg")?;
        if !status.success() {
            bail!("ffmpeg exited with status {status} after {} frames", self.frames);
        }
        Ok(self.frames)
    }
}

impl FrameSink for FfmpegSink {
    fn push(&mut self, frame: &PixelBuffer) -> Result<()> {
        let rgba = frame.to_straight_rgba();
        if rgba.len() != self.frame_bytes {
            bail!("frame is {}x{}, encoder expects {} bytes", frame.width(), frame.height(), self.frame_bytes);
        }
        let stdin = self.stdin.as_mut().context("ffmpeg stdin already closed")?;
        stdin
            .write_all(&rgba)
            .with_context(|| format!("write frame {} to ffmpeg", self.frames))?;
        self.frames += 1;
        Ok(())
    }
}

/// Steps the scheduler's clock one frame at a time and streams each frame.
/// A throttled tick re-sends the previous frame so the stream keeps its rate.
#[allow(clippy::too_many_arguments)]
pub(crate) fn render_frames(
    scheduler: &mut FrameScheduler<ManualClock>,
    clock: &ManualClock,
    source: &mut dyn AudioSource,
    scene: &Scene,
    display: (usize, usize),
    fps: u32,
    frame_count: usize,
    sink: &mut dyn FrameSink,
) -> Result<()> {
    let duration = frame_count as f32 / fps as f32;
    for idx in 0..frame_count {
        let t = idx as f64 / fps as f64;
        clock.set(Duration::from_secs_f64(t));
        let playhead = Playhead {
            current: t as f32,
            duration,
        };
        let outcome = scheduler.tick(display, source, scene, playhead);
        if idx % (fps as usize).max(1) == 0 {
            debug!(idx, ?outcome, "export progress");
        }
        let frame = scheduler.surface().read_pixels().context("capture frame")?;
        sink.push(&frame)?;
    }
    Ok(())
}
