use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::audio::{AudioTrack, FeatureAnalyzer, TrackSource};
use crate::config::Config;
use crate::export::{compute_export_duration, compute_frame_count};
use crate::overlay::Playhead;
use crate::project::ProjectSnapshot;
use crate::scheduler::{FrameClock, FrameScheduler, ManualClock, SystemClock, TickOutcome};
use crate::settings::Scene;
use crate::surface::PixelBuffer;

/// FFT size for the analyser, giving 1024 frequency bins.
pub const ANALYZER_FFT_SIZE: usize = 2048;

pub fn run(cfg: Config) -> Result<()> {
    cfg.validate()?;

    let track = AudioTrack::load_wav(&cfg.audio).with_context(|| format!("read wav {}", cfg.audio.display()))?;
    let audio_duration_s = track.duration().as_secs_f32();
    let duration_s = compute_export_duration(audio_duration_s, cfg.duration);
    if duration_s <= 0.0 {
        bail!("audio duration is zero after applying --duration");
    }

    let snapshot = build_snapshot(&cfg)?;
    if let Some(path) = cfg.save_project.as_deref() {
        snapshot
            .save(path)
            .with_context(|| format!("save project {}", path.display()))?;
        info!(path = %path.display(), "project saved");
    }
    let scene = snapshot.scene;

    fs::create_dir_all(&cfg.out_dir).with_context(|| format!("create output directory {}", cfg.out_dir.display()))?;

    let mut source = TrackSource::new(track, FeatureAnalyzer::new(ANALYZER_FFT_SIZE, scene.visualizer.smoothing));
    source.set_smoothing(scene.visualizer.smoothing);

    let seed = cfg.seed.unwrap_or_else(|| fastrand::u64(..));
    info!(
        style = scene.style.name(),
        width = cfg.width,
        height = cfg.height,
        fps = cfg.fps,
        duration_s,
        seed,
        "rendering"
    );

    let saved = if cfg.realtime {
        let scheduler = FrameScheduler::with_seed(SystemClock::default(), cfg.width, cfg.height, seed);
        drive_realtime(scheduler, &cfg, &scene, &mut source, duration_s)?
    } else {
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::with_seed(clock.clone(), cfg.width, cfg.height, seed);
        drive_offline(scheduler, clock, &cfg, &scene, &mut source, duration_s)?
    };

    println!("saved {} frames -> {}", saved, cfg.out_dir.display());
    Ok(())
}

/// Scene from `--project` (or defaults) with command line overrides applied.
pub fn build_snapshot(cfg: &Config) -> Result<ProjectSnapshot> {
    let mut snapshot = match cfg.project.as_deref() {
        Some(path) => ProjectSnapshot::load(path).with_context(|| format!("load project {}", path.display()))?,
        None => ProjectSnapshot::default(),
    };
    let scene = &mut snapshot.scene;
    if let Some(style) = cfg.style {
        scene.style = style;
    }
    if let Some(scheme) = cfg.color_scheme {
        scene.color_scheme = scheme;
    }
    if !cfg.palette.is_empty() {
        scene.custom_palette = cfg.palette.clone();
    }
    if let Some(blend) = cfg.blend {
        scene.layer.blend_mode = blend;
    }
    if cfg.image.is_some() {
        scene.effects.enabled = true;
    }
    if cfg.ken_burns {
        scene.effects.ken_burns = true;
    }
    if let Some(path) = cfg.watermark.as_deref() {
        scene.overlays.watermark.enabled = true;
        scene.overlays.watermark.image = Some(path.display().to_string());
    }
    snapshot.export.fps = cfg.fps;
    Ok(snapshot)
}

fn prepare<C: FrameClock>(scheduler: &mut FrameScheduler<C>, cfg: &Config, scene: &Scene) -> Result<()> {
    if let Some(path) = cfg.image.as_deref() {
        scheduler.set_image(Some(load_image(path)?));
    }
    if let Some(path) = cfg.background.as_deref() {
        scheduler.set_background(Some(load_image(path)?));
    }
    // Offline runs decode the watermark up front so the first frames carry it.
    if let Some(source) = scene.overlays.watermark.image.as_deref().filter(|s| !s.is_empty()) {
        match PixelBuffer::open(Path::new(source)) {
            Ok(img) => scheduler.overlays_mut().watermark.set_image(source, img),
            Err(err) => warn!(source, %err, "watermark image failed to load"),
        }
    }
    scheduler.set_playing(true);
    Ok(())
}

fn drive_offline(
    mut scheduler: FrameScheduler<ManualClock>,
    clock: ManualClock,
    cfg: &Config,
    scene: &Scene,
    source: &mut TrackSource,
    duration_s: f32,
) -> Result<usize> {
    prepare(&mut scheduler, cfg, scene)?;
    let frame_count = compute_frame_count(duration_s, cfg.fps);
    let fps = cfg.fps as f64;
    let mut saved = 0usize;

    for idx in 0..frame_count {
        let t = idx as f64 / fps;
        clock.set(Duration::from_secs_f64(t));
        let playhead = Playhead {
            current: t as f32,
            duration: duration_s,
        };
        match scheduler.tick((cfg.width, cfg.height), source, scene, playhead) {
            TickOutcome::Rendered => {
                if is_snapshot_frame(scheduler.frames_rendered(), cfg.every) {
                    save_frame(&scheduler, &cfg.out_dir, idx)?;
                    saved += 1;
                }
            }
            TickOutcome::Throttled => debug!(idx, "frame throttled"),
            TickOutcome::Idle => break,
        }
    }
    scheduler.set_playing(false);
    Ok(saved)
}

fn drive_realtime(
    mut scheduler: FrameScheduler<SystemClock>,
    cfg: &Config,
    scene: &Scene,
    source: &mut TrackSource,
    duration_s: f32,
) -> Result<usize> {
    prepare(&mut scheduler, cfg, scene)?;
    let clock = SystemClock::default();
    let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
    let mut saved = 0usize;
    let mut idx = 0usize;

    loop {
        let current = clock.now().as_secs_f32();
        if current >= duration_s {
            break;
        }
        let playhead = Playhead {
            current,
            duration: duration_s,
        };
        if scheduler.tick((cfg.width, cfg.height), source, scene, playhead) == TickOutcome::Rendered {
            if is_snapshot_frame(scheduler.frames_rendered(), cfg.every) {
                save_frame(&scheduler, &cfg.out_dir, idx)?;
                saved += 1;
            }
            idx += 1;
        }

        // Frame pacing.
        std::thread::sleep(scheduler.next_frame_in().max(target));
    }
    scheduler.set_playing(false);
    Ok(saved)
}

/// Saves the first rendered frame and every `every`th after it.
fn is_snapshot_frame(rendered: u64, every: u32) -> bool {
    rendered.saturating_sub(1) % every.max(1) as u64 == 0
}

fn load_image(path: &Path) -> Result<PixelBuffer> {
    PixelBuffer::open(path).with_context(|| format!("load image {}", path.display()))
}

fn save_frame<C: FrameClock>(scheduler: &FrameScheduler<C>, out_dir: &Path, idx: usize) -> Result<()> {
    let pixels = scheduler.surface().read_pixels().context("capture frame")?;
    let path: PathBuf = out_dir.join(format!("frame_{idx:06}.png"));
    pixels
        .save_png(&path)
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), "frame saved");
    Ok(())
}
