//! Frame-time smoke checks at 720p. Timings only mean something with
//! optimizations on, so these run in release builds (`cargo test --release`).

use std::time::{Duration, Instant};

use canvas_visualizer::audio::AudioFeatureFrame;
use canvas_visualizer::color::ColorScheme;
use canvas_visualizer::overlay::Playhead;
use canvas_visualizer::scheduler::{FrameScheduler, ManualClock, MIN_FRAME_INTERVAL};
use canvas_visualizer::settings::{Scene, VisualStyle, VisualizerConfig};
use canvas_visualizer::surface::{PixelBuffer, Surface};
use canvas_visualizer::visual::{RenderRequest, VisualizationRenderer};

const W: usize = 1280;
const H: usize = 720;
const WARMUP: usize = 5;
const FRAMES: usize = 30;
const SEED: u64 = 0xB0D6_E7ED;

/// Twice the scheduler's frame interval.
fn ceiling() -> Duration {
    MIN_FRAME_INTERVAL * 2
}

fn beat(f: usize) -> AudioFeatureFrame {
    let t = f as f32 / 60.0;
    let bass = if f % 24 == 0 { 1.0 } else { (t * 1.9).sin() * 0.35 + 0.4 };
    AudioFeatureFrame::synthetic(1024, t, bass)
}

fn photo(w: usize, h: usize) -> PixelBuffer {
    let mut img = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let r = (x * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            img.set(x, y, [r, g, if (x / 32 + y / 32) % 2 == 0 { 200 } else { 40 }, 255]);
        }
    }
    img
}

fn mean(total: Duration) -> Duration {
    total / FRAMES as u32
}

#[test]
#[cfg_attr(debug_assertions, ignore = "frame timings need a release build")]
fn every_style_fits_the_frame_ceiling() {
    let config = VisualizerConfig::default();
    let mut slow = Vec::new();
    for style in VisualStyle::all() {
        let mut renderer = VisualizationRenderer::with_seed(SEED);
        let mut surface = Surface::new(W, H);
        let mut total = Duration::ZERO;
        for f in 0..WARMUP + FRAMES {
            let audio = beat(f);
            let req = RenderRequest {
                time: f as f32 / 60.0,
                audio: &audio,
                style,
                color_scheme: ColorScheme::Neon,
                config: &config,
                background: None,
                custom_palette: &[],
                skip_background_fill: false,
            };
            let start = Instant::now();
            renderer.render(&mut surface, &req);
            if f >= WARMUP {
                total += start.elapsed();
            }
        }
        if mean(total) > ceiling() {
            slow.push(format!("{} {:?}", style.name(), mean(total)));
        }
    }
    assert!(slow.is_empty(), "over {:?}/frame: {}", ceiling(), slow.join(", "));
}

#[test]
#[cfg_attr(debug_assertions, ignore = "frame timings need a release build")]
fn image_pipeline_fits_the_frame_ceiling() {
    let clock = ManualClock::new();
    let mut scheduler = FrameScheduler::with_seed(clock.clone(), W, H, SEED);
    scheduler.set_image(Some(photo(W, H)));
    scheduler.set_exporting(true);

    let mut scene = Scene {
        style: VisualStyle::Bars,
        ..Scene::default()
    };
    scene.effects.enabled = true;
    scene.effects.ken_burns = true;
    scene.effects.pulse = true;
    scene.effects.mirror = true;
    scene.effects.vignette = true;
    scene.overlays.progress_bar.enabled = true;
    scene.overlays.particles.enabled = true;

    let mut source = |_: Duration| Some(beat(0));
    let mut total = Duration::ZERO;
    for f in 0..WARMUP + FRAMES {
        clock.set(MIN_FRAME_INTERVAL * f as u32);
        let playhead = Playhead {
            current: f as f32 / 60.0,
            duration: 10.0,
        };
        let start = Instant::now();
        scheduler.tick((W, H), &mut source, &scene, playhead);
        if f >= WARMUP {
            total += start.elapsed();
        }
    }
    assert!(mean(total) <= ceiling(), "pipeline {:?}/frame", mean(total));
}
