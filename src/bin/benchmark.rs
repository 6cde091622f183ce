use std::time::{Duration, Instant};

use anyhow::Result;
use canvas_visualizer::audio::AudioFeatureFrame;
use canvas_visualizer::color::ColorScheme;
use canvas_visualizer::effects::ImageEffectsProcessor;
use canvas_visualizer::overlay::Playhead;
use canvas_visualizer::scheduler::{FrameScheduler, ManualClock};
use canvas_visualizer::settings::{ImageEffectSettings, Scene, VisualStyle, VisualizerConfig};
use canvas_visualizer::surface::{PixelBuffer, Surface};
use canvas_visualizer::visual::{RenderRequest, VisualizationRenderer};

const BINS: usize = 1024;
const SEED: u64 = 0xF15D_2026;

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 120,
        w: 640,
        h: 360,
        ci_smoke: false,
        quick: false,
        max_ms: 16.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(30);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    let v = s.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Kick on every 24th frame, softer swell in between.
fn synth_audio(f: usize) -> AudioFeatureFrame {
    let t = f as f32 / 60.0;
    let bass = if f % 24 == 0 { 1.0 } else { (t * 1.9).sin() * 0.35 + 0.4 };
    AudioFeatureFrame::synthetic(BINS, t, bass)
}

fn lit(px: &PixelBuffer) -> bool {
    px.data().chunks_exact(4).any(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
}

/// Checkerboard-ish gradient standing in for a user image.
fn test_image(w: usize, h: usize) -> PixelBuffer {
    let mut img = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let check = ((x / 32) + (y / 32)) % 2 == 0;
            let r = (x * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            img.set(x, y, [r, g, if check { 200 } else { 40 }, 255]);
        }
    }
    img
}

struct Tally {
    total: Duration,
    frames: usize,
    black: Vec<String>,
    slow: Vec<(String, f64)>,
}

impl Tally {
    fn new() -> Self {
        Self {
            total: Duration::ZERO,
            frames: 0,
            black: Vec::new(),
            slow: Vec::new(),
        }
    }

    fn record(&mut self, args: &Args, name: &str, elapsed: Duration, lit: usize) -> f64 {
        self.total += elapsed;
        self.frames += args.frames;
        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        if lit == 0 {
            self.black.push(name.to_string());
        }
        if ms > args.max_ms {
            self.slow.push((name.to_string(), ms));
        }
        ms
    }
}

fn bench_styles(args: &Args, tally: &mut Tally) {
    let config = VisualizerConfig::default();
    println!(
        "Style benchmark: styles={} frames/style={} size={}x{}",
        VisualStyle::all().len(),
        args.frames,
        args.w,
        args.h
    );

    for (idx, style) in VisualStyle::all().into_iter().enumerate() {
        let mut renderer = VisualizationRenderer::with_seed(SEED);
        let mut surface = Surface::new(args.w, args.h);
        let start = Instant::now();
        let mut lit_frames = 0usize;
        for f in 0..args.frames {
            let audio = synth_audio(f);
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
            renderer.render(&mut surface, &req);
            if lit(surface.pixels()) {
                lit_frames += 1;
            }
        }
        let ms = tally.record(args, style.name(), start.elapsed(), lit_frames);
        println!("{:>2}. {:<20} {:>8.3} ms/frame  lit={:>3}/{}", idx, style.name(), ms, lit_frames, args.frames);
    }
}

type Toggle = fn(&mut ImageEffectSettings);

fn effect_toggles() -> [(&'static str, Toggle); 19] {
    [
        ("pulse", |e| e.pulse = true),
        ("wave", |e| e.wave = true),
        ("colorShift", |e| e.color_shift = true),
        ("glitch", |e| e.glitch = true),
        ("zoom", |e| e.zoom = true),
        ("blur", |e| e.blur = true),
        ("chromatic", |e| e.chromatic = true),
        ("rotation", |e| e.rotation = true),
        ("mirror", |e| e.mirror = true),
        ("scanlines", |e| e.scanlines = true),
        ("vignette", |e| e.vignette = true),
        ("circleRotation", |e| e.circle_rotation = true),
        ("rainMask", |e| e.rain_mask = true),
        ("sliceShift", |e| e.slice_shift = true),
        ("ripple", |e| e.ripple = true),
        ("pixelSort", |e| e.pixel_sort = true),
        ("tunnelZoom", |e| e.tunnel_zoom = true),
        ("shatter", |e| e.shatter = true),
        ("liquidMorph", |e| e.liquid_morph = true),
    ]
}

fn bench_effects(args: &Args, tally: &mut Tally) {
    let image = test_image(args.w, args.h);
    let toggles = effect_toggles();
    println!("Image effect benchmark: effects={} frames/effect={}", toggles.len(), args.frames);

    for (name, toggle) in toggles {
        let mut effects = ImageEffectSettings {
            enabled: true,
            ..ImageEffectSettings::default()
        };
        toggle(&mut effects);
        let mut processor = ImageEffectsProcessor::with_seed(SEED);
        let mut surface = Surface::new(args.w, args.h);
        let start = Instant::now();
        let mut lit_frames = 0usize;
        for f in 0..args.frames {
            let audio = synth_audio(f);
            processor.apply_image_effects(&mut surface, &audio, &image, &effects, f as f32 / 60.0);
            if lit(surface.pixels()) {
                lit_frames += 1;
            }
        }
        let ms = tally.record(args, name, start.elapsed(), lit_frames);
        println!("    {:<20} {:>8.3} ms/frame  lit={:>3}/{}", name, ms, lit_frames, args.frames);
    }
}

fn bench_pipeline(args: &Args, tally: &mut Tally) {
    let clock = ManualClock::new();
    let mut scheduler = FrameScheduler::with_seed(clock.clone(), args.w, args.h, SEED);
    scheduler.set_image(Some(test_image(args.w, args.h)));
    scheduler.set_exporting(true);

    let mut scene = Scene {
        style: VisualStyle::Particles,
        ..Scene::default()
    };
    scene.effects.enabled = true;
    scene.effects.pulse = true;
    scene.effects.vignette = true;
    scene.effects.ken_burns = true;
    scene.overlays.progress_bar.enabled = true;
    scene.overlays.particles.enabled = true;

    let duration = args.frames as f32 / 60.0;
    let mut source = |_: Duration| Some(synth_audio(0));
    let start = Instant::now();
    let mut lit_frames = 0usize;
    for f in 0..args.frames {
        clock.set(Duration::from_millis(17 * f as u64));
        let playhead = Playhead {
            current: f as f32 / 60.0,
            duration,
        };
        scheduler.tick((args.w, args.h), &mut source, &scene, playhead);
        if lit(scheduler.surface().pixels()) {
            lit_frames += 1;
        }
    }
    let ms = tally.record(args, "full pipeline", start.elapsed(), lit_frames);
    println!("Pipeline: {:>8.3} ms/frame  lit={:>3}/{}", ms, lit_frames, args.frames);
}

fn main() -> Result<()> {
    let args = parse_args();
    let mut tally = Tally::new();

    bench_styles(&args, &mut tally);
    bench_effects(&args, &mut tally);
    bench_pipeline(&args, &mut tally);

    let avg_ms = tally.total.as_secs_f64() * 1000.0 / tally.frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("Summary: {:>8.3} ms/frame avg  {:>7.2} FPS", avg_ms, fps);

    if args.ci_smoke {
        if !tally.black.is_empty() || !tally.slow.is_empty() {
            eprintln!("CI smoke: FAIL");
            if !tally.black.is_empty() {
                eprintln!("  black output: {}", tally.black.join(", "));
            }
            for (name, ms) in &tally.slow {
                eprintln!("  slow: {} ({:.3} ms/frame > {:.3})", name, ms, args.max_ms);
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }

    Ok(())
}
