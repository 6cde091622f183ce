use canvas_visualizer::audio::AudioFeatureFrame;
use canvas_visualizer::color::{ColorScheme, Palette};
use canvas_visualizer::noise::{hash01, ValueNoise};
use canvas_visualizer::settings::{VisualStyle, VisualizerConfig};
use canvas_visualizer::surface::{PixelBuffer, Surface};
use canvas_visualizer::visual::{RenderRequest, VisualizationRenderer};

const SEED: u64 = 0xC0FF_EE00;

fn request<'a>(
    style: VisualStyle,
    audio: &'a AudioFeatureFrame,
    config: &'a VisualizerConfig,
    palette: &'a [String],
    time: f32,
) -> RenderRequest<'a> {
    RenderRequest {
        time,
        audio,
        style,
        color_scheme: ColorScheme::Neon,
        config,
        background: None,
        custom_palette: palette,
        skip_background_fill: false,
    }
}

fn has_non_black(buf: &PixelBuffer) -> bool {
    buf.data()
        .chunks_exact(4)
        .any(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
}

/// Frame whose spectrum is loud only in bins `lit`.
fn spike_frame(bins: usize, lit: &[usize]) -> AudioFeatureFrame {
    let mut freq = vec![0u8; bins];
    for &i in lit {
        freq[i] = 255;
    }
    AudioFeatureFrame::from_arrays(freq, vec![128; bins * 2])
}

// ── Bars ────────────────────────────────────────────────────────────────────

#[test]
fn silent_bars_draw_nothing() {
    let mut renderer = VisualizationRenderer::with_seed(SEED);
    let mut surface = Surface::new(160, 90);
    let audio = AudioFeatureFrame::silent(1024);
    let config = VisualizerConfig::default();
    for f in 0..5 {
        renderer.render(&mut surface, &request(VisualStyle::Bars, &audio, &config, &[], f as f32 / 60.0));
    }
    assert!(!has_non_black(surface.pixels()), "zero spectrum must leave only the fade fill");
}

// ── Particles ───────────────────────────────────────────────────────────────

#[test]
fn bass_spawns_bounded_particle_pool() {
    let mut renderer = VisualizationRenderer::with_seed(SEED);
    let mut surface = Surface::new(200, 200);
    let mut audio = AudioFeatureFrame::silent(1024);
    audio.bass_level = 255.0;
    audio.mid_level = 0.0;
    audio.treble_level = 0.0;
    let config = VisualizerConfig {
        particle_count: 50,
        ..VisualizerConfig::default()
    };

    for f in 0..100 {
        renderer.render(&mut surface, &request(VisualStyle::Particles, &audio, &config, &[], f as f32 / 60.0));
        assert!(renderer.particle_count() <= 50, "pool exceeded cap at tick {f}");
    }
    let n = renderer.particle_count();
    assert!(n > 0 && n <= 50, "pool size {n}");
}

#[test]
fn silence_spawns_no_particles() {
    let mut renderer = VisualizationRenderer::with_seed(SEED);
    let mut surface = Surface::new(64, 64);
    let audio = AudioFeatureFrame::silent(256);
    let config = VisualizerConfig::default();
    for _ in 0..30 {
        renderer.render(&mut surface, &request(VisualStyle::Particles, &audio, &config, &[], 0.0));
    }
    assert_eq!(renderer.particle_count(), 0);
}

// ── Noise ───────────────────────────────────────────────────────────────────

#[test]
fn value_noise_is_pure() {
    let noise = ValueNoise::new();
    for &(x, y) in &[(0.0f32, 0.0f32), (1.25, -3.5), (17.3, 4.9), (-0.01, 100.0)] {
        let a = noise.noise2(x, y);
        let b = noise.noise2(x, y);
        assert_eq!(a.to_bits(), b.to_bits());
    }
    assert_eq!(hash01(42, 7).to_bits(), hash01(42, 7).to_bits());
}

// ── Palette ─────────────────────────────────────────────────────────────────

#[test]
fn unknown_scheme_falls_back_to_neon() {
    assert_eq!(Palette::resolve(ColorScheme::Unknown, &[]), Palette::scheme(ColorScheme::Neon));
    assert_eq!(ColorScheme::Unknown.hex_colors(), ColorScheme::Neon.hex_colors());

    let audio = AudioFeatureFrame::synthetic(1024, 0.4, 0.9);
    let config = VisualizerConfig::default();
    let draw = |scheme: ColorScheme| {
        let mut renderer = VisualizationRenderer::with_seed(SEED);
        let mut surface = Surface::new(96, 64);
        let req = RenderRequest {
            color_scheme: scheme,
            ..request(VisualStyle::Bars, &audio, &config, &[], 0.5)
        };
        renderer.render(&mut surface, &req);
        surface.snapshot()
    };
    let unknown = draw(ColorScheme::Unknown);
    assert!(has_non_black(&unknown));
    assert_eq!(unknown, draw(ColorScheme::Neon));
}

#[test]
fn palette_cycling_stays_in_bounds() {
    let hex = ["#ff0000", "#00ff00", "#0000ff", "#ffff00", "#00ffff", "#ff00ff", "#ffffff", "#808080"];
    let mut surface = Surface::new(96, 64);
    let audio = AudioFeatureFrame::synthetic(512, 0.3, 0.9);
    for len in 2..=8 {
        let custom: Vec<String> = hex[..len].iter().map(|s| s.to_string()).collect();
        let palette = Palette::resolve(ColorScheme::Neon, &custom);
        assert_eq!(palette.len(), len);
        for i in 0..1000 {
            palette.cycle(i);
            palette.pick(i, 997);
        }
        for bar_count in [1usize, 3, 7, 64, 333] {
            let config = VisualizerConfig {
                bar_count,
                ..VisualizerConfig::default()
            };
            let mut renderer = VisualizationRenderer::with_seed(SEED);
            for style in VisualStyle::all() {
                renderer.render(&mut surface, &request(style, &audio, &config, &custom, 1.0));
            }
        }
    }
}

// ── Circular ────────────────────────────────────────────────────────────────

/// Count of pixels whose point reflection through the center differs by
/// more than `tol` in any channel, over pixels that are lit on either side.
fn asymmetric_pixels(buf: &PixelBuffer, tol: i32) -> (usize, usize) {
    let (w, h) = (buf.width(), buf.height());
    let mut lit = 0usize;
    let mut off = 0usize;
    for y in 0..h {
        for x in 0..w {
            let a = buf.get(x, y);
            let b = buf.get(w - 1 - x, h - 1 - y);
            if a[..3].iter().chain(&b[..3]).all(|&c| c < 8) {
                continue;
            }
            lit += 1;
            if (0..3).any(|c| (a[c] as i32 - b[c] as i32).abs() > tol) {
                off += 1;
            }
        }
    }
    (lit, off)
}

#[test]
fn circular_mirror_is_point_symmetric() {
    // Single ray at 45 degrees, one color, no glow, no rotation.
    let audio = spike_frame(1024, &[128]);
    let palette = vec!["#40c0ff".to_string()];
    let render = |mirror: bool| {
        let config = VisualizerConfig {
            bar_count: 8,
            glow_intensity: 0.0,
            rotation_speed: 0.0,
            mirror_mode: mirror,
            ..VisualizerConfig::default()
        };
        let mut renderer = VisualizationRenderer::with_seed(SEED);
        let mut surface = Surface::new(200, 200);
        renderer.render(&mut surface, &request(VisualStyle::Circular, &audio, &config, &palette, 0.0));
        surface.snapshot()
    };

    let (lit, off) = asymmetric_pixels(&render(true), 48);
    assert!(lit > 200, "expected visible rays, got {lit} lit pixels");
    assert!(off * 50 < lit, "{off} of {lit} pixels break point symmetry");

    let (lit_plain, off_plain) = asymmetric_pixels(&render(false), 48);
    assert!(off_plain * 4 > lit_plain, "a lone ray should not be symmetric");
}

// ── Renderer lifecycle ──────────────────────────────────────────────────────

#[test]
fn resets_are_idempotent() {
    let mut renderer = VisualizationRenderer::with_seed(SEED);
    let mut surface = Surface::new(120, 80);
    let mut audio = AudioFeatureFrame::synthetic(1024, 0.0, 1.0);
    audio.bass_level = 255.0;
    let config = VisualizerConfig::default();
    for f in 0..20 {
        renderer.render(&mut surface, &request(VisualStyle::Particles, &audio, &config, &[], f as f32 / 60.0));
        renderer.render(&mut surface, &request(VisualStyle::EndlessMaze, &audio, &config, &[], f as f32 / 60.0));
    }
    assert!(renderer.rotation() != 0.0);
    assert!(renderer.particle_count() > 0);

    renderer.reset_rotation();
    renderer.reset_rotation();
    assert_eq!(renderer.rotation(), 0.0);

    renderer.clear_particles();
    assert_eq!(renderer.particle_count(), 0);
    renderer.clear_particles();
    assert_eq!(renderer.particle_count(), 0);
}

#[test]
fn every_style_survives_degenerate_frames() {
    let empty = AudioFeatureFrame::from_arrays(Vec::new(), Vec::new());
    let silent = AudioFeatureFrame::silent(1024);
    let loud = AudioFeatureFrame::from_arrays(vec![255; 1024], vec![255; 2048]);
    let config = VisualizerConfig::default();
    let mut renderer = VisualizationRenderer::with_seed(SEED);

    for size in [(1usize, 1usize), (3, 200), (320, 180)] {
        let mut surface = Surface::new(size.0, size.1);
        for style in VisualStyle::all() {
            for audio in [&empty, &silent, &loud] {
                renderer.render(&mut surface, &request(style, audio, &config, &[], 2.5));
            }
        }
    }

    let mut zero = Surface::new(0, 0);
    for style in VisualStyle::all() {
        renderer.render(&mut zero, &request(style, &loud, &config, &[], 0.0));
    }
}

#[test]
fn every_style_draws_something_when_loud() {
    let audio = AudioFeatureFrame::synthetic(1024, 0.5, 1.0);
    let config = VisualizerConfig::default();
    for style in VisualStyle::all() {
        let mut renderer = VisualizationRenderer::with_seed(SEED);
        let mut surface = Surface::new(160, 120);
        for f in 0..6 {
            renderer.render(&mut surface, &request(style, &audio, &config, &[], f as f32 / 60.0));
        }
        assert!(has_non_black(surface.pixels()), "{} rendered black", style.name());
    }
}

#[test]
fn unknown_style_leaves_surface_untouched() {
    let mut renderer = VisualizationRenderer::with_seed(SEED);
    let mut surface = Surface::new(40, 30);
    let before = surface.snapshot();
    let audio = AudioFeatureFrame::synthetic(256, 0.0, 1.0);
    let config = VisualizerConfig::default();
    renderer.render(&mut surface, &request(VisualStyle::Unknown, &audio, &config, &[], 0.0));
    assert_eq!(surface.snapshot(), before);
}

#[test]
fn renderers_do_not_share_state() {
    let mut a = VisualizationRenderer::with_seed(1);
    let b = VisualizationRenderer::with_seed(2);
    let mut surface = Surface::new(100, 100);
    let mut audio = AudioFeatureFrame::silent(1024);
    audio.bass_level = 255.0;
    let config = VisualizerConfig::default();
    for _ in 0..10 {
        a.render(&mut surface, &request(VisualStyle::Particles, &audio, &config, &[], 0.0));
    }
    assert!(a.particle_count() > 0);
    assert_eq!(b.particle_count(), 0);
    assert_eq!(b.rotation(), 0.0);
}
