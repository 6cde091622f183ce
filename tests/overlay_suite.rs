use canvas_visualizer::audio::AudioFeatureFrame;
use canvas_visualizer::overlay::{
    active_dots, draw_caption, draw_progress_bar, draw_text_overlay, progress_fraction, OverlayCompositor,
    ParticleOverlay, Playhead, ProgressLayout, WatermarkOverlay,
};
use canvas_visualizer::settings::{
    Anchor, CaptionConfig, OverlaySettings, ParticleKind, ParticleOverlayConfig, ProgressBarConfig, ProgressStyle,
    TextAnimation, TextOverlayConfig, WatermarkConfig,
};
use canvas_visualizer::surface::{PixelBuffer, Surface};

fn lit_pixels(buf: &PixelBuffer) -> usize {
    buf.data().chunks_exact(4).filter(|px| px[3] != 0).count()
}

fn dots_config() -> ProgressBarConfig {
    ProgressBarConfig {
        enabled: true,
        style: ProgressStyle::Dots,
        show_time: false,
        color: "#ff0000".to_string(),
        background_color: "#0000ff".to_string(),
        opacity: 1.0,
        height: 8.0,
        ..ProgressBarConfig::default()
    }
}

// ── Progress bar ────────────────────────────────────────────────────────────

#[test]
fn half_progress_lights_half_the_dots() {
    let config = dots_config();
    let mut surface = Surface::new(400, 120);
    let duration = 180.0;
    draw_progress_bar(&mut surface, &config, duration / 2.0, duration, 0.0);

    let layout = ProgressLayout::new(&config, 400.0, 120.0).expect("bottom layout");
    let dots = layout.dots();
    assert!(dots.len() >= 2 && dots.len() % 2 == 0);

    let active = dots
        .iter()
        .filter(|(cx, cy, _)| {
            let px = surface.pixels().get(*cx as usize, *cy as usize);
            px[0] > 200 && px[2] < 60 && px[3] > 200
        })
        .count();
    assert_eq!(active * 2, dots.len(), "{active} of {} dots active", dots.len());

    // The rest carry the dimmed background color.
    let inactive = dots
        .iter()
        .filter(|(cx, cy, _)| {
            let px = surface.pixels().get(*cx as usize, *cy as usize);
            px[2] > 200 && px[0] < 60
        })
        .count();
    assert_eq!(active + inactive, dots.len());
}

#[test]
fn progress_math_handles_degenerate_durations() {
    assert_eq!(progress_fraction(5.0, 0.0), 0.0);
    assert_eq!(progress_fraction(5.0, f32::NAN), 0.0);
    assert_eq!(progress_fraction(50.0, 10.0), 1.0);
    assert_eq!(active_dots(10, 0.5), 5);
    assert_eq!(active_dots(10, 2.0), 10);
    assert_eq!(active_dots(0, 0.5), 0);
}

#[test]
fn every_progress_style_draws_a_track() {
    for style in [
        ProgressStyle::Line,
        ProgressStyle::Dots,
        ProgressStyle::Wave,
        ProgressStyle::Glow,
        ProgressStyle::Minimal,
    ] {
        let config = ProgressBarConfig {
            style,
            ..dots_config()
        };
        let mut surface = Surface::new(300, 80);
        draw_progress_bar(&mut surface, &config, 30.0, 60.0, 1.0);
        assert!(lit_pixels(surface.pixels()) > 0, "{style:?} drew nothing");
    }
}

#[test]
fn unknown_progress_style_draws_nothing() {
    let config = ProgressBarConfig {
        style: ProgressStyle::Unknown,
        ..dots_config()
    };
    let mut surface = Surface::new(300, 80);
    draw_progress_bar(&mut surface, &config, 30.0, 60.0, 1.0);
    assert_eq!(lit_pixels(surface.pixels()), 0);
}

// ── Particles ───────────────────────────────────────────────────────────────

#[test]
fn particle_pool_tracks_configured_count() {
    let mut overlay = ParticleOverlay::new(99);
    let mut surface = Surface::new(200, 150);
    let audio = AudioFeatureFrame::synthetic(512, 0.0, 1.0);

    for kind in ParticleKind::all() {
        for count in [0usize, 1, 25, 80] {
            let config = ParticleOverlayConfig {
                enabled: true,
                kind,
                count,
                speed: 3.0,
                ..ParticleOverlayConfig::default()
            };
            for f in 0..120 {
                overlay.draw(&mut surface, &audio, &config, f as f32 / 60.0);
                assert!(overlay.particles().len() <= count);
            }
            assert_eq!(overlay.particles().len(), count, "{kind:?} x{count}");
        }
    }
}

#[test]
fn particles_stay_near_the_canvas() {
    let mut overlay = ParticleOverlay::new(5);
    let mut surface = Surface::new(160, 90);
    let audio = AudioFeatureFrame::synthetic(512, 0.0, 1.0);
    let config = ParticleOverlayConfig {
        enabled: true,
        kind: ParticleKind::Confetti,
        count: 40,
        speed: 5.0,
        ..ParticleOverlayConfig::default()
    };
    for f in 0..600 {
        overlay.draw(&mut surface, &audio, &config, f as f32 / 60.0);
    }
    for p in overlay.particles() {
        assert!(p.x > -80.0 && p.x < 240.0 && p.y > -80.0 && p.y < 170.0, "stray particle {p:?}");
    }
}

#[test]
fn unknown_particle_kind_draws_nothing() {
    let mut overlay = ParticleOverlay::new(1);
    let mut surface = Surface::new(100, 100);
    let config = ParticleOverlayConfig {
        enabled: true,
        kind: ParticleKind::Unknown,
        ..ParticleOverlayConfig::default()
    };
    overlay.draw(&mut surface, &AudioFeatureFrame::default(), &config, 0.0);
    assert_eq!(lit_pixels(surface.pixels()), 0);
    assert!(overlay.particles().is_empty());
}

// ── Text and caption ────────────────────────────────────────────────────────

#[test]
fn text_overlay_draws_at_every_anchor() {
    let audio = AudioFeatureFrame::synthetic(256, 0.0, 0.5);
    for anchor in Anchor::all() {
        for animation in TextAnimation::all() {
            let config = TextOverlayConfig {
                enabled: true,
                text: "LIVE".to_string(),
                font_size: 24.0,
                position: anchor,
                padding: 10.0,
                animation,
                ..TextOverlayConfig::default()
            };
            let mut surface = Surface::new(240, 160);
            draw_text_overlay(&mut surface, &config, &audio, 0.4);
            assert!(lit_pixels(surface.pixels()) > 0, "{anchor:?}/{animation:?} drew nothing");
        }
    }
}

#[test]
fn text_overlay_skips_unknown_or_empty_input() {
    let audio = AudioFeatureFrame::default();
    let base = TextOverlayConfig {
        enabled: true,
        text: "HELLO".to_string(),
        ..TextOverlayConfig::default()
    };
    let cases = [
        TextOverlayConfig {
            position: Anchor::Unknown,
            ..base.clone()
        },
        TextOverlayConfig {
            animation: TextAnimation::Unknown,
            ..base.clone()
        },
        TextOverlayConfig {
            text: "   ".to_string(),
            ..base.clone()
        },
        TextOverlayConfig {
            enabled: false,
            ..base.clone()
        },
    ];
    for config in cases {
        let mut surface = Surface::new(200, 100);
        draw_text_overlay(&mut surface, &config, &audio, 0.0);
        assert_eq!(lit_pixels(surface.pixels()), 0);
    }
}

#[test]
fn caption_draws_when_text_present() {
    let mut surface = Surface::new(200, 100);
    draw_caption(&mut surface, &CaptionConfig::default());
    assert_eq!(lit_pixels(surface.pixels()), 0);

    let config = CaptionConfig {
        text: "Track 01".to_string(),
        font_size: 20.0,
        ..CaptionConfig::default()
    };
    draw_caption(&mut surface, &config);
    assert!(lit_pixels(surface.pixels()) > 0);
}

// ── Watermark ───────────────────────────────────────────────────────────────

#[test]
fn watermark_is_skipped_until_loaded() {
    let config = WatermarkConfig {
        enabled: true,
        image: Some("/nonexistent/watermark-logo.png".to_string()),
        opacity: 1.0,
        ..WatermarkConfig::default()
    };
    let mut overlay = WatermarkOverlay::new();
    let mut surface = Surface::new(200, 120);
    for _ in 0..3 {
        overlay.draw(&mut surface, &config);
    }
    assert!(!overlay.is_ready());
    assert_eq!(lit_pixels(surface.pixels()), 0);
}

#[test]
fn watermark_draws_in_its_corner() {
    let source = "logo.png";
    let config = WatermarkConfig {
        enabled: true,
        image: Some(source.to_string()),
        position: Anchor::TopLeft,
        size: 20.0,
        opacity: 1.0,
        padding: 10.0,
    };
    let mut overlay = WatermarkOverlay::new();
    overlay.set_image(source, PixelBuffer::filled(40, 20, [0, 255, 0, 255]));
    assert!(overlay.is_ready());

    let mut surface = Surface::new(200, 100);
    overlay.draw(&mut surface, &config);
    // 20% of the 100 px short side: 20 x 10 at (10, 10).
    assert_eq!(surface.pixels().get(15, 14), [0, 255, 0, 255]);
    assert_eq!(surface.pixels().get(100, 50)[3], 0);
    assert_eq!(surface.pixels().get(35, 14)[3], 0);
}

// ── Compositor ──────────────────────────────────────────────────────────────

#[test]
fn compositor_with_nothing_enabled_is_a_noop() {
    let mut compositor = OverlayCompositor::with_seed(3);
    let mut surface = Surface::new(120, 80);
    let playhead = Playhead {
        current: 1.0,
        duration: 2.0,
    };
    compositor.draw(&mut surface, &AudioFeatureFrame::default(), &OverlaySettings::default(), playhead, 0.0);
    assert_eq!(lit_pixels(surface.pixels()), 0);
}

#[test]
fn compositor_draws_enabled_layers() {
    let mut compositor = OverlayCompositor::with_seed(3);
    let mut surface = Surface::new(240, 160);
    let settings = OverlaySettings {
        progress_bar: dots_config(),
        particles: ParticleOverlayConfig {
            enabled: true,
            count: 10,
            ..ParticleOverlayConfig::default()
        },
        ..OverlaySettings::default()
    };
    let playhead = Playhead {
        current: 1.0,
        duration: 2.0,
    };
    compositor.draw(&mut surface, &AudioFeatureFrame::default(), &settings, playhead, 0.0);
    assert!(lit_pixels(surface.pixels()) > 0);
    assert_eq!(compositor.particles.particles().len(), 10);
}
