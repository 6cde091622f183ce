use canvas_visualizer::audio::AudioFeatureFrame;
use canvas_visualizer::effects::pixel::{box_blur, glitch_bands, liquid_morph, pixel_sort, slice_shift};
use canvas_visualizer::effects::{ImageEffectsProcessor, KenBurns, PanDirection};
use canvas_visualizer::settings::{ImageEffectSettings, MirrorMode, SliceDirection};
use canvas_visualizer::surface::{PixelBuffer, Surface};

const SEED: u64 = 0x1A6E_5EED;

/// Smooth diagonal gradient, opaque.
fn gradient_image(w: usize, h: usize) -> PixelBuffer {
    let mut img = PixelBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let r = (x * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            img.set(x, y, [r, g, 128, 255]);
        }
    }
    img
}

fn noisy_image(w: usize, h: usize, seed: u64) -> PixelBuffer {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut img = PixelBuffer::new(w, h);
    for px in img.data_mut().chunks_exact_mut(4) {
        px[0] = rng.u8(..);
        px[1] = rng.u8(..);
        px[2] = rng.u8(..);
        px[3] = 255;
    }
    img
}

fn row(buf: &PixelBuffer, y: usize) -> Vec<[u8; 4]> {
    (0..buf.width()).map(|x| buf.get(x, y)).collect()
}

fn sorted(mut v: Vec<[u8; 4]>) -> Vec<[u8; 4]> {
    v.sort();
    v
}

fn render(effects: &ImageEffectSettings, image: &PixelBuffer, audio: &AudioFeatureFrame) -> PixelBuffer {
    render_at(effects, image, audio, 0.75)
}

fn render_at(effects: &ImageEffectSettings, image: &PixelBuffer, audio: &AudioFeatureFrame, t: f32) -> PixelBuffer {
    let mut processor = ImageEffectsProcessor::with_seed(SEED);
    let mut surface = Surface::new(120, 80);
    processor.apply_image_effects(&mut surface, audio, image, effects, t);
    surface.snapshot()
}

fn close(a: [u8; 4], b: [u8; 4], tol: u8) -> bool {
    (0..4).all(|c| a[c].abs_diff(b[c]) <= tol)
}

/// Pixels in the first half/quadrant whose reflection differs by more than
/// 24 in any color channel.
fn mirror_mismatches(out: &PixelBuffer, flip_x: bool, flip_y: bool) -> usize {
    let (w, h) = (out.width(), out.height());
    let (xs, ys) = (if flip_x { w / 2 } else { w }, if flip_y { h / 2 } else { h });
    let mut off = 0usize;
    for y in 0..ys {
        for x in 0..xs {
            let a = out.get(x, y);
            let b = out.get(if flip_x { w - 1 - x } else { x }, if flip_y { h - 1 - y } else { y });
            if (0..3).any(|c| a[c].abs_diff(b[c]) > 24) {
                off += 1;
            }
        }
    }
    off
}

fn base_effects() -> ImageEffectSettings {
    ImageEffectSettings {
        enabled: true,
        ..ImageEffectSettings::default()
    }
}

// ── Pixel kernels ───────────────────────────────────────────────────────────

#[test]
fn pixel_sort_permutes_runs() {
    let mut buf = noisy_image(64, 16, 7);
    let before = buf.clone();
    let threshold = 90.0;
    pixel_sort(&mut buf, threshold, 3, 10);

    for y in 0..16 {
        assert_eq!(sorted(row(&before, y)), sorted(row(&buf, y)), "row {y} changed its pixel multiset");
    }
    // Rows outside the window are untouched.
    for y in (0..3).chain(13..16) {
        assert_eq!(row(&before, y), row(&buf, y));
    }
    // Inside the window every bright run ends up ordered by brightness.
    for y in 3..13 {
        let r = row(&buf, y);
        for pair in r.windows(2) {
            let (a, b) = (PixelBuffer::brightness(pair[0]), PixelBuffer::brightness(pair[1]));
            if a > threshold && b > threshold {
                assert!(a <= b, "row {y} run not sorted");
            }
        }
    }
}

#[test]
fn slice_shift_only_moves_pixels_within_rows() {
    let mut buf = noisy_image(48, 24, 11);
    let before = buf.clone();
    slice_shift(&mut buf, SliceDirection::Horizontal, 9.0, 0.4);
    assert_ne!(buf, before);
    for y in 0..24 {
        assert_eq!(sorted(row(&before, y)), sorted(row(&buf, y)));
    }
}

#[test]
fn slice_shift_unknown_direction_is_noop() {
    let mut buf = noisy_image(16, 16, 3);
    let before = buf.clone();
    slice_shift(&mut buf, SliceDirection::Unknown, 5.0, 1.0);
    assert_eq!(buf, before);
}

#[test]
fn liquid_morph_zero_amplitude_is_identity() {
    let mut buf = noisy_image(32, 32, 5);
    let before = buf.clone();
    liquid_morph(&mut buf, 0.0, 1.0, 3.0);
    assert_eq!(buf, before);
    liquid_morph(&mut buf, 6.0, 1.0, 3.0);
    assert_ne!(buf, before);
}

#[test]
fn glitch_bands_keep_each_row_a_permutation() {
    let mut buf = noisy_image(40, 40, 9);
    let before = buf.clone();
    let mut rng = fastrand::Rng::with_seed(SEED);
    glitch_bands(&mut buf, &mut rng, 6, 12);
    for y in 0..40 {
        assert_eq!(sorted(row(&before, y)), sorted(row(&buf, y)));
    }
}

#[test]
fn box_blur_preserves_flat_color() {
    let mut buf = PixelBuffer::filled(20, 10, [40, 80, 120, 255]);
    let before = buf.clone();
    box_blur(&mut buf, 3);
    assert_eq!(buf, before);
}

// ── Pixel effects in the processor ──────────────────────────────────────────

#[test]
fn zero_intensity_liquid_morph_matches_plain_draw() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let morph = render(
        &ImageEffectSettings {
            liquid_morph: true,
            liquid_morph_intensity: 0.0,
            ..base_effects()
        },
        &image,
        &audio,
    );
    assert_eq!(plain, morph);
}

#[test]
fn unreadable_surface_skips_pixel_effects() {
    let image = gradient_image(90, 60).with_origin_clean(false);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let pixel_heavy = render(
        &ImageEffectSettings {
            blur: true,
            slice_shift: true,
            pixel_sort: true,
            pixel_sort_intensity: 1.0,
            liquid_morph: true,
            ..base_effects()
        },
        &image,
        &audio,
    );
    assert_eq!(plain, pixel_heavy);
}

#[test]
fn readable_surface_applies_pixel_effects() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let shifted = render(
        &ImageEffectSettings {
            slice_shift: true,
            slice_shift_intensity: 1.0,
            ..base_effects()
        },
        &image,
        &audio,
    );
    assert_ne!(plain, shifted);
}

// ── Mirror and wave ─────────────────────────────────────────────────────────

fn mirrored(mode: MirrorMode) -> PixelBuffer {
    render(
        &ImageEffectSettings {
            mirror: true,
            mirror_mode: mode,
            ..base_effects()
        },
        &gradient_image(90, 60),
        &AudioFeatureFrame::silent(1024),
    )
}

#[test]
fn horizontal_mirror_reflects_left_half() {
    let out = mirrored(MirrorMode::Horizontal);
    let (w, h) = (out.width(), out.height());
    let off = mirror_mismatches(&out, true, false);
    assert!(off * 50 < w * h / 2, "{off} mirrored pixels differ");
}

#[test]
fn vertical_mirror_reflects_top_half() {
    let out = mirrored(MirrorMode::Vertical);
    let (w, h) = (out.width(), out.height());
    let off = mirror_mismatches(&out, false, true);
    assert!(off * 50 < w * h / 2, "{off} mirrored pixels differ");
    // The gradient runs left to right, so there is no left/right symmetry.
    assert!(mirror_mismatches(&out, true, false) > w * h / 4);
}

#[test]
fn quad_mirror_reflects_both_ways() {
    let out = mirrored(MirrorMode::Quad);
    let (w, h) = (out.width(), out.height());
    let across = mirror_mismatches(&out, true, false);
    let down = mirror_mismatches(&out, false, true);
    assert!(across * 50 < w * h / 2, "{across} pixels differ across");
    assert!(down * 50 < w * h / 2, "{down} pixels differ down");
}

#[test]
fn wave_strips_shift_sideways_only() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let wave = |intensity: f32| {
        render(
            &ImageEffectSettings {
                wave: true,
                wave_intensity: intensity,
                ..base_effects()
            },
            &image,
            &audio,
        )
    };

    let waved = wave(1.0);
    let (w, h) = (plain.width(), plain.height());
    let mut widest = 0.0f32;
    for y in 0..h {
        let mut red = 0.0f32;
        for x in 8..w - 8 {
            let (a, b) = (plain.get(x, y), waved.get(x, y));
            // The gradient's green channel only depends on the row.
            assert!(a[1].abs_diff(b[1]) <= 3, "row {y} moved vertically");
            red += (a[0] as f32 - b[0] as f32).abs();
        }
        widest = widest.max(red / (w - 16) as f32);
    }
    assert!(widest > 2.0, "no strip moved: {widest}");

    let still = wave(0.0);
    for y in 0..h {
        for x in 0..w {
            assert!(close(still.get(x, y), plain.get(x, y), 2), "({x}, {y})");
        }
    }
}

// ── Creative effects ────────────────────────────────────────────────────────

#[test]
fn rain_mask_is_repeatable_and_only_adds_light() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 0.8);
    let fx = ImageEffectSettings {
        rain_mask: true,
        rain_mask_intensity: 1.0,
        ..base_effects()
    };
    let first = render_at(&fx, &image, &audio, 1.5);
    assert_eq!(first, render_at(&fx, &image, &audio, 1.5));
    assert_ne!(first, render_at(&fx, &image, &audio, 2.5));

    let plain = render_at(&base_effects(), &image, &audio, 1.5);
    assert_ne!(first, plain);
    for (rain, dry) in first.data().chunks_exact(4).zip(plain.data().chunks_exact(4)) {
        assert!((0..3).all(|c| rain[c] >= dry[c]), "{rain:?} darker than {dry:?}");
    }
}

#[test]
fn shatter_leaves_black_gaps_between_shards() {
    let image = gradient_image(90, 60);
    let loud = AudioFeatureFrame::from_arrays(vec![255; 1024], vec![128; 2048]);
    let out = render(
        &ImageEffectSettings {
            shatter: true,
            shatter_intensity: 1.0,
            shatter_pieces: 8,
            ..base_effects()
        },
        &image,
        &loud,
    );
    // Shards move away from the center, which is left uncovered.
    assert_eq!(out.get(60, 40), [0, 0, 0, 255]);
    let black = out.data().chunks_exact(4).filter(|p| p[..3] == [0, 0, 0]).count();
    let plain = render(&base_effects(), &image, &loud);
    assert!(plain.data().chunks_exact(4).all(|p| p[2] > 0));
    assert!(black > 20, "only {black} black pixels");
}

#[test]
fn tunnel_zoom_and_circle_rotation_keep_the_center() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let cases = [
        ImageEffectSettings {
            tunnel_zoom: true,
            tunnel_zoom_intensity: 1.0,
            ..base_effects()
        },
        ImageEffectSettings {
            circle_rotation: true,
            circle_rotation_intensity: 1.0,
            ..base_effects()
        },
    ];
    for fx in cases {
        let out = render(&fx, &image, &audio);
        assert_ne!(out, plain);
        let (a, b) = (out.get(60, 40), plain.get(60, 40));
        assert!(close(a, b, 12), "center moved: {a:?} vs {b:?}");
    }
}

#[test]
fn silent_ripple_changes_nothing() {
    let image = gradient_image(90, 60);
    let audio = AudioFeatureFrame::synthetic(1024, 0.2, 1.0);
    let plain = render(&base_effects(), &image, &audio);
    let ripple = |intensity: f32| {
        render(
            &ImageEffectSettings {
                ripple: true,
                ripple_intensity: intensity,
                ..base_effects()
            },
            &image,
            &audio,
        )
    };
    assert_eq!(ripple(0.0), plain);
    assert_ne!(ripple(1.0), plain);
}

#[test]
fn every_effect_runs_together_without_panicking() {
    let image = gradient_image(64, 48);
    let audio = AudioFeatureFrame::from_arrays(vec![255; 1024], vec![255; 2048]);
    let all = ImageEffectSettings {
        pulse: true,
        wave: true,
        color_shift: true,
        glitch: true,
        zoom: true,
        blur: true,
        chromatic: true,
        rotation: true,
        scanlines: true,
        vignette: true,
        circle_rotation: true,
        rain_mask: true,
        slice_shift: true,
        slice_shift_direction: SliceDirection::Both,
        ripple: true,
        pixel_sort: true,
        tunnel_zoom: true,
        shatter: true,
        liquid_morph: true,
        ..base_effects()
    };
    let mut processor = ImageEffectsProcessor::with_seed(SEED);
    for size in [(1usize, 1usize), (7, 300), (120, 80)] {
        let mut surface = Surface::new(size.0, size.1);
        for f in 0..4 {
            processor.apply_image_effects(&mut surface, &audio, &image, &all, f as f32 * 0.1);
        }
    }
    assert!(processor.rotation() > 0.0);
}

// ── Rotation and Ken Burns ──────────────────────────────────────────────────

#[test]
fn image_rotation_reset_is_idempotent() {
    let image = gradient_image(32, 32);
    let audio = AudioFeatureFrame::synthetic(256, 0.0, 0.5);
    let fx = ImageEffectSettings {
        rotation: true,
        ..base_effects()
    };
    let mut processor = ImageEffectsProcessor::with_seed(SEED);
    let mut surface = Surface::new(32, 32);
    for _ in 0..3 {
        processor.apply_image_effects(&mut surface, &audio, &image, &fx, 0.0);
    }
    assert!(processor.rotation() > 0.0);
    processor.reset_image_rotation();
    processor.reset_image_rotation();
    assert_eq!(processor.rotation(), 0.0);
}

#[test]
fn ken_burns_turns_after_max_pan() {
    let mut kb = KenBurns::default();
    assert_eq!(kb.direction, PanDirection::Right);
    for _ in 0..150 {
        kb.advance(1.0);
    }
    assert_eq!(kb.direction, PanDirection::Right);
    for _ in 0..100 {
        kb.advance(1.0);
    }
    assert_eq!(kb.direction, PanDirection::Down);
}
