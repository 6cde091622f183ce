//! Effects that rewrite the raw RGBA buffer directly. Each takes the buffer
//! returned by [`Surface::pixels_mut`](crate::surface::Surface::pixels_mut);
//! the processor skips them when the surface is not readable.

use crate::settings::SliceDirection;
use crate::surface::PixelBuffer;

/// Bands the image is split into for slice shifting.
pub const SLICE_BANDS: usize = 12;

/// Shifts `SLICE_BANDS` horizontal bands (rows move left/right) and/or
/// vertical bands (columns move up/down) by a sinusoidal offset, wrapping
/// pixels around the edge.
pub fn slice_shift(buf: &mut PixelBuffer, direction: SliceDirection, amplitude: f32, t: f32) {
    if buf.is_empty() || !(amplitude.is_finite() && amplitude > 0.0) {
        return;
    }
    let offset = |k: usize| ((k as f32 * 0.8 + t * 2.0).sin() * amplitude).round() as isize;
    if matches!(direction, SliceDirection::Horizontal | SliceDirection::Both) {
        let (w, h) = (buf.width(), buf.height());
        let band = h.div_ceil(SLICE_BANDS);
        let data = buf.data_mut();
        for y in 0..h {
            let shift = offset(y / band).rem_euclid(w as isize) as usize;
            if shift != 0 {
                data[y * w * 4..(y + 1) * w * 4].rotate_right(shift * 4);
            }
        }
    }
    if matches!(direction, SliceDirection::Vertical | SliceDirection::Both) {
        let (w, h) = (buf.width(), buf.height());
        let band = w.div_ceil(SLICE_BANDS);
        let mut column = vec![[0u8; 4]; h];
        for x in 0..w {
            let shift = offset(x / band + SLICE_BANDS).rem_euclid(h as isize) as usize;
            if shift == 0 {
                continue;
            }
            for (y, px) in column.iter_mut().enumerate() {
                *px = buf.get(x, y);
            }
            column.rotate_right(shift);
            for (y, px) in column.iter().enumerate() {
                buf.set(x, y, *px);
            }
        }
    }
}

/// Sorts every run of pixels brighter than `threshold` by brightness, for
/// `rows` consecutive rows starting at `start_row` (wrapping). Runs are
/// permuted in place; no pixel value changes.
pub fn pixel_sort(buf: &mut PixelBuffer, threshold: f32, start_row: usize, rows: usize) {
    let (w, h) = (buf.width(), buf.height());
    if buf.is_empty() || rows == 0 {
        return;
    }
    let mut run: Vec<[u8; 4]> = Vec::with_capacity(w);
    for r in 0..rows.min(h) {
        let y = (start_row + r) % h;
        let mut x = 0;
        while x < w {
            if PixelBuffer::brightness(buf.get(x, y)) <= threshold {
                x += 1;
                continue;
            }
            let start = x;
            run.clear();
            while x < w {
                let px = buf.get(x, y);
                if PixelBuffer::brightness(px) <= threshold {
                    break;
                }
                run.push(px);
                x += 1;
            }
            if run.len() > 1 {
                run.sort_by(|a, b| PixelBuffer::brightness(*a).total_cmp(&PixelBuffer::brightness(*b)));
                for (i, px) in run.iter().enumerate() {
                    buf.set(start + i, y, *px);
                }
            }
        }
    }
}

/// Domain warp: every output pixel samples the source at a trig-driven
/// offset (nearest neighbour, clamped). Zero `amplitude` is the identity.
pub fn liquid_morph(buf: &mut PixelBuffer, amplitude: f32, mid: f32, t: f32) {
    if buf.is_empty() || !(amplitude.is_finite() && amplitude > 0.0) {
        return;
    }
    let src = buf.clone();
    let (w, h) = (buf.width(), buf.height());
    let (maxx, maxy) = ((w - 1) as f32, (h - 1) as f32);
    let swirl = 1.0 + mid.clamp(0.0, 1.0);
    // Per-row and per-column terms are separable, so hoist them.
    let row_dx: Vec<f32> = (0..h).map(|y| (y as f32 * 0.021 + t * 2.0).sin() * amplitude * swirl).collect();
    let col_dy: Vec<f32> = (0..w).map(|x| (x as f32 * 0.019 + t * 1.6).cos() * amplitude * swirl).collect();
    let sdata = src.data();
    let data = buf.data_mut();
    for y in 0..h {
        for x in 0..w {
            let diag = ((x + y) as f32 * 0.013 + t).sin() * amplitude * 0.5;
            let sx = (x as f32 + row_dx[y] + diag).round().clamp(0.0, maxx) as usize;
            let sy = (y as f32 + col_dy[x] - diag).round().clamp(0.0, maxy) as usize;
            let si = (sy * w + sx) * 4;
            let di = (y * w + x) * 4;
            data[di..di + 4].copy_from_slice(&sdata[si..si + 4]);
        }
    }
}

/// Copies `bands` random horizontal bands with a random horizontal offset,
/// wrapping at the row ends.
pub fn glitch_bands(buf: &mut PixelBuffer, rng: &mut fastrand::Rng, bands: usize, max_shift: usize) {
    let (w, h) = (buf.width(), buf.height());
    if buf.is_empty() || max_shift == 0 {
        return;
    }
    let data = buf.data_mut();
    for _ in 0..bands {
        let y0 = rng.usize(..h);
        let bh = rng.usize(1..=(h / 12).max(1)).min(h - y0);
        let shift = rng.usize(1..=max_shift) % w;
        if shift == 0 {
            continue;
        }
        let left = rng.bool();
        for y in y0..y0 + bh {
            let row = &mut data[y * w * 4..(y + 1) * w * 4];
            if left {
                row.rotate_left(shift * 4);
            } else {
                row.rotate_right(shift * 4);
            }
        }
    }
}

/// Separable box blur on all four channels.
pub fn box_blur(buf: &mut PixelBuffer, radius: usize) {
    let (w, h) = (buf.width(), buf.height());
    if buf.is_empty() || radius == 0 {
        return;
    }
    let mut line = vec![[0u32; 4]; w.max(h)];
    let data = buf.data_mut();
    blur_pass(data, w, h, radius, (4, w * 4), &mut line);
    blur_pass(data, h, w, radius, (w * 4, 4), &mut line);
}

/// Blurs `lines` lines of `len` pixels; `(step, stride)` are byte distances
/// between neighbouring pixels and between lines.
fn blur_pass(data: &mut [u8], len: usize, lines: usize, r: usize, (step, stride): (usize, usize), tmp: &mut [[u32; 4]]) {
    for l in 0..lines {
        let base = l * stride;
        for i in 0..len {
            let o = base + i * step;
            tmp[i] = [data[o] as u32, data[o + 1] as u32, data[o + 2] as u32, data[o + 3] as u32];
        }
        let mut acc = [0u32; 4];
        let mut count = 0u32;
        for px in tmp.iter().take(r.min(len - 1) + 1) {
            for c in 0..4 {
                acc[c] += px[c];
            }
            count += 1;
        }
        for i in 0..len {
            let o = base + i * step;
            for c in 0..4 {
                data[o + c] = ((acc[c] + count / 2) / count) as u8;
            }
            if i + r + 1 < len {
                for c in 0..4 {
                    acc[c] += tmp[i + r + 1][c];
                }
                count += 1;
            }
            if i >= r {
                for c in 0..4 {
                    acc[c] -= tmp[i - r][c];
                }
                count -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 37 + y * 11) % 256) as u8;
                buf.set(x, y, [v, 255 - v, (x * 5) as u8, 255]);
            }
        }
        buf
    }

    #[test]
    fn slice_shift_preserves_each_row_multiset() {
        let src = gradient(40, 24);
        let mut out = src.clone();
        slice_shift(&mut out, SliceDirection::Horizontal, 9.0, 0.3);
        assert_ne!(out, src);
        for y in 0..24 {
            let mut a: Vec<[u8; 4]> = (0..40).map(|x| src.get(x, y)).collect();
            let mut b: Vec<[u8; 4]> = (0..40).map(|x| out.get(x, y)).collect();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn liquid_morph_zero_amplitude_is_identity() {
        let src = gradient(32, 16);
        let mut out = src.clone();
        liquid_morph(&mut out, 0.0, 1.0, 4.2);
        assert_eq!(out, src);
    }

    #[test]
    fn box_blur_keeps_flat_image_flat() {
        let mut buf = PixelBuffer::filled(9, 7, [40, 80, 120, 255]);
        box_blur(&mut buf, 3);
        assert_eq!(buf, PixelBuffer::filled(9, 7, [40, 80, 120, 255]));
    }

    #[test]
    fn glitch_bands_only_permute_rows() {
        let src = gradient(30, 30);
        let mut out = src.clone();
        let mut rng = fastrand::Rng::with_seed(4);
        glitch_bands(&mut out, &mut rng, 6, 10);
        for y in 0..30 {
            let mut a: Vec<[u8; 4]> = (0..30).map(|x| src.get(x, y)).collect();
            let mut b: Vec<[u8; 4]> = (0..30).map(|x| out.get(x, y)).collect();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }
}
