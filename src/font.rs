//! Blocky 3x5 bitmap font, emitted as vector paths so text picks up the
//! surface transform, shadow and stroke like any other shape.

use crate::surface::Path;

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
/// Advance in glyph cells (3 columns plus 1 spacing).
const ADVANCE: f32 = 4.0;

fn glyph_3x5(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' | '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'S' | '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '&' => [0b010, 0b101, 0b010, 0b101, 0b011],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '*' => [0b101, 0b010, 0b111, 0b010, 0b101],
        '@' => [0b111, 0b101, 0b111, 0b100, 0b111],
        ' ' => [0b000; 5],
        _ => [0b111, 0b101, 0b101, 0b101, 0b111],
    }
}

/// Width and height of `text` at a given cap height in pixels.
pub fn measure(text: &str, size: f32) -> (f32, f32) {
    let cell = size.max(0.0) / GLYPH_H as f32;
    let n = text.chars().count();
    if n == 0 {
        return (0.0, size.max(0.0));
    }
    let w = (n as f32 * ADVANCE - 1.0) * cell;
    (w, size.max(0.0))
}

/// Outline of `text` with its top-left corner at `(x, y)`. Horizontal runs of
/// lit cells are merged so stroked text traces whole bars.
pub fn text_path(text: &str, x: f32, y: f32, size: f32) -> Path {
    let mut path = Path::new();
    let cell = size / GLYPH_H as f32;
    if !(cell.is_finite() && cell > 0.0) {
        return path;
    }
    for (i, ch) in text.chars().enumerate() {
        let gx = x + i as f32 * ADVANCE * cell;
        for (ry, bits) in glyph_3x5(ch).iter().enumerate() {
            let mut rx = 0;
            while rx < GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - rx)) == 0 {
                    rx += 1;
                    continue;
                }
                let start = rx;
                while rx < GLYPH_W && bits & (1 << (GLYPH_W - 1 - rx)) != 0 {
                    rx += 1;
                }
                path.rect(
                    gx + start as f32 * cell,
                    y + ry as f32 * cell,
                    (rx - start) as f32 * cell,
                    cell,
                );
            }
        }
    }
    path
}

/// `m:ss` label for progress displays.
pub fn format_time(seconds: f32) -> String {
    let s = if seconds.is_finite() { seconds.max(0.0) as u64 } else { 0 };
    format!("{}:{:02}", s / 60, s % 60)
}
