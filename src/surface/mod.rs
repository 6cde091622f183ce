//! Canvas-style 2D drawing surface backed by tiny-skia.
//!
//! Everything the renderer, image effects and overlays draw goes through
//! [`Surface`]: anti-aliased path fill and stroke, linear and radial
//! gradients, image drawing under an affine transform, mask clipping, global
//! alpha, blend modes and a soft shadow halo used for glow. The pixels live
//! in a premultiplied [`PixelBuffer`] that tiny-skia renders into directly.
//! Pixel-level effects use [`Surface::pixels_mut`], which refuses access once
//! a non-readable image has been drawn.

mod paint;
mod path;
mod pixels;

use std::sync::Arc;

use tiny_skia::{FillRule, FilterQuality, LineCap, LineJoin, Mask, Pattern, PixmapMut, Rect, SpreadMode, Stroke};

pub use paint::{BlendMode, Color, Gradient, GradientKind, Paint};
pub use path::Path;
pub use pixels::PixelBuffer;
pub use tiny_skia::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface pixels are not readable (tainted by a non-readable image)")]
    Tainted,
    #[error("pixel buffer is {got_w}x{got_h}, surface is {want_w}x{want_h}")]
    SizeMismatch {
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
}

#[derive(Clone, Debug)]
struct DrawState {
    transform: Transform,
    clip: Option<Arc<Mask>>,
    alpha: f32,
    blend: BlendMode,
    shadow_blur: f32,
    shadow_color: Color,
    line_width: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            clip: None,
            alpha: 1.0,
            blend: BlendMode::Normal,
            shadow_blur: 0.0,
            shadow_color: Color::TRANSPARENT,
            line_width: 1.0,
        }
    }
}

const MAX_SPARE_MASKS: usize = 4;

/// Halo rings drawn under a shadowed shape: `(width in blur units, alpha)`.
const SHADOW_RINGS: [(f32, f32); 2] = [(2.0, 0.3), (1.0, 0.45)];

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

/// Normalized rect for a canvas `(x, y, w, h)`, which may have negative sides.
fn rect_from_xywh(x: f32, y: f32, w: f32, h: f32) -> Option<Rect> {
    Rect::from_ltrb(x.min(x + w), y.min(y + h), x.max(x + w), y.max(y + h))
}

/// Pure integer translation, where image draws need no filtering.
fn is_pixel_aligned(ts: Transform) -> bool {
    ts.sx == 1.0 && ts.sy == 1.0 && ts.kx == 0.0 && ts.ky == 0.0 && ts.tx.fract() == 0.0 && ts.ty.fract() == 0.0
}

pub struct Surface {
    buf: PixelBuffer,
    state: DrawState,
    stack: Vec<DrawState>,
    /// Clip masks no longer referenced by any state, reused by `clip`.
    spare_masks: Vec<Mask>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.buf.width())
            .field("height", &self.buf.height())
            .field("readable", &self.buf.origin_clean())
            .finish()
    }
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buf: PixelBuffer::new(width, height),
            state: DrawState::default(),
            stack: Vec::new(),
            spare_masks: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.buf.width()
    }

    pub fn height(&self) -> usize {
        self.buf.height()
    }

    /// Reallocates the backing buffer only when the size changes. Like a
    /// canvas, a resize clears pixels, draw state and taint.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if width == self.buf.width() && height == self.buf.height() {
            return false;
        }
        self.buf = PixelBuffer::new(width, height);
        self.state = DrawState::default();
        self.stack.clear();
        self.spare_masks.clear();
        true
    }

    /// Raw pixels for frame capture.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.buf
    }

    pub fn is_readable(&self) -> bool {
        self.buf.origin_clean()
    }

    pub fn read_pixels(&self) -> Result<PixelBuffer, SurfaceError> {
        if !self.buf.origin_clean() {
            return Err(SurfaceError::Tainted);
        }
        Ok(self.buf.clone())
    }

    pub fn pixels_mut(&mut self) -> Result<&mut PixelBuffer, SurfaceError> {
        if !self.buf.origin_clean() {
            return Err(SurfaceError::Tainted);
        }
        Ok(&mut self.buf)
    }

    pub fn write_pixels(&mut self, src: &PixelBuffer) -> Result<(), SurfaceError> {
        if src.width() != self.width() || src.height() != self.height() {
            return Err(SurfaceError::SizeMismatch {
                got_w: src.width(),
                got_h: src.height(),
                want_w: self.width(),
                want_h: self.height(),
            });
        }
        let clean = self.buf.origin_clean() && src.origin_clean();
        self.buf.data_mut().copy_from_slice(src.data());
        self.buf.set_origin_clean(clean);
        Ok(())
    }

    /// Copy of the current pixels for drawing back onto this surface. The
    /// copy carries the surface's readability.
    pub fn snapshot(&self) -> PixelBuffer {
        self.buf.clone()
    }

    /// Sets every pixel to transparent black, ignoring draw state.
    pub fn clear(&mut self) {
        self.buf.data_mut().fill(0);
    }

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            let popped = std::mem::replace(&mut self.state, state);
            self.recycle(popped.clip);
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.state.transform = self.state.transform.pre_translate(tx, ty);
    }

    /// Rotation in radians, clockwise on screen.
    pub fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform.pre_concat(Transform::from_rotate(angle.to_degrees()));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.pre_scale(sx, sy);
    }

    pub fn transform(&mut self, t: Transform) {
        self.state.transform = self.state.transform.pre_concat(t);
    }

    pub fn set_transform(&mut self, t: Transform) {
        self.state.transform = t;
    }

    pub fn current_transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn alpha(&self) -> f32 {
        self.state.alpha
    }

    pub fn set_blend(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    pub fn blend(&self) -> BlendMode {
        self.state.blend
    }

    pub fn set_shadow(&mut self, blur: f32, color: Color) {
        self.state.shadow_blur = if blur.is_finite() { blur.max(0.0) } else { 0.0 };
        self.state.shadow_color = color;
    }

    pub fn clear_shadow(&mut self) {
        self.state.shadow_blur = 0.0;
    }

    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    /// Intersects the clip region with `path`. An empty path clips
    /// everything away.
    pub fn clip(&mut self, path: &Path) {
        let Some(mut mask) = self.take_mask() else {
            return;
        };
        if let Some(path) = path.to_skia() {
            mask.fill_path(&path, FillRule::Winding, true, self.state.transform);
        }
        if let Some(prev) = self.state.clip.as_deref() {
            for (m, p) in mask.data_mut().iter_mut().zip(prev.data()) {
                *m = ((*m as u16 * *p as u16 + 127) / 255) as u8;
            }
        }
        let replaced = self.state.clip.replace(Arc::new(mask));
        self.recycle(replaced);
    }

    pub fn clip_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let mut p = Path::new();
        p.rect(x, y, w, h);
        self.clip(&p);
    }

    pub fn fill_path(&mut self, path: &Path, paint: impl Into<Paint>) {
        let Some(path) = path.to_skia() else {
            return;
        };
        let Some(paint) = self.skia_paint(&paint.into()) else {
            return;
        };
        self.draw_shadow(&path, 0.0);
        let ts = self.state.transform;
        self.render(|pixmap, clip| {
            pixmap.fill_path(&path, &paint, FillRule::Winding, ts, clip);
        });
    }

    pub fn stroke_path(&mut self, path: &Path, paint: impl Into<Paint>) {
        let Some(path) = path.to_skia() else {
            return;
        };
        let Some(paint) = self.skia_paint(&paint.into()) else {
            return;
        };
        let width = self.state.line_width;
        self.draw_shadow(&path, width);
        let stroke = round_stroke(width);
        let ts = self.state.transform;
        self.render(|pixmap, clip| {
            pixmap.stroke_path(&path, &paint, &stroke, ts, clip);
        });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: impl Into<Paint>) {
        if self.has_shadow() {
            let mut p = Path::new();
            p.rect(x, y, w, h);
            self.fill_path(&p, paint);
            return;
        }
        let Some(rect) = rect_from_xywh(x, y, w, h) else {
            return;
        };
        let Some(paint) = self.skia_paint(&paint.into()) else {
            return;
        };
        let ts = self.state.transform;
        self.render(|pixmap, clip| {
            pixmap.fill_rect(rect, &paint, ts, clip);
        });
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: impl Into<Paint>) {
        let mut p = Path::new();
        p.circle(cx, cy, r);
        self.fill_path(&p, paint);
    }

    pub fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, paint: impl Into<Paint>) {
        let mut p = Path::new();
        p.move_to(x0, y0).line_to(x1, y1);
        self.stroke_path(&p, paint);
    }

    /// Draws the whole image into the destination rectangle (user space).
    pub fn draw_image(&mut self, img: &PixelBuffer, dx: f32, dy: f32, dw: f32, dh: f32) {
        let src = [0.0, 0.0, img.width() as f32, img.height() as f32];
        self.draw_image_region(img, src, [dx, dy, dw, dh]);
    }

    /// Draws the `src` rectangle of `img` into `dst` (both `[x, y, w, h]`).
    /// The image is a pattern mapped from `src` onto `dst`; only `dst` is
    /// filled.
    pub fn draw_image_region(&mut self, img: &PixelBuffer, src: [f32; 4], dst: [f32; 4]) {
        let [sx, sy, sw, sh] = src;
        let [dx, dy, dw, dh] = dst;
        if !(sw > 0.0 && sh > 0.0 && dw != 0.0 && dh != 0.0) || self.state.alpha <= 0.0 {
            return;
        }
        let Some(image) = img.as_pixmap() else {
            return;
        };
        let Some(rect) = rect_from_xywh(dx, dy, dw, dh) else {
            return;
        };
        let (kx, ky) = (dw / sw, dh / sh);
        let placement = Transform::from_row(kx, 0.0, 0.0, ky, dx - sx * kx, dy - sy * ky);
        let ts = self.state.transform;
        let quality = if is_pixel_aligned(ts.pre_concat(placement)) {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let paint = tiny_skia::Paint {
            shader: Pattern::new(image, SpreadMode::Pad, quality, self.state.alpha, placement),
            blend_mode: self.state.blend.to_skia(),
            anti_alias: true,
            ..tiny_skia::Paint::default()
        };
        self.render(|pixmap, clip| {
            pixmap.fill_rect(rect, &paint, ts, clip);
        });
        if !img.origin_clean() {
            self.buf.set_origin_clean(false);
        }
    }

    /// Zeroed surface-sized mask, from the spare list when one is free.
    fn take_mask(&mut self) -> Option<Mask> {
        let (w, h) = (self.width() as u32, self.height() as u32);
        match self.spare_masks.pop() {
            Some(mut mask) if mask.width() == w && mask.height() == h => {
                mask.data_mut().fill(0);
                Some(mask)
            }
            _ => Mask::new(w, h),
        }
    }

    fn recycle(&mut self, clip: Option<Arc<Mask>>) {
        if let Some(mask) = clip.and_then(|c| Arc::try_unwrap(c).ok()) {
            if self.spare_masks.len() < MAX_SPARE_MASKS {
                self.spare_masks.push(mask);
            }
        }
    }

    fn has_shadow(&self) -> bool {
        self.state.shadow_blur > 0.5 && self.state.shadow_color.a > 0.0
    }

    fn skia_paint(&self, paint: &Paint) -> Option<tiny_skia::Paint<'static>> {
        if self.state.alpha <= 0.0 {
            return None;
        }
        Some(tiny_skia::Paint {
            shader: paint.to_shader(self.state.alpha)?,
            blend_mode: self.state.blend.to_skia(),
            anti_alias: true,
            ..tiny_skia::Paint::default()
        })
    }

    /// Glow under a shape: round-joined rings of the shadow color around
    /// the outline, widest and faintest first. `base` is the stroke width
    /// of the shape itself (zero for fills).
    fn draw_shadow(&mut self, path: &tiny_skia::Path, base: f32) {
        if !self.has_shadow() {
            return;
        }
        let blur = self.state.shadow_blur;
        let color = self.state.shadow_color;
        let ts = self.state.transform;
        for (spread, weight) in SHADOW_RINGS {
            let ring = Paint::Solid(color.with_alpha(color.a * weight));
            let Some(paint) = self.skia_paint(&ring) else {
                continue;
            };
            let stroke = round_stroke(base + blur * spread);
            self.render(|pixmap, clip| {
                pixmap.stroke_path(path, &paint, &stroke, ts, clip);
            });
        }
    }

    /// Runs `draw` against a tiny-skia view of the buffer with the current
    /// clip. Zero-sized surfaces draw nothing.
    fn render(&mut self, draw: impl FnOnce(&mut PixmapMut<'_>, Option<&Mask>)) {
        let clip = self.state.clip.as_deref();
        if let Some(mut pixmap) = self.buf.as_pixmap_mut() {
            draw(&mut pixmap, clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_paints_inside_only() {
        let mut s = Surface::new(8, 8);
        s.fill_rect(2.0, 2.0, 4.0, 4.0, Color::WHITE);
        assert_eq!(s.pixels().get(3, 3), [255, 255, 255, 255]);
        assert_eq!(s.pixels().get(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn transforms_apply_in_canvas_order() {
        let mut s = Surface::new(12, 4);
        s.translate(4.0, 0.0);
        s.scale(2.0, 1.0);
        s.fill_rect(0.0, 0.0, 1.0, 4.0, Color::WHITE);
        assert_eq!(s.pixels().get(4, 1)[0], 255);
        assert_eq!(s.pixels().get(5, 1)[0], 255);
        assert_eq!(s.pixels().get(3, 1)[3], 0);
        assert_eq!(s.pixels().get(6, 1)[3], 0);
    }

    #[test]
    fn source_over_opaque_replaces_destination() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(10, 20, 30));
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(255, 0, 0));
        assert_eq!(s.pixels().get(2, 2), [255, 0, 0, 255]);
    }

    #[test]
    fn lighter_adds_channels() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(100, 100, 100));
        s.set_blend(BlendMode::Lighter);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::rgb(100, 0, 0));
        let px = s.pixels().get(1, 1);
        assert!(px[0].abs_diff(200) <= 1, "{px:?}");
        assert_eq!(px[1], 100);
    }

    #[test]
    fn zero_alpha_draws_nothing() {
        let mut s = Surface::new(4, 4);
        s.set_alpha(0.0);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::WHITE);
        assert!(s.pixels().data().iter().all(|b| *b == 0));
    }

    #[test]
    fn linear_gradient_ramps_between_stops() {
        let mut s = Surface::new(10, 1);
        let g = Gradient::linear(0.0, 0.0, 10.0, 0.0)
            .stop(0.0, Color::BLACK)
            .stop(1.0, Color::WHITE);
        s.fill_rect(0.0, 0.0, 10.0, 1.0, g);
        let (left, mid, right) = (s.pixels().get(0, 0)[0], s.pixels().get(5, 0)[0], s.pixels().get(9, 0)[0]);
        assert!(left < 40, "{left}");
        assert!((100..=180).contains(&mid), "{mid}");
        assert!(right > 215, "{right}");
    }

    #[test]
    fn radial_gradient_holds_inner_color_inside_inner_radius() {
        let mut s = Surface::new(40, 40);
        let g = Gradient::radial(20.0, 20.0, 10.0, 20.0)
            .stop(0.0, Color::WHITE)
            .stop(1.0, Color::BLACK);
        s.fill_rect(0.0, 0.0, 40.0, 40.0, g);
        assert!(s.pixels().get(24, 20)[0] > 245);
        assert!(s.pixels().get(20, 1)[0] < 80);
    }

    #[test]
    fn clip_limits_fill() {
        let mut s = Surface::new(8, 8);
        s.save();
        s.clip_rect(0.0, 0.0, 4.0, 8.0);
        s.fill_rect(0.0, 0.0, 8.0, 8.0, Color::WHITE);
        s.restore();
        assert_eq!(s.pixels().get(1, 1)[0], 255);
        assert_eq!(s.pixels().get(6, 1)[0], 0);
    }

    #[test]
    fn nested_clips_intersect() {
        let mut s = Surface::new(8, 8);
        s.clip_rect(0.0, 0.0, 4.0, 8.0);
        s.clip_rect(2.0, 0.0, 6.0, 8.0);
        s.fill_rect(0.0, 0.0, 8.0, 8.0, Color::WHITE);
        assert_eq!(s.pixels().get(1, 3)[3], 0);
        assert_eq!(s.pixels().get(3, 3)[0], 255);
        assert_eq!(s.pixels().get(5, 3)[3], 0);
    }

    #[test]
    fn restored_clip_mask_is_reused_cleanly() {
        let mut s = Surface::new(8, 8);
        s.save();
        s.clip_rect(0.0, 0.0, 2.0, 8.0);
        s.restore();
        assert_eq!(s.spare_masks.len(), 1);
        s.save();
        s.clip_rect(6.0, 0.0, 2.0, 8.0);
        assert!(s.spare_masks.is_empty());
        s.fill_rect(0.0, 0.0, 8.0, 8.0, Color::WHITE);
        s.restore();
        assert_eq!(s.pixels().get(1, 4)[3], 0);
        assert_eq!(s.pixels().get(7, 4)[0], 255);
    }

    #[test]
    fn empty_clip_path_hides_everything() {
        let mut s = Surface::new(4, 4);
        s.clip(&Path::new());
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::WHITE);
        assert!(s.pixels().data().iter().all(|b| *b == 0));
    }

    #[test]
    fn shadow_spreads_beyond_the_shape() {
        let mut s = Surface::new(40, 40);
        s.set_shadow(8.0, Color::rgb(255, 0, 0));
        s.fill_rect(15.0, 15.0, 10.0, 10.0, Color::WHITE);
        assert_eq!(s.pixels().get(20, 20), [255, 255, 255, 255]);
        let halo = s.pixels().get(12, 20);
        assert!(halo[0] > 0 && halo[1] == 0, "{halo:?}");
        assert_eq!(s.pixels().get(2, 2)[3], 0);

        s.clear_shadow();
        s.clear();
        s.fill_rect(15.0, 15.0, 10.0, 10.0, Color::WHITE);
        assert_eq!(s.pixels().get(12, 20)[3], 0);
    }

    #[test]
    fn aligned_image_draw_copies_pixels() {
        let mut img = PixelBuffer::new(3, 2);
        img.set(0, 0, [255, 0, 0, 255]);
        img.set(2, 1, [0, 0, 255, 255]);
        let mut s = Surface::new(6, 4);
        s.draw_image(&img, 2.0, 1.0, 3.0, 2.0);
        assert_eq!(s.pixels().get(2, 1), [255, 0, 0, 255]);
        assert_eq!(s.pixels().get(4, 2), [0, 0, 255, 255]);
        assert_eq!(s.pixels().get(3, 1), [0, 0, 0, 0]);
        assert_eq!(s.pixels().get(1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn drawing_unreadable_image_taints_surface() {
        let mut s = Surface::new(4, 4);
        let img = PixelBuffer::filled(2, 2, [255, 0, 0, 255]).with_origin_clean(false);
        s.draw_image(&img, 0.0, 0.0, 4.0, 4.0);
        assert_eq!(s.pixels().get(1, 1), [255, 0, 0, 255]);
        assert_eq!(s.read_pixels().unwrap_err(), SurfaceError::Tainted);
        assert!(s.pixels_mut().is_err());
        s.resize(5, 5);
        assert!(s.read_pixels().is_ok());
    }

    #[test]
    fn zero_sized_surface_ignores_drawing() {
        let mut s = Surface::new(0, 0);
        s.clip_rect(0.0, 0.0, 4.0, 4.0);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::WHITE);
        s.draw_image(&PixelBuffer::filled(2, 2, [255; 4]), 0.0, 0.0, 2.0, 2.0);
        assert!(s.pixels().is_empty());
    }

    #[test]
    fn resize_is_a_no_op_for_same_size() {
        let mut s = Surface::new(4, 4);
        s.fill_rect(0.0, 0.0, 4.0, 4.0, Color::WHITE);
        assert!(!s.resize(4, 4));
        assert_eq!(s.pixels().get(0, 0)[0], 255);
    }
}
