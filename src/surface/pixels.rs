use std::path::Path as FsPath;

use tiny_skia::{PixmapMut, PixmapRef};

/// Owned RGBA8 image, row-major, premultiplied alpha: the byte layout
/// tiny-skia draws into, so the surface renders straight into this buffer
/// and the pixel kernels see the same bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
    /// False for images whose pixels must not be read back (the equivalent
    /// of a cross-origin source). Drawing one taints the target surface.
    origin_clean: bool,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width.saturating_mul(height).saturating_mul(4)],
            origin_clean: true,
        }
    }

    /// Buffer with every pixel set to the straight-alpha color `rgba`.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut buf = Self::new(width, height);
        let px = premultiply(rgba);
        for chunk in buf.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        buf
    }

    /// Wraps premultiplied RGBA bytes; `None` when the length does not match.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width.saturating_mul(height).saturating_mul(4)).then_some(Self {
            width,
            height,
            data,
            origin_clean: true,
        })
    }

    pub fn open(path: &FsPath) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (w, h) = img.dimensions();
        let mut data = img.into_raw();
        for px in data.chunks_exact_mut(4) {
            let p = premultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&p);
        }
        Ok(Self {
            width: w as usize,
            height: h as usize,
            data,
            origin_clean: true,
        })
    }

    pub fn save_png(&self, path: &FsPath) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.to_straight_rgba(),
            self.width as u32,
            self.height as u32,
            image::ColorType::Rgba8,
        )
    }

    /// Straight-alpha copy of the pixels, for encoders.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let p = demultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&p);
        }
        out
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Premultiplied bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn origin_clean(&self) -> bool {
        self.origin_clean
    }

    pub fn with_origin_clean(mut self, clean: bool) -> Self {
        self.origin_clean = clean;
        self
    }

    pub(crate) fn set_origin_clean(&mut self, clean: bool) {
        self.origin_clean = clean;
    }

    /// `None` for zero-sized buffers.
    pub(crate) fn as_pixmap(&self) -> Option<PixmapRef<'_>> {
        PixmapRef::from_bytes(&self.data, self.width as u32, self.height as u32)
    }

    pub(crate) fn as_pixmap_mut(&mut self) -> Option<PixmapMut<'_>> {
        PixmapMut::from_bytes(&mut self.data, self.width as u32, self.height as u32)
    }

    /// Raw premultiplied pixel. Opaque pixels read the same either way.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, px: [u8; 4]) {
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Perceived brightness of a pixel, 0..=255.
    #[inline]
    pub fn brightness(px: [u8; 4]) -> f32 {
        0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
    }
}

#[inline]
pub(crate) fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    [mul(r), mul(g), mul(b), a]
}

#[inline]
pub(crate) fn demultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    if a == 0 || a == 255 {
        return [r, g, b, a];
    }
    let div = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
    [div(r), div(g), div(b), a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_stores_premultiplied_bytes() {
        let buf = PixelBuffer::filled(2, 1, [200, 100, 0, 128]);
        assert_eq!(buf.get(1, 0), [100, 50, 0, 128]);
        assert_eq!(&buf.to_straight_rgba()[..4], &[199, 100, 0, 128]);
    }

    #[test]
    fn zero_sized_buffer_has_no_pixmap() {
        let buf = PixelBuffer::new(0, 5);
        assert!(buf.is_empty());
        assert!(buf.as_pixmap().is_none());
    }
}
