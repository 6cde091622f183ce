use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::{debug, warn};

use crate::settings::WatermarkConfig;
use crate::surface::{PixelBuffer, Surface};

enum Slot {
    Empty,
    Loading {
        source: String,
        rx: Receiver<Result<PixelBuffer, image::ImageError>>,
    },
    Ready {
        source: String,
        image: PixelBuffer,
    },
    Failed {
        source: String,
    },
}

/// Watermark layer. The image is decoded once off the frame loop and
/// cached; until it arrives the layer draws nothing.
pub struct WatermarkOverlay {
    slot: Slot,
}

impl Default for WatermarkOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkOverlay {
    pub fn new() -> Self {
        Self { slot: Slot::Empty }
    }

    /// Installs an already decoded image for `source`.
    pub fn set_image(&mut self, source: impl Into<String>, image: PixelBuffer) {
        self.slot = Slot::Ready {
            source: source.into(),
            image,
        };
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, Slot::Ready { .. })
    }

    fn source(&self) -> Option<&str> {
        match &self.slot {
            Slot::Empty => None,
            Slot::Loading { source, .. } | Slot::Ready { source, .. } | Slot::Failed { source } => Some(source),
        }
    }

    /// Starts a background decode when the configured source changes and
    /// picks up a finished decode.
    pub fn poll(&mut self, config: &WatermarkConfig) {
        let Some(want) = config.image.as_deref().filter(|s| !s.is_empty()) else {
            self.slot = Slot::Empty;
            return;
        };
        if self.source() != Some(want) {
            let (tx, rx) = mpsc::channel();
            let path = PathBuf::from(want);
            thread::spawn(move || {
                let _ = tx.send(PixelBuffer::open(&path));
            });
            debug!(source = want, "loading watermark");
            self.slot = Slot::Loading {
                source: want.to_string(),
                rx,
            };
            return;
        }
        if let Slot::Loading { source, rx } = &self.slot {
            let next = match rx.try_recv() {
                Ok(Ok(image)) => Slot::Ready {
                    source: source.clone(),
                    image,
                },
                Ok(Err(err)) => {
                    warn!(source = %source, %err, "watermark image failed to load");
                    Slot::Failed { source: source.clone() }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => Slot::Failed { source: source.clone() },
            };
            self.slot = next;
        }
    }

    pub fn draw(&mut self, s: &mut Surface, config: &WatermarkConfig) {
        if !config.enabled {
            return;
        }
        self.poll(config);
        let Slot::Ready { image, .. } = &self.slot else {
            return;
        };
        draw_watermark(s, image, config);
    }
}

/// Target rectangle `(x, y, w, h)`: the image's width is `size` percent of
/// the shorter canvas side, height follows the aspect ratio.
pub fn watermark_rect(image_w: f32, image_h: f32, cw: f32, ch: f32, config: &WatermarkConfig) -> Option<(f32, f32, f32, f32)> {
    if image_w <= 0.0 || image_h <= 0.0 {
        return None;
    }
    let pct = if config.size.is_finite() { config.size.clamp(0.0, 100.0) } else { 15.0 };
    let w = cw.min(ch) * pct / 100.0;
    let h = w * image_h / image_w;
    if w < 1.0 || h < 1.0 {
        return None;
    }
    let (x, y) = config.position.place(cw, ch, w, h, config.padding.max(0.0))?;
    Some((x, y, w, h))
}

fn draw_watermark(s: &mut Surface, image: &PixelBuffer, config: &WatermarkConfig) {
    let (cw, ch) = (s.width() as f32, s.height() as f32);
    let Some((x, y, w, h)) = watermark_rect(image.width() as f32, image.height() as f32, cw, ch, config) else {
        return;
    };
    s.save();
    s.set_alpha(config.opacity.clamp(0.0, 1.0));
    s.draw_image(image, x, y, w, h);
    s.restore();
}
