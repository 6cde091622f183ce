//! Per-frame loop: throttling, surface sizing and layer composition.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::audio::{AudioFeatureFrame, AudioSource};
use crate::effects::{ImageEffectsProcessor, KenBurns};
use crate::overlay::{OverlayCompositor, Playhead};
use crate::settings::{Scene, VisualStyle};
use crate::surface::{BlendMode, PixelBuffer, Surface};
use crate::visual::{RenderRequest, VisualizationRenderer};

/// Minimum spacing between rendered frames (~60 fps).
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Monotonic time source driving the loop.
pub trait FrameClock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}

impl FrameClock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Hand-stepped clock. Clones share the same time, so a test or an offline
/// exporter can keep one handle and advance the scheduler's copy.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl FrameClock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing was done.
    Idle,
    /// Called sooner than [`MIN_FRAME_INTERVAL`] after the last frame.
    Throttled,
    Rendered,
}

/// Runs one frame per tick while playing or exporting.
///
/// Composition order: image layer (inside the Ken Burns transform when
/// enabled), visualization (blended over the image with the layer settings),
/// then overlays.
pub struct FrameScheduler<C: FrameClock> {
    clock: C,
    state: SchedulerState,
    playing: bool,
    exporting: bool,
    last_frame: Option<Duration>,
    frames: u64,
    surface: Surface,
    scratch: Surface,
    renderer: VisualizationRenderer,
    effects: ImageEffectsProcessor,
    ken_burns: KenBurns,
    overlays: OverlayCompositor,
    image: Option<PixelBuffer>,
    background: Option<PixelBuffer>,
    active_style: Option<VisualStyle>,
}

impl<C: FrameClock> FrameScheduler<C> {
    pub fn new(clock: C, width: usize, height: usize) -> Self {
        Self::with_seed(clock, width, height, fastrand::u64(..))
    }

    pub fn with_seed(clock: C, width: usize, height: usize, seed: u64) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
            playing: false,
            exporting: false,
            last_frame: None,
            frames: 0,
            surface: Surface::new(width, height),
            scratch: Surface::new(width, height),
            renderer: VisualizationRenderer::with_seed(seed),
            effects: ImageEffectsProcessor::with_seed(seed.rotate_left(17)),
            ken_burns: KenBurns::default(),
            overlays: OverlayCompositor::with_seed(seed.rotate_left(31)),
            image: None,
            background: None,
            active_style: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// The raster surface, for frame capture.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn renderer(&self) -> &VisualizationRenderer {
        &self.renderer
    }

    pub fn image_effects(&self) -> &ImageEffectsProcessor {
        &self.effects
    }

    pub fn ken_burns(&self) -> &KenBurns {
        &self.ken_burns
    }

    pub fn overlays_mut(&mut self) -> &mut OverlayCompositor {
        &mut self.overlays
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.update_state();
    }

    /// Keeps frames coming while an export captures them, even when paused.
    pub fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
        self.update_state();
    }

    fn update_state(&mut self) {
        let next = if self.playing || self.exporting {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, playing = self.playing, exporting = self.exporting, "scheduler state");
            self.state = next;
            if next == SchedulerState::Idle {
                self.last_frame = None;
            }
        }
    }

    /// Replaces the effects image and resets everything tied to the old one.
    pub fn set_image(&mut self, image: Option<PixelBuffer>) {
        self.image = image.filter(|i| !i.is_empty());
        self.effects.reset_image_rotation();
        self.ken_burns.reset();
        info!(present = self.image.is_some(), "effects image changed");
    }

    /// Image drawn faintly behind the visualization.
    pub fn set_background(&mut self, image: Option<PixelBuffer>) {
        self.background = image.filter(|i| !i.is_empty());
    }

    /// Time until the next frame may render.
    pub fn next_frame_in(&self) -> Duration {
        match self.last_frame {
            Some(last) => (last + MIN_FRAME_INTERVAL).saturating_sub(self.clock.now()),
            None => Duration::ZERO,
        }
    }

    /// One loop iteration. `display` is the size the surface should have.
    pub fn tick(
        &mut self,
        display: (usize, usize),
        audio: &mut dyn AudioSource,
        scene: &Scene,
        playhead: Playhead,
    ) -> TickOutcome {
        if self.state == SchedulerState::Idle {
            return TickOutcome::Idle;
        }
        let now = self.clock.now();
        if let Some(last) = self.last_frame {
            if now.saturating_sub(last) < MIN_FRAME_INTERVAL {
                trace!(?now, "frame throttled");
                return TickOutcome::Throttled;
            }
        }
        self.last_frame = Some(now);
        self.render_frame(now.as_secs_f32(), display, audio, scene, playhead);
        self.frames += 1;
        TickOutcome::Rendered
    }

    fn render_frame(
        &mut self,
        t: f32,
        (width, height): (usize, usize),
        audio: &mut dyn AudioSource,
        scene: &Scene,
        playhead: Playhead,
    ) {
        if self.surface.resize(width, height) {
            debug!(width, height, "surface resized");
        }
        if self.active_style != Some(scene.style) {
            if self.active_style.is_some() {
                info!(style = scene.style.name(), "style changed");
            }
            self.renderer.reset_rotation();
            self.renderer.clear_particles();
            self.active_style = Some(scene.style);
        }

        let position = Duration::try_from_secs_f32(playhead.current.max(0.0)).unwrap_or_default();
        let frame = audio
            .audio_data(position)
            .unwrap_or_else(AudioFeatureFrame::default);

        let mut image_drawn = false;
        if let Some(image) = self.image.as_ref().filter(|_| scene.effects.enabled) {
            self.surface.save();
            if scene.effects.ken_burns {
                self.ken_burns.advance(scene.effects.ken_burns_speed);
                self.ken_burns.apply(&mut self.surface);
            }
            self.effects
                .apply_image_effects(&mut self.surface, &frame, image, &scene.effects, t);
            self.surface.restore();
            image_drawn = true;
        }

        if !(image_drawn && scene.effects.hide_visualization) {
            let mut req = RenderRequest {
                time: t,
                audio: &frame,
                style: scene.style,
                color_scheme: scene.color_scheme,
                config: &scene.visualizer,
                background: self.background.as_ref(),
                custom_palette: &scene.custom_palette,
                skip_background_fill: false,
            };
            if image_drawn {
                req.skip_background_fill = true;
                self.scratch.resize(width, height);
                self.scratch.clear();
                self.renderer.render(&mut self.scratch, &req);
                let layer = &scene.layer;
                if layer.blend_mode != BlendMode::Unknown {
                    self.surface.save();
                    self.surface.set_blend(layer.blend_mode);
                    self.surface.set_alpha(layer.opacity);
                    self.surface.draw_image(self.scratch.pixels(), 0.0, 0.0, width as f32, height as f32);
                    self.surface.restore();
                }
            } else {
                self.renderer.render(&mut self.surface, &req);
            }
        }

        self.overlays
            .draw(&mut self.surface, &frame, &scene.overlays, playhead, t);
    }
}
