use std::{sync::Arc, time::Duration};

use crate::{
    compositor::LenticularCompositor,
    foundation::{
        core::Raster,
        error::{QuiltError, QuiltResult},
    },
    params::{
        config::{CameraSweepConfig, OpticalConfig, SceneElement, SceneElementPlacement},
        control::{ControlChannel, ControlCommand, ControlSender, ControlTarget},
        store::ParamStore,
    },
    quilt::{DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH, QuiltGenerator, QuiltImage, QuiltLayout},
    raster::text::FontSource,
    render::{SceneRenderer, raycast::CpuSceneRenderer},
    runtime::{
        render_loop::{LoopState, RenderLoop, TickPlan},
        scheduler::{FrameScheduler, FrameToken},
        surface::RenderSurfaceState,
    },
    scene::builder::{DISC_SPIN_STEP, QuiltScene},
};

/// Construction-time knobs that are not persisted parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RendererOptions {
    pub tile_width: u32,
    pub tile_height: u32,
    pub invert_views: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            invert_views: false,
        }
    }
}

/// Multi-view renderer: scene, quilt generation, interlacing and the frame loop.
pub struct LenticularRenderer<S: FrameScheduler> {
    store: ParamStore,
    scene: QuiltScene,
    scene_renderer: Box<dyn SceneRenderer>,
    generator: QuiltGenerator,
    compositor: LenticularCompositor,
    sweep: CameraSweepConfig,
    surface: RenderSurfaceState,
    render_loop: RenderLoop<S>,
    controls: ControlChannel,
    quilt: Option<Arc<QuiltImage>>,
    frame: Option<Raster>,
}

impl<S: FrameScheduler> std::fmt::Debug for LenticularRenderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LenticularRenderer")
            .field("state", &self.render_loop.state())
            .field("surface", &self.surface)
            .field("sweep", &self.sweep)
            .field("has_quilt", &self.quilt.is_some())
            .finish()
    }
}

impl<S: FrameScheduler> LenticularRenderer<S> {
    /// Seed the store, read every configuration value from it and build the scene.
    pub fn new(
        mut store: ParamStore,
        surface: RenderSurfaceState,
        scheduler: S,
        scene_renderer: Box<dyn SceneRenderer>,
        options: RendererOptions,
    ) -> QuiltResult<Self> {
        store.seed_defaults()?;

        let mut optics = OpticalConfig::from_store(&mut store)?;
        optics.invert_views = options.invert_views;
        let sweep = CameraSweepConfig::from_store(&mut store);
        let placements: Vec<(SceneElement, SceneElementPlacement)> = SceneElement::ALL
            .into_iter()
            .map(|e| (e, SceneElementPlacement::from_store(&mut store, e)))
            .collect();

        let layout = QuiltLayout::for_optics(&optics, options.tile_width, options.tile_height)?;
        let generator = QuiltGenerator::new(layout)?;
        let compositor = LenticularCompositor::new(optics, surface.resolution_uniform())?;

        tracing::info!(
            physical = ?surface.physical_size(),
            dpr = surface.dpr(),
            center_offset = optics.center_offset,
            view_cone = sweep.view_cone_degrees,
            camera_distance = sweep.camera_distance,
            "lenticular renderer ready"
        );

        Ok(Self {
            store,
            scene: QuiltScene::build(&placements),
            scene_renderer,
            generator,
            compositor,
            sweep,
            surface,
            render_loop: RenderLoop::new(scheduler),
            controls: ControlChannel::new(),
            quilt: None,
            frame: None,
        })
    }

    /// Same as [`LenticularRenderer::new`] with the CPU ray caster.
    pub fn with_font(
        store: ParamStore,
        surface: RenderSurfaceState,
        scheduler: S,
        font: Option<FontSource>,
        options: RendererOptions,
    ) -> QuiltResult<Self> {
        Self::new(
            store,
            surface,
            scheduler,
            Box::new(CpuSceneRenderer::with_font(font)),
            options,
        )
    }

    pub fn start(&mut self) {
        self.render_loop.start();
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn scheduler(&self) -> &S {
        self.render_loop.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.render_loop.scheduler_mut()
    }

    /// Run one frame callback to completion.
    ///
    /// Pending controls are applied first. Returns `Ok(None)` when the token was stale.
    pub fn on_frame(&mut self, token: FrameToken, now: Duration) -> QuiltResult<Option<TickPlan>> {
        self.apply_pending_controls();
        let Some(plan) = self.render_loop.on_frame(token, now) else {
            return Ok(None);
        };
        self.scene.rotate_disc(DISC_SPIN_STEP);
        if plan.regenerate_quilt {
            self.render_quilt()?;
        }
        self.render_frame()?;
        Ok(Some(plan))
    }

    /// Regenerate the quilt from the current scene and bind it to the compositor.
    pub fn render_quilt(&mut self) -> QuiltResult<Arc<QuiltImage>> {
        let quilt = self.generator.generate(
            self.scene.graph_mut(),
            self.scene_renderer.as_mut(),
            &self.sweep,
        )?;
        self.compositor.set_quilt(quilt.clone())?;
        self.quilt = Some(quilt.clone());
        Ok(quilt)
    }

    /// Interlace the bound quilt at the surface's physical size.
    ///
    /// A zero-sized surface keeps the previous frame.
    pub fn render_frame(&mut self) -> QuiltResult<Option<&Raster>> {
        if self.surface.is_empty() {
            tracing::debug!(surface = ?self.surface, "surface is empty, skipping composite");
            return Ok(self.frame.as_ref());
        }
        let (w, h) = self.surface.physical_size();
        self.frame = Some(self.compositor.composite(w, h)?);
        Ok(self.frame.as_ref())
    }

    pub fn update_label_text(&mut self, text: &str) {
        self.scene.update_label_text(text);
    }

    pub fn update_timer_text(&mut self, display: &str) {
        self.scene.update_timer_text(display);
    }

    /// New logical size or pixel ratio; the resolution uniform follows immediately.
    pub fn on_resize(&mut self, width: f32, height: f32, dpr: f32) {
        self.surface = RenderSurfaceState::new(width, height, dpr);
        let (rx, ry) = self.surface.resolution_uniform();
        self.compositor.set_resolution(rx, ry);
        tracing::debug!(physical = ?self.surface.physical_size(), "surface resized");
    }

    pub fn control_sender(&self) -> ControlSender {
        self.controls.sender()
    }

    /// Persist a control value and apply it to the live state.
    ///
    /// Values that would break a camera invariant are rejected before anything is written.
    /// A failed store write is logged; the live change still applies.
    pub fn apply_control(&mut self, cmd: &ControlCommand) -> QuiltResult<()> {
        let value = cmd.value as f32;
        if !value.is_finite() {
            return Err(QuiltError::validation(format!(
                "control '{}' expects a finite number within f32 range",
                cmd.control.id()
            )));
        }
        let target = cmd.control.target();
        let next_sweep = match target {
            ControlTarget::ViewCone => Some(CameraSweepConfig::new(value, self.sweep.camera_distance)?),
            ControlTarget::CameraDistance => {
                Some(CameraSweepConfig::new(self.sweep.view_cone_degrees, value)?)
            }
            _ => None,
        };

        if let Err(err) = self.store.set(cmd.control.key(), &cmd.raw) {
            tracing::warn!(key = %cmd.control.key(), error = %err, "failed to persist control value");
        }

        match target {
            ControlTarget::PositionY(element) => {
                let mut p = self.scene.placement(element);
                p.y = value;
                self.scene.apply_placement(element, p);
            }
            ControlTarget::PositionZ(element) => {
                let mut p = self.scene.placement(element);
                p.z = value;
                self.scene.apply_placement(element, p);
            }
            ControlTarget::Scale(element) => {
                let mut p = self.scene.placement(element);
                p.scale = value;
                self.scene.apply_placement(element, p);
            }
            ControlTarget::ViewCone | ControlTarget::CameraDistance => {
                if let Some(sweep) = next_sweep {
                    self.sweep = sweep;
                }
            }
            ControlTarget::CenterOffset => self.compositor.set_center_offset(value),
        }
        tracing::debug!(
            control = cmd.control.id(),
            value = %cmd.control.display_value(&cmd.raw),
            "control applied"
        );
        Ok(())
    }

    /// Apply everything queued through [`LenticularRenderer::control_sender`].
    pub fn apply_pending_controls(&mut self) -> usize {
        let cmds = self.controls.drain();
        let mut applied = 0;
        for cmd in &cmds {
            match self.apply_control(cmd) {
                Ok(()) => applied += 1,
                Err(err) => {
                    tracing::warn!(control = cmd.control.id(), error = %err, "control rejected")
                }
            }
        }
        applied
    }

    pub fn current_frame(&self) -> Option<&Raster> {
        self.frame.as_ref()
    }

    pub fn current_quilt(&self) -> Option<Arc<QuiltImage>> {
        self.quilt.clone()
    }

    pub fn scene(&self) -> &QuiltScene {
        &self.scene
    }

    pub fn surface(&self) -> &RenderSurfaceState {
        &self.surface
    }

    pub fn sweep(&self) -> &CameraSweepConfig {
        &self.sweep
    }

    pub fn compositor(&self) -> &LenticularCompositor {
        &self.compositor
    }

    pub fn store_mut(&mut self) -> &mut ParamStore {
        &mut self.store
    }
}

/// How long a [`DeferredRenderer`] waits between capability probes.
pub const INIT_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// What the host platform has to provide before rendering can begin.
#[derive(Clone, Debug, Default)]
pub struct Capabilities {
    /// Glyph source for label and timer text. Without it text planes stay empty.
    pub font: Option<FontSource>,
}

/// Reports whether rendering capabilities are available yet.
pub trait CapabilityProbe {
    fn probe(&mut self) -> Option<Capabilities>;
}

impl<F> CapabilityProbe for F
where
    F: FnMut() -> Option<Capabilities>,
{
    fn probe(&mut self) -> Option<Capabilities> {
        self()
    }
}

/// Ready once the font file at `path` can be read.
#[derive(Clone, Debug)]
pub struct FontFileProbe {
    path: std::path::PathBuf,
}

impl FontFileProbe {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CapabilityProbe for FontFileProbe {
    fn probe(&mut self) -> Option<Capabilities> {
        match FontSource::load(&self.path) {
            Ok(font) => Some(Capabilities { font: Some(font) }),
            Err(err) => {
                tracing::debug!(path = %self.path.display(), error = %err, "font not available yet");
                None
            }
        }
    }
}

struct PendingSetup<S> {
    store: ParamStore,
    scheduler: S,
    options: RendererOptions,
}

/// Holds construction until the probe reports capabilities, retrying every 100ms.
///
/// Text pushed before initialization is kept and applied once the renderer exists; the
/// renderer starts its loop as soon as it is built.
pub struct DeferredRenderer<P: CapabilityProbe, S: FrameScheduler> {
    probe: P,
    setup: Option<PendingSetup<S>>,
    surface: RenderSurfaceState,
    renderer: Option<LenticularRenderer<S>>,
    next_attempt: Option<Duration>,
    attempts: u32,
    label: Option<String>,
    timer: Option<String>,
}

impl<P: CapabilityProbe, S: FrameScheduler> DeferredRenderer<P, S> {
    pub fn new(
        probe: P,
        store: ParamStore,
        surface: RenderSurfaceState,
        scheduler: S,
        options: RendererOptions,
    ) -> Self {
        Self {
            probe,
            setup: Some(PendingSetup {
                store,
                scheduler,
                options,
            }),
            surface,
            renderer: None,
            next_attempt: None,
            attempts: 0,
            label: None,
            timer: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.renderer.is_some()
    }

    /// Probes made so far, including the successful one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time of the next allowed probe, if one failed.
    pub fn next_attempt(&self) -> Option<Duration> {
        self.next_attempt
    }

    /// Try to initialize at `now`. Probes are spaced at least [`INIT_RETRY_INTERVAL`] apart.
    pub fn poll(&mut self, now: Duration) -> QuiltResult<bool> {
        if self.renderer.is_some() {
            return Ok(true);
        }
        if self.next_attempt.is_some_and(|t| now < t) {
            return Ok(false);
        }
        self.attempts += 1;
        let Some(caps) = self.probe.probe() else {
            self.next_attempt = Some(now + INIT_RETRY_INTERVAL);
            tracing::debug!(attempt = self.attempts, "render capabilities unavailable, retrying");
            return Ok(false);
        };
        let Some(setup) = self.setup.take() else {
            return Err(QuiltError::render("deferred renderer lost its setup"));
        };

        let mut renderer = LenticularRenderer::with_font(
            setup.store,
            self.surface,
            setup.scheduler,
            caps.font,
            setup.options,
        )?;
        if let Some(text) = self.label.take() {
            renderer.update_label_text(&text);
        }
        if let Some(display) = self.timer.take() {
            renderer.update_timer_text(&display);
        }
        renderer.start();
        tracing::info!(attempts = self.attempts, "renderer initialized");
        self.renderer = Some(renderer);
        Ok(true)
    }

    /// Record the new size; forwarded only once the renderer exists.
    pub fn on_resize(&mut self, width: f32, height: f32, dpr: f32) {
        self.surface = RenderSurfaceState::new(width, height, dpr);
        if let Some(r) = self.renderer.as_mut() {
            r.on_resize(width, height, dpr);
        }
    }

    pub fn update_label_text(&mut self, text: &str) {
        match self.renderer.as_mut() {
            Some(r) => r.update_label_text(text),
            None => self.label = Some(text.to_string()),
        }
    }

    pub fn update_timer_text(&mut self, display: &str) {
        match self.renderer.as_mut() {
            Some(r) => r.update_timer_text(display),
            None => self.timer = Some(display.to_string()),
        }
    }

    pub fn surface(&self) -> &RenderSurfaceState {
        &self.surface
    }

    pub fn renderer(&self) -> Option<&LenticularRenderer<S>> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut LenticularRenderer<S>> {
        self.renderer.as_mut()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/renderer.rs"]
mod tests;
