//! Scene manager
//!
//! The per-frame entry point for the application loop. Runs the passes of
//! a frame in order: shadow map, water reflection and refraction, main
//! pass (into the post-processing target when enabled), post-processing,
//! and finally the GUI overlay. Passes with nothing to do are skipped.

use crate::config::EngineConfig;
use crate::render::api::{GraphicsDevice, Viewport};
use crate::render::systems::{DrawStats, GuiRenderer, PostProcessing};
use crate::render::window::WindowSurface;
use crate::render::{Loader, RenderResult};
use crate::scene::camera::Camera;
use crate::scene::frame::FramePhase;
use crate::scene::scene::Scene;
use crate::scene::scene_renderer::{PassReport, SceneAssets, SceneRenderer, WaterPassReports};

/// What one frame did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Passes in the order they ran
    pub phases: Vec<FramePhase>,
    /// Shadow pass counters
    pub shadow: DrawStats,
    /// Water passes, when the scene has water
    pub water_passes: Option<WaterPassReports>,
    /// Main pass
    pub main: PassReport,
    /// Water tiles drawn in the main pass
    pub water: DrawStats,
    /// Post-processing counters
    pub post: DrawStats,
    /// GUI counters
    pub gui: DrawStats,
}

/// Owns the scene renderer plus the screen-space renderers
#[derive(Debug)]
pub struct SceneManager {
    renderer: SceneRenderer,
    post: Option<PostProcessing>,
    gui: GuiRenderer,
}

impl SceneManager {
    /// Build the renderer stack for a window of size `window`
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        config: &EngineConfig,
        window: Viewport,
        assets: SceneAssets,
    ) -> RenderResult<Self> {
        let renderer = SceneRenderer::new(device, loader, config, window, assets)?;
        let post = if config.render.post_processing {
            Some(PostProcessing::new(device, loader, window, config.render.contrast)?)
        } else {
            None
        };
        let gui = GuiRenderer::new(device, loader)?;
        Ok(Self { renderer, post, gui })
    }

    /// The scene renderer
    pub const fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    /// Mutable scene renderer, for driving passes by hand
    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    /// Render one frame of `scene` from `camera`
    ///
    /// The frame state machine always returns to idle, even when a pass
    /// fails.
    pub fn render_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: &dyn WindowSurface,
        scene: &Scene,
        camera: &Camera,
    ) -> RenderResult<FrameReport> {
        let size = window.size();
        if size != self.renderer.window() {
            self.resize(device, size)?;
        }

        let frame_time = window.frame_time();
        self.renderer.begin_frame(frame_time)?;
        let result = self.run_passes(device, scene, camera, frame_time);
        self.renderer.end_frame();

        let mut report = result?;
        report.phases = self.renderer.executed_phases().to_vec();
        log::debug!(
            "Frame: {:?}, {} draw calls in main pass",
            report.phases,
            report.main.draw_calls()
        );
        Ok(report)
    }

    fn run_passes(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        camera: &Camera,
        frame_time: f32,
    ) -> RenderResult<FrameReport> {
        let focal_point = scene.shadow_focus.unwrap_or_else(|| {
            camera.position + camera.forward() * (self.renderer.config().shadows.shadow_distance / 2.0)
        });
        let shadow = self.renderer.render_shadow_map(device, scene, focal_point, camera)?;
        let water_passes = self.renderer.prepare_water(device, scene, camera)?;

        self.renderer.enter_phase(FramePhase::MainPass)?;
        let window = self.renderer.window();
        let renderer = &mut self.renderer;
        let mut main_pass = |device: &mut dyn GraphicsDevice| -> RenderResult<(PassReport, DrawStats)> {
            let main = renderer.render_scene(device, scene, camera, None)?;
            let water = renderer.render_water(device, &scene.water_tiles, camera, &scene.lights, frame_time)?;
            Ok((main, water))
        };
        let (main, water) = match self.post.as_mut() {
            Some(post) => post.target_mut().scoped(device, window, main_pass)?,
            None => main_pass(device)?,
        };

        let post = match self.post.as_ref() {
            Some(post) => {
                self.renderer.enter_phase(FramePhase::PostProcess)?;
                post.apply(device)?
            }
            None => DrawStats::default(),
        };

        let gui = if scene.guis.is_empty() {
            DrawStats::default()
        } else {
            self.renderer.enter_phase(FramePhase::GuiOverlay)?;
            self.gui.render(device, &scene.guis)?
        };

        Ok(FrameReport {
            phases: Vec::new(),
            shadow,
            water_passes,
            main,
            water,
            post,
            gui,
        })
    }

    /// Follow a window size change
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, window: Viewport) -> RenderResult<()> {
        if window.width == 0 || window.height == 0 {
            return Ok(());
        }
        self.renderer.resize(window);
        if let Some(post) = self.post.as_mut() {
            post.resize(device, window)?;
        }
        Ok(())
    }

    /// Release everything the manager owns
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.renderer.dispose(device);
        if let Some(post) = self.post.as_mut() {
            post.dispose(device);
        }
        self.gui.dispose(device);
    }
}
