//! Scene renderer
//!
//! Coordinates the sub-renderers into passes. One pass filters the scene
//! for a camera, batches what is visible, uploads lights and draws
//! entities, terrain and sky into whatever target is bound. The water
//! passes run that twice into the water targets; the shadow pass renders
//! depth from the sun.
//!
//! The renderer owns every GL state change it makes: each pass leaves
//! depth testing and culling on, and clip distance, blending and
//! wireframe off, whatever happened in between.

use crate::config::{EngineConfig, RenderConfig};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::api::{Capability, ClearFlags, GraphicsDevice, TextureId, Viewport};
use crate::render::framebuffer::WaterFrameBuffers;
use crate::render::systems::water::WaterPassTextures;
use crate::render::systems::{
    DrawStats, EntityRenderer, PassContext, ShadowMapRenderer, ShadowSampling, SkyboxRenderer, TerrainRenderer,
    WaterRenderer,
};
use crate::render::{Loader, RenderError, RenderResult};
use crate::scene::batch::EntityBatches;
use crate::scene::camera::{perspective_projection, Camera};
use crate::scene::frame::{FramePhase, FrameSequencer};
use crate::scene::frustum::Frustum;
use crate::scene::light::SceneLights;
use crate::scene::scene::Scene;
use crate::scene::shadow_box::ShadowBoxParams;
use crate::scene::terrain::Terrain;
use crate::scene::visibility::{compute_visibility, VisibilityQuery};
use crate::scene::water_tile::WaterTile;

pub use crate::render::systems::water::WaterTextures;

/// Textures supplied by the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneAssets {
    /// Sky cube map
    pub skybox: Option<TextureId>,
    /// Water distortion and normal maps
    pub water: Option<WaterTextures>,
}

/// What one scene pass did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Camera position used for the pass
    pub camera_position: Vec3,
    /// Camera pitch used for the pass
    pub camera_pitch: f32,
    /// Clip plane of the pass
    pub clip_plane: Option<Vec4>,
    /// Objects that passed the visibility filter
    pub visible_objects: usize,
    /// Instance count of each entity batch, in draw order
    pub batch_sizes: Vec<usize>,
    /// Terrain tiles drawn
    pub terrain_tiles: usize,
    /// Active local lights uploaded
    pub active_lights: usize,
    /// Entity renderer counters
    pub entities: DrawStats,
    /// Terrain renderer counters
    pub terrain: DrawStats,
    /// Skybox counters
    pub skybox: DrawStats,
}

impl PassReport {
    /// Draw calls across all sub-renderers
    pub fn draw_calls(&self) -> usize {
        self.entities.draw_calls + self.terrain.draw_calls + self.skybox.draw_calls
    }
}

/// Reports of the two water passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterPassReports {
    /// Pass from the mirrored camera, geometry above the water
    pub reflection: PassReport,
    /// Pass from the real camera, geometry below the water
    pub refraction: PassReport,
}

/// The per-pass part of the renderer: sub-renderers plus scratch state
#[derive(Debug)]
struct ScenePasses {
    entity: EntityRenderer,
    terrain: TerrainRenderer,
    skybox: SkyboxRenderer,
    projection: Mat4,
    visibility: Vec<bool>,
    batches: EntityBatches,
    settings: RenderConfig,
}

impl ScenePasses {
    fn prepare(device: &mut dyn GraphicsDevice, sky: Vec3) {
        device.enable(Capability::DepthTest);
        device.enable(Capability::CullFace);
        device.set_clear_color(sky.push(1.0));
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
    }

    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        camera: &Camera,
        clip_plane: Option<Vec4>,
        shadow: ShadowSampling,
    ) -> RenderResult<PassReport> {
        let view = camera.view_matrix();
        let frustum = Frustum::from_matrix(&(self.projection * view));
        let query = VisibilityQuery {
            camera_position: camera.position,
            frustum: self.settings.frustum_culling.then_some(&frustum),
            test_radius: self.settings.frustum_test_radius,
            clip_plane,
        };

        let visibility = &mut self.visibility;
        let (_, terrains) = rayon::join(
            || compute_visibility(&scene.objects, &query, visibility),
            || scene.terrains.iter().filter(|t| t.renderable).collect::<Vec<&Terrain>>(),
        );

        self.batches.clear();
        for (index, visible) in self.visibility.iter().enumerate() {
            if *visible {
                self.batches.insert(scene.objects[index].batch_key(), index);
            }
        }

        let lights = scene.lights.uniforms(&camera.position);
        let sky = Vec3::from(self.settings.sky_colour);
        let ctx = PassContext {
            projection: self.projection,
            view,
            camera_position: camera.position,
            clip_plane,
            sky_colour: sky,
            lights: &lights,
            shadow,
        };

        Self::prepare(device, sky);
        if clip_plane.is_some() {
            device.enable(Capability::ClipDistance0);
        }
        if self.settings.wireframe {
            device.set_wireframe(true);
        }
        let drawn = self.draw(device, &ctx, scene, &terrains);
        if self.settings.wireframe {
            device.set_wireframe(false);
        }
        if clip_plane.is_some() {
            device.disable(Capability::ClipDistance0);
        }

        let report = drawn.map(|(entities, terrain, skybox)| PassReport {
            camera_position: camera.position,
            camera_pitch: camera.pitch,
            clip_plane,
            visible_objects: self.batches.total_instances(),
            batch_sizes: self.batches.sizes(),
            terrain_tiles: terrains.len(),
            active_lights: lights.active,
            entities,
            terrain,
            skybox,
        });
        self.batches.clear();
        if let Ok(report) = &report {
            log::trace!(
                "Scene pass: {} visible in {} batches, {} terrain tiles, clip {:?}",
                report.visible_objects,
                report.batch_sizes.len(),
                report.terrain_tiles,
                clip_plane
            );
        }
        report
    }

    fn draw(
        &self,
        device: &mut dyn GraphicsDevice,
        ctx: &PassContext<'_>,
        scene: &Scene,
        terrains: &[&Terrain],
    ) -> RenderResult<(DrawStats, DrawStats, DrawStats)> {
        let entities = self.entity.render(device, ctx, &scene.objects, &self.batches)?;
        let terrain = self.terrain.render(device, ctx, terrains)?;
        let skybox = if self.settings.render_skybox {
            self.skybox.render(device, &ctx.projection, &ctx.view, ctx.sky_colour)?
        } else {
            DrawStats::default()
        };
        Ok((entities, terrain, skybox))
    }

    fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.entity.dispose(device);
        self.terrain.dispose(device);
        self.skybox.dispose(device);
    }
}

/// Draws scenes pass by pass
///
/// Explicitly constructed and owned by the application loop; nothing in
/// it is global.
#[derive(Debug)]
pub struct SceneRenderer {
    passes: ScenePasses,
    water_targets: WaterFrameBuffers,
    water: WaterRenderer,
    shadows: Option<ShadowMapRenderer>,
    sequencer: FrameSequencer,
    window: Viewport,
    config: EngineConfig,
    disposed: bool,
}

impl SceneRenderer {
    /// Build every sub-renderer and offscreen target
    ///
    /// Any allocation, compile or completeness failure aborts construction.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        config: &EngineConfig,
        window: Viewport,
        assets: SceneAssets,
    ) -> RenderResult<Self> {
        config.validate().map_err(RenderError::InitializationFailed)?;

        let passes = ScenePasses {
            entity: EntityRenderer::new(device)?,
            terrain: TerrainRenderer::new(device)?,
            skybox: SkyboxRenderer::new(device, loader, assets.skybox, config.render.skybox_rotation_speed)?,
            projection: Self::projection_for(config, window),
            visibility: Vec::new(),
            batches: EntityBatches::new(),
            settings: config.render.clone(),
        };
        let water_targets = WaterFrameBuffers::new(device, &config.water)?;
        let water = WaterRenderer::new(device, loader, assets.water, config)?;
        let shadows = if config.shadows.enabled {
            Some(ShadowMapRenderer::new(device, &config.shadows)?)
        } else {
            None
        };

        log::info!(
            "Scene renderer ready on '{}' ({}x{}, shadows {}, skybox {})",
            device.name(),
            window.width,
            window.height,
            if shadows.is_some() { "on" } else { "off" },
            if config.render.render_skybox { "on" } else { "off" }
        );
        Ok(Self {
            passes,
            water_targets,
            water,
            shadows,
            sequencer: FrameSequencer::new()?,
            window,
            config: config.clone(),
            disposed: false,
        })
    }

    fn projection_for(config: &EngineConfig, window: Viewport) -> Mat4 {
        perspective_projection(
            config.render.fov_degrees,
            window.aspect_ratio(),
            config.render.near_plane,
            config.render.far_plane,
        )
    }

    /// Current projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.passes.projection
    }

    /// Window viewport restored after offscreen passes
    pub const fn window(&self) -> Viewport {
        self.window
    }

    /// Configuration the renderer was built with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pass the current frame is in
    pub const fn phase(&self) -> FramePhase {
        self.sequencer.current()
    }

    /// Passes entered in the current or last frame
    pub fn executed_phases(&self) -> &[FramePhase] {
        self.sequencer.executed()
    }

    /// Start a frame and advance per-frame animation
    pub fn begin_frame(&mut self, frame_time: f32) -> RenderResult<()> {
        self.sequencer.begin()?;
        self.passes.skybox.advance(frame_time);
        Ok(())
    }

    /// Move the frame to `phase`
    pub fn enter_phase(&mut self, phase: FramePhase) -> RenderResult<()> {
        self.sequencer.advance(phase)
    }

    /// Return to idle
    pub fn end_frame(&mut self) {
        self.sequencer.finish();
    }

    fn shadow_sampling(&self) -> ShadowSampling {
        self.shadows
            .as_ref()
            .map_or_else(ShadowSampling::disabled, ShadowMapRenderer::sampling)
    }

    /// Render one pass of `scene` from `camera` into the bound target
    pub fn render_scene(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        camera: &Camera,
        clip_plane: Option<Vec4>,
    ) -> RenderResult<PassReport> {
        let shadow = self.shadow_sampling();
        self.passes.render(device, scene, camera, clip_plane, shadow)
    }

    /// Render the reflection and refraction passes of the water
    ///
    /// Returns `None` when the scene has no water. The reflection pass uses
    /// a mirrored copy of `camera`, so the caller's camera is never changed.
    /// Outside [`SceneRenderer::begin_frame`] the passes run untracked.
    pub fn prepare_water(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        camera: &Camera,
    ) -> RenderResult<Option<WaterPassReports>> {
        let Some(height) = scene.water_height() else {
            return Ok(None);
        };
        let bias = self.config.water.clip_bias;
        let shadow = self.shadow_sampling();
        let window = self.window;
        let passes = &mut self.passes;

        self.sequencer.advance_if_open(FramePhase::WaterReflection)?;
        let reflection_camera = camera.mirrored(height);
        let above = Vec4::new(0.0, 1.0, 0.0, -height + bias);
        let reflection = self.water_targets.reflect(device, window, |device| {
            passes.render(device, scene, &reflection_camera, Some(above), shadow)
        })?;

        self.sequencer.advance_if_open(FramePhase::WaterRefraction)?;
        let below = Vec4::new(0.0, -1.0, 0.0, height + bias);
        let refraction = self.water_targets.refract(device, window, |device| {
            passes.render(device, scene, camera, Some(below), shadow)
        })?;

        Ok(Some(WaterPassReports { reflection, refraction }))
    }

    /// Render shadow casters near `focal_point` into the shadow map
    ///
    /// Does nothing when shadows are disabled. Outside
    /// [`SceneRenderer::begin_frame`] the pass runs untracked.
    pub fn render_shadow_map(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        focal_point: Vec3,
        camera: &Camera,
    ) -> RenderResult<DrawStats> {
        let Some(shadows) = self.shadows.as_mut() else {
            return Ok(DrawStats::default());
        };
        self.sequencer.advance_if_open(FramePhase::ShadowPass)?;
        let params = ShadowBoxParams::from_config(&self.config, self.window.aspect_ratio());
        shadows.render(
            device,
            self.window,
            &scene.objects,
            focal_point,
            camera,
            &scene.lights.sun().unit_direction(),
            &params,
        )
    }

    /// Draw water tiles sampling the water targets and the shadow map
    pub fn render_water(
        &mut self,
        device: &mut dyn GraphicsDevice,
        tiles: &[WaterTile],
        camera: &Camera,
        lights: &SceneLights,
        frame_time: f32,
    ) -> RenderResult<DrawStats> {
        self.water.advance(frame_time);
        if tiles.is_empty() {
            return Ok(DrawStats::default());
        }
        let targets = WaterPassTextures {
            reflection: self.water_targets.reflection_texture()?,
            refraction: self.water_targets.refraction_texture()?,
            refraction_depth: self.water_targets.refraction_depth_texture()?,
        };
        let uniforms = lights.uniforms(&camera.position);
        let ctx = PassContext {
            projection: self.passes.projection,
            view: camera.view_matrix(),
            camera_position: camera.position,
            clip_plane: None,
            sky_colour: Vec3::from(self.config.render.sky_colour),
            lights: &uniforms,
            shadow: self.shadow_sampling(),
        };
        self.water.render(device, &ctx, tiles, &targets)
    }

    /// Rebuild the projection for a new window size
    pub fn resize(&mut self, window: Viewport) {
        if window.width == 0 || window.height == 0 {
            log::debug!("Ignoring resize to {}x{}", window.width, window.height);
            return;
        }
        self.window = window;
        self.passes.projection = Self::projection_for(&self.config, window);
        log::debug!("Projection rebuilt for {}x{}", window.width, window.height);
    }

    /// Depth texture of the shadow map, if shadows are on
    pub fn shadow_map_texture(&self) -> Option<TextureId> {
        self.shadows.as_ref().and_then(|s| s.shadow_map().ok())
    }

    /// World to shadow-map texture space of the last shadow pass
    pub fn to_shadow_map_space(&self) -> Mat4 {
        self.shadows
            .as_ref()
            .map_or_else(Mat4::identity, ShadowMapRenderer::to_shadow_map_space)
    }

    /// Release programs and offscreen targets; safe to call twice
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        if self.disposed {
            return;
        }
        self.passes.dispose(device);
        self.water.dispose(device);
        self.water_targets.dispose(device);
        if let Some(shadows) = self.shadows.as_mut() {
            shadows.dispose(device);
        }
        self.disposed = true;
        log::info!("Scene renderer disposed");
    }
}
