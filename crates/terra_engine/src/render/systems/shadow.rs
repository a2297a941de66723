//! Shadow map renderer
//!
//! Renders the depth of every caster near the focal point from the sun's
//! point of view into the shadow map target. The light-space transform of
//! the last pass is kept so the lit shaders can project into the map.

use crate::config::ShadowConfig;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{Capability, ClearFlags, GraphicsDevice, TextureId, TextureTarget, Viewport};
use crate::render::framebuffer::ShadowFrameBuffer;
use crate::render::shader::sources;
use crate::render::systems::{DrawStats, ShadowSampling};
use crate::render::{RenderResult, ShaderProgram};
use crate::scene::{Camera, EntityBatches, RenderableObject, ShadowBox, ShadowBoxParams};

/// Owns the shadow map target and the depth-only program
#[derive(Debug)]
pub struct ShadowMapRenderer {
    shader: ShaderProgram,
    target: ShadowFrameBuffer,
    batches: EntityBatches,
    shadow_box: Option<ShadowBox>,
    config: ShadowConfig,
}

impl ShadowMapRenderer {
    /// Create the depth target and link the program
    pub fn new(device: &mut dyn GraphicsDevice, config: &ShadowConfig) -> RenderResult<Self> {
        let mut target = ShadowFrameBuffer::new(device, config.map_size)?;
        let shader = match ShaderProgram::new(device, &sources::SHADOW, &["mvpMatrix", "modelTexture"]) {
            Ok(shader) => shader,
            Err(e) => {
                target.dispose(device);
                return Err(e);
            }
        };
        shader.connect_texture_units(device, &[("modelTexture", 0)])?;
        log::info!("Shadow map {}x{}", config.map_size, config.map_size);
        Ok(Self {
            shader,
            target,
            batches: EntityBatches::new(),
            shadow_box: None,
            config: config.clone(),
        })
    }

    /// Depth texture of the shadow map
    pub fn shadow_map(&self) -> RenderResult<TextureId> {
        self.target.shadow_map()
    }

    /// Box fitted by the last pass
    pub const fn shadow_box(&self) -> Option<&ShadowBox> {
        self.shadow_box.as_ref()
    }

    /// World to shadow-map texture space of the last pass
    pub fn to_shadow_map_space(&self) -> Mat4 {
        self.shadow_box
            .as_ref()
            .map_or_else(Mat4::identity, ShadowBox::to_shadow_map_space)
    }

    /// Sampling inputs for the lit shaders
    pub fn sampling(&self) -> ShadowSampling {
        match (self.shadow_box.as_ref(), self.shadow_map()) {
            (Some(shadow_box), Ok(map)) => ShadowSampling {
                shadow_map: Some(map),
                to_shadow_map_space: shadow_box.to_shadow_map_space(),
                distance: self.config.shadow_distance,
                transition_distance: self.config.transition_distance,
                map_size: self.target.size() as f32,
                pcf_count: self.config.pcf_count,
            },
            _ => ShadowSampling::disabled(),
        }
    }

    /// Render casters within the shadow distance of `focal_point`
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: Viewport,
        objects: &[RenderableObject],
        focal_point: Vec3,
        camera: &Camera,
        light_direction: &Vec3,
        params: &ShadowBoxParams,
    ) -> RenderResult<DrawStats> {
        let shadow_box = ShadowBox::compute(camera, light_direction, params);
        let light_space = shadow_box.light_space_matrix();
        self.shadow_box = Some(shadow_box);

        self.batches.clear();
        for (index, object) in objects.iter().enumerate() {
            if object.renderable && (object.position - focal_point).norm() <= params.shadow_distance {
                self.batches.insert(object.batch_key(), index);
            }
        }
        log::trace!("Shadow pass: {} casters in {} batches", self.batches.total_instances(), self.batches.len());

        let shader = &self.shader;
        let batches = &self.batches;
        self.target.scoped(device, window, |device| {
            device.enable(Capability::DepthTest);
            device.clear(ClearFlags::DEPTH);
            shader.with_active(device, |device| {
                let mut stats = DrawStats::default();
                for batch in batches.batches() {
                    let Some(first) = batch.instances.first().map(|i| &objects[*i]) else {
                        continue;
                    };
                    let model = first.textured_model.model;
                    if let Err(e) = model.validate() {
                        device.bind_vertex_array(None);
                        return Err(e);
                    }
                    device.bind_vertex_array(Some(model.vao()));
                    stats.model_binds += 1;

                    let mut bound = None;
                    for index in &batch.instances {
                        let object = &objects[*index];
                        let material = &object.textured_model.material;
                        if bound != Some(material.id()) {
                            device.bind_texture(0, TextureTarget::Texture2D, Some(material.texture));
                            bound = Some(material.id());
                        }
                        shader.set(device, "mvpMatrix", light_space * object.transformation_matrix());
                        model.draw(device);
                        stats.draw_calls += 1;
                    }
                }
                device.bind_vertex_array(None);
                Ok(stats)
            })
        })
    }

    /// Release the target and the program
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
        self.target.dispose(device);
    }
}
