//! Entity renderer
//!
//! Draws the batch map of a pass: one vertex array bind per batch, a
//! material bind whenever consecutive instances switch material, then one
//! transform upload and one draw per instance.

use crate::render::api::{Capability, GraphicsDevice, TextureTarget};
use crate::render::shader::sources;
use crate::render::systems::{lighting, load_pass_uniforms, DrawStats, PassContext, SCENE_UNIFORMS, SHADOW_MAP_UNIT};
use crate::render::{RenderResult, ShaderProgram};
use crate::scene::{EntityBatches, Material, MaterialId, RenderableObject};

/// Renders textured, lit entities
#[derive(Debug)]
pub struct EntityRenderer {
    shader: ShaderProgram,
}

impl EntityRenderer {
    /// Link the entity program and assign its samplers
    pub fn new(device: &mut dyn GraphicsDevice) -> RenderResult<Self> {
        let mut uniforms: Vec<String> = SCENE_UNIFORMS.iter().map(|s| s.to_string()).collect();
        uniforms.extend(
            ["useFakeLighting", "numberOfRows", "offset", "modelTexture", "shadowMap"]
                .iter()
                .map(|s| s.to_string()),
        );
        uniforms.extend(lighting::light_uniform_names());

        let shader = ShaderProgram::new(device, &sources::ENTITY, &uniforms)?;
        shader.connect_texture_units(device, &[("modelTexture", 0), ("shadowMap", SHADOW_MAP_UNIT as i32)])?;
        Ok(Self { shader })
    }

    /// Draw every batch; `objects` is the list the batch indices refer to
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        ctx: &PassContext<'_>,
        objects: &[RenderableObject],
        batches: &EntityBatches,
    ) -> RenderResult<DrawStats> {
        if batches.is_empty() {
            return Ok(DrawStats::default());
        }
        self.shader.with_active(device, |device| {
            load_pass_uniforms(&self.shader, device, ctx);
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

                let mut bound: Option<MaterialId> = None;
                let mut culling_disabled = false;
                for index in &batch.instances {
                    let object = &objects[*index];
                    let material = &object.textured_model.material;
                    if bound != Some(material.id()) {
                        culling_disabled = self.apply_material(device, material, culling_disabled);
                        bound = Some(material.id());
                    }
                    self.shader.set(device, "transformationMatrix", object.transformation_matrix());
                    self.shader.set(device, "offset", object.texture_offset());
                    model.draw(device);
                    stats.draw_calls += 1;
                }

                if culling_disabled {
                    device.enable(Capability::CullFace);
                }
            }

            device.bind_vertex_array(None);
            Ok(stats)
        })
    }

    /// Bind `material` for the following instances; returns whether culling
    /// is now off
    fn apply_material(&self, device: &mut dyn GraphicsDevice, material: &Material, culling_disabled: bool) -> bool {
        device.bind_texture(0, TextureTarget::Texture2D, Some(material.texture));
        let disable_culling = material.needs_culling_disabled();
        if disable_culling && !culling_disabled {
            device.disable(Capability::CullFace);
        } else if !disable_culling && culling_disabled {
            device.enable(Capability::CullFace);
        }
        self.shader.set(device, "numberOfRows", material.number_of_rows.max(1) as f32);
        self.shader.set(device, "useFakeLighting", material.use_fake_lighting);
        self.shader.set(device, "shineDamper", material.shine_damper);
        self.shader.set(device, "reflectivity", material.reflectivity);
        disable_culling
    }

    /// Delete the program
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
    }
}
