//! Terrain renderer

use crate::render::api::{GraphicsDevice, TextureTarget};
use crate::render::shader::sources;
use crate::render::systems::{lighting, load_pass_uniforms, DrawStats, PassContext, SCENE_UNIFORMS, SHADOW_MAP_UNIT};
use crate::render::{RenderResult, ShaderProgram};
use crate::scene::Terrain;

const SAMPLERS: [(&str, i32); 6] = [
    ("backgroundTexture", 0),
    ("rTexture", 1),
    ("gTexture", 2),
    ("bTexture", 3),
    ("blendMap", 4),
    ("shadowMap", SHADOW_MAP_UNIT as i32),
];

/// Renders blend-mapped terrain tiles
#[derive(Debug)]
pub struct TerrainRenderer {
    shader: ShaderProgram,
}

impl TerrainRenderer {
    /// Link the terrain program and assign its samplers
    pub fn new(device: &mut dyn GraphicsDevice) -> RenderResult<Self> {
        let mut uniforms: Vec<String> = SCENE_UNIFORMS.iter().map(|s| s.to_string()).collect();
        uniforms.extend(SAMPLERS.iter().map(|(name, _)| name.to_string()));
        uniforms.push("useBlendMap".to_string());
        uniforms.extend(lighting::light_uniform_names());

        let shader = ShaderProgram::new(device, &sources::TERRAIN, &uniforms)?;
        shader.connect_texture_units(device, &SAMPLERS)?;
        Ok(Self { shader })
    }

    /// Draw the tiles of the terrain batch, one bind and one draw each
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        ctx: &PassContext<'_>,
        terrains: &[&Terrain],
    ) -> RenderResult<DrawStats> {
        if terrains.is_empty() {
            return Ok(DrawStats::default());
        }
        self.shader.with_active(device, |device| {
            load_pass_uniforms(&self.shader, device, ctx);
            self.shader.set(device, "shineDamper", 1.0_f32);
            self.shader.set(device, "reflectivity", 0.0_f32);
            let mut stats = DrawStats::default();

            for terrain in terrains {
                if let Err(e) = terrain.model.validate() {
                    device.bind_vertex_array(None);
                    return Err(e);
                }
                device.bind_vertex_array(Some(terrain.model.vao()));
                let pack = terrain.textures;
                for (unit, texture) in [pack.background, pack.r, pack.g, pack.b].into_iter().enumerate() {
                    device.bind_texture(unit as u32, TextureTarget::Texture2D, Some(texture));
                }
                device.bind_texture(4, TextureTarget::Texture2D, terrain.blend_map);
                self.shader.set(device, "useBlendMap", terrain.blend_map.is_some());
                self.shader.set(device, "transformationMatrix", terrain.transformation_matrix());
                stats.model_binds += 1;

                terrain.model.draw(device);
                stats.draw_calls += 1;
            }

            device.bind_vertex_array(None);
            Ok(stats)
        })
    }

    /// Delete the program
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
    }
}
