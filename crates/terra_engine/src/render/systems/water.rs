//! Water renderer
//!
//! Samples the reflection and refraction targets through a scrolling
//! du/dv distortion map. Blending is switched on for the soft shoreline
//! and off again before returning.

use crate::config::EngineConfig;
use crate::render::api::{Capability, GraphicsDevice, TextureId, TextureTarget};
use crate::render::shader::sources;
use crate::render::systems::{DrawStats, PassContext, SHADOW_MAP_UNIT};
use crate::render::{Loader, Model, RenderResult, ShaderProgram};
use crate::scene::WaterTile;

const QUAD: [f32; 12] = [-1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

const SAMPLERS: [(&str, i32); 6] = [
    ("reflectionTexture", 0),
    ("refractionTexture", 1),
    ("dudvMap", 2),
    ("normalMap", 3),
    ("depthMap", 4),
    ("shadowMap", SHADOW_MAP_UNIT as i32),
];

const UNIFORMS: [&str; 11] = [
    "projectionMatrix",
    "viewMatrix",
    "modelMatrix",
    "toShadowMapSpace",
    "cameraPosition",
    "sunDirection",
    "sunColour",
    "moveFactor",
    "waveStrength",
    "near",
    "far",
];

/// Distortion and normal maps of the water surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTextures {
    /// du/dv distortion map
    pub dudv_map: TextureId,
    /// Surface normal map
    pub normal_map: TextureId,
}

/// Offscreen textures the water samples in the main pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterPassTextures {
    /// Reflection colour
    pub reflection: TextureId,
    /// Refraction colour
    pub refraction: TextureId,
    /// Refraction depth
    pub refraction_depth: TextureId,
}

/// Renders water tiles
#[derive(Debug)]
pub struct WaterRenderer {
    shader: ShaderProgram,
    quad: Model,
    textures: WaterTextures,
    move_factor: f32,
    wave_speed: f32,
    wave_strength: f32,
    near: f32,
    far: f32,
}

impl WaterRenderer {
    /// Upload the quad and link the program
    ///
    /// Without textures, flat 1×1 maps are created so the surface renders
    /// undistorted.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        textures: Option<WaterTextures>,
        config: &EngineConfig,
    ) -> RenderResult<Self> {
        let quad = loader.load_positions(device, &QUAD, 2)?;
        let textures = match textures {
            Some(textures) => textures,
            None => {
                log::debug!("No water textures given; using flat maps");
                WaterTextures {
                    dudv_map: loader.load_texture_rgba(device, 1, 1, &[128, 128, 0, 255])?,
                    normal_map: loader.load_texture_rgba(device, 1, 1, &[128, 255, 128, 255])?,
                }
            }
        };

        let mut uniforms: Vec<&str> = UNIFORMS.to_vec();
        uniforms.extend(SAMPLERS.iter().map(|(name, _)| *name));
        let shader = ShaderProgram::new(device, &sources::WATER, &uniforms)?;
        shader.connect_texture_units(device, &SAMPLERS)?;

        Ok(Self {
            shader,
            quad,
            textures,
            move_factor: 0.0,
            wave_speed: config.water.wave_speed,
            wave_strength: config.water.wave_strength,
            near: config.render.near_plane,
            far: config.render.far_plane,
        })
    }

    /// Distortion scroll position in `[0, 1)`
    pub const fn move_factor(&self) -> f32 {
        self.move_factor
    }

    /// Scroll the distortion by one frame
    pub fn advance(&mut self, frame_time: f32) {
        self.move_factor = (self.move_factor + self.wave_speed * frame_time).rem_euclid(1.0);
    }

    /// Draw every tile
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        ctx: &PassContext<'_>,
        tiles: &[WaterTile],
        targets: &WaterPassTextures,
    ) -> RenderResult<DrawStats> {
        if tiles.is_empty() {
            return Ok(DrawStats::default());
        }
        self.shader.with_active(device, |device| {
            self.shader.set(device, "projectionMatrix", ctx.projection);
            self.shader.set(device, "viewMatrix", ctx.view);
            self.shader.set(device, "cameraPosition", ctx.camera_position);
            self.shader.set(device, "toShadowMapSpace", ctx.shadow.to_shadow_map_space);
            self.shader.set(device, "sunDirection", ctx.lights.sun_direction);
            self.shader.set(device, "sunColour", ctx.lights.sun_colour);
            self.shader.set(device, "moveFactor", self.move_factor);
            self.shader.set(device, "waveStrength", self.wave_strength);
            self.shader.set(device, "near", self.near);
            self.shader.set(device, "far", self.far);

            device.bind_vertex_array(Some(self.quad.vao()));
            let units = [
                targets.reflection,
                targets.refraction,
                self.textures.dudv_map,
                self.textures.normal_map,
                targets.refraction_depth,
            ];
            for (unit, texture) in units.into_iter().enumerate() {
                device.bind_texture(unit as u32, TextureTarget::Texture2D, Some(texture));
            }
            device.bind_texture(SHADOW_MAP_UNIT, TextureTarget::Texture2D, ctx.shadow.shadow_map);
            device.enable(Capability::Blend);

            let mut stats = DrawStats { model_binds: 1, draw_calls: 0 };
            for tile in tiles {
                self.shader.set(device, "modelMatrix", tile.model_matrix());
                self.quad.draw(device);
                stats.draw_calls += 1;
            }

            device.disable(Capability::Blend);
            device.bind_vertex_array(None);
            Ok(stats)
        })
    }

    /// Delete the program (quad and textures belong to the loader)
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingDevice;

    #[test]
    fn test_move_factor_wraps() {
        let mut device = RecordingDevice::new(8, 8);
        let mut loader = Loader::new();
        let mut water = WaterRenderer::new(&mut device, &mut loader, None, &EngineConfig::default()).unwrap();
        assert_eq!(loader.live_resources(), 3);

        for _ in 0..50 {
            water.advance(1.0);
            assert!((0.0..1.0).contains(&water.move_factor()));
        }
        assert!((water.move_factor() - 0.5).abs() < 1e-3);

        water.dispose(&mut device);
        loader.dispose_all(&mut device);
        assert_eq!(device.live_objects(), 0);
    }
}
