//! Per-feature renderers
//!
//! Each renderer owns its shader program and draws one kind of scene
//! content. They share the per-pass inputs in [`PassContext`] and report
//! bind and draw counts in [`DrawStats`]; the scene renderer decides which
//! ones run in a pass and in which target.

pub mod entity;
pub mod gui;
pub mod lighting;
pub mod post;
pub mod shadow;
pub mod skybox;
pub mod terrain;
pub mod water;

pub use entity::EntityRenderer;
pub use gui::{GuiRenderer, GuiTexture};
pub use post::PostProcessing;
pub use shadow::ShadowMapRenderer;
pub use skybox::SkyboxRenderer;
pub use terrain::TerrainRenderer;
pub use water::WaterRenderer;

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::api::{GraphicsDevice, TextureId, TextureTarget};
use crate::render::ShaderProgram;
use crate::scene::LightUniforms;

/// Texture unit the shadow map is bound to in lit shaders
pub const SHADOW_MAP_UNIT: u32 = 5;

/// Plane uploaded when a pass has no clip plane; every vertex passes it
pub const NO_CLIP_PLANE: Vec4 = Vec4::new(0.0, -1.0, 0.0, 100_000.0);

/// Shadow map sampling inputs of the lit shaders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSampling {
    /// Depth texture, `None` while shadows are off
    pub shadow_map: Option<TextureId>,
    /// World to shadow-map texture space
    pub to_shadow_map_space: Mat4,
    /// Distance at which shadows end
    pub distance: f32,
    /// Fade band before `distance`
    pub transition_distance: f32,
    /// Shadow map edge length in texels
    pub map_size: f32,
    /// Percentage-closer filter radius
    pub pcf_count: i32,
}

impl ShadowSampling {
    /// Sampling that never darkens anything
    pub fn disabled() -> Self {
        Self {
            shadow_map: None,
            to_shadow_map_space: Mat4::identity(),
            distance: 0.0,
            transition_distance: 1.0,
            map_size: 1.0,
            pcf_count: 0,
        }
    }
}

/// Inputs every lit renderer needs for one pass
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// Projection matrix
    pub projection: Mat4,
    /// Camera view matrix
    pub view: Mat4,
    /// Camera position
    pub camera_position: Vec3,
    /// Clip plane of the pass
    pub clip_plane: Option<Vec4>,
    /// Fog and clear colour
    pub sky_colour: Vec3,
    /// Sun and padded local lights
    pub lights: &'a LightUniforms,
    /// Shadow map inputs
    pub shadow: ShadowSampling,
}

/// Counters reported by a draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Model (vertex array and material) binds
    pub model_binds: usize,
    /// Draw calls issued
    pub draw_calls: usize,
}

impl std::ops::AddAssign for DrawStats {
    fn add_assign(&mut self, other: Self) {
        self.model_binds += other.model_binds;
        self.draw_calls += other.draw_calls;
    }
}

/// Uniforms shared by the entity and terrain programs
pub(crate) const SCENE_UNIFORMS: &[&str] = &[
    "transformationMatrix",
    "projectionMatrix",
    "viewMatrix",
    "plane",
    "skyColour",
    "shineDamper",
    "reflectivity",
    "toShadowMapSpace",
    "shadowDistance",
    "transitionDistance",
    "shadowMapSize",
    "pcfCount",
];

/// Upload camera, clip plane, fog, light and shadow uniforms
pub(crate) fn load_pass_uniforms(program: &ShaderProgram, device: &mut dyn GraphicsDevice, ctx: &PassContext<'_>) {
    program.set(device, "projectionMatrix", ctx.projection);
    program.set(device, "viewMatrix", ctx.view);
    program.set(device, "plane", ctx.clip_plane.unwrap_or(NO_CLIP_PLANE));
    program.set(device, "skyColour", ctx.sky_colour);
    lighting::load_lights(program, device, ctx.lights);

    program.set(device, "toShadowMapSpace", ctx.shadow.to_shadow_map_space);
    program.set(device, "shadowDistance", ctx.shadow.distance);
    program.set(device, "transitionDistance", ctx.shadow.transition_distance);
    program.set(device, "shadowMapSize", ctx.shadow.map_size);
    program.set(device, "pcfCount", ctx.shadow.pcf_count);
    device.bind_texture(SHADOW_MAP_UNIT, TextureTarget::Texture2D, ctx.shadow.shadow_map);
}
