//! Embedded GLSL sources of the built-in programs

use crate::render::api::ShaderSource;

const MESH_ATTRIBUTES: &[&str] = &["position", "textureCoords", "normal"];
const POSITION_ONLY: &[&str] = &["position"];

/// Lit, fogged, shadowed entity shader
pub const ENTITY: ShaderSource = ShaderSource {
    name: "entity",
    vertex: include_str!("glsl/entity.vert"),
    fragment: include_str!("glsl/entity.frag"),
    attributes: MESH_ATTRIBUTES,
};

/// Blend-mapped terrain shader
pub const TERRAIN: ShaderSource = ShaderSource {
    name: "terrain",
    vertex: include_str!("glsl/terrain.vert"),
    fragment: include_str!("glsl/terrain.frag"),
    attributes: MESH_ATTRIBUTES,
};

/// Cube-mapped sky shader
pub const SKYBOX: ShaderSource = ShaderSource {
    name: "skybox",
    vertex: include_str!("glsl/skybox.vert"),
    fragment: include_str!("glsl/skybox.frag"),
    attributes: POSITION_ONLY,
};

/// Reflective/refractive water shader
pub const WATER: ShaderSource = ShaderSource {
    name: "water",
    vertex: include_str!("glsl/water.vert"),
    fragment: include_str!("glsl/water.frag"),
    attributes: POSITION_ONLY,
};

/// Depth-only shadow caster shader
pub const SHADOW: ShaderSource = ShaderSource {
    name: "shadow",
    vertex: include_str!("glsl/shadow.vert"),
    fragment: include_str!("glsl/shadow.frag"),
    attributes: &["position", "textureCoords"],
};

/// Screen-space textured quad shader
pub const GUI: ShaderSource = ShaderSource {
    name: "gui",
    vertex: include_str!("glsl/gui.vert"),
    fragment: include_str!("glsl/gui.frag"),
    attributes: POSITION_ONLY,
};

/// Fullscreen contrast adjustment
pub const CONTRAST: ShaderSource = ShaderSource {
    name: "contrast",
    vertex: include_str!("glsl/contrast.vert"),
    fragment: include_str!("glsl/contrast.frag"),
    attributes: POSITION_ONLY,
};
