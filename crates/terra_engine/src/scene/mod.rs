//! # Scene
//!
//! Scene data and the frame pipeline built on top of the render layer.
//!
//! - Data: [`Camera`], [`RenderableObject`], [`Material`], lights, terrain
//!   tiles and water tiles, gathered per frame into a [`Scene`].
//! - Per-pass helpers: view [`Frustum`], visibility filter, batch map and
//!   the light-space [`ShadowBox`].
//! - Coordination: [`SceneRenderer`] draws one pass at a time and
//!   [`SceneManager`] sequences the passes of a frame.

pub mod batch;
pub mod camera;
pub mod frame;
pub mod frustum;
pub mod light;
pub mod material;
pub mod object;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod scene_manager;
pub mod scene_renderer;
pub mod shadow_box;
pub mod terrain;
pub mod visibility;
pub mod water_tile;

#[cfg(test)]
mod tests;

pub use batch::{EntityBatch, EntityBatches};
pub use camera::{perspective_projection, Camera};
pub use frame::{FramePhase, FrameSequencer};
pub use frustum::{Frustum, Plane};
pub use light::{DirectionalLight, Light, LightSlot, LightUniforms, PointLight, SceneLights, SpotLight, MAX_LIGHTS};
pub use material::{Material, MaterialId, TexturedModel};
pub use object::RenderableObject;
pub use scene::Scene;
pub use scene_manager::{FrameReport, SceneManager};
pub use scene_renderer::{PassReport, SceneAssets, SceneRenderer, WaterPassReports, WaterTextures};
pub use shadow_box::{ShadowBox, ShadowBoxParams};
pub use terrain::{HeightField, HeightsGenerator, Terrain, TerrainTexturePack};
pub use visibility::{compute_visibility, VisibilityQuery};
pub use water_tile::WaterTile;
