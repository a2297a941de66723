//! # Terra Engine
//!
//! Scene rendering core for a small OpenGL engine with terrain, water and
//! directional shadows.
//!
//! ## Layers
//!
//! - **foundation**: math aliases, timing, logging setup and the node graph
//!   used to order frame passes
//! - **config**: serde-backed engine settings loaded from TOML or RON
//! - **render**: the [`GraphicsDevice`](render::api::GraphicsDevice) seam with
//!   an OpenGL backend and a recording backend, plus resource loading,
//!   offscreen targets, shader programs and the per-feature sub-renderers
//! - **scene**: scene data, visibility and batching, the shadow box, and the
//!   [`SceneRenderer`](scene::SceneRenderer) /
//!   [`SceneManager`](scene::SceneManager) pair that draws a frame
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use terra_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let config = EngineConfig::default();
//!     let window = HeadlessSurface::new(1280, 720);
//!     let mut device = RecordingDevice::new(1280, 720);
//!     let mut loader = Loader::new();
//!     let mut manager = SceneManager::new(&mut device, &mut loader, &config, window.size(), SceneAssets::default())?;
//!
//!     let sun = DirectionalLight::new(Vec3::new(0.3, -1.0, 0.2), Vec3::new(1.0, 1.0, 1.0));
//!     let scene = Scene::new(SceneLights::new(sun));
//!     manager.render_frame(&mut device, &window, &scene, &Camera::default())?;
//!
//!     manager.dispose(&mut device);
//!     loader.dispose_all(&mut device);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig},
        foundation::math::{Mat4, Vec2, Vec3, Vec4},
        render::{
            api::{GraphicsDevice, TextureId, Viewport},
            HeadlessSurface, Loader, RecordingDevice, RenderError, RenderResult, WindowSurface,
        },
        render::resources::ModelData,
        render::systems::GuiTexture,
        scene::{
            Camera, DirectionalLight, HeightField, HeightsGenerator, Light, Material, PointLight, RenderableObject,
            Scene, SceneAssets, SceneLights, SceneManager, SceneRenderer, SpotLight, Terrain, TerrainTexturePack,
            TexturedModel, WaterTextures, WaterTile,
        },
    };
}
