use std::sync::Arc;

use crate::config::EngineConfig;
use crate::foundation::math::{Vec2, Vec3};
use crate::render::api::{TextureId, Viewport};
use crate::render::backends::DeviceCommand;
use crate::render::resources::ModelData;
use crate::render::{Loader, Model, RecordingDevice};
use crate::scene::{
    DirectionalLight, HeightField, Light, Material, PointLight, RenderableObject, Scene, SceneAssets, SceneLights,
    SceneManager, SceneRenderer, Terrain, TerrainTexturePack, TexturedModel, WaterTile,
};

pub const WINDOW: Viewport = Viewport::new(1280, 720);

/// GPU state shared by a test
pub struct Harness {
    pub device: RecordingDevice,
    pub loader: Loader,
    pub texture: TextureId,
    pub first_model: Model,
    pub second_model: Model,
}

impl Harness {
    pub fn new() -> Self {
        let mut device = RecordingDevice::new(WINDOW.width, WINDOW.height);
        let mut loader = Loader::new();
        let texture = loader.load_texture_rgba(&mut device, 1, 1, &[255, 255, 255, 255]).unwrap();
        let first_model = loader.load(&mut device, &ModelData::cube(1.0)).unwrap();
        let second_model = loader.load(&mut device, &ModelData::cube(2.0)).unwrap();
        Self { device, loader, texture, first_model, second_model }
    }

    pub fn material(&self) -> Arc<Material> {
        Material::new(self.texture).shared()
    }

    pub fn renderer(&mut self, config: &EngineConfig) -> SceneRenderer {
        SceneRenderer::new(&mut self.device, &mut self.loader, config, WINDOW, SceneAssets::default()).unwrap()
    }

    pub fn manager(&mut self, config: &EngineConfig) -> SceneManager {
        SceneManager::new(&mut self.device, &mut self.loader, config, WINDOW, SceneAssets::default()).unwrap()
    }

    pub fn terrain(&mut self) -> Terrain {
        let heights = HeightField::flat(100.0, 5).unwrap();
        Terrain::new(
            &mut self.device,
            &mut self.loader,
            0,
            -1,
            heights,
            TerrainTexturePack::single(self.texture),
            None,
        )
        .unwrap()
    }

    pub fn count(&self, command: &DeviceCommand) -> usize {
        self.device.count(|c| c == command)
    }
}

/// Skybox off, shadows off, no post-processing
pub fn plain_config() -> EngineConfig {
    EngineConfig::default()
        .with_skybox(false)
        .with_shadows(false)
        .with_post_processing(false)
}

pub fn sun() -> DirectionalLight {
    DirectionalLight::new(Vec3::new(0.2, -1.0, -0.3), Vec3::new(1.0, 0.95, 0.9))
}

pub fn point_light(x: f32) -> Light {
    Light::Point(PointLight::new(Vec3::new(x, 5.0, -10.0), Vec3::new(1.0, 0.5, 0.2)))
}

/// One terrain tile, three objects on the first model, two on the second,
/// a sun and two point lights; all objects within 50 units of the origin
/// in front of a camera looking down -Z
pub fn reference_scene(harness: &mut Harness) -> Scene {
    let mut lights = SceneLights::new(sun());
    lights.push(point_light(-5.0)).unwrap();
    lights.push(point_light(5.0)).unwrap();
    let mut scene = Scene::new(lights);

    let first = TexturedModel::new(harness.first_model, harness.material());
    let second = TexturedModel::new(harness.second_model, harness.material());
    for (x, z) in [(-4.0, -10.0), (0.0, -20.0), (4.0, -30.0)] {
        scene.add_object(RenderableObject::new(first.clone(), Vec3::new(x, 0.0, z)));
    }
    for (x, z) in [(-6.0, -15.0), (6.0, -40.0)] {
        scene.add_object(RenderableObject::new(second.clone(), Vec3::new(x, 1.0, z)));
    }
    scene.terrains.push(harness.terrain());
    scene
}

pub fn water_tile(height: f32) -> WaterTile {
    WaterTile::new(0.0, -30.0, height).with_scale(Vec2::new(40.0, 40.0))
}
