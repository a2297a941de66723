//! Lake demo
//!
//! Generated terrain around a lake, a scatter of crates on the shore, a
//! sun plus a few coloured point lights, and a camera slowly circling the
//! water. Settings come from `lake.toml` when it exists.

use rand::prelude::*;
use terra_engine::prelude::*;
use terra_engine::render::backends::GlDevice;
use terra_engine::render::window::GlfwWindow;

const CONFIG_PATH: &str = "lake.toml";
const CRATE_COUNT: usize = 60;
const WATER_HEIGHT: f32 = -4.0;
const ORBIT_RADIUS: f32 = 70.0;
const ORBIT_SPEED: f32 = 6.0;
/// Fixed world seed so every run builds the same lake
const WORLD_SEED: u64 = 0x1a4e_5eed;

/// Solid RGBA pixel block
fn solid_pixels(size: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.iter().copied().cycle().take((size * size * 4) as usize).collect()
}

/// Checkerboard so the crates read as textured
fn checker_pixels(size: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let cell = if (x / 8 + y / 8) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&cell);
        }
    }
    pixels
}

struct LakeDemoApp {
    config: EngineConfig,
    window: GlfwWindow,
    device: GlDevice,
    loader: Loader,
    scene: Scene,
    camera: Camera,
    orbit_angle: f32,
}

impl LakeDemoApp {
    fn new(config: EngineConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let (window, gl) = GlfwWindow::new(&config.window)?;
        let size = window.size();
        let mut device = GlDevice::new(gl, size.width, size.height);
        let mut loader = Loader::new();
        let scene = Self::build_scene(&mut device, &mut loader, &config)?;

        Ok(Self {
            config,
            window,
            device,
            loader,
            scene,
            camera: Camera::new(Vec3::new(0.0, 20.0, ORBIT_RADIUS)).with_orientation(15.0, 0.0),
            orbit_angle: 0.0,
        })
    }

    fn build_scene(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        config: &EngineConfig,
    ) -> RenderResult<Scene> {
        let grass = loader.load_texture_rgba(device, 64, 64, &solid_pixels(64, [70, 120, 50, 255]))?;
        let mud = loader.load_texture_rgba(device, 64, 64, &solid_pixels(64, [90, 70, 50, 255]))?;
        let flowers = loader.load_texture_rgba(device, 64, 64, &solid_pixels(64, [200, 180, 60, 255]))?;
        let path = loader.load_texture_rgba(device, 64, 64, &solid_pixels(64, [140, 130, 120, 255]))?;
        let blend_map = loader.load_texture_rgba(device, 1, 1, &[40, 10, 10, 255])?;
        let crate_texture =
            loader.load_texture_rgba(device, 64, 64, &checker_pixels(64, [150, 100, 50, 255], [110, 70, 30, 255]))?;

        let sun = DirectionalLight::new(Vec3::new(0.4, -1.0, 0.3), Vec3::new(1.0, 0.95, 0.85));
        let mut scene = Scene::new(SceneLights::new(sun));
        for (position, colour) in [
            (Vec3::new(-30.0, 6.0, -30.0), Vec3::new(1.0, 0.3, 0.1)),
            (Vec3::new(30.0, 6.0, -30.0), Vec3::new(0.1, 0.4, 1.0)),
            (Vec3::new(0.0, 6.0, 40.0), Vec3::new(0.2, 1.0, 0.3)),
        ] {
            let lamp = PointLight::new(position, colour).with_attenuation(Vec3::new(1.0, 0.01, 0.002));
            scene.lights.push(Light::Point(lamp))?;
        }

        let textures = TerrainTexturePack { background: grass, r: mud, g: flowers, b: path };
        for (grid_x, grid_z) in [(-1, -1), (0, -1), (-1, 0), (0, 0)] {
            let generator = HeightsGenerator::for_tile(WORLD_SEED, &config.terrain, grid_x, grid_z);
            let heights = HeightField::generated(&config.terrain, &generator)?;
            scene.terrains.push(Terrain::new(
                device,
                loader,
                grid_x,
                grid_z,
                heights,
                textures,
                Some(blend_map),
            )?);
        }

        scene.water_tiles.push(WaterTile::new(0.0, 0.0, WATER_HEIGHT).with_scale(Vec2::new(120.0, 120.0)));

        let cube = loader.load(device, &ModelData::cube(1.0))?;
        let crates = TexturedModel::new(cube, Material::new(crate_texture).with_specular(10.0, 0.3).shared());
        let mut rng = StdRng::seed_from_u64(WORLD_SEED);
        while scene.objects.len() < CRATE_COUNT {
            let x = rng.gen_range(-150.0..150.0);
            let z = rng.gen_range(-150.0..150.0);
            let Some(ground) = scene.terrain_height_at(x, z) else {
                continue;
            };
            if ground < WATER_HEIGHT + 1.0 {
                continue;
            }
            let object = RenderableObject::new(crates.clone(), Vec3::new(x, ground + 1.0, z))
                .with_rotation(Vec3::new(0.0, rng.gen_range(0.0..360.0), 0.0))
                .with_scale(rng.gen_range(0.8..2.0));
            scene.add_object(object);
        }

        log::info!(
            "Lake scene: {} terrain tiles, {} crates, {} local lights",
            scene.terrains.len(),
            scene.objects.len(),
            scene.lights.local_lights().len()
        );
        Ok(scene)
    }

    fn update_camera(&mut self, delta_time: f32) {
        self.orbit_angle = (self.orbit_angle + ORBIT_SPEED * delta_time) % 360.0;
        let radians = self.orbit_angle.to_radians();
        let x = ORBIT_RADIUS * radians.sin();
        let z = ORBIT_RADIUS * radians.cos();
        let ground = self.scene.terrain_height_at(x, z).unwrap_or(0.0).max(WATER_HEIGHT);
        self.camera.position = Vec3::new(x, ground + 20.0, z);
        // Face the lake centre
        self.camera.yaw = -self.orbit_angle;
    }

    fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let size = self.window.size();
        let mut manager =
            SceneManager::new(&mut self.device, &mut self.loader, &self.config, size, SceneAssets::default())?;

        let result = self.frame_loop(&mut manager);

        manager.dispose(&mut self.device);
        self.loader.dispose_all(&mut self.device);
        result
    }

    fn frame_loop(&mut self, manager: &mut SceneManager) -> Result<(), Box<dyn std::error::Error>> {
        let mut frames: u64 = 0;
        while !self.window.should_close() {
            self.window.poll_events();
            self.update_camera(self.window.frame_time());

            let report = manager.render_frame(&mut self.device, &self.window, &self.scene, &self.camera)?;
            self.window.swap_buffers();

            frames += 1;
            if frames % 600 == 0 {
                log::info!(
                    "{:.1} fps, {} objects visible, {} draw calls in main pass",
                    self.window.timer().average_fps(),
                    report.main.visible_objects,
                    report.main.draw_calls()
                );
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = if std::path::Path::new(CONFIG_PATH).exists() {
        EngineConfig::load(CONFIG_PATH)?
    } else {
        EngineConfig::default()
    };
    terra_engine::foundation::logging::init_with_level(&config.log_level.0);

    log::info!("Starting lake demo");
    let mut app = LakeDemoApp::new(config)?;
    match app.run() {
        Ok(()) => {
            log::info!("Lake demo finished");
            Ok(())
        }
        Err(e) => {
            log::error!("Lake demo failed: {e}");
            Err(e)
        }
    }
}
