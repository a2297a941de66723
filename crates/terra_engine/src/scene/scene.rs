//! Per-frame scene snapshot

use crate::foundation::math::Vec3;
use crate::render::systems::gui::GuiTexture;
use crate::scene::light::SceneLights;
use crate::scene::object::RenderableObject;
use crate::scene::terrain::Terrain;
use crate::scene::water_tile::WaterTile;

/// Everything the renderer draws in one frame
///
/// Game code mutates the scene between frames; the renderer only ever
/// borrows it immutably.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Entities
    pub objects: Vec<RenderableObject>,
    /// Terrain tiles
    pub terrains: Vec<Terrain>,
    /// Sun and local lights
    pub lights: SceneLights,
    /// Water surfaces
    pub water_tiles: Vec<WaterTile>,
    /// 2D overlay quads
    pub guis: Vec<GuiTexture>,
    /// Point the shadow pass is centred on; the camera is used when unset
    pub shadow_focus: Option<Vec3>,
}

impl Scene {
    /// Empty scene lit by `lights`
    pub fn new(lights: SceneLights) -> Self {
        Self {
            objects: Vec::new(),
            terrains: Vec::new(),
            lights,
            water_tiles: Vec::new(),
            guis: Vec::new(),
            shadow_focus: None,
        }
    }

    /// Add an entity and return its index
    pub fn add_object(&mut self, object: RenderableObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Ground height under a world position, from the first tile covering it
    pub fn terrain_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.terrains.iter().find_map(|t| t.height_at(world_x, world_z))
    }

    /// Height of the water plane (all tiles share the first tile's height)
    pub fn water_height(&self) -> Option<f32> {
        self.water_tiles.first().map(|tile| tile.height)
    }
}
