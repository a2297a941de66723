//! Height-field terrain tiles
//!
//! A terrain tile is a square grid of `vertex_count × vertex_count`
//! vertices spanning `size` world units, placed at `(grid_x, grid_z)` in
//! tile coordinates. Heights come from a procedural generator or a
//! heightmap image and are kept on the CPU for ground queries.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TerrainConfig;
use crate::foundation::math::{barycentric, transformation_matrix, utils::cosine_interpolate, Mat4, Vec2, Vec3};
use crate::render::api::{GraphicsDevice, TextureId};
use crate::render::resources::ModelData;
use crate::render::{Loader, Model, RenderError, RenderResult};

const MAX_PIXEL_COLOUR: f32 = 256.0 * 256.0 * 256.0;

/// The four splat textures of a terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainTexturePack {
    /// Black regions of the blend map
    pub background: TextureId,
    /// Red channel texture
    pub r: TextureId,
    /// Green channel texture
    pub g: TextureId,
    /// Blue channel texture
    pub b: TextureId,
}

impl TerrainTexturePack {
    /// Use one texture for every channel
    pub const fn single(texture: TextureId) -> Self {
        Self { background: texture, r: texture, g: texture, b: texture }
    }
}

/// Seeded value-noise height generator
#[derive(Debug, Clone)]
pub struct HeightsGenerator {
    seed: u64,
    amplitude: f32,
    octaves: u32,
    roughness: f32,
    x_offset: i64,
    z_offset: i64,
}

impl HeightsGenerator {
    /// Generator for a standalone tile
    pub fn new(seed: u64, config: &TerrainConfig) -> Self {
        Self {
            seed,
            amplitude: config.max_height,
            octaves: config.octaves.max(1),
            roughness: config.roughness,
            x_offset: 0,
            z_offset: 0,
        }
    }

    /// Generator whose noise lines up with neighbouring tiles
    pub fn for_tile(seed: u64, config: &TerrainConfig, grid_x: i32, grid_z: i32) -> Self {
        let span = config.vertex_count.saturating_sub(1) as i64;
        Self {
            x_offset: i64::from(grid_x) * span,
            z_offset: i64::from(grid_z) * span,
            ..Self::new(seed, config)
        }
    }

    /// Height at vertex `(x, z)`
    pub fn generate_height(&self, x: i64, z: i64) -> f32 {
        let d = 2f32.powi(self.octaves as i32 - 1);
        (0..self.octaves)
            .map(|i| {
                let freq = 2f32.powi(i as i32) / d;
                let amp = self.roughness.powi(i as i32) * self.amplitude;
                self.interpolated_noise((x + self.x_offset) as f32 * freq, (z + self.z_offset) as f32 * freq) * amp
            })
            .sum()
    }

    fn interpolated_noise(&self, x: f32, z: f32) -> f32 {
        let int_x = x.floor() as i64;
        let int_z = z.floor() as i64;
        let frac_x = x - int_x as f32;
        let frac_z = z - int_z as f32;

        let v1 = self.smooth_noise(int_x, int_z);
        let v2 = self.smooth_noise(int_x + 1, int_z);
        let v3 = self.smooth_noise(int_x, int_z + 1);
        let v4 = self.smooth_noise(int_x + 1, int_z + 1);
        let i1 = cosine_interpolate(v1, v2, frac_x);
        let i2 = cosine_interpolate(v3, v4, frac_x);
        cosine_interpolate(i1, i2, frac_z)
    }

    fn smooth_noise(&self, x: i64, z: i64) -> f32 {
        let corners = (self.noise(x - 1, z - 1)
            + self.noise(x + 1, z - 1)
            + self.noise(x - 1, z + 1)
            + self.noise(x + 1, z + 1))
            / 16.0;
        let sides = (self.noise(x - 1, z) + self.noise(x + 1, z) + self.noise(x, z - 1) + self.noise(x, z + 1)) / 8.0;
        corners + sides + self.noise(x, z) / 4.0
    }

    fn noise(&self, x: i64, z: i64) -> f32 {
        let seed = (x.wrapping_mul(49632))
            .wrapping_add(z.wrapping_mul(325_176))
            .wrapping_add(self.seed as i64);
        let mut rng = StdRng::seed_from_u64(seed as u64);
        rng.gen::<f32>() * 2.0 - 1.0
    }
}

/// Square grid of heights in tile-local space
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    size: f32,
    vertex_count: usize,
    heights: Vec<f32>,
}

impl HeightField {
    /// Build from a per-vertex function `(x_index, z_index) -> height`
    pub fn from_fn(size: f32, vertex_count: usize, mut height: impl FnMut(usize, usize) -> f32) -> RenderResult<Self> {
        if vertex_count < 2 || size <= 0.0 {
            return Err(RenderError::InvalidModel(format!(
                "terrain needs at least 2x2 vertices and a positive size (got {} and {})",
                vertex_count, size
            )));
        }
        let mut heights = Vec::with_capacity(vertex_count * vertex_count);
        for z in 0..vertex_count {
            for x in 0..vertex_count {
                heights.push(height(x, z));
            }
        }
        Ok(Self { size, vertex_count, heights })
    }

    /// All heights zero
    pub fn flat(size: f32, vertex_count: usize) -> RenderResult<Self> {
        Self::from_fn(size, vertex_count, |_, _| 0.0)
    }

    /// Procedural heights
    pub fn generated(config: &TerrainConfig, generator: &HeightsGenerator) -> RenderResult<Self> {
        Self::from_fn(config.size, config.vertex_count, |x, z| {
            generator.generate_height(x as i64, z as i64)
        })
    }

    /// Decode a heightmap; one vertex per pixel row
    ///
    /// The 24-bit RGB value maps linearly onto `[-max_height, max_height)`.
    pub fn from_heightmap_image(image: &image::RgbImage, size: f32, max_height: f32) -> RenderResult<Self> {
        let vertex_count = image.height().min(image.width()) as usize;
        Self::from_fn(size, vertex_count, |x, z| {
            let [r, g, b] = image.get_pixel(x as u32, z as u32).0;
            let rgb = (u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)) as f32;
            (rgb - MAX_PIXEL_COLOUR / 2.0) / (MAX_PIXEL_COLOUR / 2.0) * max_height
        })
    }

    /// Load and decode a heightmap file
    pub fn from_heightmap(path: impl AsRef<Path>, size: f32, max_height: f32) -> RenderResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| RenderError::TextureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_heightmap_image(&image.to_rgb8(), size, max_height)
    }

    /// Tile edge length in world units
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Vertices per edge
    pub const fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Height stored at vertex `(x, z)`
    pub fn vertex_height(&self, x: usize, z: usize) -> f32 {
        let x = x.min(self.vertex_count - 1);
        let z = z.min(self.vertex_count - 1);
        self.heights[z * self.vertex_count + x]
    }

    /// Interpolated height at a tile-local position, `None` off the tile
    pub fn height_at(&self, local_x: f32, local_z: f32) -> Option<f32> {
        let grid_square = self.size / (self.vertex_count - 1) as f32;
        let grid_x = (local_x / grid_square).floor();
        let grid_z = (local_z / grid_square).floor();
        let last = (self.vertex_count - 1) as f32;
        if !(0.0..last).contains(&grid_x) || !(0.0..last).contains(&grid_z) {
            return None;
        }
        let (gx, gz) = (grid_x as usize, grid_z as usize);
        let x_coord = (local_x - grid_x * grid_square) / grid_square;
        let z_coord = (local_z - grid_z * grid_square) / grid_square;
        let pos = Vec2::new(x_coord, z_coord);

        let h = |dx: usize, dz: usize| self.vertex_height(gx + dx, gz + dz);
        Some(if x_coord <= 1.0 - z_coord {
            barycentric(
                &Vec3::new(0.0, h(0, 0), 0.0),
                &Vec3::new(1.0, h(1, 0), 0.0),
                &Vec3::new(0.0, h(0, 1), 1.0),
                &pos,
            )
        } else {
            barycentric(
                &Vec3::new(1.0, h(1, 0), 0.0),
                &Vec3::new(1.0, h(1, 1), 1.0),
                &Vec3::new(0.0, h(0, 1), 1.0),
                &pos,
            )
        })
    }

    fn normal(&self, x: usize, z: usize) -> Vec3 {
        let left = self.vertex_height(x.saturating_sub(1), z);
        let right = self.vertex_height(x + 1, z);
        let down = self.vertex_height(x, z.saturating_sub(1));
        let up = self.vertex_height(x, z + 1);
        Vec3::new(left - right, 2.0, down - up).normalize()
    }

    /// Mesh for the grid
    pub fn to_model_data(&self) -> ModelData {
        let n = self.vertex_count;
        let last = (n - 1) as f32;
        let mut data = ModelData::default();
        for z in 0..n {
            for x in 0..n {
                let normal = self.normal(x, z);
                data.positions.extend_from_slice(&[
                    x as f32 / last * self.size,
                    self.vertex_height(x, z),
                    z as f32 / last * self.size,
                ]);
                data.normals.extend_from_slice(normal.as_slice());
                data.tex_coords.extend_from_slice(&[x as f32 / last, z as f32 / last]);
            }
        }
        for gz in 0..n - 1 {
            for gx in 0..n - 1 {
                let top_left = (gz * n + gx) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((gz + 1) * n + gx) as u32;
                let bottom_right = bottom_left + 1;
                data.indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }
        data
    }
}

/// A placed, uploaded terrain tile
#[derive(Debug, Clone)]
pub struct Terrain {
    /// World x of the tile corner
    pub x: f32,
    /// World z of the tile corner
    pub z: f32,
    /// Uploaded grid mesh
    pub model: Model,
    /// Splat textures
    pub textures: TerrainTexturePack,
    /// Blend map; without one only the background texture is used
    pub blend_map: Option<TextureId>,
    /// Game-controlled visibility switch
    pub renderable: bool,
    heights: HeightField,
}

impl Terrain {
    /// Upload `heights` as the tile at `(grid_x, grid_z)`
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        grid_x: i32,
        grid_z: i32,
        heights: HeightField,
        textures: TerrainTexturePack,
        blend_map: Option<TextureId>,
    ) -> RenderResult<Self> {
        let model = loader.load(device, &heights.to_model_data())?;
        log::debug!(
            "Terrain tile ({}, {}): {} vertices per edge",
            grid_x,
            grid_z,
            heights.vertex_count()
        );
        Ok(Self {
            x: grid_x as f32 * heights.size(),
            z: grid_z as f32 * heights.size(),
            model,
            textures,
            blend_map,
            renderable: true,
            heights,
        })
    }

    /// CPU height data
    pub const fn heights(&self) -> &HeightField {
        &self.heights
    }

    /// Ground height at a world position, `None` off this tile
    pub fn height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.heights.height_at(world_x - self.x, world_z - self.z)
    }

    /// Tile centre at height zero
    pub fn center(&self) -> Vec3 {
        let half = self.heights.size() / 2.0;
        Vec3::new(self.x + half, 0.0, self.z + half)
    }

    /// Model matrix (translation only)
    pub fn transformation_matrix(&self) -> Mat4 {
        transformation_matrix(&Vec3::new(self.x, 0.0, self.z), &Vec3::zeros(), &Vec3::new(1.0, 1.0, 1.0))
    }
}
