//! Water surface tiles

use crate::foundation::math::{transformation_matrix, Mat4, Vec2, Vec3};

/// Half-extent of a tile when no scale is given
pub const DEFAULT_TILE_SIZE: f32 = 60.0;

/// A flat water quad at a fixed height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterTile {
    /// Centre x
    pub x: f32,
    /// Centre z
    pub z: f32,
    /// Surface height
    pub height: f32,
    /// Half-extent along x and z
    pub scale: Vec2,
}

impl WaterTile {
    /// Square tile of the default size
    pub fn new(x: f32, z: f32, height: f32) -> Self {
        Self {
            x,
            z,
            height,
            scale: Vec2::new(DEFAULT_TILE_SIZE, DEFAULT_TILE_SIZE),
        }
    }

    /// Set the half-extents
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix for the unit quad
    pub fn model_matrix(&self) -> Mat4 {
        transformation_matrix(
            &Vec3::new(self.x, self.height, self.z),
            &Vec3::zeros(),
            &Vec3::new(self.scale.x, 1.0, self.scale.y),
        )
    }
}
