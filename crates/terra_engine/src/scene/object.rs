//! Renderable scene objects

use crate::foundation::math::{transformation_matrix, Mat4, Vec2, Vec3};
use crate::render::ModelId;
use crate::scene::material::TexturedModel;

/// Render distance used when an object does not set its own
pub const DEFAULT_RENDER_DISTANCE: f32 = 200.0;

/// A placed instance of a textured model
///
/// Game logic owns and mutates these between frames. The renderer only
/// reads them; per-pass visibility is kept by the renderer itself.
#[derive(Debug, Clone)]
pub struct RenderableObject {
    /// Model and material
    pub textured_model: TexturedModel,
    /// World position
    pub position: Vec3,
    /// Euler rotation in degrees
    pub rotation: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Game-controlled visibility switch
    pub renderable: bool,
    /// Maximum camera distance at which the object is drawn
    pub render_distance: f32,
    /// Cell of the material's texture atlas
    pub texture_index: u32,
}

impl RenderableObject {
    /// Visible object at `position` with identity rotation and unit scale
    pub fn new(textured_model: TexturedModel, position: Vec3) -> Self {
        Self {
            textured_model,
            position,
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            renderable: true,
            render_distance: DEFAULT_RENDER_DISTANCE,
            texture_index: 0,
        }
    }

    /// Set rotation in degrees
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set a uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Set the render distance cutoff
    pub fn with_render_distance(mut self, distance: f32) -> Self {
        self.render_distance = distance;
        self
    }

    /// Select an atlas cell
    pub fn with_texture_index(mut self, index: u32) -> Self {
        self.texture_index = index;
        self
    }

    /// Batch identity: the model handle
    pub const fn batch_key(&self) -> ModelId {
        self.textured_model.model.id()
    }

    /// Model matrix
    pub fn transformation_matrix(&self) -> Mat4 {
        transformation_matrix(&self.position, &self.rotation, &self.scale)
    }

    /// Texture coordinate offset of the selected atlas cell
    pub fn texture_offset(&self) -> Vec2 {
        let rows = self.textured_model.material.number_of_rows.max(1);
        let column = self.texture_index % rows;
        let row = self.texture_index / rows;
        Vec2::new(column as f32 / rows as f32, row as f32 / rows as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{TextureId, VertexArrayId};
    use crate::render::Model;
    use crate::scene::material::Material;

    fn object(rows: u32, index: u32) -> RenderableObject {
        let model = Model::new(ModelId(1), VertexArrayId(1), 36, true);
        let material = Material::new(TextureId(1)).with_atlas_rows(rows).shared();
        RenderableObject::new(TexturedModel::new(model, material), Vec3::zeros()).with_texture_index(index)
    }

    #[test]
    fn test_atlas_offset() {
        let offset = object(2, 3).texture_offset();
        assert!((offset.x - 0.5).abs() < f32::EPSILON);
        assert!((offset.y - 0.5).abs() < f32::EPSILON);
        assert_eq!(object(1, 0).texture_offset(), Vec2::zeros());
    }

    #[test]
    fn test_key_ignores_material() {
        let a = object(1, 0);
        let mut b = a.clone();
        b.position = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(a.batch_key(), b.batch_key());
        assert_eq!(a.batch_key(), object(4, 2).batch_key());

        let other = Model::new(ModelId(2), VertexArrayId(2), 36, true);
        let c = RenderableObject::new(TexturedModel::new(other, a.textured_model.material.clone()), Vec3::zeros());
        assert_ne!(a.batch_key(), c.batch_key());
    }
}
