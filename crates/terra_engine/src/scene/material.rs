//! Materials and textured models
//!
//! A [`Material`] gets a unique [`MaterialId`] when it is created and is
//! shared through `Arc`, so many objects can reference one material and the
//! batcher can key on identity instead of comparing parameters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::render::api::TextureId;
use crate::render::Model;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique material identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// Texture plus shading parameters
#[derive(Debug, PartialEq)]
pub struct Material {
    id: MaterialId,
    /// Diffuse texture (or atlas)
    pub texture: TextureId,
    /// Specular exponent
    pub shine_damper: f32,
    /// Specular strength
    pub reflectivity: f32,
    /// Texture has cut-out alpha; disables back-face culling
    pub has_transparency: bool,
    /// Light as if the normal pointed straight up (grass, foliage)
    pub use_fake_lighting: bool,
    /// Render both faces
    pub double_sided: bool,
    /// Rows (and columns) of the texture atlas
    pub number_of_rows: u32,
}

impl Material {
    /// Opaque, non-specular material
    pub fn new(texture: TextureId) -> Self {
        Self {
            id: MaterialId(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
            texture,
            shine_damper: 1.0,
            reflectivity: 0.0,
            has_transparency: false,
            use_fake_lighting: false,
            double_sided: false,
            number_of_rows: 1,
        }
    }

    /// Material identity
    pub const fn id(&self) -> MaterialId {
        self.id
    }

    /// Set specular parameters
    pub fn with_specular(mut self, shine_damper: f32, reflectivity: f32) -> Self {
        self.shine_damper = shine_damper;
        self.reflectivity = reflectivity;
        self
    }

    /// Mark as alpha-tested
    pub fn with_transparency(mut self) -> Self {
        self.has_transparency = true;
        self
    }

    /// Use upward normals for lighting
    pub fn with_fake_lighting(mut self) -> Self {
        self.use_fake_lighting = true;
        self
    }

    /// Disable back-face culling
    pub fn with_double_sided(mut self) -> Self {
        self.double_sided = true;
        self
    }

    /// Treat the texture as a square atlas
    pub fn with_atlas_rows(mut self, rows: u32) -> Self {
        self.number_of_rows = rows.max(1);
        self
    }

    /// Whether back-face culling must be off while drawing
    pub const fn needs_culling_disabled(&self) -> bool {
        self.has_transparency || self.double_sided
    }

    /// Wrap for sharing
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// A model paired with the material it is drawn with
#[derive(Debug, Clone)]
pub struct TexturedModel {
    /// Geometry
    pub model: Model,
    /// Shared material
    pub material: Arc<Material>,
}

impl TexturedModel {
    /// Pair a model with a material
    pub fn new(model: Model, material: Arc<Material>) -> Self {
        Self { model, material }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_ids_unique() {
        let a = Material::new(TextureId(1));
        let b = Material::new(TextureId(1));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_culling_rules() {
        assert!(!Material::new(TextureId(1)).needs_culling_disabled());
        assert!(Material::new(TextureId(1)).with_transparency().needs_culling_disabled());
        assert!(Material::new(TextureId(1)).with_double_sided().needs_culling_disabled());
        assert_eq!(Material::new(TextureId(1)).with_atlas_rows(0).number_of_rows, 1);
    }
}
