//! GPU resource loader
//!
//! Every vertex array and texture created here is recorded, and
//! [`Loader::dispose_all`] deletes them in one sweep at shutdown. Forgetting
//! that call is a leak rather than a crash; [`Loader::live_resources`] lets
//! tests and the shutdown path check for it.

use std::path::Path;

use crate::render::api::{
    CubeFace, GraphicsDevice, MeshData, TextureDesc, TextureId, VertexArrayId, VertexAttribute,
};
use crate::render::resources::model::{Model, ModelData, ModelId, POSITION_LOCATION};
use crate::render::{RenderError, RenderResult};

/// Owner of all loaded models and textures
#[derive(Debug, Default)]
pub struct Loader {
    next_model: u32,
    vertex_arrays: Vec<VertexArrayId>,
    textures: Vec<TextureId>,
}

impl Loader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    fn register_model(&mut self, vao: VertexArrayId, vertex_count: usize, indexed: bool) -> Model {
        self.next_model += 1;
        self.vertex_arrays.push(vao);
        Model::new(ModelId(self.next_model), vao, vertex_count as u32, indexed)
    }

    /// Upload indexed geometry with positions, texture coordinates and normals
    pub fn load(&mut self, device: &mut dyn GraphicsDevice, data: &ModelData) -> RenderResult<Model> {
        data.validate()?;
        let vao = device.create_vertex_array(&data.as_mesh_data())?;
        let model = self.register_model(vao, data.indices.len(), true);
        log::debug!(
            "Loaded model {:?}: {} vertices, {} indices",
            model.id(),
            data.vertex_count(),
            data.indices.len()
        );
        Ok(model)
    }

    /// Upload a non-indexed position-only stream (quads, skybox cube)
    pub fn load_positions(
        &mut self,
        device: &mut dyn GraphicsDevice,
        positions: &[f32],
        dimensions: u32,
    ) -> RenderResult<Model> {
        if dimensions == 0 || positions.is_empty() || positions.len() % dimensions as usize != 0 {
            return Err(RenderError::InvalidModel(format!(
                "{} floats do not form {}-component positions",
                positions.len(),
                dimensions
            )));
        }
        let mesh = MeshData {
            attributes: vec![VertexAttribute {
                location: POSITION_LOCATION,
                components: dimensions,
                data: positions,
            }],
            indices: None,
        };
        let vao = device.create_vertex_array(&mesh)?;
        Ok(self.register_model(vao, positions.len() / dimensions as usize, false))
    }

    /// Upload RGBA8 pixels as a mipmapped material texture
    pub fn load_texture_rgba(
        &mut self,
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RenderResult<TextureId> {
        let texture = device.create_texture(&TextureDesc::material(width, height), Some(pixels))?;
        self.textures.push(texture);
        Ok(texture)
    }

    /// Decode an image file and upload it as a material texture
    pub fn load_texture(&mut self, device: &mut dyn GraphicsDevice, path: impl AsRef<Path>) -> RenderResult<TextureId> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| RenderError::TextureLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        log::debug!("Loaded texture {} ({}x{})", path.display(), width, height);
        self.load_texture_rgba(device, width, height, image.as_raw())
    }

    /// Upload six RGBA8 faces as a cube map
    pub fn load_cube_map_faces(
        &mut self,
        device: &mut dyn GraphicsDevice,
        faces: &[CubeFace<'_>; 6],
    ) -> RenderResult<TextureId> {
        let texture = device.create_cube_map(faces)?;
        self.textures.push(texture);
        Ok(texture)
    }

    /// Decode six image files (`+X, -X, +Y, -Y, +Z, -Z`) into a cube map
    pub fn load_cube_map<P: AsRef<Path>>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        paths: &[P; 6],
    ) -> RenderResult<TextureId> {
        let mut images = Vec::with_capacity(6);
        for path in paths {
            let path = path.as_ref();
            let image = image::open(path)
                .map_err(|e| RenderError::TextureLoad {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
                .to_rgba8();
            images.push(image);
        }
        let face = |i: usize| CubeFace {
            width: images[i].width(),
            height: images[i].height(),
            pixels: images[i].as_raw(),
        };
        let faces = [face(0), face(1), face(2), face(3), face(4), face(5)];
        self.load_cube_map_faces(device, &faces)
    }

    /// Number of handles still owned
    pub fn live_resources(&self) -> usize {
        self.vertex_arrays.len() + self.textures.len()
    }

    /// Release every vertex array and texture this loader created
    pub fn dispose_all(&mut self, device: &mut dyn GraphicsDevice) {
        let (vaos, textures) = (self.vertex_arrays.len(), self.textures.len());
        for vao in self.vertex_arrays.drain(..) {
            device.delete_vertex_array(vao);
        }
        for texture in self.textures.drain(..) {
            device.delete_texture(texture);
        }
        log::info!("Loader released {} vertex arrays and {} textures", vaos, textures);
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        if self.live_resources() > 0 {
            log::warn!(
                "Loader dropped with {} live GPU resources; call dispose_all before shutdown",
                self.live_resources()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingDevice;

    #[test]
    fn test_dispose_all_releases_everything() {
        let mut device = RecordingDevice::new(640, 480);
        let mut loader = Loader::new();

        let cube = loader.load(&mut device, &ModelData::cube(1.0)).unwrap();
        let quad = loader.load_positions(&mut device, &[-1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0, -1.0], 2).unwrap();
        loader.load_texture_rgba(&mut device, 2, 2, &[255; 16]).unwrap();
        let face = CubeFace { width: 1, height: 1, pixels: &[0, 0, 0, 255] };
        loader.load_cube_map_faces(&mut device, &[face; 6]).unwrap();

        assert_ne!(cube.id(), quad.id());
        assert_eq!(quad.vertex_count(), 4);
        assert!(!quad.is_indexed());
        assert_eq!(loader.live_resources(), 4);
        assert_eq!(device.live_objects(), 4);

        loader.dispose_all(&mut device);
        assert_eq!(loader.live_resources(), 0);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_missing_texture_is_fatal() {
        let mut device = RecordingDevice::new(640, 480);
        let mut loader = Loader::new();
        let result = loader.load_texture(&mut device, "does/not/exist.png");
        assert!(matches!(result, Err(RenderError::TextureLoad { .. })));
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_bad_position_stream_rejected() {
        let mut device = RecordingDevice::new(640, 480);
        let mut loader = Loader::new();
        assert!(loader.load_positions(&mut device, &[1.0, 2.0, 3.0], 2).is_err());
        assert_eq!(loader.live_resources(), 0);
    }
}
