//! Model handles and CPU-side geometry

use crate::render::api::{
    GraphicsDevice, MeshData, PrimitiveTopology, VertexArrayId, VertexAttribute,
};
use crate::render::{RenderError, RenderResult};

/// Attribute location of positions in every scene shader
pub const POSITION_LOCATION: u32 = 0;
/// Attribute location of texture coordinates
pub const TEX_COORD_LOCATION: u32 = 1;
/// Attribute location of normals
pub const NORMAL_LOCATION: u32 = 2;

/// Identity of a loaded model; batching keys on this, never on geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

/// Immutable GPU-resident geometry
///
/// Returned by the [`Loader`](super::Loader), which owns the underlying
/// vertex array. Copies share the same GPU objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    id: ModelId,
    vao: VertexArrayId,
    vertex_count: u32,
    indexed: bool,
}

impl Model {
    pub(crate) const fn new(id: ModelId, vao: VertexArrayId, vertex_count: u32, indexed: bool) -> Self {
        Self { id, vao, vertex_count, indexed }
    }

    /// Model identity
    pub const fn id(&self) -> ModelId {
        self.id
    }

    /// Vertex array handle
    pub const fn vao(&self) -> VertexArrayId {
        self.vao
    }

    /// Indices (indexed models) or vertices (array models) per draw
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Whether draws use the index buffer
    pub const fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Reject handles that cannot be drawn
    pub fn validate(&self) -> RenderResult<()> {
        if self.vao.0 == 0 || self.vertex_count == 0 {
            return Err(RenderError::InvalidModel(format!(
                "model {:?} has no geometry (vao {:?}, {} vertices)",
                self.id, self.vao, self.vertex_count
            )));
        }
        Ok(())
    }

    /// Issue one draw of the whole model; the vertex array must be bound
    pub fn draw(&self, device: &mut dyn GraphicsDevice) {
        if self.indexed {
            device.draw_elements(self.vertex_count);
        } else {
            device.draw_arrays(PrimitiveTopology::Triangles, self.vertex_count);
        }
    }
}

/// CPU-side indexed geometry with positions, texture coordinates and normals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    /// xyz per vertex
    pub positions: Vec<f32>,
    /// uv per vertex
    pub tex_coords: Vec<f32>,
    /// xyz per vertex
    pub normals: Vec<f32>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl ModelData {
    /// Borrow as an upload request with the standard attribute locations
    pub fn as_mesh_data(&self) -> MeshData<'_> {
        MeshData {
            attributes: vec![
                VertexAttribute { location: POSITION_LOCATION, components: 3, data: &self.positions },
                VertexAttribute { location: TEX_COORD_LOCATION, components: 2, data: &self.tex_coords },
                VertexAttribute { location: NORMAL_LOCATION, components: 3, data: &self.normals },
            ],
            indices: Some(&self.indices),
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Check that the streams describe the same vertices
    pub fn validate(&self) -> RenderResult<()> {
        let n = self.vertex_count();
        if n == 0 || self.positions.len() % 3 != 0 {
            return Err(RenderError::InvalidModel("positions must be non-empty xyz triples".to_string()));
        }
        if self.tex_coords.len() != n * 2 || self.normals.len() != n * 3 {
            return Err(RenderError::InvalidModel(format!(
                "attribute streams disagree: {} positions, {} uvs, {} normals",
                n,
                self.tex_coords.len() / 2,
                self.normals.len() / 3
            )));
        }
        if self.indices.is_empty() || self.indices.iter().any(|i| *i as usize >= n) {
            return Err(RenderError::InvalidModel("index buffer out of range".to_string()));
        }
        Ok(())
    }

    /// Axis-aligned cube centred on the origin with per-face normals
    pub fn cube(half_extent: f32) -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let mut data = Self::default();
        for (normal, u, v) in FACES {
            let base = data.vertex_count() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                for axis in 0..3 {
                    data.positions.push((normal[axis] + u[axis] * su + v[axis] * sv) * half_extent);
                    data.normals.push(normal[axis]);
                }
                data.tex_coords.push((su + 1.0) * 0.5);
                data.tex_coords.push(1.0 - (sv + 1.0) * 0.5);
            }
            data.indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        data
    }
}
