//! Graphics device abstraction
//!
//! The renderers never talk to OpenGL directly. Every GPU call goes through
//! [`GraphicsDevice`], which has an OpenGL implementation for real windows
//! and a recording implementation for headless runs and tests.

mod device;

pub use device::{
    Capability, ClearFlags, CubeFace, DepthAttachmentKind, FramebufferDesc, FramebufferId,
    FramebufferStatus, GraphicsDevice, MeshData, PrimitiveTopology, ProgramId, RenderbufferId,
    ShaderSource, TextureDesc, TextureFilter, TextureFormat, TextureId, TextureTarget,
    TextureWrap, UniformLocation, UniformValue, VertexArrayId, VertexAttribute, Viewport,
};
