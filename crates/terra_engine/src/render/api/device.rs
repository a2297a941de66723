//! Backend abstraction traits for the rendering system
//!
//! This module defines the object-safe trait that rendering backends must
//! implement, together with the opaque handle newtypes and descriptors that
//! cross it. Handles are plain integers; the backend owns the mapping to
//! native objects.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::RenderResult;

/// Handle to a vertex array object and its buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// Handle to a 2D or cube map texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to an offscreen framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Handle to a renderbuffer attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderbufferId(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Cached uniform location inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Global pipeline switches that passes toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Back-face culling
    CullFace,
    /// User clip distance 0 (`gl_ClipDistance[0]`)
    ClipDistance0,
    /// Alpha blending with `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    Blend,
    /// Multisampled rasterization
    Multisample,
}

bitflags::bitflags! {
    /// Buffers cleared by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour attachment
        const COLOR = 1;
        /// Depth attachment
        const DEPTH = 1 << 1;
    }
}

/// Pixel rectangle of the current render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a viewport anchored at the origin
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// One float vertex attribute stream
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    /// Attribute location the shader binds the stream to
    pub location: u32,
    /// Components per vertex (1..=4)
    pub components: u32,
    /// Tightly packed data
    pub data: &'a [f32],
}

/// Geometry upload request
#[derive(Debug, Clone, Default)]
pub struct MeshData<'a> {
    /// Separate attribute streams
    pub attributes: Vec<VertexAttribute<'a>>,
    /// Optional index buffer
    pub indices: Option<&'a [u32]>,
}

impl MeshData<'_> {
    /// Number of vertices described by the first attribute stream
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .first()
            .map_or(0, |a| a.data.len() / a.components.max(1) as usize)
    }

    /// Elements a draw call must issue: indices if present, else vertices
    pub fn element_count(&self) -> usize {
        self.indices.map_or_else(|| self.vertex_count(), <[u32]>::len)
    }
}

/// Primitive assembly for non-indexed draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
}

/// Texture storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA colour
    Rgba8,
    /// 24-bit depth
    Depth24,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Bilinear (trilinear when mipmapped)
    Linear,
    /// Nearest texel
    Nearest,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    /// Tile the texture
    Repeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Binding target of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureTarget {
    /// `GL_TEXTURE_2D`
    Texture2D,
    /// `GL_TEXTURE_CUBE_MAP`
    CubeMap,
}

/// 2D texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Storage format
    pub format: TextureFormat,
    /// Minification and magnification filter
    pub filter: TextureFilter,
    /// Coordinate wrapping
    pub wrap: TextureWrap,
    /// Generate a full mip chain (colour textures only)
    pub mipmaps: bool,
    /// Level-of-detail bias applied with mipmaps
    pub lod_bias: f32,
}

impl TextureDesc {
    /// Mipmapped, repeating colour texture for materials
    pub const fn material(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::Repeat,
            mipmaps: true,
            lod_bias: -0.4,
        }
    }

    /// Clamped colour attachment
    pub const fn color_attachment(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            mipmaps: false,
            lod_bias: 0.0,
        }
    }

    /// Clamped depth attachment
    pub const fn depth_attachment(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Depth24,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            mipmaps: false,
            lod_bias: 0.0,
        }
    }
}

/// One face of a cube map, in `+X, -X, +Y, -Y, +Z, -Z` order
#[derive(Debug, Clone, Copy)]
pub struct CubeFace<'a> {
    /// Face width
    pub width: u32,
    /// Face height
    pub height: u32,
    /// RGBA8 pixels
    pub pixels: &'a [u8],
}

/// How depth is attached to a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthAttachmentKind {
    /// No depth buffer
    None,
    /// Sampleable depth texture
    Texture,
    /// Write-only depth renderbuffer
    Renderbuffer,
}

/// Attachments of a framebuffer, created by the caller beforehand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferDesc {
    /// Colour texture on attachment 0, or `None` for depth-only targets
    pub color_texture: Option<TextureId>,
    /// Depth texture attachment
    pub depth_texture: Option<TextureId>,
    /// Depth renderbuffer attachment
    pub depth_renderbuffer: Option<RenderbufferId>,
}

/// Result of a completeness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// Driver rejected the attachment set
    Incomplete(String),
}

/// GLSL sources of one program plus its attribute bindings
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    /// Program name used in diagnostics
    pub name: &'static str,
    /// Vertex stage source
    pub vertex: &'static str,
    /// Fragment stage source
    pub fragment: &'static str,
    /// Attribute names, bound to locations `0..n` in order
    pub attributes: &'static [&'static str],
}

/// Typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int` or sampler unit
    Int(i32),
    /// `bool`, uploaded as a float 0/1 to match the shaders
    Bool(bool),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`
    Mat4(Mat4),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Main graphics device trait
///
/// All calls must happen on the thread that owns the context. The device
/// tracks which framebuffer and program are bound so higher layers can
/// enforce single-writer binding and non-nested program use.
pub trait GraphicsDevice {
    /// Human readable backend name
    fn name(&self) -> &str;

    // === Geometry ===

    /// Upload vertex streams (and indices) into a new vertex array
    fn create_vertex_array(&mut self, mesh: &MeshData<'_>) -> RenderResult<VertexArrayId>;

    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>);

    /// Delete a vertex array and its buffers
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    // === Textures ===

    /// Create a 2D texture; `pixels` is RGBA8 data or `None` for attachments
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> RenderResult<TextureId>;

    /// Create a cube map from six faces
    fn create_cube_map(&mut self, faces: &[CubeFace<'_>; 6]) -> RenderResult<TextureId>;

    /// Bind a texture to a texture unit
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>);

    /// Delete a texture
    fn delete_texture(&mut self, texture: TextureId);

    // === Framebuffers ===

    /// Create a depth renderbuffer
    fn create_depth_renderbuffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId>;

    /// Delete a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);

    /// Create a framebuffer with the given attachments
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> RenderResult<FramebufferId>;

    /// Report the completeness of a framebuffer
    fn framebuffer_status(&mut self, framebuffer: FramebufferId) -> FramebufferStatus;

    /// Bind a framebuffer for drawing, or the default framebuffer with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Currently bound draw framebuffer (`None` = default)
    fn bound_framebuffer(&self) -> Option<FramebufferId>;

    /// Delete a framebuffer (attachments are deleted separately)
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // === Programs ===

    /// Compile and link a program
    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramId>;

    /// Resolve a uniform location; `None` if the linker dropped it
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Make `program` current, or none
    fn use_program(&mut self, program: Option<ProgramId>);

    /// Program currently in use
    fn active_program(&self) -> Option<ProgramId>;

    /// Upload a value to a location of the active program
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    /// Delete a program
    fn delete_program(&mut self, program: ProgramId);

    // === State and drawing ===

    /// Set the viewport rectangle
    fn set_viewport(&mut self, viewport: Viewport);

    /// Current viewport
    fn viewport(&self) -> Viewport;

    /// Enable a capability
    fn enable(&mut self, capability: Capability);

    /// Disable a capability
    fn disable(&mut self, capability: Capability);

    /// Whether a capability is enabled
    fn is_enabled(&self, capability: Capability) -> bool;

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, write: bool);

    /// Switch polygon fill mode
    fn set_wireframe(&mut self, wireframe: bool);

    /// Set the clear colour
    fn set_clear_color(&mut self, color: Vec4);

    /// Clear the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Draw indexed triangles from the bound vertex array
    fn draw_elements(&mut self, index_count: u32);

    /// Draw non-indexed primitives from the bound vertex array
    fn draw_arrays(&mut self, topology: PrimitiveTopology, vertex_count: u32);
}
