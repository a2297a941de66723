//! # Rendering System
//!
//! Low-level rendering layer of the engine: the graphics device seam, GPU
//! resource loading, offscreen framebuffers, shader programs, and the
//! per-feature sub-renderers the scene renderer coordinates.
//!
//! ## Architecture
//!
//! - **Device** (`api`): object-safe [`GraphicsDevice`] trait. Every GL call
//!   in the engine goes through it.
//! - **Backends** (`backends`): `GlDevice` over `glow`, and
//!   `RecordingDevice`, a headless device that records commands.
//! - **Resources** (`resources`): the [`Loader`] that owns every vertex
//!   array and texture it creates.
//! - **Framebuffers** (`framebuffer`): bind/unbind state machine, shadow and
//!   water specialisations.
//! - **Shaders** (`shader`): programs with link-time uniform caching.
//! - **Systems** (`systems`): entity, terrain, skybox, water, shadow, GUI and
//!   post-process renderers.
//! - **Window** (`window`): the surface interface the renderer reads size and
//!   frame time from.
//!
//! ## Threading
//!
//! The GL context is current on one thread. Nothing in this module is
//! `Send`-shared across threads; only the scene visibility filter runs on
//! worker threads and it never touches the device.

pub mod api;
pub mod backends;
pub mod framebuffer;
pub mod resources;
pub mod shader;
pub mod systems;
pub mod window;

pub use api::{
    Capability, ClearFlags, FramebufferId, GraphicsDevice, MeshData, ProgramId, TextureId,
    UniformValue, VertexArrayId, Viewport,
};
pub use backends::RecordingDevice;
pub use framebuffer::{FramebufferTarget, ShadowFrameBuffer, WaterFrameBuffers};
pub use resources::{Loader, Model, ModelId};
pub use shader::ShaderProgram;
pub use window::{HeadlessSurface, WindowSurface};

/// Rendering errors
///
/// The first group is fatal: initialization must abort with the diagnostic.
/// The second group reports caller bugs (contract violations) and is
/// returned loudly instead of silently corrupting a frame.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Renderer or context initialization failed
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// GPU object allocation failed
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// A shader stage failed to compile
    #[error("Shader '{program}' {stage} stage failed to compile: {log}")]
    ShaderCompilation {
        /// Program name
        program: String,
        /// `vertex` or `fragment`
        stage: &'static str,
        /// Driver info log
        log: String,
    },

    /// A program failed to link
    #[error("Shader '{program}' failed to link: {log}")]
    ShaderLink {
        /// Program name
        program: String,
        /// Driver info log
        log: String,
    },

    /// The driver reported an incomplete framebuffer
    #[error("Framebuffer '{label}' is incomplete: {status}")]
    IncompleteFramebuffer {
        /// Target label
        label: String,
        /// Driver status
        status: String,
    },

    /// A texture could not be read or decoded
    #[error("Failed to load texture '{path}': {reason}")]
    TextureLoad {
        /// Source path
        path: String,
        /// Decoder message
        reason: String,
    },

    /// `start()` was called while another program was active
    #[error("Cannot start program {requested:?} while {active:?} is active")]
    ProgramAlreadyActive {
        /// Program already in use
        active: ProgramId,
        /// Program the caller tried to start
        requested: ProgramId,
    },

    /// `stop()` was called on a program that is not active
    #[error("Program {0:?} is not active")]
    ProgramNotActive(ProgramId),

    /// `bind()` was called while another target was bound for writing
    #[error("Cannot bind framebuffer '{label}' while {bound:?} is bound")]
    FramebufferAlreadyBound {
        /// Target the caller tried to bind
        label: String,
        /// Framebuffer that is still bound
        bound: FramebufferId,
    },

    /// `unbind()` without a matching `bind()`
    #[error("Framebuffer '{0}' is not bound")]
    FramebufferNotBound(String),

    /// Use of a target after `dispose()`
    #[error("Framebuffer '{0}' has been disposed")]
    FramebufferDisposed(String),

    /// A renderable references a model that is not loaded
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Light list violates the scene contract
    #[error("Invalid light setup: {0}")]
    InvalidLightSetup(String),

    /// A frame pass was requested with no frame in progress
    #[error("Pass {0:?} requested outside a frame")]
    FrameNotStarted(crate::scene::FramePhase),

    /// Frame passes were requested out of order
    #[error("Pass {to:?} cannot follow {from:?}")]
    PassOrder {
        /// Phase the frame was in
        from: crate::scene::FramePhase,
        /// Phase that was requested
        to: crate::scene::FramePhase,
    },
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
