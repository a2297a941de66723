//! Shader programs
//!
//! [`ShaderProgram`] wraps a linked program, caches uniform locations at
//! link time and enforces non-nested `start`/`stop`. The GLSL sources of
//! the scene shaders live in `glsl/` and are embedded at compile time.

mod program;
pub mod sources;

pub use program::{array_uniform, ShaderProgram};
