//! Window surfaces
//!
//! The renderer only needs a few things from a window: its framebuffer
//! size, the duration of the last frame, and a way to present. The
//! [`WindowSurface`] trait captures that; [`HeadlessSurface`] serves tests
//! and offline use, and the GLFW window sits behind the `windowed`
//! feature.

pub mod headless;

#[cfg(feature = "windowed")]
pub mod glfw_window;

pub use headless::HeadlessSurface;

#[cfg(feature = "windowed")]
pub use glfw_window::GlfwWindow;

use thiserror::Error;

use crate::render::api::Viewport;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// Window or context creation failed
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// What the renderer reads from and does to a window
pub trait WindowSurface {
    /// Framebuffer size in pixels
    fn size(&self) -> Viewport;

    /// Seconds the last frame took
    fn frame_time(&self) -> f32;

    /// Whether the user asked to close
    fn should_close(&self) -> bool;

    /// Present the finished frame
    fn swap_buffers(&mut self);

    /// Process pending input and window events
    fn poll_events(&mut self);
}
