//! Graphics device implementations
//!
//! - [`GlDevice`]: OpenGL 3.3 core through `glow`
//! - [`RecordingDevice`]: headless device that records every command

pub mod gl;
pub mod recording;

pub use gl::GlDevice;
pub use recording::{DeviceCommand, RecordingDevice};
