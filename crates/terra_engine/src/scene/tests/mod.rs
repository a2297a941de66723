//! Pipeline tests for the scene renderer and manager
//!
//! Everything runs against `RecordingDevice`, so the tests inspect the
//! exact device calls a frame makes.

mod fixtures;
mod frame_pipeline;
mod water_and_shadows;
