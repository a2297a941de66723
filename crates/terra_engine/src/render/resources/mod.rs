//! GPU resource loading
//!
//! The [`Loader`] uploads geometry and textures through the device and
//! remembers every handle it hands out, so a single
//! [`Loader::dispose_all`] at shutdown releases all of them.

mod loader;
mod model;

pub use loader::Loader;
pub use model::{Model, ModelData, ModelId};
