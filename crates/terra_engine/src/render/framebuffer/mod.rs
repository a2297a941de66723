//! Offscreen render targets
//!
//! [`FramebufferTarget`] is the generic target with the
//! `Unbound -> Bound -> Unbound` state machine. The shadow and water
//! specialisations fix the attachment layout each pass needs.

mod shadow;
mod target;
mod water;

pub use shadow::ShadowFrameBuffer;
pub use target::{FramebufferSpec, FramebufferTarget, TargetState};
pub use water::WaterFrameBuffers;
