//! Depth-only shadow map target

use crate::render::api::{DepthAttachmentKind, GraphicsDevice, TextureId, Viewport};
use crate::render::framebuffer::{FramebufferSpec, FramebufferTarget};
use crate::render::{RenderError, RenderResult};

/// Square depth texture the shadow pass renders into
#[derive(Debug)]
pub struct ShadowFrameBuffer {
    target: FramebufferTarget,
}

impl ShadowFrameBuffer {
    /// Create a `size × size` depth-only target
    pub fn new(device: &mut dyn GraphicsDevice, size: u32) -> RenderResult<Self> {
        let target = FramebufferTarget::create(
            device,
            "shadow_map",
            FramebufferSpec {
                width: size,
                height: size,
                color: false,
                depth: DepthAttachmentKind::Texture,
            },
        )?;
        Ok(Self { target })
    }

    /// Depth texture sampled by the main and water passes
    pub fn shadow_map(&self) -> RenderResult<TextureId> {
        self.target
            .depth_texture()
            .ok_or_else(|| RenderError::FramebufferDisposed(self.target.label().to_string()))
    }

    /// Shadow map resolution
    pub const fn size(&self) -> u32 {
        self.target.viewport().width
    }

    /// Underlying target, for binding
    pub fn target_mut(&mut self) -> &mut FramebufferTarget {
        &mut self.target
    }

    /// Run `pass` with the shadow map bound
    pub fn scoped<R>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: Viewport,
        pass: impl FnOnce(&mut dyn GraphicsDevice) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.target.scoped(device, window, pass)
    }

    /// Release the target
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.target.dispose(device);
    }
}
