//! Water reflection and refraction targets
//!
//! The reflection target only needs colour, so its depth lives in a
//! renderbuffer. The refraction target keeps depth in a texture because the
//! water shader reads it to fade the water edge and soften distortion in
//! shallow areas.

use crate::config::WaterConfig;
use crate::render::api::{DepthAttachmentKind, GraphicsDevice, TextureId, Viewport};
use crate::render::framebuffer::{FramebufferSpec, FramebufferTarget};
use crate::render::{RenderError, RenderResult};

/// Reflection and refraction targets used by the water passes
#[derive(Debug)]
pub struct WaterFrameBuffers {
    reflection: FramebufferTarget,
    refraction: FramebufferTarget,
}

impl WaterFrameBuffers {
    /// Create both targets at the configured sizes
    pub fn new(device: &mut dyn GraphicsDevice, config: &WaterConfig) -> RenderResult<Self> {
        let mut reflection = FramebufferTarget::create(
            device,
            "water_reflection",
            FramebufferSpec {
                width: config.reflection_width,
                height: config.reflection_height,
                color: true,
                depth: DepthAttachmentKind::Renderbuffer,
            },
        )?;
        let refraction = FramebufferTarget::create(
            device,
            "water_refraction",
            FramebufferSpec {
                width: config.refraction_width,
                height: config.refraction_height,
                color: true,
                depth: DepthAttachmentKind::Texture,
            },
        );
        match refraction {
            Ok(refraction) => Ok(Self { reflection, refraction }),
            Err(e) => {
                reflection.dispose(device);
                Err(e)
            }
        }
    }

    /// Run `pass` with the reflection target bound
    pub fn reflect<R>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: Viewport,
        pass: impl FnOnce(&mut dyn GraphicsDevice) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.reflection.scoped(device, window, pass)
    }

    /// Run `pass` with the refraction target bound
    pub fn refract<R>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: Viewport,
        pass: impl FnOnce(&mut dyn GraphicsDevice) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.refraction.scoped(device, window, pass)
    }

    /// Reflection colour texture
    pub fn reflection_texture(&self) -> RenderResult<TextureId> {
        Self::attachment(&self.reflection, self.reflection.color_texture())
    }

    /// Refraction colour texture
    pub fn refraction_texture(&self) -> RenderResult<TextureId> {
        Self::attachment(&self.refraction, self.refraction.color_texture())
    }

    /// Refraction depth texture
    pub fn refraction_depth_texture(&self) -> RenderResult<TextureId> {
        Self::attachment(&self.refraction, self.refraction.depth_texture())
    }

    fn attachment(target: &FramebufferTarget, texture: Option<TextureId>) -> RenderResult<TextureId> {
        texture.ok_or_else(|| RenderError::FramebufferDisposed(target.label().to_string()))
    }

    /// Reflection target size
    pub const fn reflection_viewport(&self) -> Viewport {
        self.reflection.viewport()
    }

    /// Refraction target size
    pub const fn refraction_viewport(&self) -> Viewport {
        self.refraction.viewport()
    }

    /// Release both targets; safe to call twice
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.reflection.dispose(device);
        self.refraction.dispose(device);
    }
}
