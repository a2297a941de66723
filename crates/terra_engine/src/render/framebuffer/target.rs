//! Generic framebuffer target
//!
//! ## State machine
//!
//! ```text
//!   create ──► Unbound ──bind──► Bound ──unbind──► Unbound ──dispose──► Disposed
//! ```
//!
//! - `bind` fails if any framebuffer is already bound for writing.
//! - `unbind` fails unless this target is the bound one, and restores the
//!   default framebuffer plus the window viewport.
//! - `dispose` is idempotent.
//!
//! Targets cannot release GPU objects on `Drop` because the device is not
//! reachable there; dropping an undisposed target only logs a warning.

use crate::render::api::{
    DepthAttachmentKind, FramebufferDesc, FramebufferId, FramebufferStatus, GraphicsDevice,
    RenderbufferId, TextureDesc, TextureId, Viewport,
};
use crate::render::{RenderError, RenderResult};

/// Size and attachment layout of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferSpec {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Attach a colour texture
    pub color: bool,
    /// Depth attachment kind
    pub depth: DepthAttachmentKind,
}

/// Binding state of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Not bound
    Unbound,
    /// Bound for drawing
    Bound,
    /// GPU objects deleted
    Disposed,
}

/// Offscreen framebuffer with owned attachments
#[derive(Debug)]
pub struct FramebufferTarget {
    label: String,
    spec: FramebufferSpec,
    framebuffer: FramebufferId,
    color_texture: Option<TextureId>,
    depth_texture: Option<TextureId>,
    depth_renderbuffer: Option<RenderbufferId>,
    state: TargetState,
}

impl FramebufferTarget {
    /// Allocate the framebuffer and its attachments, then verify completeness
    ///
    /// On any failure every object allocated so far is deleted before the
    /// error is returned.
    pub fn create(device: &mut dyn GraphicsDevice, label: &str, spec: FramebufferSpec) -> RenderResult<Self> {
        if spec.width == 0 || spec.height == 0 {
            return Err(RenderError::ResourceAllocation(format!(
                "framebuffer '{label}' has zero size"
            )));
        }

        let mut partial = Self {
            label: label.to_string(),
            spec,
            framebuffer: FramebufferId(0),
            color_texture: None,
            depth_texture: None,
            depth_renderbuffer: None,
            state: TargetState::Unbound,
        };
        match partial.allocate(device) {
            Ok(()) => {
                log::info!(
                    "Created framebuffer '{}' ({}x{}, colour: {}, depth: {:?})",
                    label, spec.width, spec.height, spec.color, spec.depth
                );
                Ok(partial)
            }
            Err(e) => {
                log::error!("Framebuffer '{}' creation failed: {}", label, e);
                partial.release(device);
                Err(e)
            }
        }
    }

    fn allocate(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        let FramebufferSpec { width, height, color, depth } = self.spec;
        if color {
            self.color_texture = Some(device.create_texture(&TextureDesc::color_attachment(width, height), None)?);
        }
        match depth {
            DepthAttachmentKind::None => {}
            DepthAttachmentKind::Texture => {
                self.depth_texture = Some(device.create_texture(&TextureDesc::depth_attachment(width, height), None)?);
            }
            DepthAttachmentKind::Renderbuffer => {
                self.depth_renderbuffer = Some(device.create_depth_renderbuffer(width, height)?);
            }
        }

        self.framebuffer = device.create_framebuffer(&FramebufferDesc {
            color_texture: self.color_texture,
            depth_texture: self.depth_texture,
            depth_renderbuffer: self.depth_renderbuffer,
        })?;

        match device.framebuffer_status(self.framebuffer) {
            FramebufferStatus::Complete => Ok(()),
            FramebufferStatus::Incomplete(status) => Err(RenderError::IncompleteFramebuffer {
                label: self.label.clone(),
                status,
            }),
        }
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if self.framebuffer.0 != 0 {
            device.delete_framebuffer(self.framebuffer);
        }
        if let Some(texture) = self.color_texture.take() {
            device.delete_texture(texture);
        }
        if let Some(texture) = self.depth_texture.take() {
            device.delete_texture(texture);
        }
        if let Some(rb) = self.depth_renderbuffer.take() {
            device.delete_renderbuffer(rb);
        }
        self.state = TargetState::Disposed;
    }

    /// Label used in diagnostics
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Target size
    pub const fn viewport(&self) -> Viewport {
        Viewport::new(self.spec.width, self.spec.height)
    }

    /// Current state
    pub const fn state(&self) -> TargetState {
        self.state
    }

    /// Colour attachment
    pub const fn color_texture(&self) -> Option<TextureId> {
        self.color_texture
    }

    /// Depth texture attachment
    pub const fn depth_texture(&self) -> Option<TextureId> {
        self.depth_texture
    }

    /// Bind for drawing and set the viewport to the target size
    pub fn bind(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        match self.state {
            TargetState::Disposed => return Err(RenderError::FramebufferDisposed(self.label.clone())),
            TargetState::Bound | TargetState::Unbound => {}
        }
        if let Some(bound) = device.bound_framebuffer() {
            return Err(RenderError::FramebufferAlreadyBound {
                label: self.label.clone(),
                bound,
            });
        }
        device.bind_framebuffer(Some(self.framebuffer));
        device.set_viewport(self.viewport());
        self.state = TargetState::Bound;
        log::trace!("Bound framebuffer '{}'", self.label);
        Ok(())
    }

    /// Restore the default framebuffer and the window viewport
    pub fn unbind(&mut self, device: &mut dyn GraphicsDevice, window: Viewport) -> RenderResult<()> {
        if self.state != TargetState::Bound || device.bound_framebuffer() != Some(self.framebuffer) {
            return Err(RenderError::FramebufferNotBound(self.label.clone()));
        }
        device.bind_framebuffer(None);
        device.set_viewport(window);
        self.state = TargetState::Unbound;
        log::trace!("Unbound framebuffer '{}'", self.label);
        Ok(())
    }

    /// Run `pass` with this target bound; it is unbound again even if the
    /// pass fails
    pub fn scoped<R>(
        &mut self,
        device: &mut dyn GraphicsDevice,
        window: Viewport,
        pass: impl FnOnce(&mut dyn GraphicsDevice) -> RenderResult<R>,
    ) -> RenderResult<R> {
        self.bind(device)?;
        let result = pass(device);
        self.unbind(device, window)?;
        result
    }

    /// Recreate at a new size; handles change
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        if self.state == TargetState::Bound {
            return Err(RenderError::FramebufferAlreadyBound {
                label: self.label.clone(),
                bound: self.framebuffer,
            });
        }
        let spec = FramebufferSpec { width, height, ..self.spec };
        let label = self.label.clone();
        self.dispose(device);
        *self = Self::create(device, &label, spec)?;
        Ok(())
    }

    /// Delete every GPU object; further calls do nothing
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        if self.state == TargetState::Disposed {
            log::debug!("Framebuffer '{}' already disposed", self.label);
            return;
        }
        if self.state == TargetState::Bound && device.bound_framebuffer() == Some(self.framebuffer) {
            device.bind_framebuffer(None);
        }
        self.release(device);
        log::debug!("Disposed framebuffer '{}'", self.label);
    }
}

impl Drop for FramebufferTarget {
    fn drop(&mut self) {
        if self.state != TargetState::Disposed {
            log::warn!("Framebuffer '{}' dropped without dispose; GPU objects leaked", self.label);
        }
    }
}
