//! Post-processing
//!
//! The main pass renders into an offscreen target of window size; the
//! contrast program then draws its colour texture to the screen on a
//! fullscreen quad.

use crate::render::api::{
    Capability, DepthAttachmentKind, GraphicsDevice, PrimitiveTopology, TextureTarget, Viewport,
};
use crate::render::framebuffer::{FramebufferSpec, FramebufferTarget};
use crate::render::shader::sources;
use crate::render::systems::gui::STRIP_QUAD;
use crate::render::systems::DrawStats;
use crate::render::{Loader, Model, RenderError, RenderResult, ShaderProgram};

/// Offscreen scene target plus the contrast pass
#[derive(Debug)]
pub struct PostProcessing {
    target: FramebufferTarget,
    shader: ShaderProgram,
    quad: Model,
    contrast: f32,
}

impl PostProcessing {
    /// Create a window-sized target and link the contrast program
    pub fn new(
        device: &mut dyn GraphicsDevice,
        loader: &mut Loader,
        window: Viewport,
        contrast: f32,
    ) -> RenderResult<Self> {
        let mut target = FramebufferTarget::create(
            device,
            "post_processing",
            FramebufferSpec {
                width: window.width,
                height: window.height,
                color: true,
                depth: DepthAttachmentKind::Renderbuffer,
            },
        )?;
        let shader = ShaderProgram::new(device, &sources::CONTRAST, &["colourTexture", "contrast"]);
        let shader = match shader {
            Ok(shader) => shader,
            Err(e) => {
                target.dispose(device);
                return Err(e);
            }
        };
        shader.connect_texture_units(device, &[("colourTexture", 0)])?;
        let quad = loader.load_positions(device, &STRIP_QUAD, 2)?;
        Ok(Self { target, shader, quad, contrast })
    }

    /// Offscreen target the main pass renders into
    pub fn target_mut(&mut self) -> &mut FramebufferTarget {
        &mut self.target
    }

    /// Draw the captured frame to the current framebuffer
    pub fn apply(&self, device: &mut dyn GraphicsDevice) -> RenderResult<DrawStats> {
        let colour = self
            .target
            .color_texture()
            .ok_or_else(|| RenderError::FramebufferDisposed(self.target.label().to_string()))?;
        self.shader.with_active(device, |device| {
            device.disable(Capability::DepthTest);
            device.bind_vertex_array(Some(self.quad.vao()));
            device.bind_texture(0, TextureTarget::Texture2D, Some(colour));
            self.shader.set(device, "contrast", self.contrast);
            device.draw_arrays(PrimitiveTopology::TriangleStrip, self.quad.vertex_count());
            device.bind_vertex_array(None);
            device.enable(Capability::DepthTest);
            Ok(DrawStats { model_binds: 1, draw_calls: 1 })
        })
    }

    /// Recreate the target at the new window size
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, window: Viewport) -> RenderResult<()> {
        self.target.resize(device, window.width, window.height)
    }

    /// Release the target and the program
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
        self.target.dispose(device);
    }
}
