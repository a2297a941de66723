//! 2D overlay renderer

use crate::foundation::math::{gui_transformation_matrix, Vec2};
use crate::render::api::{Capability, GraphicsDevice, PrimitiveTopology, TextureId, TextureTarget};
use crate::render::shader::sources;
use crate::render::systems::DrawStats;
use crate::render::{Loader, Model, RenderResult, ShaderProgram};

/// Unit quad as a triangle strip
pub(crate) const STRIP_QUAD: [f32; 8] = [-1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0, -1.0];

/// Textured quad in normalized device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiTexture {
    /// Texture to show
    pub texture: TextureId,
    /// Centre in NDC
    pub position: Vec2,
    /// Half-size in NDC
    pub scale: Vec2,
}

impl GuiTexture {
    /// Quad at `position` with half-size `scale`
    pub const fn new(texture: TextureId, position: Vec2, scale: Vec2) -> Self {
        Self { texture, position, scale }
    }
}

/// Draws GUI quads over the finished frame
#[derive(Debug)]
pub struct GuiRenderer {
    shader: ShaderProgram,
    quad: Model,
}

impl GuiRenderer {
    /// Upload the quad and link the program
    pub fn new(device: &mut dyn GraphicsDevice, loader: &mut Loader) -> RenderResult<Self> {
        let quad = loader.load_positions(device, &STRIP_QUAD, 2)?;
        let shader = ShaderProgram::new(device, &sources::GUI, &["transformationMatrix", "guiTexture"])?;
        shader.connect_texture_units(device, &[("guiTexture", 0)])?;
        Ok(Self { shader, quad })
    }

    /// Draw `guis` in order with blending on and depth testing off
    pub fn render(&self, device: &mut dyn GraphicsDevice, guis: &[GuiTexture]) -> RenderResult<DrawStats> {
        if guis.is_empty() {
            return Ok(DrawStats::default());
        }
        self.shader.with_active(device, |device| {
            device.bind_vertex_array(Some(self.quad.vao()));
            device.enable(Capability::Blend);
            device.disable(Capability::DepthTest);

            let mut stats = DrawStats { model_binds: 1, draw_calls: 0 };
            for gui in guis {
                device.bind_texture(0, TextureTarget::Texture2D, Some(gui.texture));
                self.shader
                    .set(device, "transformationMatrix", gui_transformation_matrix(&gui.position, &gui.scale));
                device.draw_arrays(PrimitiveTopology::TriangleStrip, self.quad.vertex_count());
                stats.draw_calls += 1;
            }

            device.enable(Capability::DepthTest);
            device.disable(Capability::Blend);
            device.bind_vertex_array(None);
            Ok(stats)
        })
    }

    /// Delete the program
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        self.shader.dispose(device);
    }
}
