//! OpenGL 3.3 core device over `glow`
//!
//! Native objects are kept in per-kind maps keyed by the integer handles the
//! rest of the engine sees. Every vertex array remembers its buffers so
//! deleting the array releases them too.

#![allow(unsafe_code)]

use std::collections::{HashMap, HashSet};

use glow::HasContext;

use crate::foundation::math::Vec4;
use crate::render::api::{
    Capability, ClearFlags, CubeFace, FramebufferDesc, FramebufferId, FramebufferStatus,
    GraphicsDevice, MeshData, PrimitiveTopology, ProgramId, RenderbufferId, ShaderSource,
    TextureDesc, TextureFilter, TextureFormat, TextureId, TextureTarget, TextureWrap,
    UniformLocation, UniformValue, VertexArrayId, Viewport,
};
use crate::render::{RenderError, RenderResult};

struct VertexArrayObject {
    vao: glow::VertexArray,
    buffers: Vec<glow::Buffer>,
}

/// Uniform locations handed out per program, so deleting a program drops
/// every location resolved against it
struct UniformTable<L> {
    entries: HashMap<UniformLocation, (ProgramId, L)>,
}

impl<L> UniformTable<L> {
    fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    fn insert(&mut self, program: ProgramId, id: UniformLocation, native: L) {
        self.entries.insert(id, (program, native));
    }

    fn get(&self, id: UniformLocation) -> Option<&L> {
        self.entries.get(&id).map(|(_, native)| native)
    }

    fn remove_program(&mut self, program: ProgramId) {
        self.entries.retain(|_, (owner, _)| *owner != program);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Run `link` over compiled stages, then delete every stage whatever the
/// outcome
fn link_stages<S: Copy, P>(
    stages: &[S],
    link: impl FnOnce(&[S]) -> RenderResult<P>,
    mut delete: impl FnMut(S),
) -> RenderResult<P> {
    let result = link(stages);
    for stage in stages {
        delete(*stage);
    }
    result
}

/// OpenGL device
pub struct GlDevice {
    gl: glow::Context,
    next_id: u32,

    vertex_arrays: HashMap<VertexArrayId, VertexArrayObject>,
    textures: HashMap<TextureId, glow::Texture>,
    renderbuffers: HashMap<RenderbufferId, glow::Renderbuffer>,
    framebuffers: HashMap<FramebufferId, glow::Framebuffer>,
    programs: HashMap<ProgramId, glow::Program>,
    uniforms: UniformTable<glow::UniformLocation>,

    bound_framebuffer: Option<FramebufferId>,
    active_program: Option<ProgramId>,
    enabled: HashSet<Capability>,
    viewport: Viewport,
}

impl GlDevice {
    /// Wrap a context that is current on this thread
    ///
    /// Sets the pipeline defaults the renderers assume: back-face culling
    /// of counter-clockwise fronts and standard alpha blending.
    pub fn new(gl: glow::Context, width: u32, height: u32) -> Self {
        unsafe {
            gl.cull_face(glow::BACK);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.viewport(0, 0, width as i32, height as i32);
        }
        log::info!("OpenGL device created ({}x{})", width, height);
        Self {
            gl,
            next_id: 1,
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            renderbuffers: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            uniforms: UniformTable::new(),
            bound_framebuffer: None,
            active_program: None,
            enabled: HashSet::new(),
            viewport: Viewport::new(width, height),
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    const fn gl_capability(capability: Capability) -> u32 {
        match capability {
            Capability::DepthTest => glow::DEPTH_TEST,
            Capability::CullFace => glow::CULL_FACE,
            Capability::ClipDistance0 => glow::CLIP_DISTANCE0,
            Capability::Blend => glow::BLEND,
            Capability::Multisample => glow::MULTISAMPLE,
        }
    }

    const fn gl_texture_target(target: TextureTarget) -> u32 {
        match target {
            TextureTarget::Texture2D => glow::TEXTURE_2D,
            TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
        }
    }

    fn compile_stage(&self, program_name: &str, stage: u32, source: &str) -> RenderResult<glow::Shader> {
        let stage_name = if stage == glow::VERTEX_SHADER { "vertex" } else { "fragment" };
        unsafe {
            let shader = self
                .gl
                .create_shader(stage)
                .map_err(RenderError::ResourceAllocation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(RenderError::ShaderCompilation {
                    program: program_name.to_string(),
                    stage: stage_name,
                    log,
                });
            }
            Ok(shader)
        }
    }
}

impl GraphicsDevice for GlDevice {
    fn name(&self) -> &str {
        "opengl"
    }

    fn create_vertex_array(&mut self, mesh: &MeshData<'_>) -> RenderResult<VertexArrayId> {
        let gl = &self.gl;
        let object = unsafe {
            let vao = gl.create_vertex_array().map_err(RenderError::ResourceAllocation)?;
            gl.bind_vertex_array(Some(vao));
            let mut buffers = Vec::with_capacity(mesh.attributes.len() + 1);

            if let Some(indices) = mesh.indices {
                let ebo = gl.create_buffer().map_err(RenderError::ResourceAllocation)?;
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    bytemuck::cast_slice(indices),
                    glow::STATIC_DRAW,
                );
                buffers.push(ebo);
            }

            for attribute in &mesh.attributes {
                let vbo = gl.create_buffer().map_err(RenderError::ResourceAllocation)?;
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
                gl.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(attribute.data),
                    glow::STATIC_DRAW,
                );
                gl.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components as i32,
                    glow::FLOAT,
                    false,
                    0,
                    0,
                );
                gl.enable_vertex_attrib_array(attribute.location);
                buffers.push(vbo);
            }

            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_vertex_array(None);
            VertexArrayObject { vao, buffers }
        };

        let id = VertexArrayId(self.allocate());
        self.vertex_arrays.insert(id, object);
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        let native = vao.and_then(|id| self.vertex_arrays.get(&id)).map(|o| o.vao);
        unsafe { self.gl.bind_vertex_array(native) };
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if let Some(object) = self.vertex_arrays.remove(&vao) {
            unsafe {
                for buffer in object.buffers {
                    self.gl.delete_buffer(buffer);
                }
                self.gl.delete_vertex_array(object.vao);
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> RenderResult<TextureId> {
        let gl = &self.gl;
        let texture = unsafe {
            let texture = gl.create_texture().map_err(RenderError::ResourceAllocation)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            match desc.format {
                TextureFormat::Rgba8 => gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    glow::RGBA8 as i32,
                    desc.width as i32,
                    desc.height as i32,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    pixels,
                ),
                TextureFormat::Depth24 => gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    glow::DEPTH_COMPONENT24 as i32,
                    desc.width as i32,
                    desc.height as i32,
                    0,
                    glow::DEPTH_COMPONENT,
                    glow::FLOAT,
                    None,
                ),
            }

            let filter = match desc.filter {
                TextureFilter::Linear => glow::LINEAR,
                TextureFilter::Nearest => glow::NEAREST,
            };
            let wrap = match desc.wrap {
                TextureWrap::Repeat => glow::REPEAT,
                TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            };
            if desc.mipmaps && desc.format == TextureFormat::Rgba8 {
                gl.generate_mipmap(glow::TEXTURE_2D);
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR_MIPMAP_LINEAR as i32);
                gl.tex_parameter_f32(glow::TEXTURE_2D, glow::TEXTURE_LOD_BIAS, desc.lod_bias);
            } else {
                gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter as i32);
            }
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap as i32);
            gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        let id = TextureId(self.allocate());
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn create_cube_map(&mut self, faces: &[CubeFace<'_>; 6]) -> RenderResult<TextureId> {
        let gl = &self.gl;
        let texture = unsafe {
            let texture = gl.create_texture().map_err(RenderError::ResourceAllocation)?;
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            for (i, face) in faces.iter().enumerate() {
                gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + i as u32,
                    0,
                    glow::RGBA8 as i32,
                    face.width as i32,
                    face.height as i32,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    Some(face.pixels),
                );
            }
            gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            gl.tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            texture
        };

        let id = TextureId(self.allocate());
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        let native = texture.and_then(|id| self.textures.get(&id).copied());
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(Self::gl_texture_target(target), native);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(native) = self.textures.remove(&texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn create_depth_renderbuffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        let renderbuffer = unsafe {
            let rb = self.gl.create_renderbuffer().map_err(RenderError::ResourceAllocation)?;
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT24,
                width as i32,
                height as i32,
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            rb
        };
        let id = RenderbufferId(self.allocate());
        self.renderbuffers.insert(id, renderbuffer);
        Ok(id)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        if let Some(native) = self.renderbuffers.remove(&renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(native) };
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> RenderResult<FramebufferId> {
        let color = desc.color_texture.and_then(|t| self.textures.get(&t).copied());
        let depth_texture = desc.depth_texture.and_then(|t| self.textures.get(&t).copied());
        let depth_rb = desc.depth_renderbuffer.and_then(|r| self.renderbuffers.get(&r).copied());

        let gl = &self.gl;
        let framebuffer = unsafe {
            let fbo = gl.create_framebuffer().map_err(RenderError::ResourceAllocation)?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            if let Some(texture) = color {
                gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, Some(texture), 0);
                gl.draw_buffer(glow::COLOR_ATTACHMENT0);
            } else {
                gl.draw_buffer(glow::NONE);
                gl.read_buffer(glow::NONE);
            }
            if let Some(texture) = depth_texture {
                gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::DEPTH_ATTACHMENT, glow::TEXTURE_2D, Some(texture), 0);
            }
            if let Some(rb) = depth_rb {
                gl.framebuffer_renderbuffer(glow::FRAMEBUFFER, glow::DEPTH_ATTACHMENT, glow::RENDERBUFFER, Some(rb));
            }
            let restore = self.bound_framebuffer.and_then(|id| self.framebuffers.get(&id).copied());
            gl.bind_framebuffer(glow::FRAMEBUFFER, restore);
            fbo
        };

        let id = FramebufferId(self.allocate());
        self.framebuffers.insert(id, framebuffer);
        Ok(id)
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferId) -> FramebufferStatus {
        let Some(native) = self.framebuffers.get(&framebuffer).copied() else {
            return FramebufferStatus::Incomplete("unknown framebuffer".to_string());
        };
        let restore = self.bound_framebuffer.and_then(|id| self.framebuffers.get(&id).copied());
        let status = unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(native));
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, restore);
            status
        };
        match status {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::Incomplete("incomplete attachment".to_string()),
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::Incomplete("missing attachment".to_string()),
            glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Incomplete("unsupported attachment combination".to_string()),
            other => FramebufferStatus::Incomplete(format!("status 0x{other:x}")),
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let native = framebuffer.and_then(|id| self.framebuffers.get(&id).copied());
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) };
        self.bound_framebuffer = framebuffer;
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(native) = self.framebuffers.remove(&framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
    }

    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramId> {
        let vertex = self.compile_stage(source.name, glow::VERTEX_SHADER, source.vertex)?;
        let fragment = match self.compile_stage(source.name, glow::FRAGMENT_SHADER, source.fragment) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(e);
            }
        };

        let gl = &self.gl;
        let program = link_stages(
            &[vertex, fragment],
            |stages| unsafe {
                let program = gl.create_program().map_err(RenderError::ResourceAllocation)?;
                for stage in stages {
                    gl.attach_shader(program, *stage);
                }
                for (location, attribute) in source.attributes.iter().enumerate() {
                    gl.bind_attrib_location(program, location as u32, attribute);
                }
                gl.link_program(program);
                let linked = gl.get_program_link_status(program);
                for stage in stages {
                    gl.detach_shader(program, *stage);
                }
                if !linked {
                    let log = gl.get_program_info_log(program);
                    gl.delete_program(program);
                    return Err(RenderError::ShaderLink {
                        program: source.name.to_string(),
                        log,
                    });
                }
                Ok(program)
            },
            |stage| unsafe { gl.delete_shader(stage) },
        )?;

        let id = ProgramId(self.allocate());
        self.programs.insert(id, program);
        Ok(id)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let native = *self.programs.get(&program)?;
        let location = unsafe { self.gl.get_uniform_location(native, name) }?;
        let id = UniformLocation(self.allocate());
        self.uniforms.insert(program, id, location);
        Some(id)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        let native = program.and_then(|id| self.programs.get(&id).copied());
        unsafe { self.gl.use_program(native) };
        self.active_program = program;
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active_program
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let Some(native) = self.uniforms.get(location) else {
            return;
        };
        let gl = &self.gl;
        unsafe {
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(Some(native), *v),
                UniformValue::Int(v) => gl.uniform_1_i32(Some(native), *v),
                UniformValue::Bool(v) => gl.uniform_1_f32(Some(native), if *v { 1.0 } else { 0.0 }),
                UniformValue::Vec2(v) => gl.uniform_2_f32(Some(native), v.x, v.y),
                UniformValue::Vec3(v) => gl.uniform_3_f32(Some(native), v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(Some(native), v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(Some(native), false, m.as_slice()),
            }
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(native) = self.programs.remove(&program) {
            unsafe { self.gl.delete_program(native) };
        }
        self.uniforms.remove_program(program);
        if self.active_program == Some(program) {
            self.active_program = None;
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe { self.gl.viewport(0, 0, viewport.width as i32, viewport.height as i32) };
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(Self::gl_capability(capability)) };
        self.enabled.insert(capability);
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { self.gl.disable(Self::gl_capability(capability)) };
        self.enabled.remove(&capability);
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    fn set_depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) };
    }

    fn set_wireframe(&mut self, wireframe: bool) {
        let mode = if wireframe { glow::LINE } else { glow::FILL };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) };
    }

    fn set_clear_color(&mut self, color: Vec4) {
        unsafe { self.gl.clear_color(color.x, color.y, color.z, color.w) };
    }

    fn clear(&mut self, flags: ClearFlags) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) };
    }

    fn draw_elements(&mut self, index_count: u32) {
        unsafe { self.gl.draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_INT, 0) };
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, vertex_count: u32) {
        let mode = match topology {
            PrimitiveTopology::Triangles => glow::TRIANGLES,
            PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        };
        unsafe { self.gl.draw_arrays(mode, 0, vertex_count as i32) };
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        let leaked = self.vertex_arrays.len()
            + self.textures.len()
            + self.renderbuffers.len()
            + self.framebuffers.len()
            + self.programs.len();
        if leaked > 0 {
            log::warn!(
                "OpenGL device dropped with {} live objects ({} uniform locations)",
                leaked,
                self.uniforms.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_deleted_when_linking_fails() {
        let mut deleted = Vec::new();
        let result: RenderResult<u32> = link_stages(
            &[7u32, 9],
            |_| Err(RenderError::ResourceAllocation("out of program names".to_string())),
            |stage| deleted.push(stage),
        );
        assert!(matches!(result, Err(RenderError::ResourceAllocation(_))));
        assert_eq!(deleted, vec![7, 9]);

        deleted.clear();
        let linked = link_stages(&[1u32, 2], |stages| Ok(stages.len()), |stage| deleted.push(stage)).unwrap();
        assert_eq!(linked, 2);
        assert_eq!(deleted, vec![1, 2]);
    }

    #[test]
    fn test_deleting_a_program_drops_its_uniforms() {
        let mut table = UniformTable::new();
        table.insert(ProgramId(1), UniformLocation(10), 0);
        table.insert(ProgramId(1), UniformLocation(11), 1);
        table.insert(ProgramId(2), UniformLocation(12), 0);

        table.remove_program(ProgramId(1));

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(UniformLocation(10)), None);
        assert_eq!(table.get(UniformLocation(12)), Some(&0));
    }
}
