//! Headless recording device
//!
//! Allocates handles like a real driver, keeps the state a driver would
//! keep (bound framebuffer, active program, enabled capabilities, uniform
//! values), and appends every call to a command log. Tests use it to assert
//! on the exact command stream a pass produces and to check that every
//! allocation is released again.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::foundation::math::Vec4;
use crate::render::api::{
    Capability, ClearFlags, CubeFace, FramebufferDesc, FramebufferId, FramebufferStatus,
    GraphicsDevice, MeshData, PrimitiveTopology, ProgramId, RenderbufferId, ShaderSource,
    TextureDesc, TextureId, TextureTarget, UniformLocation, UniformValue, VertexArrayId,
    Viewport,
};
use crate::render::{RenderError, RenderResult};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Vertex array created with the given element count
    CreateVertexArray(VertexArrayId, usize),
    /// Vertex array bound or unbound
    BindVertexArray(Option<VertexArrayId>),
    /// Vertex array deleted
    DeleteVertexArray(VertexArrayId),
    /// Texture created
    CreateTexture(TextureId),
    /// Texture bound to a unit
    BindTexture(u32, Option<TextureId>),
    /// Texture deleted
    DeleteTexture(TextureId),
    /// Renderbuffer created
    CreateRenderbuffer(RenderbufferId),
    /// Renderbuffer deleted
    DeleteRenderbuffer(RenderbufferId),
    /// Framebuffer created
    CreateFramebuffer(FramebufferId),
    /// Framebuffer bound (`None` = default)
    BindFramebuffer(Option<FramebufferId>),
    /// Framebuffer deleted
    DeleteFramebuffer(FramebufferId),
    /// Program created
    CreateProgram(ProgramId, &'static str),
    /// Program made current
    UseProgram(Option<ProgramId>),
    /// Program deleted
    DeleteProgram(ProgramId),
    /// Uniform uploaded
    SetUniform(UniformLocation, UniformValue),
    /// Viewport changed
    SetViewport(Viewport),
    /// Capability enabled
    Enable(Capability),
    /// Capability disabled
    Disable(Capability),
    /// Depth mask changed
    DepthMask(bool),
    /// Polygon mode changed
    Wireframe(bool),
    /// Clear issued
    Clear(ClearFlags),
    /// Indexed draw
    DrawElements(u32),
    /// Array draw
    DrawArrays(PrimitiveTopology, u32),
}

/// Headless device
#[derive(Debug)]
pub struct RecordingDevice {
    next_id: u32,
    commands: Vec<DeviceCommand>,

    vertex_arrays: HashSet<VertexArrayId>,
    textures: HashSet<TextureId>,
    renderbuffers: HashSet<RenderbufferId>,
    framebuffers: HashSet<FramebufferId>,
    programs: HashMap<ProgramId, &'static str>,

    bound_framebuffer: Option<FramebufferId>,
    active_program: Option<ProgramId>,
    enabled: HashSet<Capability>,
    viewport: Viewport,

    uniform_names: HashMap<(ProgramId, String), UniformLocation>,
    uniform_values: HashMap<UniformLocation, UniformValue>,

    framebuffer_outcomes: VecDeque<Option<String>>,
    failing_programs: HashSet<&'static str>,
}

impl RecordingDevice {
    /// Create a device whose default framebuffer has the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            next_id: 1,
            commands: Vec::new(),
            vertex_arrays: HashSet::new(),
            textures: HashSet::new(),
            renderbuffers: HashSet::new(),
            framebuffers: HashSet::new(),
            programs: HashMap::new(),
            bound_framebuffer: None,
            active_program: None,
            enabled: HashSet::new(),
            viewport: Viewport::new(width, height),
            uniform_names: HashMap::new(),
            uniform_values: HashMap::new(),
            framebuffer_outcomes: VecDeque::new(),
            failing_programs: HashSet::new(),
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Make the next queued completeness check report incomplete
    pub fn fail_next_framebuffer(&mut self, status: impl Into<String>) {
        self.framebuffer_outcomes.push_back(Some(status.into()));
    }

    /// Queue a passing completeness check ahead of later failures
    pub fn pass_next_framebuffer(&mut self) {
        self.framebuffer_outcomes.push_back(None);
    }

    /// Make linking the named program fail
    pub fn fail_program(&mut self, name: &'static str) {
        self.failing_programs.insert(name);
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drop the command log (state is kept)
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Count commands matching a predicate
    pub fn count(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    /// Number of draw calls of either kind
    pub fn draw_calls(&self) -> usize {
        self.count(|c| matches!(c, DeviceCommand::DrawElements(_) | DeviceCommand::DrawArrays(..)))
    }

    /// Objects that have been created but not deleted
    pub fn live_objects(&self) -> usize {
        self.vertex_arrays.len()
            + self.textures.len()
            + self.renderbuffers.len()
            + self.framebuffers.len()
            + self.programs.len()
    }

    /// Live vertex arrays
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Live textures
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Live framebuffers
    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// Program id for a program name, if one is alive
    pub fn program_named(&self, name: &str) -> Option<ProgramId> {
        self.programs
            .iter()
            .find(|(_, n)| **n == name)
            .map(|(id, _)| *id)
    }

    /// Last value uploaded to `name` in `program`
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let location = self.uniform_names.get(&(program, name.to_string()))?;
        self.uniform_values.get(location).copied()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_vertex_array(&mut self, mesh: &MeshData<'_>) -> RenderResult<VertexArrayId> {
        if mesh.attributes.is_empty() {
            return Err(RenderError::ResourceAllocation(
                "vertex array needs at least one attribute".to_string(),
            ));
        }
        let vao = VertexArrayId(self.allocate());
        self.vertex_arrays.insert(vao);
        self.commands.push(DeviceCommand::CreateVertexArray(vao, mesh.element_count()));
        Ok(vao)
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        self.commands.push(DeviceCommand::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.vertex_arrays.remove(&vao);
        self.commands.push(DeviceCommand::DeleteVertexArray(vao));
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> RenderResult<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceAllocation("zero-sized texture".to_string()));
        }
        if let Some(pixels) = pixels {
            let expected = (desc.width * desc.height * 4) as usize;
            if pixels.len() != expected {
                return Err(RenderError::ResourceAllocation(format!(
                    "texture data has {} bytes, expected {expected}",
                    pixels.len()
                )));
            }
        }
        let texture = TextureId(self.allocate());
        self.textures.insert(texture);
        self.commands.push(DeviceCommand::CreateTexture(texture));
        Ok(texture)
    }

    fn create_cube_map(&mut self, faces: &[CubeFace<'_>; 6]) -> RenderResult<TextureId> {
        if faces.iter().any(|f| f.pixels.len() != (f.width * f.height * 4) as usize) {
            return Err(RenderError::ResourceAllocation("cube face size mismatch".to_string()));
        }
        let texture = TextureId(self.allocate());
        self.textures.insert(texture);
        self.commands.push(DeviceCommand::CreateTexture(texture));
        Ok(texture)
    }

    fn bind_texture(&mut self, unit: u32, _target: TextureTarget, texture: Option<TextureId>) {
        self.commands.push(DeviceCommand::BindTexture(unit, texture));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.commands.push(DeviceCommand::DeleteTexture(texture));
    }

    fn create_depth_renderbuffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceAllocation("zero-sized renderbuffer".to_string()));
        }
        let renderbuffer = RenderbufferId(self.allocate());
        self.renderbuffers.insert(renderbuffer);
        self.commands.push(DeviceCommand::CreateRenderbuffer(renderbuffer));
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.renderbuffers.remove(&renderbuffer);
        self.commands.push(DeviceCommand::DeleteRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(&mut self, _desc: &FramebufferDesc) -> RenderResult<FramebufferId> {
        let framebuffer = FramebufferId(self.allocate());
        self.framebuffers.insert(framebuffer);
        self.commands.push(DeviceCommand::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferId) -> FramebufferStatus {
        if !self.framebuffers.contains(&framebuffer) {
            return FramebufferStatus::Incomplete("unknown framebuffer".to_string());
        }
        match self.framebuffer_outcomes.pop_front().flatten() {
            Some(status) => FramebufferStatus::Incomplete(status),
            None => FramebufferStatus::Complete,
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound_framebuffer = framebuffer;
        self.commands.push(DeviceCommand::BindFramebuffer(framebuffer));
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        self.commands.push(DeviceCommand::DeleteFramebuffer(framebuffer));
    }

    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramId> {
        if self.failing_programs.contains(source.name) {
            return Err(RenderError::ShaderLink {
                program: source.name.to_string(),
                log: "link failure injected by recording device".to_string(),
            });
        }
        let program = ProgramId(self.allocate());
        self.programs.insert(program, source.name);
        self.commands.push(DeviceCommand::CreateProgram(program, source.name));
        Ok(program)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains_key(&program) {
            return None;
        }
        let key = (program, name.to_string());
        if let Some(location) = self.uniform_names.get(&key) {
            return Some(*location);
        }
        let location = UniformLocation(self.allocate());
        self.uniform_names.insert(key, location);
        Some(location)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.active_program = program;
        self.commands.push(DeviceCommand::UseProgram(program));
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active_program
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.uniform_values.insert(location, *value);
        self.commands.push(DeviceCommand::SetUniform(location, *value));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.active_program == Some(program) {
            self.active_program = None;
        }
        self.commands.push(DeviceCommand::DeleteProgram(program));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(DeviceCommand::SetViewport(viewport));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn enable(&mut self, capability: Capability) {
        self.enabled.insert(capability);
        self.commands.push(DeviceCommand::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.enabled.remove(&capability);
        self.commands.push(DeviceCommand::Disable(capability));
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    fn set_depth_mask(&mut self, write: bool) {
        self.commands.push(DeviceCommand::DepthMask(write));
    }

    fn set_wireframe(&mut self, wireframe: bool) {
        self.commands.push(DeviceCommand::Wireframe(wireframe));
    }

    fn set_clear_color(&mut self, _color: Vec4) {}

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(DeviceCommand::Clear(flags));
    }

    fn draw_elements(&mut self, index_count: u32) {
        self.commands.push(DeviceCommand::DrawElements(index_count));
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, vertex_count: u32) {
        self.commands.push(DeviceCommand::DrawArrays(topology, vertex_count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::VertexAttribute;

    #[test]
    fn test_tracks_live_objects() {
        let mut device = RecordingDevice::new(800, 600);
        let positions = [0.0_f32; 9];
        let mesh = MeshData {
            attributes: vec![VertexAttribute { location: 0, components: 3, data: &positions }],
            indices: None,
        };
        let vao = device.create_vertex_array(&mesh).unwrap();
        let tex = device.create_texture(&TextureDesc::color_attachment(4, 4), None).unwrap();
        assert_eq!(device.live_objects(), 2);

        device.delete_vertex_array(vao);
        device.delete_texture(tex);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn test_uniform_locations_are_stable() {
        let mut device = RecordingDevice::new(800, 600);
        let source = ShaderSource { name: "test", vertex: "", fragment: "", attributes: &[] };
        let program = device.create_program(&source).unwrap();
        let a = device.uniform_location(program, "colour").unwrap();
        let b = device.uniform_location(program, "colour").unwrap();
        assert_eq!(a, b);

        device.set_uniform(a, &UniformValue::Float(2.0));
        assert_eq!(device.uniform_value(program, "colour"), Some(UniformValue::Float(2.0)));
    }

    #[test]
    fn test_injected_framebuffer_failure() {
        let mut device = RecordingDevice::new(800, 600);
        device.fail_next_framebuffer("missing attachment");
        let fbo = device.create_framebuffer(&FramebufferDesc {
            color_texture: None,
            depth_texture: None,
            depth_renderbuffer: None,
        }).unwrap();
        assert_eq!(
            device.framebuffer_status(fbo),
            FramebufferStatus::Incomplete("missing attachment".to_string())
        );
        assert_eq!(device.framebuffer_status(fbo), FramebufferStatus::Complete);
    }
}
