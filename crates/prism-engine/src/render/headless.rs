//! In-memory render context.
//!
//! Nothing is rasterized. Every call is appended to a command log and all
//! state a GPU driver would keep (programs, buffers, attribute sources,
//! uniforms, viewport) is tracked so tests can inspect it. Buffers stay
//! readable, which makes attribute fetches observable.

use std::collections::BTreeMap;

use glam::Mat4;

use crate::coords::{Color, Viewport};
use crate::shader::{BuildError, LinkedProgram};

use super::context::{
    AttribPointer, AttributeLocation, BufferId, ClearFlags, ProgramId, RasterState, RenderContext,
    UniformLocation, MAT4_BYTES,
};

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    CreateBuffer { buffer: BufferId, len: usize },
    DeleteBuffer(BufferId),
    ClearColor(Color),
    RasterState(RasterState),
    Viewport(Viewport),
    Clear(ClearFlags),
    VertexAttribute { location: AttributeLocation, pointer: AttribPointer },
    UniformMat4 { program: ProgramId, location: UniformLocation, value: Mat4 },
    DrawTriangles { program: Option<ProgramId>, first: u32, count: u32 },
}

/// A draw call as issued, without its surrounding state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordedDraw {
    pub first: u32,
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct HeadlessContext {
    next_id: u32,
    programs: BTreeMap<ProgramId, LinkedProgram>,
    buffers: BTreeMap<BufferId, Vec<f32>>,
    current_program: Option<ProgramId>,
    attributes: BTreeMap<AttributeLocation, AttribPointer>,
    uniforms: BTreeMap<(ProgramId, UniformLocation), Mat4>,
    clear_color: Color,
    raster: RasterState,
    viewport: Option<Viewport>,
    commands: Vec<Command>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Returns and forgets the command log; tracked state is kept.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Draw calls in the log, in issue order.
    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawTriangles { first, count, .. } => {
                    Some(RecordedDraw { first: *first, count: *count })
                }
                _ => None,
            })
            .collect()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn program(&self, id: ProgramId) -> Option<&LinkedProgram> {
        self.programs.get(&id)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn buffer(&self, id: BufferId) -> Option<&[f32]> {
        self.buffers.get(&id).map(Vec::as_slice)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn raster_state(&self) -> RasterState {
        self.raster
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn attribute(&self, location: AttributeLocation) -> Option<AttribPointer> {
        self.attributes.get(&location).copied()
    }

    pub fn uniform_mat4(&self, program: ProgramId, location: UniformLocation) -> Option<Mat4> {
        self.uniforms.get(&(program, location)).copied()
    }

    /// Reads the components the attribute at `location` would feed to `vertex`.
    ///
    /// Returns `None` if the attribute is unset or the fetch runs past the buffer.
    pub fn fetch(&self, location: AttributeLocation, vertex: u32) -> Option<&[f32]> {
        let pointer = self.attributes.get(&location)?;
        let data = self.buffers.get(&pointer.buffer)?;
        let start = (pointer.offset + vertex * pointer.stride) as usize;
        data.get(start..start + pointer.components as usize)
    }
}

impl RenderContext for HeadlessContext {
    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, BuildError> {
        let id = ProgramId(self.next_id());
        self.programs.insert(id, program.clone());
        self.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.uniforms.retain(|(p, _), _| *p != program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.commands.push(Command::DeleteProgram(program));
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.programs.contains_key(&program) {
            log::warn!("headless: use_program with unknown {program:?}");
        }
        self.current_program = Some(program);
        self.commands.push(Command::UseProgram(program));
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferId {
        let id = BufferId(self.next_id());
        log::trace!("headless: buffer {label:?} ({} floats)", data.len());
        self.buffers.insert(id, data.to_vec());
        self.commands.push(Command::CreateBuffer { buffer: id, len: data.len() });
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.attributes.retain(|_, p| p.buffer != buffer);
        self.commands.push(Command::DeleteBuffer(buffer));
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.commands.push(Command::ClearColor(color));
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.raster = state;
        self.commands.push(Command::RasterState(state));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
        self.commands.push(Command::Viewport(viewport));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.commands.push(Command::Clear(flags));
    }

    fn set_vertex_attribute(&mut self, location: AttributeLocation, pointer: AttribPointer) {
        self.attributes.insert(location, pointer);
        self.commands.push(Command::VertexAttribute { location, pointer });
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        let Some(program) = self.current_program else {
            log::warn!("headless: uniform upload without a current program");
            return;
        };
        let size = self
            .programs
            .get(&program)
            .and_then(|p| p.uniforms().get(location.0 as usize))
            .map(|u| u.size);
        match size {
            Some(size) if size >= MAT4_BYTES => {}
            Some(size) => {
                log::warn!("headless: uniform {location:?} holds {size} bytes; mat4 upload skipped");
                return;
            }
            None => {
                log::warn!("headless: uniform {location:?} is not part of the current program");
                return;
            }
        }
        self.uniforms.insert((program, location), *value);
        self.commands.push(Command::UniformMat4 { program, location, value: *value });
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.commands.push(Command::DrawTriangles {
            program: self.current_program,
            first,
            count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{ShaderProgramBuilder, COLOR_FRAGMENT_SHADER};

    #[test]
    fn buffers_read_back_what_was_uploaded() {
        let mut ctx = HeadlessContext::new();
        let id = ctx.create_vertex_buffer("test", &[1.0, 2.0, 3.0]);
        assert_eq!(ctx.buffer(id), Some(&[1.0, 2.0, 3.0][..]));

        ctx.delete_buffer(id);
        assert_eq!(ctx.buffer(id), None);
    }

    #[test]
    fn fetch_follows_offset_and_stride() {
        let mut ctx = HeadlessContext::new();
        let data: Vec<f32> = (0..14).map(|v| v as f32).collect();
        let buffer = ctx.create_vertex_buffer("two vertices", &data);

        let location = AttributeLocation(1);
        ctx.set_vertex_attribute(location, AttribPointer { buffer, components: 4, offset: 3, stride: 7 });

        assert_eq!(ctx.fetch(location, 0), Some(&[3.0, 4.0, 5.0, 6.0][..]));
        assert_eq!(ctx.fetch(location, 1), Some(&[10.0, 11.0, 12.0, 13.0][..]));
        assert_eq!(ctx.fetch(location, 2), None);
    }

    #[test]
    fn contexts_are_independent() {
        let mut a = HeadlessContext::new();
        let b = HeadlessContext::new();
        a.set_viewport(Viewport::full(10, 10));
        a.draw_triangles(0, 3);

        assert_eq!(a.viewport(), Some(Viewport::full(10, 10)));
        assert_eq!(b.viewport(), None);
        assert!(b.commands().is_empty());
    }

    #[test]
    fn uniform_upload_needs_a_current_program() {
        let mut ctx = HeadlessContext::new();
        ctx.set_uniform_mat4(UniformLocation(0), &Mat4::IDENTITY);
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn mat4_upload_skips_smaller_uniforms() {
        const TINTED: &str = r#"
@group(0) @binding(0)
var<uniform> tint: vec4<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec3<f32>, @location(1) a_color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(a_position, 1.0);
    out.color = a_color * tint;
    return out;
}
"#;
        let mut ctx = HeadlessContext::new();
        let handle = ShaderProgramBuilder::new(TINTED, COLOR_FRAGMENT_SHADER)
            .require_uniform("tint")
            .build(&mut ctx)
            .unwrap();
        let tint = handle.uniform("tint").unwrap();
        let recorded = ctx.commands().len();

        ctx.set_uniform_mat4(tint, &Mat4::IDENTITY);
        assert_eq!(ctx.uniform_mat4(handle.id(), tint), None);
        assert_eq!(ctx.commands().len(), recorded);

        ctx.set_uniform_mat4(UniformLocation(7), &Mat4::IDENTITY);
        assert_eq!(ctx.commands().len(), recorded);
    }
}
