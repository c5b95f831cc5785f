use glam::Mat4;

use crate::coords::{Color, Viewport};
use crate::shader::{BuildError, LinkedProgram};

/// Linked program living inside a [`RenderContext`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u32);

/// Vertex buffer living inside a [`RenderContext`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

/// Vertex-input slot of a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// Index into the uniform table of a linked program.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Which buffers `clear` resets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

impl ClearFlags {
    pub const ALL: ClearFlags = ClearFlags { color: true, depth: true, stencil: true };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    Less,
    LessEqual,
}

/// Depth test configuration. Disabled depth testing also disables depth writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DepthTest {
    pub compare: DepthCompare,
    pub write: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Ccw,
    Cw,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Culling {
    pub front_face: FrontFace,
    pub cull_face: CullFace,
}

/// Fixed-function rasterizer state. `Default` means no depth test and no culling.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub depth: Option<DepthTest>,
    pub culling: Option<Culling>,
}

/// Source of one vertex attribute inside an interleaved float buffer.
///
/// `offset` and `stride` are counted in floats, not bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttribPointer {
    pub buffer: BufferId,
    pub components: u8,
    pub offset: u32,
    pub stride: u32,
}

impl AttribPointer {
    /// Number of whole vertices this pointer can fetch from a buffer of `len` floats.
    pub fn available_vertices(&self, len: u32) -> u32 {
        let needed = self.offset + self.components as u32;
        if self.stride == 0 || len < needed {
            return 0;
        }
        (len - needed) / self.stride + 1
    }
}

/// Bytes taken by a `mat4x4<f32>` uniform.
pub(crate) const MAT4_BYTES: u32 = std::mem::size_of::<Mat4>() as u32;

/// Explicit GPU context.
///
/// All state that a GL-style API keeps globally (current program, attribute
/// sources, viewport, clear color) lives in the implementor, so several
/// contexts can coexist in one process. Methods must only be called from the
/// thread that owns the context.
pub trait RenderContext {
    /// Registers a linked program. Backends may still refuse it.
    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, BuildError>;

    fn delete_program(&mut self, program: ProgramId);

    /// Makes `program` current for uniform uploads and draw calls.
    fn use_program(&mut self, program: ProgramId);

    /// Uploads `data` once into an immutable vertex buffer.
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferId;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn set_clear_color(&mut self, color: Color);

    fn set_raster_state(&mut self, state: RasterState);

    fn set_viewport(&mut self, viewport: Viewport);

    fn clear(&mut self, flags: ClearFlags);

    /// Points (and enables) the attribute at `location` at a buffer sub-range.
    fn set_vertex_attribute(&mut self, location: AttributeLocation, pointer: AttribPointer);

    /// Uploads a matrix to a uniform of the current program. Uniforms smaller
    /// than a matrix are left untouched with a warning.
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// Draws `count` vertices starting at `first` as a triangle list with the
    /// current program and attribute sources.
    fn draw_triangles(&mut self, first: u32, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_vertices_counts_whole_fetches() {
        // 17 interleaved vertices of 7 floats.
        let position = AttribPointer { buffer: BufferId(0), components: 3, offset: 0, stride: 7 };
        let color = AttribPointer { buffer: BufferId(0), components: 4, offset: 3, stride: 7 };
        assert_eq!(position.available_vertices(17 * 7), 17);
        assert_eq!(color.available_vertices(17 * 7), 17);
    }

    #[test]
    fn available_vertices_handles_short_buffers() {
        let color = AttribPointer { buffer: BufferId(0), components: 4, offset: 3, stride: 7 };
        assert_eq!(color.available_vertices(6), 0);
        assert_eq!(color.available_vertices(7), 1);

        let zero_stride = AttribPointer { stride: 0, ..color };
        assert_eq!(zero_stride.available_vertices(100), 0);
    }
}
