use crate::render::{AttribPointer, BufferId};

/// Sub-range of one attribute inside an interleaved vertex, in floats.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeRange {
    pub offset: u32,
    pub components: u8,
}

/// Interleaved vertex layout. Offsets and stride are counted in floats.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: u32,
    pub position: AttributeRange,
    pub color: AttributeRange,
}

impl VertexLayout {
    /// `x, y, z` followed by `r, g, b, a`.
    pub const POSITION_COLOR: VertexLayout = VertexLayout {
        stride: 7,
        position: AttributeRange { offset: 0, components: 3 },
        color: AttributeRange { offset: 3, components: 4 },
    };

    pub fn position_pointer(&self, buffer: BufferId) -> AttribPointer {
        self.pointer(buffer, self.position)
    }

    pub fn color_pointer(&self, buffer: BufferId) -> AttribPointer {
        self.pointer(buffer, self.color)
    }

    fn pointer(&self, buffer: BufferId, range: AttributeRange) -> AttribPointer {
        AttribPointer {
            buffer,
            components: range.components,
            offset: range.offset,
            stride: self.stride,
        }
    }
}

/// Static interleaved vertex data embedded in the binary.
#[derive(Debug, Copy, Clone)]
pub struct Mesh {
    vertices: &'static [f32],
}

impl Mesh {
    pub const LAYOUT: VertexLayout = VertexLayout::POSITION_COLOR;

    /// Panics (at compile time for `const` meshes) if `vertices` holds a partial vertex.
    pub const fn new(vertices: &'static [f32]) -> Self {
        assert!(
            vertices.len() % Self::LAYOUT.stride as usize == 0,
            "mesh length must be a multiple of the vertex stride"
        );
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &'static [f32] {
        self.vertices
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / Self::LAYOUT.stride as usize) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO: Mesh = Mesh::new(&[
        0.0, 1.0, 2.0, 0.1, 0.2, 0.3, 0.4, //
        3.0, 4.0, 5.0, 0.5, 0.6, 0.7, 0.8,
    ]);

    #[test]
    fn vertex_count_follows_stride() {
        assert_eq!(TWO.vertex_count(), 2);
        assert_eq!(TWO.vertices().len(), 14);
    }

    #[test]
    #[should_panic(expected = "multiple of the vertex stride")]
    fn partial_vertex_is_rejected() {
        let data: &'static [f32] = &[0.0; 8];
        let _ = Mesh::new(data);
    }

    #[test]
    fn pointers_share_stride() {
        let layout = Mesh::LAYOUT;
        let buffer = BufferId(1);
        let position = layout.position_pointer(buffer);
        let color = layout.color_pointer(buffer);

        assert_eq!((position.offset, position.components, position.stride), (0, 3, 7));
        assert_eq!((color.offset, color.components, color.stride), (3, 4, 7));
        assert_eq!(position.available_vertices(14), 2);
        assert_eq!(color.available_vertices(14), 2);
    }
}
