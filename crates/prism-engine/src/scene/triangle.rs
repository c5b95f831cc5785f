use crate::coords::{Color, Viewport};
use crate::shader::TRIANGLE_VERTEX_SHADER;

use super::{DrawCall, Mesh, Scene};

/// A single red triangle, already in clip space.
pub const TRIANGLE_MESH: Mesh = Mesh::new(&[
    -0.5, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, //
    0.5, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, //
    0.0, 0.5, -1.0, 1.0, 0.0, 0.0, 1.0,
]);

const DRAWS: [DrawCall; 1] = [DrawCall::new(0, 3)];

/// Static triangle on a blue background inside a square viewport.
#[derive(Debug, Default, Copy, Clone)]
pub struct TriangleScene;

impl TriangleScene {
    /// Square viewport of side `min(width, height)`, centered in the surface.
    pub fn square_viewport(width: u32, height: u32) -> Viewport {
        let max = width.max(height);
        let size = width.min(height);
        Viewport::new(
            ((max - height) / 2) as i32,
            ((max - width) / 2) as i32,
            size,
            size,
        )
    }
}

impl Scene for TriangleScene {
    fn label(&self) -> &'static str {
        "triangle"
    }

    fn vertex_shader(&self) -> &'static str {
        TRIANGLE_VERTEX_SHADER
    }

    fn mesh(&self) -> &Mesh {
        &TRIANGLE_MESH
    }

    fn clear_color(&self) -> Color {
        Color::BLUE
    }

    fn resize(&mut self, width: u32, height: u32) -> Viewport {
        Self::square_viewport(width, height)
    }

    fn draw_calls(&self) -> &[DrawCall] {
        &DRAWS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_centered_square() {
        assert_eq!(TriangleScene::square_viewport(800, 600), Viewport::new(100, 0, 600, 600));
        assert_eq!(TriangleScene::square_viewport(600, 800), Viewport::new(0, 100, 600, 600));
        assert_eq!(TriangleScene::square_viewport(500, 500), Viewport::new(0, 0, 500, 500));
    }

    #[test]
    fn zero_sized_surface_gives_empty_viewport() {
        assert!(TriangleScene::square_viewport(0, 600).is_empty());
    }

    #[test]
    fn mesh_has_three_vertices() {
        assert_eq!(TRIANGLE_MESH.vertex_count(), 3);
        assert_eq!(TriangleScene.draw_calls(), &[DrawCall::new(0, 3)]);
    }
}
