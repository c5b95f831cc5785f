use std::time::Duration;

use glam::Mat4;

use crate::coords::{Color, Viewport};
use crate::render::{
    Culling, CullFace, DepthCompare, DepthTest, FrontFace, RasterState, RenderContext,
};
use crate::shader::{ProgramHandle, MVP_UNIFORM, PYRAMID_VERTEX_SHADER};

use super::camera::{self, OrbitCamera};
use super::{DrawCall, Mesh, Scene};

/// Four colored sides followed by a gray base given as a five-vertex strip.
pub const PYRAMID_MESH: Mesh = Mesh::new(&[
    // blue
    -1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, //
    -1.0, -1.0, 0.0, 0.0, 0.0, 1.0, 1.0, //
    0.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, //
    // green
    -1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0, //
    1.0, -1.0, 0.0, 0.0, 1.0, 0.0, 1.0, //
    0.0, 0.0, 2.0, 0.0, 1.0, 0.0, 1.0, //
    // red
    1.0, -1.0, 0.0, 1.0, 0.0, 0.0, 1.0, //
    1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, //
    0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 1.0, //
    // yellow
    1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, //
    -1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, //
    0.0, 0.0, 2.0, 1.0, 1.0, 0.0, 1.0, //
    // base
    1.0, 1.0, 0.0, 0.5, 0.5, 0.5, 1.0, //
    1.0, -1.0, 0.0, 0.5, 0.5, 0.5, 1.0, //
    -1.0, -1.0, 0.0, 0.5, 0.5, 0.5, 1.0, //
    -1.0, 1.0, 0.0, 0.5, 0.5, 0.5, 1.0, //
    1.0, 1.0, 0.0, 0.5, 0.5, 0.5, 1.0,
]);

const SIDES: [DrawCall; 4] = [
    DrawCall::new(0, 3),
    DrawCall::new(3, 3),
    DrawCall::new(6, 3),
    DrawCall::new(9, 3),
];

/// How the base strip is split into draw calls.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum BaseFan {
    /// Two whole triangles, `(12, 3)` and `(14, 3)`.
    #[default]
    Corrected,
    /// `(12, 4)` and `(14, 4)`. The second call runs one vertex past the mesh;
    /// backends drop the partial triangles, which rasterizes the same base.
    Legacy,
}

impl BaseFan {
    fn draws(self) -> [DrawCall; 2] {
        match self {
            BaseFan::Corrected => [DrawCall::new(12, 3), DrawCall::new(14, 3)],
            BaseFan::Legacy => [DrawCall::new(12, 4), DrawCall::new(14, 4)],
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PyramidConfig {
    pub base: BaseFan,
}

/// Pyramid viewed by an orbiting camera, depth tested and back-face culled.
#[derive(Debug, Clone)]
pub struct PyramidScene {
    camera: OrbitCamera,
    projection: Mat4,
    draws: [DrawCall; 6],
}

impl PyramidScene {
    pub fn new(config: PyramidConfig) -> Self {
        let [base0, base1] = config.base.draws();
        let [s0, s1, s2, s3] = SIDES;
        Self {
            camera: OrbitCamera::default(),
            projection: Mat4::IDENTITY,
            draws: [s0, s1, s2, s3, base0, base1],
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn mvp(&self, elapsed: Duration) -> Mat4 {
        self.projection * self.camera.view(elapsed)
    }
}

impl Default for PyramidScene {
    fn default() -> Self {
        Self::new(PyramidConfig::default())
    }
}

impl Scene for PyramidScene {
    fn label(&self) -> &'static str {
        "pyramid"
    }

    fn vertex_shader(&self) -> &'static str {
        PYRAMID_VERTEX_SHADER
    }

    fn required_uniforms(&self) -> &'static [&'static str] {
        &[MVP_UNIFORM]
    }

    fn mesh(&self) -> &Mesh {
        &PYRAMID_MESH
    }

    fn clear_color(&self) -> Color {
        Color::BLACK
    }

    fn raster_state(&self) -> RasterState {
        RasterState {
            depth: Some(DepthTest {
                compare: DepthCompare::LessEqual,
                write: true,
            }),
            culling: Some(Culling {
                front_face: FrontFace::Ccw,
                cull_face: CullFace::Back,
            }),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Viewport {
        match camera::projection(width, height) {
            Some(p) => self.projection = p,
            None => log::debug!("pyramid: zero-height surface; keeping previous projection"),
        }
        Viewport::full(width, height)
    }

    fn draw_calls(&self) -> &[DrawCall] {
        &self.draws
    }

    fn prepare_frame(&mut self, ctx: &mut dyn RenderContext, program: &ProgramHandle, elapsed: Duration) {
        match program.uniform(MVP_UNIFORM) {
            Some(location) => ctx.set_uniform_mat4(location, &self.mvp(elapsed)),
            None => log::warn!("pyramid: program has no `{MVP_UNIFORM}` uniform"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(scene: &PyramidScene) -> Vec<u32> {
        scene.draw_calls().iter().map(|d| d.count).collect()
    }

    #[test]
    fn mesh_is_four_sides_and_a_base_strip() {
        assert_eq!(PYRAMID_MESH.vertex_count(), 17);
    }

    #[test]
    fn corrected_base_stays_inside_the_mesh() {
        let scene = PyramidScene::default();
        assert_eq!(counts(&scene), vec![3, 3, 3, 3, 3, 3]);
        for d in scene.draw_calls() {
            assert!(d.first + d.count <= PYRAMID_MESH.vertex_count());
        }
    }

    #[test]
    fn legacy_base_uses_four_vertex_calls() {
        let scene = PyramidScene::new(PyramidConfig { base: BaseFan::Legacy });
        assert_eq!(counts(&scene), vec![3, 3, 3, 3, 4, 4]);
        assert_eq!(scene.draw_calls()[5], DrawCall::new(14, 4));
    }

    #[test]
    fn zero_height_keeps_projection() {
        let mut scene = PyramidScene::default();
        scene.resize(800, 600);
        let before = scene.projection();

        let vp = scene.resize(800, 0);
        assert_eq!(scene.projection(), before);
        assert_eq!(vp, Viewport::full(800, 0));
    }

    #[test]
    fn resize_is_idempotent() {
        let mut scene = PyramidScene::default();
        let a = scene.resize(1024, 768);
        let pa = scene.projection();
        let b = scene.resize(1024, 768);
        assert_eq!(a, b);
        assert_eq!(pa, scene.projection());
    }

    #[test]
    fn apex_lies_inside_clip_volume() {
        let mut scene = PyramidScene::default();
        scene.resize(800, 600);
        let clip = scene.mvp(Duration::from_millis(123)) * glam::Vec4::new(0.0, 0.0, 2.0, 1.0);
        assert!(clip.w > 0.0);
        for c in clip.truncate().to_array() {
            assert!(c.abs() <= clip.w, "{clip:?}");
        }
    }
}
