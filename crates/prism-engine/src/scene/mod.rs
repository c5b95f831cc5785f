//! Scenes drawn by [`FrameRenderer`](crate::render::FrameRenderer).
//!
//! A scene supplies static data (shaders, mesh, draw calls, fixed raster
//! state) and the per-size and per-frame computations that differ between
//! the demos. The renderer owns everything that touches context resources.

mod camera;
mod mesh;
mod pyramid;
mod triangle;

use std::time::Duration;

use crate::coords::{Color, Viewport};
use crate::render::{RasterState, RenderContext};
use crate::shader::{ProgramHandle, COLOR_FRAGMENT_SHADER};

pub use camera::{projection, OrbitCamera, FAR, NEAR};
pub use mesh::{AttributeRange, Mesh, VertexLayout};
pub use pyramid::{BaseFan, PyramidConfig, PyramidScene, PYRAMID_MESH};
pub use triangle::{TriangleScene, TRIANGLE_MESH};

/// One `draw_triangles(first, count)` call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub first: u32,
    pub count: u32,
}

impl DrawCall {
    pub const fn new(first: u32, count: u32) -> Self {
        Self { first, count }
    }
}

pub trait Scene {
    /// Name used in logs and GPU object labels.
    fn label(&self) -> &'static str;

    fn vertex_shader(&self) -> &'static str;

    fn fragment_shader(&self) -> &'static str {
        COLOR_FRAGMENT_SHADER
    }

    /// Uniforms the program must expose.
    fn required_uniforms(&self) -> &'static [&'static str] {
        &[]
    }

    fn mesh(&self) -> &Mesh;

    fn clear_color(&self) -> Color;

    fn raster_state(&self) -> RasterState {
        RasterState::default()
    }

    /// Recomputes size-dependent state and returns the viewport to use.
    fn resize(&mut self, width: u32, height: u32) -> Viewport;

    fn draw_calls(&self) -> &[DrawCall];

    /// Uploads per-frame uniforms. `elapsed` is measured from surface creation.
    fn prepare_frame(&mut self, ctx: &mut dyn RenderContext, program: &ProgramHandle, elapsed: Duration) {
        let _ = (ctx, program, elapsed);
    }
}
