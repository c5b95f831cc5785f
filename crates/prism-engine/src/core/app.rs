use std::time::Instant;

use crate::render::RenderContext;
use crate::shader::BuildError;

/// Lifecycle contract a host drives a renderer through.
///
/// Calls arrive strictly in sequence from one thread:
/// `on_surface_created`, then `on_surface_changed` on every resize, then
/// `on_draw_frame` once per redraw. `on_surface_destroyed` may be followed by
/// a new `on_surface_created`, possibly with a different context.
pub trait SurfaceRenderer {
    /// Builds context resources. An error is fatal for the host.
    fn on_surface_created(&mut self, ctx: &mut dyn RenderContext, now: Instant) -> Result<(), BuildError>;

    /// Size in physical pixels.
    fn on_surface_changed(&mut self, ctx: &mut dyn RenderContext, width: u32, height: u32);

    fn on_draw_frame(&mut self, ctx: &mut dyn RenderContext, now: Instant);

    /// Releases context resources while the context is still alive.
    fn on_surface_destroyed(&mut self, ctx: &mut dyn RenderContext) {
        let _ = ctx;
    }
}
