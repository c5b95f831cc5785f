//! Per-frame draw contract shared by every scene.

use std::time::Instant;

use crate::core::SurfaceRenderer;
use crate::coords::Viewport;
use crate::scene::{Mesh, Scene};
use crate::shader::{
    BuildError, ProgramHandle, ShaderProgramBuilder, COLOR_ATTRIBUTE, COLOR_ATTRIBUTE_INDEX,
    POSITION_ATTRIBUTE, POSITION_ATTRIBUTE_INDEX,
};
use crate::time::elapsed_between;

use super::context::{AttributeLocation, BufferId, ClearFlags, RenderContext};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    SurfaceReady,
    Sized,
    Rendering,
}

#[derive(Debug)]
struct Resources {
    program: ProgramHandle,
    vertices: BufferId,
    position: AttributeLocation,
    color: AttributeLocation,
}

/// Owns one program and one static vertex buffer inside a context and draws
/// `scene` with them.
#[derive(Debug)]
pub struct FrameRenderer<S> {
    scene: S,
    state: RendererState,
    resources: Option<Resources>,
    viewport: Option<Viewport>,
    origin: Option<Instant>,
}

impl<S: Scene> FrameRenderer<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            state: RendererState::Uninitialized,
            resources: None,
            viewport: None,
            origin: None,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn program(&self) -> Option<&ProgramHandle> {
        self.resources.as_ref().map(|r| &r.program)
    }

    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.resources.as_ref().map(|r| r.vertices)
    }

    fn build_resources(&self, ctx: &mut dyn RenderContext) -> Result<Resources, BuildError> {
        let scene = &self.scene;

        let mut builder = ShaderProgramBuilder::new(scene.vertex_shader(), scene.fragment_shader())
            .label(scene.label())
            .bind_attribute(POSITION_ATTRIBUTE_INDEX, POSITION_ATTRIBUTE)
            .bind_attribute(COLOR_ATTRIBUTE_INDEX, COLOR_ATTRIBUTE);
        for name in scene.required_uniforms() {
            builder = builder.require_uniform(name);
        }
        let program = builder.build(&mut *ctx)?;

        let (Some(position), Some(color)) =
            (program.attribute(POSITION_ATTRIBUTE), program.attribute(COLOR_ATTRIBUTE))
        else {
            ctx.delete_program(program.id());
            return Err(BuildError::missing(POSITION_ATTRIBUTE));
        };

        let vertices = ctx.create_vertex_buffer(scene.label(), scene.mesh().vertices());

        Ok(Resources {
            program,
            vertices,
            position,
            color,
        })
    }
}

impl<S: Scene> SurfaceRenderer for FrameRenderer<S> {
    fn on_surface_created(&mut self, ctx: &mut dyn RenderContext, now: Instant) -> Result<(), BuildError> {
        if self.resources.take().is_some() {
            // Ids from a lost context mean nothing in the new one.
            log::debug!("{}: surface re-created; previous resources forgotten", self.scene.label());
        }
        self.state = RendererState::Uninitialized;
        self.viewport = None;

        ctx.set_clear_color(self.scene.clear_color());
        ctx.set_raster_state(self.scene.raster_state());

        let resources = self.build_resources(ctx)?;
        log::info!(
            "{}: surface created ({} vertices, {} draw calls)",
            self.scene.label(),
            self.scene.mesh().vertex_count(),
            self.scene.draw_calls().len()
        );

        self.resources = Some(resources);
        self.origin = Some(now);
        self.state = RendererState::SurfaceReady;
        Ok(())
    }

    fn on_surface_changed(&mut self, ctx: &mut dyn RenderContext, width: u32, height: u32) {
        if self.state == RendererState::Uninitialized {
            log::warn!("{}: surface changed before it was created; ignored", self.scene.label());
            return;
        }

        let viewport = self.scene.resize(width, height);
        ctx.set_viewport(viewport);
        self.viewport = Some(viewport);

        if self.state == RendererState::SurfaceReady {
            self.state = RendererState::Sized;
        }
        log::debug!("{}: surface {width}x{height}, viewport {viewport:?}", self.scene.label());
    }

    fn on_draw_frame(&mut self, ctx: &mut dyn RenderContext, now: Instant) {
        let (Some(res), Some(origin)) = (self.resources.as_ref(), self.origin) else {
            log::warn!("{}: draw before surface creation; skipped", self.scene.label());
            return;
        };
        if !matches!(self.state, RendererState::Sized | RendererState::Rendering) {
            log::warn!("{}: draw before the first resize; skipped", self.scene.label());
            return;
        }

        ctx.clear(ClearFlags::ALL);
        self.scene.prepare_frame(ctx, &res.program, elapsed_between(origin, now));

        let layout = Mesh::LAYOUT;
        for call in self.scene.draw_calls() {
            ctx.set_vertex_attribute(res.position, layout.position_pointer(res.vertices));
            ctx.set_vertex_attribute(res.color, layout.color_pointer(res.vertices));
            ctx.draw_triangles(call.first, call.count);
        }

        self.state = RendererState::Rendering;
    }

    fn on_surface_destroyed(&mut self, ctx: &mut dyn RenderContext) {
        if let Some(res) = self.resources.take() {
            ctx.delete_buffer(res.vertices);
            ctx.delete_program(res.program.id());
            log::info!("{}: surface destroyed; resources released", self.scene.label());
        }
        self.state = RendererState::Uninitialized;
        self.viewport = None;
        self.origin = None;
    }
}
