//! Rendering.
//!
//! [`RenderContext`] is the explicit GPU context renderers draw through.
//! [`HeadlessContext`] records commands in memory; [`WgpuContext`] replays
//! them onto a window surface. [`FrameRenderer`] drives a scene through the
//! host lifecycle.

mod context;
mod ctx;
mod frame;
mod gpu_context;
mod headless;

pub use context::{
    AttribPointer, AttributeLocation, BufferId, ClearFlags, CullFace, Culling, DepthCompare,
    DepthTest, FrontFace, ProgramId, RasterState, RenderContext, UniformLocation,
};
pub use ctx::RenderTarget;
pub use frame::{FrameRenderer, RendererState};
pub use gpu_context::WgpuContext;
pub use headless::{Command, HeadlessContext, RecordedDraw};
