//! Contracts between the host runtime and renderers.

mod app;

pub use app::SurfaceRenderer;
