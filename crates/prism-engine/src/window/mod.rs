//! Window and event loop.
//!
//! Owns the `winit` event loop and window, wires them to the GPU layer and
//! drives a `SurfaceRenderer` through the surface lifecycle.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
