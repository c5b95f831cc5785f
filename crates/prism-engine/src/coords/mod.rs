//! Color and viewport types shared by the renderers and backends.
//!
//! Viewports are physical pixels with a bottom-left origin. Matrices are
//! `glam` types built with the `_gl` constructors (depth in `[-w, w]`).

mod color;
mod viewport;

pub use color::Color;
pub use viewport::{TargetRect, Viewport};
