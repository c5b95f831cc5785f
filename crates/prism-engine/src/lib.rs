//! Prism engine crate.
//!
//! Shader-program building, the per-frame draw contract and the scenes it
//! draws, plus the window/GPU runtime that hosts them.

pub mod coords;
pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod scene;
pub mod shader;
pub mod time;
pub mod window;
