//! GPU device and window surface.
//!
//! - creates the wgpu Instance/Adapter/Device/Queue
//! - configures the surface and keeps a depth-stencil target sized to it
//! - acquires frames and maps surface errors to actions

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
