//! Frame timing.
//!
//! - one `FrameClock` per window, ticked once per redraw
//! - `FrameTime::now` is the timestamp renderers animate against

mod frame_clock;

pub use frame_clock::{elapsed_between, FrameClock, FrameTime};
