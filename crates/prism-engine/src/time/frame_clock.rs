use std::time::{Duration, Instant};

/// Timing for one redraw.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    pub frame_index: u64,
}

/// Per-window clock producing a `FrameTime` on every redraw.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    frame_index: u64,
}

impl FrameClock {
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let ft = FrameTime {
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

/// Absolute time between two instants, whichever comes first.
pub fn elapsed_between(origin: Instant, now: Instant) -> Duration {
    if now >= origin {
        now - origin
    } else {
        origin - now
    }
}
