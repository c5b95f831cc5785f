/// Viewport rectangle in physical pixels.
///
/// Origin follows the GL convention: `(x, y)` is the bottom-left corner of the
/// rectangle, measured from the bottom-left corner of the surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a whole `width` x `height` surface.
    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Converts to wgpu's top-left origin on a `target` of `(width, height)`
    /// pixels.
    ///
    /// The viewport keeps its full size so the NDC mapping matches GL even when
    /// it hangs over the target edge; the scissor covers the visible part.
    /// Returns `None` when nothing of the viewport lies inside the target.
    pub fn to_top_left(self, target: (u32, u32)) -> Option<TargetRect> {
        let (tw, th) = (target.0 as i64, target.1 as i64);

        // Flip the bottom-left origin into top-left space.
        let top = th - (self.y as i64 + self.height as i64);

        let x0 = (self.x as i64).clamp(0, tw);
        let x1 = (self.x as i64 + self.width as i64).clamp(0, tw);
        let y0 = top.clamp(0, th);
        let y1 = (top + self.height as i64).clamp(0, th);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(TargetRect {
            viewport: [self.x as f32, top as f32, self.width as f32, self.height as f32],
            scissor: [x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32],
        })
    }
}

/// A [`Viewport`] placed on a render target with a top-left origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TargetRect {
    /// `(x, y, width, height)` for `set_viewport`; may extend past the target.
    pub viewport: [f32; 4],
    /// `(x, y, width, height)` for `set_scissor_rect`; always inside the target.
    pub scissor: [u32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_surface_maps_to_itself() {
        let rect = Viewport::full(800, 600).to_top_left((800, 600)).unwrap();
        assert_eq!(rect.viewport, [0.0, 0.0, 800.0, 600.0]);
        assert_eq!(rect.scissor, [0, 0, 800, 600]);
    }

    #[test]
    fn bottom_left_origin_is_flipped() {
        // 600x600 square lifted 100px from the bottom of a 600x800 surface.
        let rect = Viewport::new(0, 100, 600, 600).to_top_left((600, 800)).unwrap();
        assert_eq!(rect.viewport, [0.0, 100.0, 600.0, 600.0]);
        assert_eq!(rect.scissor, [0, 100, 600, 600]);

        let rect = Viewport::new(0, 0, 100, 100).to_top_left((200, 300)).unwrap();
        assert_eq!(rect.viewport, [0.0, 200.0, 100.0, 100.0]);
    }

    #[test]
    fn oversized_viewport_keeps_its_mapping() {
        let rect = Viewport::new(-50, 0, 200, 100).to_top_left((100, 100)).unwrap();
        assert_eq!(rect.viewport, [-50.0, 0.0, 200.0, 100.0]);
        assert_eq!(rect.scissor, [0, 0, 100, 100]);

        // Hangs off the top: top-left y goes negative, scissor starts at 0.
        let rect = Viewport::new(0, 50, 100, 100).to_top_left((100, 100)).unwrap();
        assert_eq!(rect.viewport, [0.0, -50.0, 100.0, 100.0]);
        assert_eq!(rect.scissor, [0, 0, 100, 50]);
    }

    #[test]
    fn disjoint_or_empty_viewport_is_rejected() {
        assert_eq!(Viewport::new(500, 0, 10, 10).to_top_left((100, 100)), None);
        assert_eq!(Viewport::new(0, 0, 0, 10).to_top_left((100, 100)), None);
        assert!(Viewport::new(0, 0, 0, 10).is_empty());
    }
}
