/// What the runtime should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; the next redraw may succeed.
    Reconfigured,
    SkipFrame,
    /// Unrecoverable (typically out of memory); the runtime exits.
    Fatal,
}
