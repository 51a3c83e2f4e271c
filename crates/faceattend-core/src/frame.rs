/// One encoded camera still, alive only for the duration of a single
/// recognition call.
#[derive(Debug, Clone)]
pub struct StillFrame {
    /// JPEG-encoded image bytes.
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Capability wrapper over the current camera still.
///
/// `capture_still` must not block beyond a frame interval and has no side
/// effects beyond reading the camera buffer. `None` means the camera is
/// inactive, not yet ready, or produced an unusable frame — callers treat
/// it as "skip this tick", never as an error.
pub trait FrameSource: Send + 'static {
    fn capture_still(&mut self) -> Option<StillFrame>;
}
