use crate::shared::frame::Frame;

/// On-screen presentation of frames plus the key poll used for cancellation.
pub trait FrameDisplay: Send {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `delay_ms` for a key press and returns its code, if any.
    fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, Box<dyn std::error::Error>>;

    /// Closes every window this display opened. Safe to call more than once.
    fn close(&mut self);
}
