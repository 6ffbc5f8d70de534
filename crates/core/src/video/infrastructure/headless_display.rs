use crate::shared::frame::Frame;
use crate::video::domain::frame_display::FrameDisplay;

/// Display that shows nothing and never reports a key press.
///
/// Used with `--headless`, where the loop only ends at end-of-stream.
#[derive(Default)]
pub struct HeadlessDisplay {
    shown: usize,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames that would have been displayed.
    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl FrameDisplay for HeadlessDisplay {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        log::trace!("headless: skipping '{window}' frame {}", frame.index());
        self.shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, _delay_ms: i32) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        Ok(None)
    }

    fn close(&mut self) {}
}
