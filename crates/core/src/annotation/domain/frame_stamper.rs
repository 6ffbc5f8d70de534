use chrono::{DateTime, Local};

use crate::shared::constants::{TIMESTAMP_COLOR, TIMESTAMP_FORMAT, TIMESTAMP_ORIGIN};
use crate::shared::frame::Frame;

use super::text_renderer::TextRenderer;

pub type Clock = Box<dyn Fn() -> DateTime<Local> + Send>;

/// Overlay text for a captured frame: wall-clock time and frame number.
pub fn frame_label(time: &DateTime<Local>, index: usize) -> String {
    format!("{} :: {index}", time.format(TIMESTAMP_FORMAT))
}

/// Stamps each frame with the current time and its index.
pub struct FrameStamper {
    renderer: Box<dyn TextRenderer>,
    clock: Clock,
}

impl FrameStamper {
    pub fn new(renderer: Box<dyn TextRenderer>) -> Self {
        Self::with_clock(renderer, Box::new(Local::now))
    }

    pub fn with_clock(renderer: Box<dyn TextRenderer>, clock: Clock) -> Self {
        Self { renderer, clock }
    }

    pub fn stamp(&self, frame: &mut Frame) -> Result<(), Box<dyn std::error::Error>> {
        let label = frame_label(&(self.clock)(), frame.index());
        self.renderer
            .put_text(frame, &label, TIMESTAMP_ORIGIN, TIMESTAMP_COLOR)
    }
}
