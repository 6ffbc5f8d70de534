use std::collections::HashSet;

use opencv::highgui;

use crate::shared::frame::Frame;
use crate::video::domain::frame_display::FrameDisplay;

use super::mat_convert::frame_to_mat;

/// Shows frames in OpenCV HighGUI windows, creating each window on first use.
#[derive(Default)]
pub struct HighguiDisplay {
    windows: HashSet<String>,
}

impl HighguiDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameDisplay for HighguiDisplay {
    fn show(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if !self.windows.contains(window) {
            highgui::named_window(window, highgui::WINDOW_AUTOSIZE)?;
            self.windows.insert(window.to_string());
        }
        let mat = frame_to_mat(frame)?;
        highgui::imshow(window, &mat)?;
        Ok(())
    }

    fn poll_key(&mut self, delay_ms: i32) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        let key = highgui::wait_key(delay_ms)?;
        Ok((key >= 0).then_some(key & 0xFF))
    }

    fn close(&mut self) {
        if self.windows.is_empty() {
            return;
        }
        if let Err(e) = highgui::destroy_all_windows() {
            log::warn!("Failed to close display windows: {e}");
        }
        self.windows.clear();
    }
}

impl Drop for HighguiDisplay {
    fn drop(&mut self) {
        self.close();
    }
}
