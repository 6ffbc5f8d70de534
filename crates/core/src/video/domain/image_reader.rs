use std::path::Path;

use crate::shared::frame::Frame;

/// Loads a single image file as a BGR frame.
pub trait ImageReader: Send {
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;
}
