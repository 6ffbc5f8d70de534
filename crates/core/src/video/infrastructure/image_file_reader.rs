use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Decodes image files with the `image` crate into BGR frames.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        let bgr: Vec<u8> = img
            .into_raw()
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[2], rgb[1], rgb[0]])
            .collect();
        Ok(Frame::new(bgr, width, height, 3, index))
    }
}
