use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to image files using the `image` crate.
///
/// Single-channel frames are saved as grayscale; three-channel frames are
/// converted from BGR to RGB on the way out.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match frame.channels() {
            1 => {
                let img =
                    image::GrayImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                        .ok_or("Failed to create grayscale image from frame data")?;
                img.save(path)?;
            }
            3 => {
                let rgb: Vec<u8> = frame
                    .data()
                    .chunks_exact(3)
                    .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]])
                    .collect();
                let img = image::RgbImage::from_raw(frame.width(), frame.height(), rgb)
                    .ok_or("Failed to create image from frame data")?;
                img.save(path)?;
            }
            n => return Err(format!("Unsupported channel count for image output: {n}").into()),
        }
        Ok(())
    }
}
