use std::path::{Path, PathBuf};

use opencv::core::Size;
use opencv::prelude::*;
use opencv::videoio;

use crate::shared::constants::{OUTPUT_FOURCC, OUTPUT_FPS};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes BGR frames with OpenCV's `VideoWriter`.
///
/// Every frame must match the size the writer was opened with; OpenCV
/// silently drops mismatched frames, so the check happens here.
pub struct OpenCvVideoWriter {
    fourcc: [char; 4],
    fps: Option<f64>,
    writer: Option<videoio::VideoWriter>,
    output_path: Option<PathBuf>,
    size: (u32, u32),
    frames_written: usize,
}

impl OpenCvVideoWriter {
    pub fn new() -> Self {
        Self {
            fourcc: OUTPUT_FOURCC,
            fps: None,
            writer: None,
            output_path: None,
            size: (0, 0),
            frames_written: 0,
        }
    }

    pub fn with_fourcc(mut self, fourcc: [char; 4]) -> Self {
        self.fourcc = fourcc;
        self
    }

    /// Overrides the source frame rate.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl Default for OpenCvVideoWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoWriter for OpenCvVideoWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let fps = match self.fps {
            Some(fps) => fps,
            None if metadata.fps > 0.0 => metadata.fps,
            None => OUTPUT_FPS,
        };
        let [a, b, c, d] = self.fourcc;
        let code = videoio::VideoWriter::fourcc(a, b, c, d)?;
        let path_str = path
            .to_str()
            .ok_or_else(|| format!("Invalid output path: {}", path.display()))?;

        let writer = videoio::VideoWriter::new(
            path_str,
            code,
            fps,
            Size::new(metadata.width as i32, metadata.height as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(format!("Cannot open video writer: {}", path.display()).into());
        }
        log::info!(
            "Writing {}x{} @ {fps:.1} fps to {}",
            metadata.width,
            metadata.height,
            path.display()
        );

        self.writer = Some(writer);
        self.output_path = Some(path.to_path_buf());
        self.size = (metadata.width, metadata.height);
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let writer = self.writer.as_mut().ok_or("Video writer not opened")?;
        if frame.dimensions() != self.size {
            return Err(format!(
                "Frame {} is {}x{}, writer expects {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.size.0,
                self.size.1
            )
            .into());
        }
        if frame.channels() != 3 {
            return Err(format!("Expected a 3-channel frame, got {}", frame.channels()).into());
        }
        let mat = super::mat_convert::frame_to_mat(frame)?;
        writer.write(&mat)?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut writer) = self.writer.take() {
            writer.release()?;
            if let Some(path) = &self.output_path {
                log::info!("Wrote {} frames to {}", self.frames_written, path.display());
            }
        }
        Ok(())
    }
}

impl Drop for OpenCvVideoWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to release video writer: {e}");
        }
    }
}
