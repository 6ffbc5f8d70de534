use std::path::PathBuf;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

use super::mat_convert::mat_to_frame;

#[derive(Clone, Debug, PartialEq)]
pub enum CaptureTarget {
    Camera(i32),
    File(PathBuf),
}

/// Camera or video-file source backed by OpenCV's `VideoCapture`.
pub struct OpenCvCapture {
    target: CaptureTarget,
    requested_size: Option<(u32, u32)>,
    capture: Option<VideoCapture>,
    frame_index: usize,
}

impl OpenCvCapture {
    pub fn camera(index: i32) -> Self {
        Self::new(CaptureTarget::Camera(index))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(CaptureTarget::File(path.into()))
    }

    fn new(target: CaptureTarget) -> Self {
        Self {
            target,
            requested_size: None,
            capture: None,
            frame_index: 0,
        }
    }

    /// Asks the device for a capture resolution. Cameras may ignore it; the
    /// metadata returned by `open` reports what was actually negotiated.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.requested_size = Some((width, height));
        self
    }

    fn open_capture(&self) -> Result<VideoCapture, Box<dyn std::error::Error>> {
        let cap = match &self.target {
            CaptureTarget::Camera(index) => VideoCapture::new(*index, videoio::CAP_ANY)?,
            CaptureTarget::File(path) => {
                let path_str = path
                    .to_str()
                    .ok_or_else(|| format!("Invalid video path: {}", path.display()))?;
                VideoCapture::from_file(path_str, videoio::CAP_ANY)?
            }
        };
        if !cap.is_opened()? {
            return Err(match &self.target {
                CaptureTarget::Camera(index) => format!("Cannot open camera #{index}"),
                CaptureTarget::File(path) => format!("Cannot open video file: {}", path.display()),
            }
            .into());
        }
        Ok(cap)
    }
}

impl FrameSource for OpenCvCapture {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let mut cap = self.open_capture()?;

        if let Some((w, h)) = self.requested_size {
            cap.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
            cap.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }

        let total = cap.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let metadata = VideoMetadata {
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32,
            fps: cap.get(videoio::CAP_PROP_FPS)?,
            total_frames: if total > 0.0 { total as usize } else { 0 },
            codec: decode_fourcc(cap.get(videoio::CAP_PROP_FOURCC)?),
            source_path: match &self.target {
                CaptureTarget::Camera(_) => None,
                CaptureTarget::File(path) => Some(path.clone()),
            },
        };
        log::info!(
            "Opened {:?}: {}x{} @ {:.1} fps",
            self.target,
            metadata.width,
            metadata.height,
            metadata.fps
        );

        self.capture = Some(cap);
        self.frame_index = 0;
        Ok(metadata)
    }

    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let cap = self.capture.as_mut().ok_or("Capture source not opened")?;
        let mut mat = Mat::default();
        if !cap.read(&mut mat)? || mat.empty() {
            return Ok(None);
        }
        let frame = mat_to_frame(&mat, self.frame_index)?;
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        if let Some(mut cap) = self.capture.take() {
            if let Err(e) = cap.release() {
                log::warn!("Failed to release {:?}: {e}", self.target);
            } else {
                log::debug!("Released {:?}", self.target);
            }
        }
    }
}

impl Drop for OpenCvCapture {
    fn drop(&mut self) {
        self.release();
    }
}

/// Decodes the little-endian four-character code OpenCV reports as a double.
fn decode_fourcc(code: f64) -> String {
    let code = code as u32;
    (0..4)
        .map(|i| ((code >> (8 * i)) & 0xFF) as u8 as char)
        .filter(|c| c.is_ascii_graphic())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fourcc() {
        let code = u32::from_le_bytes(*b"mp4v") as f64;
        assert_eq!(decode_fourcc(code), "mp4v");
    }

    #[test]
    fn test_decode_fourcc_zero_is_empty() {
        assert_eq!(decode_fourcc(0.0), "");
    }

    #[test]
    fn test_open_missing_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = OpenCvCapture::file(dir.path().join("missing.mp4"));
        assert!(source.open().is_err());
    }

    #[test]
    fn test_read_without_open_returns_error() {
        let mut source = OpenCvCapture::file("unused.mp4");
        assert!(source.read().is_err());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut source = OpenCvCapture::camera(0).with_size(640, 480);
        source.release();
        source.release();
    }
}
