use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Where a session pulls frames from.
///
/// Implementations wrap a camera device or a video file. The source is
/// opened once per session and released on every exit path.
pub trait FrameSource: Send {
    /// Opens the underlying device or file and returns its metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Reads the next frame, or `None` at end-of-stream.
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device or file handle. Safe to call more than once.
    fn release(&mut self);
}
