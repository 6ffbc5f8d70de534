use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for object detection on a single frame.
///
/// `&mut self` because classifier backends keep scratch buffers between
/// calls.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
