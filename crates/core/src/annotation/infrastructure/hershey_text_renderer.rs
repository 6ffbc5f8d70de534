use opencv::core::{Point, Scalar};
use opencv::imgproc;

use crate::annotation::domain::text_renderer::TextRenderer;
use crate::shared::frame::Frame;
use crate::video::infrastructure::mat_convert::{frame_to_mat, mat_to_frame};

const FONT_SCALE: f64 = 0.6;
const LINE_THICKNESS: i32 = 1;

/// Renders text with OpenCV's Hershey simplex font.
pub struct HersheyTextRenderer;

impl HersheyTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HersheyTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRenderer for HersheyTextRenderer {
    fn put_text(
        &self,
        frame: &mut Frame,
        text: &str,
        origin: (i32, i32),
        color: [u8; 3],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(());
        }
        let mut mat = frame_to_mat(frame)?;
        imgproc::put_text(
            &mut mat,
            text,
            Point::new(origin.0, origin.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            FONT_SCALE,
            Scalar::new(color[0] as f64, color[1] as f64, color[2] as f64, 0.0),
            LINE_THICKNESS,
            imgproc::LINE_8,
            false,
        )?;
        *frame = mat_to_frame(&mat, frame.index())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_changes_pixels_but_not_size() {
        let mut frame = Frame::filled(200, 40, 3, 0, 4);
        HersheyTextRenderer::new()
            .put_text(&mut frame, "12:00 :: 4", (20, 25), [255, 255, 255])
            .unwrap();
        assert_eq!(frame.dimensions(), (200, 40));
        assert_eq!(frame.index(), 4);
        assert!(frame.data().iter().any(|&b| b == 255));
    }
}
