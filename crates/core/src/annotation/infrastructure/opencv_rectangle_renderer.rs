use opencv::core::{Point, Scalar};
use opencv::imgproc;

use crate::annotation::domain::region_renderer::RegionRenderer;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::video::infrastructure::mat_convert::{frame_to_mat, mat_to_frame};

/// Draws boxes with `cv::rectangle`.
pub struct OpenCvRectangleRenderer;

impl OpenCvRectangleRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenCvRectangleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionRenderer for OpenCvRectangleRenderer {
    fn draw(
        &self,
        frame: &mut Frame,
        regions: &[Region],
        color: [u8; 3],
        thickness: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if regions.is_empty() || thickness == 0 || frame.is_empty() {
            return Ok(());
        }
        let mut mat = frame_to_mat(frame)?;
        let color = Scalar::new(color[0] as f64, color[1] as f64, color[2] as f64, 0.0);
        for r in regions {
            imgproc::rectangle_points(
                &mut mat,
                Point::new(r.x, r.y),
                Point::new(r.x.saturating_add(r.width), r.y.saturating_add(r.height)),
                color,
                thickness as i32,
                imgproc::LINE_8,
                0,
            )?;
        }
        *frame = mat_to_frame(&mat, frame.index())?;
        Ok(())
    }
}
