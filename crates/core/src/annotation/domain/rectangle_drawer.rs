use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::region_renderer::RegionRenderer;

/// [`RegionRenderer`] writing pixels directly, for builds without OpenCV.
///
/// A one-pixel border is identical to `cv::rectangle`. Thicker borders are
/// centred on the edge with square corners, where OpenCV rounds them.
pub struct PixelRectangleDrawer;

impl RegionRenderer for PixelRectangleDrawer {
    fn draw(
        &self,
        frame: &mut Frame,
        regions: &[Region],
        color: [u8; 3],
        thickness: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        draw_regions(frame, regions, color, thickness);
        Ok(())
    }
}

/// Outlines each region with a `thickness`-pixel border of `color`, in place.
///
/// Parts of a border outside the frame are dropped. Extra colour
/// components beyond the frame's channel count are ignored.
pub fn draw_regions(frame: &mut Frame, regions: &[Region], color: [u8; 3], thickness: u32) {
    if regions.is_empty() || thickness == 0 || frame.is_empty() {
        return;
    }
    let (width, height) = frame.dimensions();
    let channels = (frame.channels() as usize).min(color.len());
    let half = (thickness / 2) as i32;
    let mut pixels = frame.as_ndarray_mut();

    for region in regions {
        let (x1, y1) = (region.x, region.y);
        let (x2, y2) = (
            region.x.saturating_add(region.width),
            region.y.saturating_add(region.height),
        );
        let outer = Region::new(
            x1 - half,
            y1 - half,
            x2 - x1 + 2 * half + 1,
            y2 - y1 + 2 * half + 1,
        );
        let Some(visible) = outer.clamp_to(width, height) else {
            continue;
        };

        for y in visible.y..visible.y + visible.height {
            for x in visible.x..visible.x + visible.width {
                let on_border = (y - y1).abs() <= half
                    || (y - y2).abs() <= half
                    || (x - x1).abs() <= half
                    || (x - x2).abs() <= half;
                if !on_border {
                    continue;
                }
                for (c, &value) in color.iter().enumerate().take(channels) {
                    pixels[[y as usize, x as usize, c]] = value;
                }
            }
        }
    }
}
