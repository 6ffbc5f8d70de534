use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Outlines detection boxes onto a frame in place.
pub trait RegionRenderer: Send {
    /// Each region is drawn from its top-left corner `(x, y)` to
    /// `(x + width, y + height)`, both inclusive. `color` is per channel in
    /// frame order.
    fn draw(
        &self,
        frame: &mut Frame,
        regions: &[Region],
        color: [u8; 3],
        thickness: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
