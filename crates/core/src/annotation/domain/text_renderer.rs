use crate::shared::frame::Frame;

/// Draws a line of text onto a frame in place.
pub trait TextRenderer: Send {
    /// `origin` is the bottom-left corner of the text baseline.
    fn put_text(
        &self,
        frame: &mut Frame,
        text: &str,
        origin: (i32, i32),
        color: [u8; 3],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
