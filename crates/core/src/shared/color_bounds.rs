use super::constants::{LOWER_WHITE, UPPER_WHITE};

/// Inclusive per-channel bounds for a colour range mask.
///
/// Bounds are plain vectors so that a malformed range (empty, or with a
/// channel count that doesn't match the frame) can be represented and
/// rejected by the compositing step instead of at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorBounds {
    pub lower: Vec<u8>,
    pub upper: Vec<u8>,
}

impl ColorBounds {
    pub fn new(lower: Vec<u8>, upper: Vec<u8>) -> Self {
        Self { lower, upper }
    }

    /// Near-white pixels, the range the capture loop paints as background.
    pub fn near_white() -> Self {
        Self::new(LOWER_WHITE.to_vec(), UPPER_WHITE.to_vec())
    }

    /// True when every channel of `pixel` lies within the bounds.
    pub fn contains(&self, pixel: &[u8]) -> bool {
        pixel
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&p, (&lo, &hi))| lo <= p && p <= hi)
    }
}

impl Default for ColorBounds {
    fn default() -> Self {
        Self::near_white()
    }
}
