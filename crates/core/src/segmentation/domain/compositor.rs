use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::shared::color_bounds::ColorBounds;
use crate::shared::constants::{DEFAULT_BACKGROUND_COLOR, SPECKLE_KERNEL_SIZE};
use crate::shared::frame::Frame;

use super::morphology::{elliptical_kernel, in_range, open};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    /// Caller-supplied frame or parameters were unusable.
    #[error("invalid composite input: {0}")]
    InvalidInput(String),
    /// The foreground model or a processing step failed.
    #[error("composite processing failed: {0}")]
    Processing(String),
}

/// Paints near-white regions of a frame as a flat background over the
/// live foreground mask.
///
/// Output is a single-channel frame: pixels whose colour falls inside the
/// colour range (after speckle removal) take the background value, every
/// other pixel keeps the foreground-mask value.
pub trait MaskCompositor: Send {
    fn compose(&self, frame: &Frame, fg_mask: &Frame) -> Result<Frame, CompositeError>;
}

/// [`MaskCompositor`] computed on `ndarray`, for builds without OpenCV.
pub struct BackgroundCompositor {
    bounds: ColorBounds,
    background: i32,
    kernel: Array2<bool>,
}

impl BackgroundCompositor {
    pub fn new(bounds: ColorBounds, background: i32) -> Self {
        Self {
            bounds,
            background,
            kernel: elliptical_kernel(SPECKLE_KERNEL_SIZE),
        }
    }
}

impl MaskCompositor for BackgroundCompositor {
    fn compose(&self, frame: &Frame, fg_mask: &Frame) -> Result<Frame, CompositeError> {
        composite_with_kernel(frame, fg_mask, &self.bounds, self.background, &self.kernel)
    }
}

impl Default for BackgroundCompositor {
    fn default() -> Self {
        Self::new(ColorBounds::near_white(), DEFAULT_BACKGROUND_COLOR)
    }
}

/// One-shot form of [`BackgroundCompositor`].
pub fn composite_background(
    frame: &Frame,
    fg_mask: &Frame,
    bounds: &ColorBounds,
    background: i32,
) -> Result<Frame, CompositeError> {
    composite_with_kernel(
        frame,
        fg_mask,
        bounds,
        background,
        &elliptical_kernel(SPECKLE_KERNEL_SIZE),
    )
}

fn composite_with_kernel(
    frame: &Frame,
    fg_mask: &Frame,
    bounds: &ColorBounds,
    background: i32,
    kernel: &Array2<bool>,
) -> Result<Frame, CompositeError> {
    validate_inputs(frame, fg_mask, bounds, background)?;

    let white = open(&in_range(frame.as_ndarray(), bounds), kernel);
    let keep_fg = white.mapv(|v| !v);
    let fg = mask_plane(fg_mask);

    // fg AND inverted mask, OR background AND mask
    let bg = background as u8;
    let composed: Vec<u8> = ndarray::Zip::from(&fg)
        .and(&keep_fg)
        .and(&white)
        .map_collect(|&f, &keep, &w| (f & keep) | (bg & w))
        .into_raw_vec_and_offset()
        .0;

    Ok(Frame::new(
        composed,
        frame.width(),
        frame.height(),
        1,
        frame.index(),
    ))
}

/// Checks shared by every [`MaskCompositor`]: parameter problems are
/// `InvalidInput`, a foreground mask that doesn't fit the frame is `Processing`.
pub fn validate_inputs(
    frame: &Frame,
    fg_mask: &Frame,
    bounds: &ColorBounds,
    background: i32,
) -> Result<(), CompositeError> {
    if frame.is_empty() {
        return Err(CompositeError::InvalidInput("empty frame".into()));
    }
    if bounds.lower.is_empty() || bounds.upper.is_empty() {
        return Err(CompositeError::InvalidInput("empty colour bounds".into()));
    }
    let channels = frame.channels() as usize;
    if bounds.lower.len() != channels || bounds.upper.len() != channels {
        return Err(CompositeError::InvalidInput(format!(
            "colour bounds have {}/{} channels, frame has {channels}",
            bounds.lower.len(),
            bounds.upper.len()
        )));
    }
    if !(0..=255).contains(&background) {
        return Err(CompositeError::InvalidInput(format!(
            "background colour {background} outside 0..=255"
        )));
    }
    if fg_mask.channels() != 1 || fg_mask.dimensions() != frame.dimensions() {
        return Err(CompositeError::Processing(format!(
            "foreground mask is {}x{}x{}, frame is {}x{}",
            fg_mask.width(),
            fg_mask.height(),
            fg_mask.channels(),
            frame.width(),
            frame.height()
        )));
    }
    Ok(())
}

fn mask_plane(mask: &Frame) -> ArrayView2<'_, u8> {
    ArrayView2::from_shape((mask.height() as usize, mask.width() as usize), mask.data())
        .expect("single-channel mask length must match dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bgr_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::filled(width, height, 3, value, 0)
    }

    fn fg_mask(width: u32, height: u32, value: u8) -> Frame {
        Frame::filled(width, height, 1, value, 0)
    }

    #[test]
    fn test_dark_frame_passes_foreground_through() {
        let frame = bgr_frame(8, 6, 10);
        let fg = fg_mask(8, 6, 127);
        let out = composite_background(&frame, &fg, &ColorBounds::near_white(), 255).unwrap();
        assert_eq!(out.channels(), 1);
        assert_eq!(out.dimensions(), (8, 6));
        assert!(out.data().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_white_frame_becomes_background() {
        let frame = bgr_frame(8, 6, 240);
        let fg = fg_mask(8, 6, 0);
        let out = composite_background(&frame, &fg, &ColorBounds::near_white(), 200).unwrap();
        assert!(out.data().iter().all(|&v| v == 200));
    }

    #[test]
    fn test_isolated_white_pixel_is_treated_as_noise() {
        let mut frame = bgr_frame(5, 5, 0);
        {
            let mut px = frame.as_ndarray_mut();
            for c in 0..3 {
                px[[2, 2, c]] = 255;
            }
        }
        let fg = fg_mask(5, 5, 50);
        let out = composite_background(&frame, &fg, &ColorBounds::near_white(), 255).unwrap();
        assert!(out.data().iter().all(|&v| v == 50));
    }

    #[test]
    fn test_output_keeps_frame_index() {
        let frame = Frame::new(vec![0; 12], 2, 2, 3, 42);
        let out = composite_background(&frame, &fg_mask(2, 2, 0), &ColorBounds::default(), 0)
            .unwrap();
        assert_eq!(out.index(), 42);
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = Frame::new(Vec::new(), 0, 0, 3, 0);
        let err = composite_background(&frame, &fg_mask(0, 0, 0), &ColorBounds::default(), 255)
            .unwrap_err();
        assert!(matches!(err, CompositeError::InvalidInput(_)));
    }

    #[rstest]
    #[case::empty_lower(ColorBounds::new(vec![], vec![255, 255, 255]))]
    #[case::empty_upper(ColorBounds::new(vec![220, 220, 220], vec![]))]
    #[case::both_empty(ColorBounds::new(vec![], vec![]))]
    #[case::wrong_channel_count(ColorBounds::new(vec![220], vec![255]))]
    fn test_bad_bounds_are_invalid(#[case] bounds: ColorBounds) {
        let err = composite_background(&bgr_frame(4, 4, 0), &fg_mask(4, 4, 0), &bounds, 255)
            .unwrap_err();
        assert!(matches!(err, CompositeError::InvalidInput(_)));
    }

    #[rstest]
    #[case(0, true)]
    #[case(255, true)]
    #[case(256, false)]
    #[case(-1, false)]
    fn test_background_colour_range(#[case] background: i32, #[case] accepted: bool) {
        let result = composite_background(
            &bgr_frame(4, 4, 0),
            &fg_mask(4, 4, 0),
            &ColorBounds::near_white(),
            background,
        );
        assert_eq!(result.is_ok(), accepted);
        if let Err(e) = result {
            assert!(matches!(e, CompositeError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_mismatched_mask_is_processing_error() {
        let err = composite_background(
            &bgr_frame(4, 4, 0),
            &fg_mask(3, 4, 0),
            &ColorBounds::near_white(),
            255,
        )
        .unwrap_err();
        assert!(matches!(err, CompositeError::Processing(_)));
    }

    #[test]
    fn test_multichannel_mask_is_processing_error() {
        let err = composite_background(
            &bgr_frame(4, 4, 0),
            &bgr_frame(4, 4, 0),
            &ColorBounds::near_white(),
            255,
        )
        .unwrap_err();
        assert!(matches!(err, CompositeError::Processing(_)));
    }

    #[test]
    fn test_white_corner_block_grows_like_opencv_opening() {
        let mut frame = bgr_frame(4, 4, 0);
        frame
            .as_ndarray_mut()
            .slice_mut(ndarray::s![0..2, 0..2, ..])
            .fill(250);
        let out = composite_background(&frame, &fg_mask(4, 4, 7), &ColorBounds::near_white(), 255)
            .unwrap();

        let background: Vec<(usize, usize)> = (0..16)
            .map(|i| (i / 4, i % 4))
            .filter(|&(y, x)| out.data()[y * 4 + x] == 255)
            .collect();
        assert_eq!(
            background,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0), (2, 1)]
        );
        assert!(out.data().iter().all(|&v| v == 255 || v == 7));
    }

    #[test]
    fn test_compositor_matches_one_shot_function() {
        let mut frame = bgr_frame(6, 6, 0);
        frame
            .as_ndarray_mut()
            .slice_mut(ndarray::s![0..4, 0..4, ..])
            .fill(250);
        let fg = fg_mask(6, 6, 9);
        let compositor = BackgroundCompositor::default();
        assert_eq!(
            compositor.compose(&frame, &fg).unwrap(),
            composite_background(&frame, &fg, &ColorBounds::near_white(), 255).unwrap()
        );
    }
}
