use opencv::core::{self, Mat, Point, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;

use crate::segmentation::domain::compositor::{validate_inputs, CompositeError, MaskCompositor};
use crate::shared::color_bounds::ColorBounds;
use crate::shared::constants::{DEFAULT_BACKGROUND_COLOR, SPECKLE_KERNEL_SIZE};
use crate::shared::frame::Frame;
use crate::video::infrastructure::mat_convert::{frame_to_mat, mat_to_frame};

/// [`MaskCompositor`] built from OpenCV primitives: `inRange`, a
/// `MORPH_OPEN` with an elliptical kernel, and masked bitwise operations.
pub struct OpenCvCompositor {
    bounds: ColorBounds,
    background: i32,
}

impl OpenCvCompositor {
    pub fn new(bounds: ColorBounds, background: i32) -> Self {
        Self { bounds, background }
    }

    fn compose_mats(
        &self,
        frame: &Frame,
        fg_mask: &Frame,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let src = frame_to_mat(frame)?;
        let fg = frame_to_mat(fg_mask)?;
        let (rows, cols) = (src.rows(), src.cols());

        let lower = Mat::new_rows_cols_with_default(
            rows,
            cols,
            src.typ(),
            channel_scalar(&self.bounds.lower),
        )?;
        let upper = Mat::new_rows_cols_with_default(
            rows,
            cols,
            src.typ(),
            channel_scalar(&self.bounds.upper),
        )?;
        let mut white = Mat::default();
        core::in_range(&src, &lower, &upper, &mut white)?;

        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_ELLIPSE,
            Size::new(SPECKLE_KERNEL_SIZE as i32, SPECKLE_KERNEL_SIZE as i32),
            Point::new(-1, -1),
        )?;
        let mut opened = Mat::default();
        imgproc::morphology_ex(
            &white,
            &mut opened,
            imgproc::MORPH_OPEN,
            &kernel,
            Point::new(-1, -1),
            1,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let mut keep_fg = Mat::default();
        core::bitwise_not(&opened, &mut keep_fg, &Mat::default())?;

        let background = Mat::new_rows_cols_with_default(
            rows,
            cols,
            core::CV_8UC1,
            Scalar::all(self.background as f64),
        )?;
        let mut fg_part = zeros(rows, cols)?;
        core::bitwise_and(&fg, &fg, &mut fg_part, &keep_fg)?;
        let mut bg_part = zeros(rows, cols)?;
        core::bitwise_and(&background, &background, &mut bg_part, &opened)?;

        let mut composed = Mat::default();
        core::bitwise_or(&fg_part, &bg_part, &mut composed, &Mat::default())?;
        mat_to_frame(&composed, frame.index())
    }
}

impl Default for OpenCvCompositor {
    fn default() -> Self {
        Self::new(ColorBounds::near_white(), DEFAULT_BACKGROUND_COLOR)
    }
}

impl MaskCompositor for OpenCvCompositor {
    fn compose(&self, frame: &Frame, fg_mask: &Frame) -> Result<Frame, CompositeError> {
        validate_inputs(frame, fg_mask, &self.bounds, self.background)?;
        self.compose_mats(frame, fg_mask)
            .map_err(|e| CompositeError::Processing(e.to_string()))
    }
}

fn channel_scalar(values: &[u8]) -> Scalar {
    let mut s = [0.0; 4];
    for (slot, &v) in s.iter_mut().zip(values) {
        *slot = v as f64;
    }
    Scalar::new(s[0], s[1], s[2], s[3])
}

fn zeros(rows: i32, cols: i32) -> opencv::Result<Mat> {
    Mat::new_rows_cols_with_default(rows, cols, core::CV_8UC1, Scalar::all(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::domain::compositor::BackgroundCompositor;
    use crate::segmentation::domain::morphology::{elliptical_kernel, open};
    use ndarray::Array2;
    use rstest::rstest;

    // Deterministic speckle pattern with blocks touching every edge.
    fn patterned_frame(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, 3, 30, 5);
        {
            let mut px = frame.as_ndarray_mut();
            for y in 0..height as usize {
                for x in 0..width as usize {
                    let on = (x * 7 + y * 13) % 5 < 2
                        || (x < 3 && y < 3)
                        || x + 2 >= width as usize;
                    if on {
                        for c in 0..3 {
                            px[[y, x, c]] = 230 + ((x + c) % 20) as u8;
                        }
                    }
                }
            }
        }
        frame
    }

    fn gradient_mask(width: u32, height: u32) -> Frame {
        let data = (0..width * height).map(|i| (i % 251) as u8).collect();
        Frame::new(data, width, height, 1, 5)
    }

    #[rstest]
    #[case(255)]
    #[case(0)]
    #[case(128)]
    fn test_matches_ndarray_compositor(#[case] background: i32) {
        let frame = patterned_frame(17, 11);
        let fg = gradient_mask(17, 11);
        let bounds = ColorBounds::near_white();

        let expected = BackgroundCompositor::new(bounds.clone(), background)
            .compose(&frame, &fg)
            .unwrap();
        let actual = OpenCvCompositor::new(bounds, background)
            .compose(&frame, &fg)
            .unwrap();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_opening_matches_ndarray_opening_at_edges() {
        let (h, w) = (9usize, 12usize);
        let mask = Array2::from_shape_fn((h, w), |(y, x)| {
            if (x * 5 + y * 3) % 7 < 3 || y == 0 || x == w - 1 {
                255u8
            } else {
                0
            }
        });
        let expected = open(&mask, &elliptical_kernel(SPECKLE_KERNEL_SIZE));

        let src = frame_to_mat(&Frame::new(
            mask.iter().copied().collect(),
            w as u32,
            h as u32,
            1,
            0,
        ))
        .unwrap();
        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_ELLIPSE,
            Size::new(2, 2),
            Point::new(-1, -1),
        )
        .unwrap();
        let mut opened = Mat::default();
        imgproc::morphology_ex(
            &src,
            &mut opened,
            imgproc::MORPH_OPEN,
            &kernel,
            Point::new(-1, -1),
            1,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value().unwrap(),
        )
        .unwrap();

        let actual = mat_to_frame(&opened, 0).unwrap();
        assert_eq!(actual.data(), expected.as_slice().unwrap());
    }

    #[test]
    fn test_invalid_background_is_rejected_before_opencv() {
        let err = OpenCvCompositor::new(ColorBounds::near_white(), 300)
            .compose(&patterned_frame(4, 4), &gradient_mask(4, 4))
            .unwrap_err();
        assert!(matches!(err, CompositeError::InvalidInput(_)));
    }

    #[test]
    fn test_mismatched_mask_is_processing_error() {
        let err = OpenCvCompositor::default()
            .compose(&patterned_frame(4, 4), &gradient_mask(3, 4))
            .unwrap_err();
        assert!(matches!(err, CompositeError::Processing(_)));
    }
}
