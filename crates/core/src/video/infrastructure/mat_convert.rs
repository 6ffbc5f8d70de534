//! Conversions between [`Frame`] and OpenCV `Mat` buffers.

use opencv::core::{self, Mat, Scalar};
use opencv::prelude::*;

use crate::shared::frame::Frame;

pub(crate) fn frame_to_mat(frame: &Frame) -> Result<Mat, Box<dyn std::error::Error>> {
    if frame.is_empty() {
        return Ok(Mat::default());
    }
    let typ = match frame.channels() {
        1 => core::CV_8UC1,
        3 => core::CV_8UC3,
        4 => core::CV_8UC4,
        n => return Err(format!("Unsupported channel count: {n}").into()),
    };
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height() as i32,
        frame.width() as i32,
        typ,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(frame.data());
    Ok(mat)
}

pub(crate) fn mat_to_frame(mat: &Mat, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    if mat.depth() != core::CV_8U {
        return Err(format!("Expected an 8-bit image, got depth {}", mat.depth()).into());
    }
    let owned;
    let mat = if mat.is_continuous() {
        mat
    } else {
        owned = mat.try_clone()?;
        &owned
    };
    Ok(Frame::new(
        mat.data_bytes()?.to_vec(),
        mat.cols() as u32,
        mat.rows() as u32,
        mat.channels() as u8,
        index,
    ))
}
