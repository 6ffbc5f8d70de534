//! Binary-mask primitives on `ndarray` views: colour range thresholding and
//! erosion/dilation with an elliptical structuring element.

use ndarray::{Array2, ArrayView3};

use crate::shared::color_bounds::ColorBounds;

/// Elliptical structuring element of `size` x `size`, anchored at its centre
/// (`size / 2`), built the same way OpenCV's `MORPH_ELLIPSE` is.
pub fn elliptical_kernel(size: usize) -> Array2<bool> {
    let mut kernel = Array2::from_elem((size, size), false);
    let r = (size / 2) as i64;
    let c = (size / 2) as f64;
    let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };

    for i in 0..size {
        let dy = i as i64 - r;
        if dy.abs() > r {
            continue;
        }
        let dx = (c * (((r * r - dy * dy) as f64) * inv_r2).sqrt()).round() as i64;
        let j1 = (c as i64 - dx).max(0) as usize;
        let j2 = ((c as i64 + dx + 1) as usize).min(size);
        for j in j1..j2 {
            kernel[[i, j]] = true;
        }
    }
    kernel
}

/// 255 where every channel of the pixel lies inside `bounds`, else 0.
pub fn in_range(pixels: ArrayView3<'_, u8>, bounds: &ColorBounds) -> Array2<u8> {
    let (h, w, _) = pixels.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let px = pixels.slice(ndarray::s![y, x, ..]);
        let inside = match px.as_slice() {
            Some(channels) => bounds.contains(channels),
            None => bounds.contains(&px.to_vec()),
        };
        if inside {
            255
        } else {
            0
        }
    })
}

pub fn erode(mask: &Array2<u8>, kernel: &Array2<bool>) -> Array2<u8> {
    apply_kernel(mask, kernel, u8::MAX, u8::min)
}

/// Dilation with the kernel as given, not reflected, like `cv::dilate`.
/// With an even-sized kernel an opening can therefore shift edges by a pixel.
pub fn dilate(mask: &Array2<u8>, kernel: &Array2<bool>) -> Array2<u8> {
    apply_kernel(mask, kernel, u8::MIN, u8::max)
}

/// Erosion followed by dilation: removes bright specks smaller than the kernel.
pub fn open(mask: &Array2<u8>, kernel: &Array2<bool>) -> Array2<u8> {
    dilate(&erode(mask, kernel), kernel)
}

// Neighbour at kernel offset minus anchor. Out-of-frame neighbours are
// skipped, matching OpenCV's default morphology border.
fn apply_kernel(
    mask: &Array2<u8>,
    kernel: &Array2<bool>,
    identity: u8,
    combine: fn(u8, u8) -> u8,
) -> Array2<u8> {
    let (h, w) = mask.dim();
    let (kh, kw) = kernel.dim();
    let (ay, ax) = ((kh / 2) as isize, (kw / 2) as isize);

    Array2::from_shape_fn((h, w), |(y, x)| {
        let mut acc = identity;
        for ((ky, kx), &on) in kernel.indexed_iter() {
            if !on {
                continue;
            }
            let sy = y as isize + ky as isize - ay;
            let sx = x as isize + kx as isize - ax;
            if sy < 0 || sx < 0 || sy >= h as isize || sx >= w as isize {
                continue;
            }
            acc = combine(acc, mask[[sy as usize, sx as usize]]);
        }
        acc
    })
}
