use ndarray::Array2;

use crate::filters::map_pixels;

/// Morphological opening (erosion followed by dilation) with a `kernel x kernel`
/// square structuring element, applied `iterations` times each.
///
/// Removes small isolated foreground pixels while preserving larger regions.
pub fn morphological_opening(mask: &Array2<bool>, kernel: usize, iterations: usize) -> Array2<bool> {
    let eroded = repeat(mask, iterations, |m| erode(m, kernel));
    repeat(&eroded, iterations, |m| dilate(m, kernel))
}

/// Morphological closing (dilation followed by erosion) with a `kernel x kernel`
/// square structuring element, applied `iterations` times each.
///
/// Fills gaps narrower than the kernel and merges nearby regions.
pub fn morphological_closing(mask: &Array2<bool>, kernel: usize, iterations: usize) -> Array2<bool> {
    let dilated = repeat(mask, iterations, |m| dilate(m, kernel));
    repeat(&dilated, iterations, |m| erode(m, kernel))
}

/// Binary erosion: a pixel stays true only if every in-bounds pixel under the
/// structuring element is true. Pixels outside the image do not erode.
pub fn erode(mask: &Array2<bool>, kernel: usize) -> Array2<bool> {
    let rows = sweep(mask, kernel, Axis::Row, true);
    sweep(&rows, kernel, Axis::Col, true)
}

/// Binary dilation: a pixel becomes true if any in-bounds pixel under the
/// structuring element is true.
pub fn dilate(mask: &Array2<bool>, kernel: usize) -> Array2<bool> {
    let rows = sweep(mask, kernel, Axis::Row, false);
    sweep(&rows, kernel, Axis::Col, false)
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Col,
}

fn repeat(
    mask: &Array2<bool>,
    iterations: usize,
    op: impl Fn(&Array2<bool>) -> Array2<bool>,
) -> Array2<bool> {
    let mut current = mask.clone();
    for _ in 0..iterations {
        current = op(&current);
    }
    current
}

/// One separable pass of a rectangular min (erode) or max (dilate) filter.
///
/// The anchor sits at `kernel / 2`, so even kernels reach one pixel further
/// backwards than forwards.
fn sweep(mask: &Array2<bool>, kernel: usize, axis: Axis, all: bool) -> Array2<bool> {
    let (h, w) = mask.dim();
    if kernel <= 1 || h == 0 || w == 0 {
        return mask.clone();
    }
    let back = kernel / 2;
    let forward = kernel - 1 - back;

    map_pixels(h, w, |row, col| {
        let (pos, len) = match axis {
            Axis::Row => (col, w),
            Axis::Col => (row, h),
        };
        let lo = pos.saturating_sub(back);
        let hi = (pos + forward).min(len - 1);
        let sample = |i: usize| match axis {
            Axis::Row => mask[[row, i]],
            Axis::Col => mask[[i, col]],
        };
        if all {
            (lo..=hi).all(sample)
        } else {
            (lo..=hi).any(sample)
        }
    })
}
