pub mod adaptive_threshold;
pub mod denoise;
pub mod gaussian_blur;
pub mod histogram;

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Build an `(h, w)` array by evaluating `f(row, col)` for every pixel.
///
/// Rows are computed in parallel once the image reaches
/// `PARALLEL_PIXEL_THRESHOLD` pixels; smaller images stay on the caller's thread.
pub(crate) fn map_pixels<T, F>(h: usize, w: usize, f: F) -> Array2<T>
where
    T: Copy + Default + Send,
    F: Fn(usize, usize) -> T + Sync,
{
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<T>> = (0..h)
            .into_par_iter()
            .map(|row| (0..w).map(|col| f(row, col)).collect())
            .collect();

        let mut result = Array2::<T>::default((h, w));
        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
        result
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| f(row, col))
    }
}
