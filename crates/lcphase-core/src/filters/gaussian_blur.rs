use ndarray::Array2;

use crate::frame::GrayBuffer;

use super::map_pixels;

/// Apply a `size x size` Gaussian blur to an 8-bit image using separable 1D
/// convolution. Borders replicate the edge pixel. Results are rounded.
pub fn gaussian_blur(data: &GrayBuffer, size: usize) -> GrayBuffer {
    let (h, w) = data.dim();
    if size <= 1 || h == 0 || w == 0 {
        return data.clone();
    }
    let kernel = make_gaussian_kernel(size);
    let input = data.mapv(|v| v as f32);
    let row_pass = convolve_rows(&input, &kernel);
    let col_pass = convolve_cols(&row_pass, &kernel);
    col_pass.mapv(|v| v.round().clamp(0.0, 255.0) as u8)
}

/// Sigma implied by a kernel size when none is given explicitly.
pub fn sigma_for_size(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian kernel of odd `size`.
///
/// Small kernels use the binomial tables; larger ones are sampled from
/// the Gaussian with `sigma_for_size(size)`.
pub fn make_gaussian_kernel(size: usize) -> Vec<f32> {
    match size {
        1 => return vec![1.0],
        3 => return vec![0.25, 0.5, 0.25],
        5 => return vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        _ => {}
    }

    let sigma = sigma_for_size(size);
    let radius = size / 2;
    let mut kernel = vec![0.0f32; 2 * radius + 1];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

fn convolve_rows(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    map_pixels(h, w, |row, col| {
        let mut sum = 0.0f32;
        for (ki, &kv) in kernel.iter().enumerate() {
            let src_col =
                (col as isize + ki as isize - radius as isize).clamp(0, w as isize - 1) as usize;
            sum += data[[row, src_col]] * kv;
        }
        sum
    })
}

fn convolve_cols(data: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = kernel.len() / 2;
    map_pixels(h, w, |row, col| {
        let mut sum = 0.0f32;
        for (ki, &kv) in kernel.iter().enumerate() {
            let src_row =
                (row as isize + ki as isize - radius as isize).clamp(0, h as isize - 1) as usize;
            sum += data[[src_row, col]] * kv;
        }
        sum
    })
}
