use crate::frame::{BinaryImage, GrayBuffer};

use super::map_pixels;

/// Summed-area table with one row/column of zero padding,
/// shape = (h + 1) x (w + 1), row-major.
pub struct IntegralImage {
    sums: Vec<u64>,
    width: usize,
    height: usize,
}

impl IntegralImage {
    pub fn new(data: &GrayBuffer) -> Self {
        let (h, w) = data.dim();
        let iw = w + 1;
        let mut sums = vec![0u64; iw * (h + 1)];
        for row in 0..h {
            let mut row_sum = 0u64;
            for col in 0..w {
                row_sum += data[[row, col]] as u64;
                sums[(row + 1) * iw + col + 1] = row_sum + sums[row * iw + col + 1];
            }
        }
        Self {
            sums,
            width: w,
            height: h,
        }
    }

    /// Sum over the half-open rectangle `[r0, r1) x [c0, c1)`.
    pub fn sum(&self, r0: usize, c0: usize, r1: usize, c1: usize) -> u64 {
        let iw = self.width + 1;
        self.sums[r1 * iw + c1] + self.sums[r0 * iw + c0]
            - self.sums[r0 * iw + c1]
            - self.sums[r1 * iw + c0]
    }

    /// Mean over the `block x block` window centered at `(row, col)`,
    /// clipped to the image.
    pub fn local_mean(&self, row: usize, col: usize, block: usize) -> f64 {
        let radius = block / 2;
        let r0 = row.saturating_sub(radius);
        let c0 = col.saturating_sub(radius);
        let r1 = (row + radius + 1).min(self.height);
        let c1 = (col + radius + 1).min(self.width);
        let area = ((r1 - r0) * (c1 - c0)) as f64;
        self.sum(r0, c0, r1, c1) as f64 / area
    }
}

/// Inverted adaptive mean threshold.
///
/// A pixel becomes foreground when it is at or below its local
/// `block x block` mean minus `offset`, so darker-than-surroundings texture
/// lights up regardless of any global illumination gradient.
pub fn adaptive_threshold_inv(data: &GrayBuffer, block: usize, offset: i32) -> BinaryImage {
    let (h, w) = data.dim();
    let integral = IntegralImage::new(data);
    map_pixels(h, w, |row, col| {
        let threshold = integral.local_mean(row, col, block) - offset as f64;
        (data[[row, col]] as f64) <= threshold
    })
}
