use crate::detection::components::connected_components;
use crate::frame::{BinaryImage, GrayBuffer, Mask};

use super::config::TextureConfig;

/// Edge-density texture measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextureScore {
    /// Normalized local variance plus normalized edge count, rounded.
    pub texture_score: u32,
    /// Pixels whose Sobel magnitude exceeds the gradient threshold.
    pub edge_count: u32,
}

/// Count connected foreground regions inside the mask whose area lies strictly
/// between `config.min_area` and `config.max_area`.
pub fn count_structures(binary: &BinaryImage, mask: &Mask, config: &TextureConfig) -> u32 {
    let restricted = ndarray::Zip::from(binary)
        .and(mask.data())
        .map_collect(|&fg, &lc| fg && lc);

    connected_components(&restricted, config.connectivity)
        .iter()
        .filter(|c| c.area > config.min_area && c.area < config.max_area)
        .count() as u32
}

/// Edge-density texture score over interior LC pixels.
///
/// For each pixel whose full 3x3 neighborhood lies inside the image, the 3x3
/// population variance is accumulated and the Sobel magnitude is compared
/// against `config.gradient_threshold`. Both sums are divided by their
/// configured scale divisors before being combined.
pub fn texture_score(gray: &GrayBuffer, mask: &Mask, config: &TextureConfig) -> TextureScore {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return TextureScore::default();
    }

    let mut variance_sum = 0.0f64;
    let mut edge_count = 0u64;

    for row in 1..h - 1 {
        for col in 1..w - 1 {
            if !mask.is_lc(row, col) {
                continue;
            }
            let p = |dr: usize, dc: usize| gray[[row + dr - 1, col + dc - 1]] as f64;

            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for dr in 0..3 {
                for dc in 0..3 {
                    let v = p(dr, dc);
                    sum += v;
                    sum_sq += v * v;
                }
            }
            let mean = sum / 9.0;
            variance_sum += (sum_sq / 9.0 - mean * mean).max(0.0);

            let gx = -p(0, 0) + p(0, 2) - 2.0 * p(1, 0) + 2.0 * p(1, 2) - p(2, 0) + p(2, 2);
            let gy = -p(0, 0) - 2.0 * p(0, 1) - p(0, 2) + p(2, 0) + 2.0 * p(2, 1) + p(2, 2);
            if (gx * gx + gy * gy).sqrt() > config.gradient_threshold {
                edge_count += 1;
            }
        }
    }

    let score = variance_sum / config.local_variance_divisor
        + edge_count as f64 / config.edge_divisor;

    TextureScore {
        texture_score: score.round() as u32,
        edge_count: edge_count as u32,
    }
}
