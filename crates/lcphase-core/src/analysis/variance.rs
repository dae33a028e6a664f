use serde::{Deserialize, Serialize};

use crate::frame::{GrayBuffer, Mask};

/// Intensity statistics over the LC pixels of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityStats {
    pub mean: f64,
    /// Population variance (divides by the pixel count).
    pub variance: f64,
    pub std_dev: f64,
    pub pixel_count: usize,
}

/// Compute mean, population variance and standard deviation of the grayscale
/// levels at LC positions. An empty mask yields all zeros.
pub fn compute(gray: &GrayBuffer, mask: &Mask) -> IntensityStats {
    let mut count = 0usize;
    let mut sum = 0.0f64;
    for (&v, &lc) in gray.iter().zip(mask.data().iter()) {
        if lc {
            sum += v as f64;
            count += 1;
        }
    }
    if count == 0 {
        return IntensityStats::default();
    }

    let n = count as f64;
    let mean = sum / n;
    let var: f64 = gray
        .iter()
        .zip(mask.data().iter())
        .filter(|(_, lc)| **lc)
        .map(|(&v, _)| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;

    IntensityStats {
        mean,
        variance: var,
        std_dev: var.sqrt(),
        pixel_count: count,
    }
}
