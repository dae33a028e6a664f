pub mod classify;
pub mod config;
pub mod preprocess;
pub mod texture;
pub mod variance;

pub use classify::{classify, Classification, Phase};
pub use config::{DenoiseConfig, Equalization, PreprocessConfig, TextureConfig, TextureMethod};
pub use preprocess::preprocess;
pub use texture::{count_structures, texture_score, TextureScore};
pub use variance::IntensityStats;

use crate::error::Result;
use crate::frame::{BinaryImage, Frame, GrayBuffer, Mask};
use crate::pipeline::config::AnalysisConfig;

/// Every measurement taken from one frame.
#[derive(Clone, Debug)]
pub struct FrameMeasurement {
    /// Structure count used for classification: valid contours, or the
    /// edge-density score when that method is configured.
    pub num_contours: u32,
    /// Edge-density measurement, when that method is configured.
    pub texture: Option<TextureScore>,
    pub intensity: IntensityStats,
    pub classification: Classification,
}

/// Run the per-frame pipeline: preprocess, texture, variance, classify.
///
/// Intermediate images live only for the duration of this call.
pub fn analyze_frame(frame: &Frame, mask: &Mask, config: &AnalysisConfig) -> Result<FrameMeasurement> {
    mask.check_frame(frame)?;
    let gray = frame.grayscale()?;
    Ok(measure(&gray, mask, config, None))
}

/// Same as [`analyze_frame`], also returning the binarized image.
pub fn analyze_frame_with_binary(
    frame: &Frame,
    mask: &Mask,
    config: &AnalysisConfig,
) -> Result<(FrameMeasurement, BinaryImage)> {
    mask.check_frame(frame)?;
    let gray = frame.grayscale()?;
    let binary = preprocess::preprocess_gray(&gray, mask, &config.preprocess);
    let measurement = measure(&gray, mask, config, Some(&binary));
    Ok((measurement, binary))
}

fn measure(
    gray: &GrayBuffer,
    mask: &Mask,
    config: &AnalysisConfig,
    binary: Option<&BinaryImage>,
) -> FrameMeasurement {
    let (num_contours, texture) = match config.texture.method {
        TextureMethod::Contours => {
            let count = match binary {
                Some(b) => count_structures(b, mask, &config.texture),
                None => {
                    let b = preprocess::preprocess_gray(gray, mask, &config.preprocess);
                    count_structures(&b, mask, &config.texture)
                }
            };
            (count, None)
        }
        // No binarization needed.
        TextureMethod::EdgeDensity => {
            let score = texture_score(gray, mask, &config.texture);
            (score.texture_score, Some(score))
        }
    };
    let intensity = variance::compute(gray, mask);
    let classification = classify(num_contours, intensity.variance, &config.thresholds);

    FrameMeasurement {
        num_contours,
        texture,
        intensity,
        classification,
    }
}
