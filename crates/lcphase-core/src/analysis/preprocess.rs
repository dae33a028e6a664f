use crate::consts::MAX_INTENSITY;
use crate::detection::morphology::{morphological_closing, morphological_opening};
use crate::error::Result;
use crate::filters::adaptive_threshold::adaptive_threshold_inv;
use crate::filters::denoise::non_local_means;
use crate::filters::gaussian_blur::gaussian_blur;
use crate::filters::histogram::{clahe, equalize_histogram};
use crate::frame::{BinaryImage, Frame, GrayBuffer, Mask};

use super::config::{Equalization, PreprocessConfig};

/// Binarize a frame so texture shows up as countable foreground regions.
///
/// Pipeline: grayscale -> force masked pixels to white -> blur -> equalize ->
/// optional denoise -> inverted adaptive threshold -> opening -> closing ->
/// clear masked pixels.
pub fn preprocess(frame: &Frame, mask: &Mask, config: &PreprocessConfig) -> Result<BinaryImage> {
    mask.check_frame(frame)?;
    let gray = frame.grayscale()?;
    Ok(preprocess_gray(&gray, mask, config))
}

/// Same as [`preprocess`] on an already converted grayscale frame.
pub fn preprocess_gray(gray: &GrayBuffer, mask: &Mask, config: &PreprocessConfig) -> BinaryImage {
    // Step 1: excluded pixels cannot register as dark structure.
    let masked = apply_mask_white(gray, mask);

    // Step 2: suppress sensor noise.
    let blurred = gaussian_blur(&masked, config.blur_kernel);

    // Step 3: normalize illumination.
    let equalized = match config.equalization {
        Equalization::None => blurred,
        Equalization::Global => equalize_histogram(&blurred),
        Equalization::Clahe { clip_limit, tiles } => clahe(&blurred, tiles, clip_limit),
    };

    // Step 4: optional speckle removal.
    let denoised = match config.denoise {
        Some(ref nlm) => non_local_means(&equalized, nlm.strength, nlm.template, nlm.search),
        None => equalized,
    };

    // Step 5: darker-than-local-mean pixels become foreground.
    let binary = adaptive_threshold_inv(&denoised, config.adaptive_block, config.adaptive_offset);

    // Step 6: drop isolated pixels, then reconnect fragments.
    let opened = morphological_opening(&binary, config.open_kernel, config.open_iterations);
    let mut cleaned = morphological_closing(&opened, config.close_kernel, config.close_iterations);

    // Step 7: nothing outside the mask may be counted.
    ndarray::Zip::from(&mut cleaned)
        .and(mask.data())
        .for_each(|px, &lc| *px = *px && lc);
    cleaned
}

/// Copy of `gray` with every excluded pixel set to full white.
pub fn apply_mask_white(gray: &GrayBuffer, mask: &Mask) -> GrayBuffer {
    let mut out = gray.clone();
    ndarray::Zip::from(&mut out)
        .and(mask.data())
        .for_each(|px, &lc| {
            if !lc {
                *px = MAX_INTENSITY;
            }
        });
    out
}
