use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ELECTRODE_BRIGHTNESS, DEFAULT_ELECTRODE_CLOSING_ITERATIONS,
    DEFAULT_ELECTRODE_CLOSING_KERNEL, DEFAULT_ELECTRODE_MIN_AREA, DEFAULT_ELECTRODE_PADDING,
};
use crate::error::{LcPhaseError, Result};

/// Configuration for electrode/background exclusion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskConfig {
    /// Grayscale level above which a pixel is considered bright.
    #[serde(default = "default_brightness")]
    pub brightness_threshold: u8,
    /// Side of the square closing kernel.
    #[serde(default = "default_closing_kernel")]
    pub closing_kernel: usize,
    /// Number of closing iterations.
    #[serde(default = "default_closing_iterations")]
    pub closing_iterations: usize,
    /// Bright regions enclosing strictly more than this many pixels are excluded.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
    /// Padding added around each excluded bounding box.
    #[serde(default = "default_padding")]
    pub padding: usize,
}

fn default_brightness() -> u8 {
    DEFAULT_ELECTRODE_BRIGHTNESS
}
fn default_closing_kernel() -> usize {
    DEFAULT_ELECTRODE_CLOSING_KERNEL
}
fn default_closing_iterations() -> usize {
    DEFAULT_ELECTRODE_CLOSING_ITERATIONS
}
fn default_min_area() -> usize {
    DEFAULT_ELECTRODE_MIN_AREA
}
fn default_padding() -> usize {
    DEFAULT_ELECTRODE_PADDING
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            brightness_threshold: DEFAULT_ELECTRODE_BRIGHTNESS,
            closing_kernel: DEFAULT_ELECTRODE_CLOSING_KERNEL,
            closing_iterations: DEFAULT_ELECTRODE_CLOSING_ITERATIONS,
            min_area: DEFAULT_ELECTRODE_MIN_AREA,
            padding: DEFAULT_ELECTRODE_PADDING,
        }
    }
}

impl MaskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.closing_kernel == 0 {
            return Err(LcPhaseError::Configuration(
                "mask.closing_kernel must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
