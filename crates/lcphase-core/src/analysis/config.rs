use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ADAPTIVE_BLOCK, DEFAULT_ADAPTIVE_OFFSET, DEFAULT_BLUR_KERNEL, DEFAULT_CLAHE_CLIP_LIMIT,
    DEFAULT_CLAHE_TILES, DEFAULT_CLOSE_ITERATIONS, DEFAULT_CLOSE_KERNEL, DEFAULT_CONTOUR_MAX_AREA,
    DEFAULT_CONTOUR_MIN_AREA, DEFAULT_EDGE_DIVISOR, DEFAULT_GRADIENT_THRESHOLD,
    DEFAULT_LOCAL_VARIANCE_DIVISOR, DEFAULT_NLM_SEARCH, DEFAULT_NLM_STRENGTH,
    DEFAULT_NLM_TEMPLATE, DEFAULT_OPEN_ITERATIONS, DEFAULT_OPEN_KERNEL,
};
use crate::detection::Connectivity;
use crate::error::{LcPhaseError, Result};

/// Contrast normalization applied after blurring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Equalization {
    /// Leave intensities as they are.
    None,
    /// Whole-frame histogram equalization.
    Global,
    /// Tile-based contrast-limited equalization.
    Clahe { clip_limit: f32, tiles: usize },
}

impl Default for Equalization {
    fn default() -> Self {
        Self::Clahe {
            clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            tiles: DEFAULT_CLAHE_TILES,
        }
    }
}

impl std::fmt::Display for Equalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Global => write!(f, "Global"),
            Self::Clahe { clip_limit, tiles } => {
                write!(f, "CLAHE (clip {clip_limit}, {tiles}x{tiles} tiles)")
            }
        }
    }
}

/// Non-local-means parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenoiseConfig {
    pub strength: f32,
    pub template: usize,
    pub search: usize,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_NLM_STRENGTH,
            template: DEFAULT_NLM_TEMPLATE,
            search: DEFAULT_NLM_SEARCH,
        }
    }
}

/// Frame preprocessing parameters, in pipeline order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_blur_kernel")]
    pub blur_kernel: usize,
    #[serde(default)]
    pub equalization: Equalization,
    /// Disabled when absent.
    #[serde(default)]
    pub denoise: Option<DenoiseConfig>,
    #[serde(default = "default_adaptive_block")]
    pub adaptive_block: usize,
    #[serde(default = "default_adaptive_offset")]
    pub adaptive_offset: i32,
    #[serde(default = "default_open_kernel")]
    pub open_kernel: usize,
    #[serde(default = "default_open_iterations")]
    pub open_iterations: usize,
    #[serde(default = "default_close_kernel")]
    pub close_kernel: usize,
    #[serde(default = "default_close_iterations")]
    pub close_iterations: usize,
}

fn default_blur_kernel() -> usize {
    DEFAULT_BLUR_KERNEL
}
fn default_adaptive_block() -> usize {
    DEFAULT_ADAPTIVE_BLOCK
}
fn default_adaptive_offset() -> i32 {
    DEFAULT_ADAPTIVE_OFFSET
}
fn default_open_kernel() -> usize {
    DEFAULT_OPEN_KERNEL
}
fn default_open_iterations() -> usize {
    DEFAULT_OPEN_ITERATIONS
}
fn default_close_kernel() -> usize {
    DEFAULT_CLOSE_KERNEL
}
fn default_close_iterations() -> usize {
    DEFAULT_CLOSE_ITERATIONS
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            blur_kernel: DEFAULT_BLUR_KERNEL,
            equalization: Equalization::default(),
            denoise: None,
            adaptive_block: DEFAULT_ADAPTIVE_BLOCK,
            adaptive_offset: DEFAULT_ADAPTIVE_OFFSET,
            open_kernel: DEFAULT_OPEN_KERNEL,
            open_iterations: DEFAULT_OPEN_ITERATIONS,
            close_kernel: DEFAULT_CLOSE_KERNEL,
            close_iterations: DEFAULT_CLOSE_ITERATIONS,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(LcPhaseError::Configuration(format!(
                "preprocess.blur_kernel must be odd, got {}",
                self.blur_kernel
            )));
        }
        if self.adaptive_block < 3 || self.adaptive_block % 2 == 0 {
            return Err(LcPhaseError::Configuration(format!(
                "preprocess.adaptive_block must be odd and at least 3, got {}",
                self.adaptive_block
            )));
        }
        if self.open_kernel == 0 || self.close_kernel == 0 {
            return Err(LcPhaseError::Configuration(
                "preprocess morphology kernels must be at least 1".into(),
            ));
        }
        if let Equalization::Clahe { clip_limit, tiles } = self.equalization {
            if tiles == 0 || !clip_limit.is_finite() || clip_limit <= 0.0 {
                return Err(LcPhaseError::Configuration(
                    "preprocess.equalization CLAHE needs tiles >= 1 and a positive clip limit".into(),
                ));
            }
        }
        if let Some(ref nlm) = self.denoise {
            if nlm.template % 2 == 0 || nlm.search % 2 == 0 {
                return Err(LcPhaseError::Configuration(
                    "preprocess.denoise template and search windows must be odd".into(),
                ));
            }
        }
        Ok(())
    }
}

/// How the structural texture signal is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureMethod {
    /// Count area-filtered connected regions in the binarized frame.
    #[default]
    Contours,
    /// Local variance plus Sobel edge density on the grayscale frame.
    EdgeDensity,
}

impl std::fmt::Display for TextureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contours => write!(f, "Contours"),
            Self::EdgeDensity => write!(f, "Edge Density"),
        }
    }
}

/// Texture extraction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    #[serde(default)]
    pub method: TextureMethod,
    #[serde(default)]
    pub connectivity: Connectivity,
    /// Regions must have area strictly greater than this.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
    /// Regions must have area strictly less than this.
    #[serde(default = "default_max_area")]
    pub max_area: usize,
    #[serde(default = "default_gradient_threshold")]
    pub gradient_threshold: f64,
    #[serde(default = "default_local_variance_divisor")]
    pub local_variance_divisor: f64,
    #[serde(default = "default_edge_divisor")]
    pub edge_divisor: f64,
}

fn default_min_area() -> usize {
    DEFAULT_CONTOUR_MIN_AREA
}
fn default_max_area() -> usize {
    DEFAULT_CONTOUR_MAX_AREA
}
fn default_gradient_threshold() -> f64 {
    DEFAULT_GRADIENT_THRESHOLD
}
fn default_local_variance_divisor() -> f64 {
    DEFAULT_LOCAL_VARIANCE_DIVISOR
}
fn default_edge_divisor() -> f64 {
    DEFAULT_EDGE_DIVISOR
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            method: TextureMethod::default(),
            connectivity: Connectivity::default(),
            min_area: DEFAULT_CONTOUR_MIN_AREA,
            max_area: DEFAULT_CONTOUR_MAX_AREA,
            gradient_threshold: DEFAULT_GRADIENT_THRESHOLD,
            local_variance_divisor: DEFAULT_LOCAL_VARIANCE_DIVISOR,
            edge_divisor: DEFAULT_EDGE_DIVISOR,
        }
    }
}

impl TextureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_area >= self.max_area {
            return Err(LcPhaseError::Configuration(format!(
                "texture.min_area ({}) must be below texture.max_area ({})",
                self.min_area, self.max_area
            )));
        }
        if !(self.local_variance_divisor > 0.0 && self.edge_divisor > 0.0) {
            return Err(LcPhaseError::Configuration(
                "texture divisors must be positive".into(),
            ));
        }
        if !self.gradient_threshold.is_finite() {
            return Err(LcPhaseError::Configuration(
                "texture.gradient_threshold must be finite".into(),
            ));
        }
        Ok(())
    }
}
