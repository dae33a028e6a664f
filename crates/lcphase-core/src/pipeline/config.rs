use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analysis::config::{PreprocessConfig, TextureConfig};
use crate::consts::{
    DEFAULT_CONTOUR_THRESHOLD, DEFAULT_FPS, DEFAULT_FRAME_WAIT_MS,
    DEFAULT_MAX_CONSECUTIVE_TIMEOUTS, DEFAULT_SAMPLING_STRIDE, DEFAULT_VARIANCE_THRESHOLD,
};
use crate::detection::MaskConfig;
use crate::error::{LcPhaseError, Result};

/// Classification thresholds and sampling density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Frames with fewer valid contours are ISOTROPIC.
    #[serde(default = "default_contour_threshold")]
    pub contour_threshold: u32,
    /// Frames with variance at or above this are ISOTROPIC.
    #[serde(default = "default_variance_threshold")]
    pub variance_threshold: f64,
    /// Analyze every Nth source frame.
    #[serde(default = "default_sampling_stride")]
    pub sampling_stride: u32,
}

fn default_contour_threshold() -> u32 {
    DEFAULT_CONTOUR_THRESHOLD
}
fn default_variance_threshold() -> f64 {
    DEFAULT_VARIANCE_THRESHOLD
}
fn default_sampling_stride() -> u32 {
    DEFAULT_SAMPLING_STRIDE
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            contour_threshold: DEFAULT_CONTOUR_THRESHOLD,
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
            sampling_stride: DEFAULT_SAMPLING_STRIDE,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sampling_stride == 0 {
            return Err(LcPhaseError::Configuration(
                "thresholds.sampling_stride must be at least 1".into(),
            ));
        }
        if !self.variance_threshold.is_finite() || self.variance_threshold < 0.0 {
            return Err(LcPhaseError::Configuration(format!(
                "thresholds.variance_threshold must be a non-negative number, got {}",
                self.variance_threshold
            )));
        }
        Ok(())
    }
}

/// Frame acquisition settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Frame rate used when the source carries no timestamps.
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Longest wait for a single frame before it is skipped.
    #[serde(default = "default_frame_wait_ms")]
    pub frame_wait_ms: u64,
    /// Consecutive skipped frames after which acquisition has failed.
    #[serde(default = "default_max_consecutive_timeouts")]
    pub max_consecutive_timeouts: u32,
}

fn default_fps() -> f64 {
    DEFAULT_FPS
}
fn default_frame_wait_ms() -> u64 {
    DEFAULT_FRAME_WAIT_MS
}
fn default_max_consecutive_timeouts() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_TIMEOUTS
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frame_wait_ms: DEFAULT_FRAME_WAIT_MS,
            max_consecutive_timeouts: DEFAULT_MAX_CONSECUTIVE_TIMEOUTS,
        }
    }
}

impl SourceConfig {
    pub fn frame_wait(&self) -> Duration {
        Duration::from_millis(self.frame_wait_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(LcPhaseError::Configuration(format!(
                "source.fps must be positive, got {}",
                self.fps
            )));
        }
        if self.frame_wait_ms == 0 {
            return Err(LcPhaseError::Configuration(
                "source.frame_wait_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Complete analysis configuration. Snapshotted by a session when it starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub mask: MaskConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub texture: TextureConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl AnalysisConfig {
    /// Pre-flight check run before a session enters `Running`.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.mask.validate()?;
        self.preprocess.validate()?;
        self.texture.validate()?;
        self.source.validate()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
