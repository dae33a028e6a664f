use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::config::ThresholdConfig;

/// Liquid-crystal phase label for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    /// Textured state: many small bounded structures, low variance.
    Cholesteric,
    /// Homogeneous state: few structures, noise-dominated variance.
    Isotropic,
    /// The frame could not be processed.
    Error,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cholesteric => "CHOLESTERIC",
            Self::Isotropic => "ISOTROPIC",
            Self::Error => "ERROR",
        }
    }

    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHOLESTERIC" => Ok(Self::Cholesteric),
            "ISOTROPIC" => Ok(Self::Isotropic),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown phase label '{other}'")),
        }
    }
}

/// Both phase labels for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub by_contour: Phase,
    pub by_variance: Phase,
}

/// Fewer contours than the threshold means ISOTROPIC.
pub fn phase_by_contour(num_contours: u32, config: &ThresholdConfig) -> Phase {
    if num_contours < config.contour_threshold {
        Phase::Isotropic
    } else {
        Phase::Cholesteric
    }
}

/// Variance at or above the threshold means ISOTROPIC.
pub fn phase_by_variance(variance: f64, config: &ThresholdConfig) -> Phase {
    if variance >= config.variance_threshold {
        Phase::Isotropic
    } else {
        Phase::Cholesteric
    }
}

/// Classify a frame by both signals independently.
pub fn classify(num_contours: u32, variance: f64, config: &ThresholdConfig) -> Classification {
    Classification {
        by_contour: phase_by_contour(num_contours, config),
        by_variance: phase_by_variance(variance, config),
    }
}
