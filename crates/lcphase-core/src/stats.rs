use serde::{Deserialize, Serialize};

use crate::analysis::Phase;
use crate::consts::SECONDS_PER_MINUTE;
use crate::error::Result;
use crate::io::export::ExportRow;
use crate::pipeline::types::FrameResult;

/// Anything that carries a timestamp and both phase labels.
pub trait PhaseSample {
    fn timestamp_seconds(&self) -> f64;
    fn phase_by_contour(&self) -> Phase;
    fn phase_by_variance(&self) -> Phase;
}

impl PhaseSample for FrameResult {
    fn timestamp_seconds(&self) -> f64 {
        self.timestamp_seconds
    }
    fn phase_by_contour(&self) -> Phase {
        self.phase_by_contour
    }
    fn phase_by_variance(&self) -> Phase {
        self.phase_by_variance
    }
}

impl PhaseSample for ExportRow {
    fn timestamp_seconds(&self) -> f64 {
        self.timestamp_seconds
    }
    fn phase_by_contour(&self) -> Phase {
        self.phase_contour
    }
    fn phase_by_variance(&self) -> Phase {
        self.phase_variance
    }
}

/// Aggregate phase statistics of a result series.
///
/// Contour-based labels drive the primary fractions, durations and the
/// transition. Fractions are taken over every frame, ERROR rows included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_frames: usize,
    pub cholesteric_frames: usize,
    pub isotropic_frames: usize,
    pub error_frames: usize,
    pub cholesteric_fraction: f64,
    pub isotropic_fraction: f64,
    pub total_duration_minutes: f64,
    pub cholesteric_duration_minutes: f64,
    pub isotropic_duration_minutes: f64,
    /// Minute of the first CHOLESTERIC to ISOTROPIC step between adjacent rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_transition_minute: Option<f64>,
    pub variance_cholesteric_fraction: f64,
    pub variance_isotropic_fraction: f64,
    /// Share of non-error frames on which both labels agree.
    pub agreement_fraction: f64,
}

impl Statistics {
    pub fn cholesteric_percent(&self) -> f64 {
        self.cholesteric_fraction * 100.0
    }

    pub fn isotropic_percent(&self) -> f64 {
        self.isotropic_fraction * 100.0
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Summarize a series. Pure; an empty series gives all zeros and no transition.
pub fn summarize<T: PhaseSample>(series: &[T]) -> Statistics {
    let Some(last) = series.last() else {
        return Statistics::default();
    };

    let total = series.len();
    let count = |phase: Phase, label: fn(&T) -> Phase| {
        series.iter().filter(|s| label(*s) == phase).count()
    };

    let cholesteric = count(Phase::Cholesteric, T::phase_by_contour);
    let isotropic = count(Phase::Isotropic, T::phase_by_contour);
    let errors = series
        .iter()
        .filter(|s| s.phase_by_contour().is_error() || s.phase_by_variance().is_error())
        .count();
    let var_cholesteric = count(Phase::Cholesteric, T::phase_by_variance);
    let var_isotropic = count(Phase::Isotropic, T::phase_by_variance);

    let agreeing = series
        .iter()
        .filter(|s| !s.phase_by_contour().is_error() && s.phase_by_contour() == s.phase_by_variance())
        .count();
    let valid = total - errors;

    let fraction = |n: usize| n as f64 / total as f64;
    let cholesteric_fraction = fraction(cholesteric);
    let isotropic_fraction = fraction(isotropic);

    let total_minutes = if total == 1 {
        1.0
    } else {
        last.timestamp_seconds() / SECONDS_PER_MINUTE
    };

    let first_transition_minute = series
        .windows(2)
        .find(|pair| {
            pair[0].phase_by_contour() == Phase::Cholesteric
                && pair[1].phase_by_contour() == Phase::Isotropic
        })
        .map(|pair| pair[1].timestamp_seconds() / SECONDS_PER_MINUTE);

    Statistics {
        total_frames: total,
        cholesteric_frames: cholesteric,
        isotropic_frames: isotropic,
        error_frames: errors,
        cholesteric_fraction,
        isotropic_fraction,
        total_duration_minutes: total_minutes,
        cholesteric_duration_minutes: cholesteric_fraction * total_minutes,
        isotropic_duration_minutes: isotropic_fraction * total_minutes,
        first_transition_minute,
        variance_cholesteric_fraction: fraction(var_cholesteric),
        variance_isotropic_fraction: fraction(var_isotropic),
        agreement_fraction: if valid == 0 {
            0.0
        } else {
            agreeing as f64 / valid as f64
        },
    }
}
