use serde::{Deserialize, Serialize};

use crate::analysis::{FrameMeasurement, Phase};
use crate::consts::SECONDS_PER_MINUTE;

/// Measurements and labels for one analyzed frame.
///
/// `std_dev == sqrt(variance)`. ERROR rows carry zeroed numeric fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Source frame number.
    pub frame_index: usize,
    pub timestamp_seconds: f64,
    pub num_contours: u32,
    pub phase_by_contour: Phase,
    pub variance: f64,
    pub std_dev: f64,
    pub phase_by_variance: Phase,
    pub lc_pixel_count: usize,
}

impl FrameResult {
    pub fn from_measurement(frame_index: usize, timestamp_seconds: f64, m: &FrameMeasurement) -> Self {
        Self {
            frame_index,
            timestamp_seconds,
            num_contours: m.num_contours,
            phase_by_contour: m.classification.by_contour,
            variance: m.intensity.variance,
            std_dev: m.intensity.std_dev,
            phase_by_variance: m.classification.by_variance,
            lc_pixel_count: m.intensity.pixel_count,
        }
    }

    /// Placeholder row for a frame that failed to process.
    pub fn error(frame_index: usize, timestamp_seconds: f64) -> Self {
        Self {
            frame_index,
            timestamp_seconds,
            num_contours: 0,
            phase_by_contour: Phase::Error,
            variance: 0.0,
            std_dev: 0.0,
            phase_by_variance: Phase::Error,
            lc_pixel_count: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.phase_by_contour.is_error() || self.phase_by_variance.is_error()
    }

    pub fn timestamp_minutes(&self) -> f64 {
        self.timestamp_seconds / SECONDS_PER_MINUTE
    }
}

/// Ordered per-frame results. Insertion order is temporal order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSeries {
    results: Vec<FrameResult>,
}

impl ResultSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: FrameResult) {
        self.results.push(result);
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameResult> {
        self.results.get(index)
    }

    pub fn last(&self) -> Option<&FrameResult> {
        self.results.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[FrameResult] {
        &self.results
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }
}

impl From<Vec<FrameResult>> for ResultSeries {
    fn from(results: Vec<FrameResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a ResultSeries {
    type Item = &'a FrameResult;
    type IntoIter = std::slice::Iter<'a, FrameResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Why a session ended in `Failed`.
#[derive(Clone, Debug, PartialEq)]
pub enum FailureReason {
    /// The reference-frame mask could not be built.
    MaskConstruction(String),
    /// The source ended before producing a single frame.
    SourceExhaustedBeforeStart,
    /// The source stopped producing frames mid-run.
    Acquisition(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaskConstruction(msg) => write!(f, "mask construction failed: {msg}"),
            Self::SourceExhaustedBeforeStart => {
                write!(f, "source exhausted before the first frame")
            }
            Self::Acquisition(msg) => write!(f, "frame acquisition failed: {msg}"),
        }
    }
}

/// Lifecycle of an analysis session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed(FailureReason),
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed(reason) => write!(f, "Failed ({reason})"),
        }
    }
}

/// Thread-safe progress notification for a running session.
///
/// Called once per processed frame; implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, _frame_index: usize, _estimated_total: Option<usize>, _latest: &FrameResult) {}
}

/// Progress sink that ignores every notification.
pub struct NoOpSink;
impl ProgressSink for NoOpSink {}
