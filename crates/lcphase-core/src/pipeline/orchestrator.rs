use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::analysis::analyze_frame;
use crate::detection::{build_electrode_mask, ElectrodeMask};
use crate::error::{LcPhaseError, Result};
use crate::frame::{Frame, Mask};
use crate::io::source::{FrameSource, SourceEvent};
use crate::stats::{summarize, Statistics};

use super::config::AnalysisConfig;
use super::types::{FailureReason, FrameResult, ProgressSink, ResultSeries, SessionState};

/// One analysis run over a frame source.
///
/// The electrode mask is built from the first frame the source delivers and
/// reused for every later frame. Results accumulate in temporal order and stay
/// readable after the run ends, whatever the final state.
pub struct AnalysisSession {
    config: AnalysisConfig,
    state: SessionState,
    results: ResultSeries,
    mask: Option<ElectrodeMask>,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            results: ResultSeries::new(),
            mask: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next run.
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<()> {
        if self.state == SessionState::Running {
            return Err(LcPhaseError::AnalysisInProgress);
        }
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn results(&self) -> &ResultSeries {
        &self.results
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref().map(|m| &m.mask)
    }

    pub fn electrode_mask(&self) -> Option<&ElectrodeMask> {
        self.mask.as_ref()
    }

    pub fn statistics(&self) -> Statistics {
        summarize(self.results.as_slice())
    }

    /// Return to `Idle`, dropping results and mask.
    pub fn reset(&mut self) -> Result<()> {
        if self.state == SessionState::Running {
            return Err(LcPhaseError::AnalysisInProgress);
        }
        self.state = SessionState::Idle;
        self.results.clear();
        self.mask = None;
        Ok(())
    }

    /// Check that a run may start: state is `Idle` and the configuration is valid.
    pub fn preflight(&self) -> Result<()> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Running => return Err(LcPhaseError::AnalysisInProgress),
            ref other => {
                return Err(LcPhaseError::InvalidSessionState(format!(
                    "cannot start from {other}; reset the session first"
                )))
            }
        }
        self.config.validate()
    }

    /// Process every frame of `source` until it ends, fails or `cancel` is raised.
    ///
    /// `Err` is returned only when the run cannot start (see [`preflight`](Self::preflight));
    /// the session then stays `Idle`. Otherwise the terminal state is returned.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &dyn ProgressSink,
        cancel: &AtomicBool,
    ) -> Result<SessionState> {
        self.preflight()?;

        // Later config changes do not affect this run.
        let config = self.config.clone();
        let wait = config.source.frame_wait();
        let max_timeouts = config.source.max_consecutive_timeouts;

        self.results.clear();
        self.mask = None;
        self.state = SessionState::Running;

        info!(
            contour_threshold = config.thresholds.contour_threshold,
            variance_threshold = config.thresholds.variance_threshold,
            estimated_frames = ?source.estimated_len(),
            "Analysis started"
        );
        let started = Instant::now();
        let mut consecutive_timeouts = 0u32;

        let final_state = loop {
            if cancel.load(Ordering::Relaxed) {
                break SessionState::Cancelled;
            }

            let event = match source.next_frame(wait) {
                Ok(event) => event,
                Err(e) => break SessionState::Failed(FailureReason::Acquisition(e.to_string())),
            };

            let result = match event {
                SourceEvent::Frame(frame) => {
                    consecutive_timeouts = 0;
                    if self.mask.is_none() {
                        if let Err(reason) = self.build_reference_mask(&frame, &config) {
                            break SessionState::Failed(reason);
                        }
                    }
                    self.process(&frame, &config)
                }
                SourceEvent::Unreadable {
                    index,
                    timestamp_seconds,
                    reason,
                } => {
                    consecutive_timeouts = 0;
                    if self.mask.is_none() {
                        break SessionState::Failed(FailureReason::MaskConstruction(format!(
                            "reference frame {index} unreadable: {reason}"
                        )));
                    }
                    warn!(frame = index, %reason, "Frame could not be decoded");
                    FrameResult::error(index, timestamp_seconds)
                }
                SourceEvent::TimedOut => {
                    consecutive_timeouts += 1;
                    if max_timeouts > 0 && consecutive_timeouts >= max_timeouts {
                        break SessionState::Failed(FailureReason::Acquisition(format!(
                            "{consecutive_timeouts} consecutive frames timed out"
                        )));
                    }
                    continue;
                }
                SourceEvent::EndOfStream => {
                    if self.mask.is_none() {
                        break SessionState::Failed(FailureReason::SourceExhaustedBeforeStart);
                    }
                    break SessionState::Completed;
                }
            };

            let estimated_total = source.estimated_len().map(|rest| self.results.len() + 1 + rest);
            sink.on_progress(result.frame_index, estimated_total, &result);
            self.results.push(result);
        };

        match &final_state {
            SessionState::Failed(reason) => warn!(%reason, frames = self.results.len(), "Analysis failed"),
            state => info!(
                %state,
                frames = self.results.len(),
                errors = self.results.error_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analysis finished"
            ),
        }

        self.state = final_state.clone();
        Ok(final_state)
    }

    fn build_reference_mask(&mut self, frame: &Frame, config: &AnalysisConfig) -> std::result::Result<(), FailureReason> {
        match build_electrode_mask(frame, &config.mask) {
            Ok(mask) => {
                debug!(
                    frame = frame.index,
                    lc_pixels = mask.mask.lc_pixel_count(),
                    "Reference mask built"
                );
                self.mask = Some(mask);
                Ok(())
            }
            Err(e) => Err(FailureReason::MaskConstruction(e.to_string())),
        }
    }

    fn process(&self, frame: &Frame, config: &AnalysisConfig) -> FrameResult {
        let Some(electrode) = self.mask.as_ref() else {
            return FrameResult::error(frame.index, frame.timestamp_seconds);
        };
        match analyze_frame(frame, &electrode.mask, config) {
            Ok(m) => FrameResult::from_measurement(frame.index, frame.timestamp_seconds, &m),
            Err(e) => {
                let e = LcPhaseError::FrameProcessing {
                    index: frame.index,
                    reason: e.to_string(),
                };
                warn!(frame = frame.index, error = %e, "Recording ERROR row");
                FrameResult::error(frame.index, frame.timestamp_seconds)
            }
        }
    }
}
