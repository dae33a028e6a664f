#[allow(dead_code)]
mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lcphase_core::analysis::Phase;
use lcphase_core::error::LcPhaseError;
use lcphase_core::frame::Frame;
use lcphase_core::io::source::{SourceEvent, VecFrameSource};
use lcphase_core::pipeline::{
    AnalysisConfig, AnalysisController, AnalysisSession, FailureReason, FrameResult, NoOpSink,
    ProgressSink, SessionEvent, SessionState,
};

fn uniform_frames(n: usize) -> Vec<Frame> {
    (0..n).map(|i| Frame::uniform(16, 16, 120, i * 30, i as f64)).collect()
}

fn run(session: &mut AnalysisSession, source: &mut common::ScriptedSource) -> SessionState {
    let cancel = AtomicBool::new(false);
    session.run(source, &NoOpSink, &cancel).unwrap()
}

/// Records every progress call.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(usize, Option<usize>)>>,
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, frame_index: usize, estimated_total: Option<usize>, _latest: &FrameResult) {
        self.calls.lock().unwrap().push((frame_index, estimated_total));
    }
}

/// Raises the cancel flag once `after` frames have been reported.
struct CancelAfter {
    seen: AtomicUsize,
    after: usize,
    flag: Arc<AtomicBool>,
}

impl ProgressSink for CancelAfter {
    fn on_progress(&self, _frame_index: usize, _estimated_total: Option<usize>, _latest: &FrameResult) {
        if self.seen.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisSession
// ---------------------------------------------------------------------------

#[test]
fn test_uniform_run_completes() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(uniform_frames(3));
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);
    assert_eq!(session.state(), &SessionState::Completed);

    let results = session.results();
    assert_eq!(results.len(), 3);
    let indices: Vec<usize> = results.iter().map(|r| r.frame_index).collect();
    assert_eq!(indices, vec![0, 30, 60]);
    for r in results {
        // No structure and no intensity spread.
        assert_eq!(r.num_contours, 0);
        assert_eq!(r.phase_by_contour, Phase::Isotropic);
        assert_eq!(r.variance, 0.0);
        assert_eq!(r.phase_by_variance, Phase::Cholesteric);
        assert_eq!(r.lc_pixel_count, 256);
    }
    assert_eq!(session.mask().unwrap().lc_pixel_count(), 256);
}

#[test]
fn test_all_white_video_end_to_end() {
    let frames: Vec<Frame> = (0..3)
        .map(|i| Frame::uniform(48, 40, 255, i * 30, i as f64))
        .collect();
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(frames);
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);

    let electrode = session.electrode_mask().unwrap();
    assert!(electrode.regions.is_empty());
    assert_eq!(electrode.mask.lc_pixel_count(), 48 * 40);

    assert_eq!(session.results().len(), 3);
    for r in session.results() {
        assert_eq!(r.num_contours, 0);
        assert_eq!(r.phase_by_contour, Phase::Isotropic);
        assert_eq!(r.variance, 0.0);
        assert_eq!(r.std_dev, 0.0);
        assert_eq!(r.phase_by_variance, Phase::Cholesteric);
        assert_eq!(r.lc_pixel_count, 48 * 40);
    }
}

#[test]
fn test_reference_mask_reused_for_every_frame() {
    let frames: Vec<Frame> = (0..3)
        .map(|i| common::corner_electrode_frame(200, 80, i, i as f64 * 2.0))
        .collect();
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(frames);
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);

    assert_eq!(session.electrode_mask().unwrap().regions.len(), 1);
    assert!(session.results().iter().all(|r| r.lc_pixel_count == 31_900));
    assert!(session.results().iter().all(|r| !r.is_error()));
}

#[test]
fn test_progress_reports_each_frame() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(uniform_frames(3));
    let sink = RecordingSink::default();
    let cancel = AtomicBool::new(false);
    session.run(&mut source, &sink, &cancel).unwrap();

    let calls = sink.calls.lock().unwrap();
    assert_eq!(*calls, vec![(0, Some(3)), (30, Some(3)), (60, Some(3))]);
}

#[test]
fn test_mismatched_frame_records_error_row() {
    let frames = vec![
        Frame::uniform(16, 16, 120, 0, 0.0),
        Frame::uniform(8, 8, 120, 1, 1.0),
        Frame::uniform(16, 16, 120, 2, 2.0),
    ];
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(frames);
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);

    let results = session.results();
    assert_eq!(results.len(), 3);
    let bad = results.get(1).unwrap();
    assert!(bad.is_error());
    assert_eq!(bad.phase_by_contour, Phase::Error);
    assert_eq!(bad.num_contours, 0);
    assert_eq!(bad.timestamp_seconds, 1.0);
    assert!(!results.get(2).unwrap().is_error());
    assert_eq!(results.error_count(), 1);
}

#[test]
fn test_unreadable_frame_after_reference_is_error_row() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::new(vec![
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 0, 0.0))),
        Ok(SourceEvent::Unreadable {
            index: 30,
            timestamp_seconds: 1.0,
            reason: "bad block".into(),
        }),
    ]);
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);
    let last = session.results().last().unwrap();
    assert_eq!(last.frame_index, 30);
    assert!(last.is_error());
}

#[test]
fn test_unreadable_reference_frame_fails_mask_construction() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::new(vec![
        Ok(SourceEvent::Unreadable {
            index: 0,
            timestamp_seconds: 0.0,
            reason: "bad block".into(),
        }),
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 1, 1.0))),
    ]);
    let state = run(&mut session, &mut source);
    assert!(matches!(state, SessionState::Failed(FailureReason::MaskConstruction(_))));
    assert!(session.results().is_empty());
    assert!(session.mask().is_none());
}

#[test]
fn test_invalid_reference_frame_fails_mask_construction() {
    let broken = Frame {
        pixels: vec![0; 5],
        ..Frame::uniform(4, 4, 0, 0, 0.0)
    };
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(vec![broken]);
    let state = run(&mut session, &mut source);
    assert!(matches!(state, SessionState::Failed(FailureReason::MaskConstruction(_))));
}

#[test]
fn test_empty_source_fails_before_start() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::new(vec![]);
    assert_eq!(
        run(&mut session, &mut source),
        SessionState::Failed(FailureReason::SourceExhaustedBeforeStart)
    );
}

#[test]
fn test_single_timeout_skips_frame() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::new(vec![
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 0, 0.0))),
        Ok(SourceEvent::TimedOut),
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 60, 2.0))),
    ]);
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);
    assert_eq!(session.results().len(), 2);
    assert_eq!(session.results().last().unwrap().frame_index, 60);
}

#[test]
fn test_consecutive_timeouts_fail_acquisition() {
    let mut config = AnalysisConfig::default();
    config.source.max_consecutive_timeouts = 2;
    let mut session = AnalysisSession::new(config);
    let mut source = common::ScriptedSource::new(vec![
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 0, 0.0))),
        Ok(SourceEvent::TimedOut),
        Ok(SourceEvent::TimedOut),
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 90, 3.0))),
    ]);
    let state = run(&mut session, &mut source);
    assert!(matches!(state, SessionState::Failed(FailureReason::Acquisition(_))));
    // Results gathered before the failure are kept.
    assert_eq!(session.results().len(), 1);
}

#[test]
fn test_source_error_mid_run_fails_acquisition() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::new(vec![
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 0, 0.0))),
        Ok(SourceEvent::Frame(Frame::uniform(16, 16, 120, 30, 1.0))),
        common::source_error("camera disconnected"),
    ]);
    let state = run(&mut session, &mut source);
    match state {
        SessionState::Failed(FailureReason::Acquisition(msg)) => {
            assert!(msg.contains("camera disconnected"))
        }
        other => panic!("expected acquisition failure, got {other:?}"),
    }
    assert_eq!(session.results().len(), 2);
}

#[test]
fn test_cancel_keeps_partial_results() {
    let flag = Arc::new(AtomicBool::new(false));
    let sink = CancelAfter {
        seen: AtomicUsize::new(0),
        after: 2,
        flag: Arc::clone(&flag),
    };
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(uniform_frames(6));
    let state = session.run(&mut source, &sink, &flag).unwrap();
    assert_eq!(state, SessionState::Cancelled);
    assert_eq!(session.results().len(), 2);
}

#[test]
fn test_invalid_config_rejected_before_running() {
    let mut config = AnalysisConfig::default();
    config.thresholds.sampling_stride = 0;
    let mut session = AnalysisSession::new(config);
    let mut source = common::ScriptedSource::frames(uniform_frames(2));
    let cancel = AtomicBool::new(false);
    let err = session.run(&mut source, &NoOpSink, &cancel).unwrap_err();
    assert!(matches!(err, LcPhaseError::Configuration(_)));
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.results().is_empty());
}

#[test]
fn test_restart_requires_reset() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(uniform_frames(2));
    assert_eq!(run(&mut session, &mut source), SessionState::Completed);

    let mut again = common::ScriptedSource::frames(uniform_frames(1));
    let cancel = AtomicBool::new(false);
    let err = session.run(&mut again, &NoOpSink, &cancel).unwrap_err();
    assert!(matches!(err, LcPhaseError::InvalidSessionState(_)));
    assert_eq!(session.results().len(), 2);

    session.reset().unwrap();
    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.results().is_empty());
    assert!(session.mask().is_none());
    assert_eq!(run(&mut session, &mut again), SessionState::Completed);
    assert_eq!(session.results().len(), 1);
}

#[test]
fn test_zero_thresholds_flip_both_labels() {
    let mut config = AnalysisConfig::default();
    // Variance 0 is never below a zero threshold.
    config.thresholds.variance_threshold = 0.0;
    config.thresholds.contour_threshold = 0;
    let mut session = AnalysisSession::new(config);
    let mut source = common::ScriptedSource::frames(uniform_frames(1));
    run(&mut session, &mut source);

    let r = session.results().get(0).unwrap();
    assert_eq!(r.phase_by_variance, Phase::Isotropic);
    assert_eq!(r.phase_by_contour, Phase::Cholesteric);
}

#[test]
fn test_statistics_from_session() {
    let mut session = AnalysisSession::new(AnalysisConfig::default());
    let mut source = common::ScriptedSource::frames(uniform_frames(4));
    run(&mut session, &mut source);

    let stats = session.statistics();
    assert_eq!(stats.total_frames, 4);
    assert_eq!(stats.isotropic_frames, 4);
    assert_eq!(stats.cholesteric_frames, 0);
    assert_eq!(stats.error_frames, 0);
    assert!(stats.first_transition_minute.is_none());
}

// ---------------------------------------------------------------------------
// AnalysisController
// ---------------------------------------------------------------------------

fn drain(controller: &AnalysisController) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = controller.recv_timeout(Duration::from_secs(5)) {
        let done = matches!(event, SessionEvent::Finished { .. });
        events.push(event);
        if done {
            break;
        }
    }
    events
}

#[test]
fn test_controller_runs_in_background() {
    let mut controller = AnalysisController::new(AnalysisConfig::default());
    assert_eq!(controller.state(), SessionState::Idle);
    controller
        .start(VecFrameSource::new(uniform_frames(3)))
        .unwrap();

    let events = drain(&controller);
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[0],
        SessionEvent::Progress { frame_index: 0, estimated_total: Some(3), .. }
    ));
    assert!(matches!(
        events.last(),
        Some(SessionEvent::Finished { state: SessionState::Completed })
    ));

    assert!(controller.poll().is_none());
    assert_eq!(controller.wait().unwrap(), SessionState::Completed);
    assert!(!controller.is_running());
    assert_eq!(controller.session().unwrap().results().len(), 3);
}

#[test]
fn test_controller_rejects_second_start_and_reset_while_running() {
    let mut controller = AnalysisController::new(AnalysisConfig::default());
    controller
        .start(common::SlowSource::new(10, Duration::from_millis(100)))
        .unwrap();
    assert!(controller.is_running());
    assert_eq!(controller.state(), SessionState::Running);

    let err = controller
        .start(VecFrameSource::new(uniform_frames(1)))
        .unwrap_err();
    assert!(matches!(err, LcPhaseError::AnalysisInProgress));
    assert!(matches!(controller.reset(), Err(LcPhaseError::AnalysisInProgress)));
    assert!(matches!(
        controller.set_config(AnalysisConfig::default()),
        Err(LcPhaseError::AnalysisInProgress)
    ));

    controller.cancel();
    assert_eq!(controller.wait().unwrap(), SessionState::Cancelled);
    let partial = controller.session().unwrap().results().len();
    assert!(partial < 10);

    controller.reset().unwrap();
    assert_eq!(controller.state(), SessionState::Idle);
}

#[test]
fn test_controller_preflight_error_is_synchronous() {
    let mut config = AnalysisConfig::default();
    config.source.fps = 0.0;
    let mut controller = AnalysisController::new(config);
    let err = controller
        .start(VecFrameSource::new(uniform_frames(1)))
        .unwrap_err();
    assert!(matches!(err, LcPhaseError::Configuration(_)));
    assert!(!controller.is_running());
    assert_eq!(controller.state(), SessionState::Idle);
}
