use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error};

use crate::error::{LcPhaseError, Result};
use crate::io::source::FrameSource;

use super::config::AnalysisConfig;
use super::orchestrator::AnalysisSession;
use super::types::{FailureReason, FrameResult, ProgressSink, SessionState};

/// Message from the analysis thread.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Progress {
        frame_index: usize,
        estimated_total: Option<usize>,
        result: FrameResult,
    },
    /// Always the last event of a run.
    Finished { state: SessionState },
}

/// Progress sink that forwards every notification over an mpsc channel.
pub struct ChannelProgressSink {
    tx: Sender<SessionEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn on_progress(&self, frame_index: usize, estimated_total: Option<usize>, latest: &FrameResult) {
        // The receiver may already be gone; progress is fire-and-forget.
        let _ = self.tx.send(SessionEvent::Progress {
            frame_index,
            estimated_total,
            result: latest.clone(),
        });
    }
}

/// Runs an [`AnalysisSession`] on a background thread.
///
/// While a run is in flight the session is owned by the worker; it comes back
/// on [`wait`](Self::wait).
pub struct AnalysisController {
    session: Option<AnalysisSession>,
    config: AnalysisConfig,
    handle: Option<JoinHandle<AnalysisSession>>,
    events: Option<Receiver<SessionEvent>>,
    cancel: Arc<AtomicBool>,
}

impl AnalysisController {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            session: Some(AnalysisSession::new(config.clone())),
            config,
            handle: None,
            events: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// True once the worker thread has exited (or was never started).
    /// [`wait`](Self::wait) will not block after this.
    pub fn worker_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) => session.state().clone(),
            None => SessionState::Running,
        }
    }

    /// The session, unless a run is in flight.
    pub fn session(&self) -> Option<&AnalysisSession> {
        self.session.as_ref()
    }

    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<()> {
        let session = self.session.as_mut().ok_or(LcPhaseError::AnalysisInProgress)?;
        session.set_config(config.clone())?;
        self.config = config;
        Ok(())
    }

    /// Start analyzing `source` in the background. Returns immediately.
    ///
    /// Pre-flight errors are reported here and leave the session untouched.
    pub fn start<S>(&mut self, source: S) -> Result<()>
    where
        S: FrameSource + Send + 'static,
    {
        if self.handle.is_some() {
            return Err(LcPhaseError::AnalysisInProgress);
        }
        let session = self.session.as_ref().ok_or(LcPhaseError::AnalysisInProgress)?;
        session.preflight()?;

        let mut session = self.session.take().ok_or(LcPhaseError::AnalysisInProgress)?;
        let (tx, rx) = mpsc::channel::<SessionEvent>();
        self.cancel.store(false, Ordering::Relaxed);
        let cancel = Arc::clone(&self.cancel);

        let spawned = std::thread::Builder::new()
            .name("lcphase-analysis".into())
            .spawn(move || {
                let mut source = source;
                let sink = ChannelProgressSink::new(tx.clone());
                let state = match session.run(&mut source, &sink, &cancel) {
                    Ok(state) => state,
                    Err(e) => SessionState::Failed(FailureReason::Acquisition(e.to_string())),
                };
                let _ = tx.send(SessionEvent::Finished { state });
                session
            });

        match spawned {
            Ok(handle) => {
                debug!("Analysis worker started");
                self.handle = Some(handle);
                self.events = Some(rx);
                Ok(())
            }
            Err(e) => {
                // The closure (and the session with it) was dropped.
                self.session = Some(AnalysisSession::new(self.config.clone()));
                Err(e.into())
            }
        }
    }

    /// Next pending event, without blocking.
    pub fn poll(&self) -> Option<SessionEvent> {
        let rx = self.events.as_ref()?;
        match rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Next event, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        let rx = self.events.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Ask the running analysis to stop after the current frame.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Join the worker and take the session back. Returns the final state.
    ///
    /// Without a run in flight this returns the current state.
    pub fn wait(&mut self) -> Result<SessionState> {
        let Some(handle) = self.handle.take() else {
            return Ok(self.state());
        };
        match handle.join() {
            Ok(session) => {
                let state = session.state().clone();
                self.session = Some(session);
                Ok(state)
            }
            Err(_) => {
                error!("Analysis worker panicked");
                self.session = Some(AnalysisSession::new(self.config.clone()));
                self.events = None;
                Err(LcPhaseError::InvalidSessionState(
                    "analysis worker panicked".into(),
                ))
            }
        }
    }

    /// Reset the session to `Idle`. Rejected while a run is in flight.
    pub fn reset(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(LcPhaseError::AnalysisInProgress);
        }
        self.events = None;
        self.cancel.store(false, Ordering::Relaxed);
        match self.session.as_mut() {
            Some(session) => session.reset(),
            None => Err(LcPhaseError::AnalysisInProgress),
        }
    }
}
