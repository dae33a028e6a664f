use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use tracing::{debug, warn};

use crate::consts::PREFETCH_QUEUE_DEPTH;
use crate::error::{LcPhaseError, Result};
use crate::frame::Frame;

/// Outcome of asking a source for its next sampled frame.
#[derive(Debug)]
pub enum SourceEvent {
    Frame(Frame),
    /// A frame exists at this position but could not be decoded.
    Unreadable {
        index: usize,
        timestamp_seconds: f64,
        reason: String,
    },
    /// No frame arrived within the allowed wait; the frame is skipped.
    TimedOut,
    EndOfStream,
}

/// Forward-only sequence of sampled frames with increasing timestamps.
///
/// The source applies the sampling stride itself. `Err` means acquisition as a
/// whole has failed; single undecodable frames are reported as
/// [`SourceEvent::Unreadable`].
pub trait FrameSource {
    fn next_frame(&mut self, wait: Duration) -> Result<SourceEvent>;

    /// Expected number of sampled frames, if known.
    fn estimated_len(&self) -> Option<usize> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self, wait: Duration) -> Result<SourceEvent> {
        (**self).next_frame(wait)
    }

    fn estimated_len(&self) -> Option<usize> {
        (**self).estimated_len()
    }
}

/// Metadata about a frame source.
#[derive(Clone, Debug)]
pub struct SourceInfo {
    pub description: String,
    pub width: usize,
    pub height: usize,
    /// Frames in the underlying video, before sampling.
    pub total_frames: usize,
    pub fps: f64,
    pub has_timestamps: bool,
}

/// Number of samples taken from `total` frames at `stride`.
pub fn sampled_len(total: usize, stride: usize) -> usize {
    let stride = stride.max(1);
    total.div_ceil(stride)
}

/// In-memory frames, sampled at a fixed stride.
pub struct VecFrameSource {
    frames: std::vec::IntoIter<Frame>,
    stride: usize,
    remaining: usize,
    started: bool,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self::with_stride(frames, 1)
    }

    /// Yield frames 0, stride, 2*stride, ... of `frames`.
    pub fn with_stride(frames: Vec<Frame>, stride: usize) -> Self {
        let stride = stride.max(1);
        let remaining = sampled_len(frames.len(), stride);
        Self {
            frames: frames.into_iter(),
            stride,
            remaining,
            started: false,
        }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self, _wait: Duration) -> Result<SourceEvent> {
        let skip = if self.started { self.stride - 1 } else { 0 };
        self.started = true;
        match self.frames.nth(skip) {
            Some(frame) => {
                self.remaining = self.remaining.saturating_sub(1);
                Ok(SourceEvent::Frame(frame))
            }
            None => Ok(SourceEvent::EndOfStream),
        }
    }

    fn estimated_len(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

type Delivery = Result<SourceEvent>;

/// Runs a source on its own decode thread and hands frames over a bounded
/// channel, so a stalled decoder costs at most `wait` per frame.
///
/// A frame that arrives after its wait expired is discarded.
pub struct PrefetchSource {
    rx: Receiver<Delivery>,
    estimated_len: Option<usize>,
    pending_skips: usize,
    finished: bool,
}

impl PrefetchSource {
    pub fn spawn<S>(source: S) -> Result<Self>
    where
        S: FrameSource + Send + 'static,
    {
        let estimated_len = source.estimated_len();
        let (tx, rx) = mpsc::sync_channel::<Delivery>(PREFETCH_QUEUE_DEPTH);

        std::thread::Builder::new()
            .name("lcphase-decode".into())
            .spawn(move || decode_loop(source, tx))?;

        Ok(Self {
            rx,
            estimated_len,
            pending_skips: 0,
            finished: false,
        })
    }
}

fn decode_loop<S: FrameSource>(mut source: S, tx: SyncSender<Delivery>) {
    // The decode thread itself never gives up on a frame.
    let patience = Duration::from_secs(3600);
    loop {
        let delivery = source.next_frame(patience);
        let last = matches!(delivery, Ok(SourceEvent::EndOfStream) | Err(_));
        if matches!(delivery, Ok(SourceEvent::TimedOut)) {
            continue;
        }
        if tx.send(delivery).is_err() {
            debug!("Prefetch receiver dropped; stopping decode thread");
            return;
        }
        if last {
            return;
        }
    }
}

impl FrameSource for PrefetchSource {
    fn next_frame(&mut self, wait: Duration) -> Result<SourceEvent> {
        if self.finished {
            return Ok(SourceEvent::EndOfStream);
        }
        loop {
            match self.rx.recv_timeout(wait) {
                Ok(Ok(SourceEvent::EndOfStream)) => {
                    self.finished = true;
                    return Ok(SourceEvent::EndOfStream);
                }
                Ok(Ok(event)) => {
                    if self.pending_skips > 0 {
                        self.pending_skips -= 1;
                        debug!("Discarding late frame");
                        continue;
                    }
                    self.estimated_len = self.estimated_len.map(|n| n.saturating_sub(1));
                    return Ok(event);
                }
                Ok(Err(e)) => {
                    self.finished = true;
                    return Err(e);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(wait_ms = wait.as_millis() as u64, "Frame wait expired; skipping frame");
                    self.pending_skips += 1;
                    self.estimated_len = self.estimated_len.map(|n| n.saturating_sub(1));
                    return Ok(SourceEvent::TimedOut);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.finished = true;
                    return Err(LcPhaseError::Source("decode thread stopped unexpectedly".into()));
                }
            }
        }
    }

    fn estimated_len(&self) -> Option<usize> {
        self.estimated_len
    }
}
