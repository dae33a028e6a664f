use std::collections::VecDeque;
use std::time::Duration;

use lcphase_core::analysis::Phase;
use lcphase_core::error::{LcPhaseError, Result};
use lcphase_core::frame::{Frame, GrayBuffer};
use lcphase_core::io::ser::SER_HEADER_SIZE;
use lcphase_core::io::source::{FrameSource, SourceEvent};
use lcphase_core::pipeline::FrameResult;
use ndarray::Array2;

/// Build a SER file header.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB, 101=BGR
pub fn build_ser_header(width: u32, height: u32, bit_depth: u32, num_frames: usize, color_id: i32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    // Magic (14 bytes)
    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID
    buf.extend_from_slice(&color_id.to_le_bytes());
    // LittleEndian = 0
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope (40 bytes each)
    let mut observer = [0u8; 40];
    observer[..7].copy_from_slice(b"lab-one");
    buf.extend_from_slice(&observer);
    buf.extend_from_slice(&[0u8; 40]);
    buf.extend_from_slice(&[0u8; 40]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete mono 8-bit SER file with the given frame data.
pub fn build_mono_ser(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, 8, frames.len(), 0);
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Append a timestamp trailer (100 ns ticks).
pub fn append_timestamps(buf: &mut Vec<u8>, ticks: &[u64]) {
    for t in ticks {
        buf.extend_from_slice(&t.to_le_bytes());
    }
}

/// Write a buffer to a temporary file that lives as long as the handle.
pub fn write_temp_file(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

/// Deterministic pseudo-random levels in `[0, max]`.
pub fn noise_gray(h: usize, w: usize, max: u8, seed: u64) -> GrayBuffer {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array2::from_shape_fn((h, w), |_| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % (max as u64 + 1)) as u8
    })
}

/// Noise frame with a saturated square in the top-left corner.
pub fn corner_electrode_frame(size: usize, square: usize, index: usize, ts: f64) -> Frame {
    let mut gray = noise_gray(size, size, 150, index as u64 + 7);
    for row in 0..square {
        for col in 0..square {
            gray[[row, col]] = 255;
        }
    }
    Frame::from_gray(&gray, index, ts)
}

/// Gray background with a regular grid of dark squares, one per 24x24 cell.
pub fn dotted_gray(cells: usize, dot: usize) -> GrayBuffer {
    let size = cells * 24;
    Array2::from_shape_fn((size, size), |(row, col)| {
        let (r, c) = (row % 24, col % 24);
        if (8..8 + dot).contains(&r) && (8..8 + dot).contains(&c) {
            40
        } else {
            180
        }
    })
}

pub fn result(index: usize, seconds: f64, by_contour: Phase, by_variance: Phase) -> FrameResult {
    FrameResult {
        frame_index: index,
        timestamp_seconds: seconds,
        num_contours: if by_contour == Phase::Cholesteric { 40 } else { 3 },
        phase_by_contour: by_contour,
        variance: if by_variance == Phase::Isotropic { 120.5 } else { 12.25 },
        std_dev: if by_variance == Phase::Isotropic { 120.5f64.sqrt() } else { 3.5 },
        phase_by_variance: by_variance,
        lc_pixel_count: 1000,
    }
}

/// Source that replays a fixed list of events, then reports end of stream.
pub struct ScriptedSource {
    events: VecDeque<Result<SourceEvent>>,
}

impl ScriptedSource {
    pub fn new(events: Vec<Result<SourceEvent>>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn frames(frames: Vec<Frame>) -> Self {
        Self::new(frames.into_iter().map(|f| Ok(SourceEvent::Frame(f))).collect())
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self, _wait: Duration) -> Result<SourceEvent> {
        self.events.pop_front().unwrap_or(Ok(SourceEvent::EndOfStream))
    }

    fn estimated_len(&self) -> Option<usize> {
        Some(self.events.len())
    }
}

/// Source that sleeps before delivering each frame.
pub struct SlowSource {
    pub frames: VecDeque<Frame>,
    pub delay: Duration,
}

impl SlowSource {
    pub fn new(count: usize, delay: Duration) -> Self {
        Self {
            frames: (0..count).map(|i| Frame::uniform(16, 16, 120, i, i as f64)).collect(),
            delay,
        }
    }
}

impl FrameSource for SlowSource {
    fn next_frame(&mut self, _wait: Duration) -> Result<SourceEvent> {
        std::thread::sleep(self.delay);
        Ok(match self.frames.pop_front() {
            Some(f) => SourceEvent::Frame(f),
            None => SourceEvent::EndOfStream,
        })
    }
}

pub fn source_error(msg: &str) -> Result<SourceEvent> {
    Err(LcPhaseError::Source(msg.into()))
}
