use std::fs::File;
use std::path::Path;
use std::time::Duration;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;

use crate::consts::SER_TICKS_PER_SECOND;
use crate::error::{LcPhaseError, Result};
use crate::frame::{Frame, PixelLayout};

use super::source::{sampled_len, FrameSource, SourceEvent, SourceInfo};

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

const COLOR_ID_RGB: i32 = 100;
const COLOR_ID_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 {
            1
        } else {
            2
        }
    }

    /// Samples per pixel (3 for RGB/BGR, 1 for mono and raw Bayer).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            COLOR_ID_RGB | COLOR_ID_BGR => 3,
            _ => 1,
        }
    }

    /// Bytes per frame, or `None` when the header dimensions overflow.
    pub fn frame_byte_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.bytes_per_sample() * self.planes_per_pixel())
    }

    pub fn color_name(&self) -> &'static str {
        match self.color_id {
            0 => "Mono",
            8..=11 => "Bayer (raw)",
            COLOR_ID_RGB => "RGB",
            COLOR_ID_BGR => "BGR",
            _ => "Unknown (treated as mono)",
        }
    }
}

/// Memory-mapped SER video reader.
pub struct SerReader {
    mmap: Mmap,
    pub header: SerHeader,
    frame_size: usize,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The mapping is read-only and lives as long as the reader.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(LcPhaseError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(LcPhaseError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;

        let overflow = || LcPhaseError::InvalidSer("frame size overflow".into());
        let frame_size = header.frame_byte_size().ok_or_else(overflow)?;
        let expected = frame_size
            .checked_mul(header.frame_count as usize)
            .and_then(|data| data.checked_add(SER_HEADER_SIZE))
            .ok_or_else(overflow)?;
        if mmap.len() < expected {
            return Err(LcPhaseError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            header,
            frame_size,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let count = self.frame_count();
        if index >= count {
            return Err(LcPhaseError::FrameIndexOutOfRange { index, total: count });
        }
        // `open` checked that every frame lies inside the mapping.
        let size = self.frame_size;
        let offset = SER_HEADER_SIZE + index * size;
        Ok(&self.mmap[offset..offset + size])
    }

    /// Decode one frame to 8-bit interleaved RGB.
    ///
    /// Deeper samples are scaled down to 8 bits; mono and raw Bayer data are
    /// copied to all three channels.
    pub fn read_frame(&self, index: usize, timestamp_seconds: f64) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let h = self.header.height as usize;
        let w = self.header.width as usize;
        let bps = self.header.bytes_per_sample();
        let planes = self.header.planes_per_pixel();
        let max_val = ((1u32 << self.header.pixel_depth.clamp(1, 16)) - 1) as f32;

        let sample = |i: usize| -> u8 {
            let idx = i * bps;
            let v = if bps == 1 {
                raw[idx] as f32
            } else {
                let pair = [raw[idx], raw[idx + 1]];
                if self.header.little_endian {
                    u16::from_le_bytes(pair) as f32
                } else {
                    u16::from_be_bytes(pair) as f32
                }
            };
            (v / max_val * 255.0).round().clamp(0.0, 255.0) as u8
        };

        let mut pixels = Vec::with_capacity(h * w * 3);
        for p in 0..h * w {
            if planes == 1 {
                let v = sample(p);
                pixels.extend_from_slice(&[v, v, v]);
            } else {
                let (a, b, c) = (sample(p * 3), sample(p * 3 + 1), sample(p * 3 + 2));
                if self.header.color_id == COLOR_ID_BGR {
                    pixels.extend_from_slice(&[c, b, a]);
                } else {
                    pixels.extend_from_slice(&[a, b, c]);
                }
            }
        }

        Ok(Frame::new(w, h, PixelLayout::Rgb, pixels, index, timestamp_seconds))
    }

    /// Raw trailer timestamp (100 ns ticks) for a frame, when present.
    pub fn raw_timestamp(&self, index: usize) -> Option<u64> {
        let trailer = SER_HEADER_SIZE + self.frame_size * self.frame_count();
        let offset = index.checked_mul(8)?.checked_add(trailer)?;
        let bytes = self.mmap.get(offset..offset.checked_add(8)?)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    pub fn has_timestamps(&self) -> bool {
        self.frame_count() > 0 && self.raw_timestamp(self.frame_count() - 1).is_some()
    }

    /// Seconds since the first frame, from the trailer, else from `fps`.
    pub fn timestamp_seconds(&self, index: usize, fps: f64) -> f64 {
        match (self.raw_timestamp(0), self.raw_timestamp(index)) {
            (Some(first), Some(ts)) if ts >= first => (ts - first) as f64 / SER_TICKS_PER_SECOND,
            _ => index as f64 / fps,
        }
    }

    pub fn source_info(&self, path: &Path, fps: f64) -> SourceInfo {
        SourceInfo {
            description: format!("SER video {} ({})", path.display(), self.header.color_name()),
            width: self.header.width as usize,
            height: self.header.height as usize,
            total_frames: self.frame_count(),
            fps,
            has_timestamps: self.has_timestamps(),
        }
    }
}

/// Sampled frames from a SER video.
pub struct SerFrameSource {
    reader: SerReader,
    stride: usize,
    next_index: usize,
    fps: f64,
}

impl SerFrameSource {
    pub fn open(path: &Path, stride: usize, fps: f64) -> Result<Self> {
        Ok(Self::new(SerReader::open(path)?, stride, fps))
    }

    pub fn new(reader: SerReader, stride: usize, fps: f64) -> Self {
        Self {
            reader,
            stride: stride.max(1),
            next_index: 0,
            fps,
        }
    }

    pub fn reader(&self) -> &SerReader {
        &self.reader
    }
}

impl FrameSource for SerFrameSource {
    fn next_frame(&mut self, _wait: Duration) -> Result<SourceEvent> {
        let index = self.next_index;
        if index >= self.reader.frame_count() {
            return Ok(SourceEvent::EndOfStream);
        }
        self.next_index += self.stride;

        let timestamp = self.reader.timestamp_seconds(index, self.fps);
        match self.reader.read_frame(index, timestamp) {
            Ok(frame) => Ok(SourceEvent::Frame(frame)),
            Err(e) => Ok(SourceEvent::Unreadable {
                index,
                timestamp_seconds: timestamp,
                reason: e.to_string(),
            }),
        }
    }

    fn estimated_len(&self) -> Option<usize> {
        let remaining = self.reader.frame_count().saturating_sub(self.next_index);
        Some(sampled_len(remaining, self.stride))
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]); // skip magic

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(LcPhaseError::InvalidDimensions {
            width: width.max(0) as usize,
            height: height.max(0) as usize,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(LcPhaseError::InvalidSer(format!("Unsupported pixel depth {pixel_depth}")));
    }
    if frame_count < 0 {
        return Err(LcPhaseError::InvalidSer(format!("Negative frame count {frame_count}")));
    }

    // Most capture software writes 0 for little-endian data despite the
    // format description; only an explicit 1 selects big-endian.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer: read_fixed_string(&buf[42..82]),
        instrument: read_fixed_string(&buf[82..122]),
        telescope: read_fixed_string(&buf[122..162]),
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}
