use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{LcPhaseError, Result};
use crate::frame::{Frame, PixelLayout};

use super::source::{sampled_len, FrameSource, SourceEvent, SourceInfo};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files in `dir`, sorted by file name.
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decode an image file into an RGB frame.
pub fn load_frame(path: &Path, index: usize, timestamp_seconds: f64) -> Result<Frame> {
    let rgb = image::open(path)?.to_rgb8();
    let (w, h) = rgb.dimensions();
    Ok(Frame::new(
        w as usize,
        h as usize,
        PixelLayout::Rgb,
        rgb.into_raw(),
        index,
        timestamp_seconds,
    ))
}

/// Directory of still images treated as consecutive video frames at `fps`.
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    stride: usize,
    next_index: usize,
    fps: f64,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, stride: usize, fps: f64) -> Result<Self> {
        let files = list_image_files(dir)?;
        if files.is_empty() {
            return Err(LcPhaseError::Source(format!(
                "no image files found in {}",
                dir.display()
            )));
        }
        debug!(count = files.len(), dir = %dir.display(), "Found image sequence");
        Ok(Self::from_files(files, stride, fps))
    }

    pub fn from_files(files: Vec<PathBuf>, stride: usize, fps: f64) -> Self {
        Self {
            files,
            stride: stride.max(1),
            next_index: 0,
            fps,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Metadata taken from the first image.
    pub fn source_info(&self, dir: &Path) -> Result<SourceInfo> {
        let first = self
            .files
            .first()
            .ok_or_else(|| LcPhaseError::Source("empty image sequence".into()))?;
        let (width, height) = image::image_dimensions(first)?;
        Ok(SourceInfo {
            description: format!("Image sequence {}", dir.display()),
            width: width as usize,
            height: height as usize,
            total_frames: self.files.len(),
            fps: self.fps,
            has_timestamps: false,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self, _wait: Duration) -> Result<SourceEvent> {
        let index = self.next_index;
        let Some(path) = self.files.get(index) else {
            return Ok(SourceEvent::EndOfStream);
        };
        self.next_index += self.stride;

        let timestamp = index as f64 / self.fps;
        match load_frame(path, index, timestamp) {
            Ok(frame) => Ok(SourceEvent::Frame(frame)),
            Err(e) => Ok(SourceEvent::Unreadable {
                index,
                timestamp_seconds: timestamp,
                reason: format!("{}: {e}", path.display()),
            }),
        }
    }

    fn estimated_len(&self) -> Option<usize> {
        let remaining = self.files.len().saturating_sub(self.next_index);
        Some(sampled_len(remaining, self.stride))
    }
}
