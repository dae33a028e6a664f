pub mod analyze;
pub mod config;
pub mod info;
pub mod inspect;
pub mod mask;
pub mod summarize;

use std::path::Path;

use anyhow::{Context, Result};
use lcphase_core::frame::Frame;
use lcphase_core::io::image_seq::{list_image_files, load_frame};
use lcphase_core::io::ser::SerReader;
use lcphase_core::pipeline::AnalysisConfig;

/// Load the TOML config at `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Decode a single frame of a SER file or image directory by source index.
pub fn load_source_frame(input: &Path, index: usize, fps: f64) -> Result<Frame> {
    if input.is_dir() {
        let files = list_image_files(input)
            .with_context(|| format!("Failed to list images in {}", input.display()))?;
        let path = files.get(index).with_context(|| {
            format!("Frame {index} out of range ({} images)", files.len())
        })?;
        load_frame(path, index, index as f64 / fps)
            .with_context(|| format!("Failed to decode {}", path.display()))
    } else {
        let reader = SerReader::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        let timestamp = reader.timestamp_seconds(index, fps);
        reader
            .read_frame(index, timestamp)
            .with_context(|| format!("Failed to read frame {index}"))
    }
}
