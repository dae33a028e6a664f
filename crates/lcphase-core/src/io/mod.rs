pub mod export;
pub mod image_io;
pub mod image_seq;
pub mod ser;
pub mod source;

pub use export::{read_csv, write_csv, ExportRow};
pub use image_seq::ImageSequenceSource;
pub use ser::{SerFrameSource, SerReader};
pub use source::{FrameSource, PrefetchSource, SourceEvent, SourceInfo, VecFrameSource};

use std::path::Path;

use crate::error::Result;

/// Open a SER file or an image directory as a frame source.
pub fn open_source(path: &Path, stride: usize, fps: f64) -> Result<(Box<dyn FrameSource + Send>, SourceInfo)> {
    if path.is_dir() {
        let source = ImageSequenceSource::open(path, stride, fps)?;
        let info = source.source_info(path)?;
        Ok((Box::new(source), info))
    } else {
        let reader = SerReader::open(path)?;
        let info = reader.source_info(path, fps);
        Ok((Box::new(SerFrameSource::new(reader, stride, fps)), info))
    }
}
