use thiserror::Error;

#[derive(Error, Debug)]
pub enum LcPhaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Frame {index}: pixel buffer has {actual} bytes, expected {expected}")]
    BufferSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Frame {index}: {width}x{height} does not match the {mask_width}x{mask_height} mask")]
    MaskDimensionMismatch {
        index: usize,
        width: usize,
        height: usize,
        mask_width: usize,
        mask_height: usize,
    },

    #[error("Frame {index} could not be processed: {reason}")]
    FrameProcessing { index: usize, reason: String },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Mask construction failed: {0}")]
    MaskConstruction(String),

    #[error("Frame source produced no frames")]
    SourceExhaustedBeforeStart,

    #[error("Frame source failed: {0}")]
    Source(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("An analysis is already running")]
    AnalysisInProgress,

    #[error("Session is {0}; reset it before starting a new analysis")]
    InvalidSessionState(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("CSV line {line}: {reason}")]
    CsvParse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, LcPhaseError>;
