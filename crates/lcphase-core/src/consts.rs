/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// ITU-R BT.601 luminance coefficient for the red channel.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 luminance coefficient for the green channel.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 luminance coefficient for the blue channel.
pub const LUMINANCE_B: f32 = 0.114;

/// Maximum 8-bit intensity. Masked pixels are forced to this value before
/// binarization so they never read as darker-than-local-mean structure.
pub const MAX_INTENSITY: u8 = 255;

/// Number of histogram bins for 8-bit equalization.
pub const HISTOGRAM_BINS: usize = 256;

// ---------------------------------------------------------------------------
// Classification defaults
// ---------------------------------------------------------------------------

/// Frames with fewer valid contours than this are ISOTROPIC.
pub const DEFAULT_CONTOUR_THRESHOLD: u32 = 15;

/// Frames with intensity variance at or above this are ISOTROPIC.
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 96.0;

/// Analyze every Nth source frame.
pub const DEFAULT_SAMPLING_STRIDE: u32 = 30;

// ---------------------------------------------------------------------------
// Electrode mask defaults
// ---------------------------------------------------------------------------

/// Grayscale level above which a pixel counts as electrode/background glare.
pub const DEFAULT_ELECTRODE_BRIGHTNESS: u8 = 200;

/// Side of the square structuring element used to close bright regions.
pub const DEFAULT_ELECTRODE_CLOSING_KERNEL: usize = 15;

/// Closing iterations applied to the bright image.
pub const DEFAULT_ELECTRODE_CLOSING_ITERATIONS: usize = 2;

/// Bright regions must be strictly larger than this (pixels) to be excluded.
pub const DEFAULT_ELECTRODE_MIN_AREA: usize = 5000;

/// Padding (pixels) added on each side of an excluded bounding box.
pub const DEFAULT_ELECTRODE_PADDING: usize = 10;

// ---------------------------------------------------------------------------
// Preprocessing defaults
// ---------------------------------------------------------------------------

/// Gaussian blur kernel size (odd).
pub const DEFAULT_BLUR_KERNEL: usize = 3;

/// CLAHE clip limit, as a multiple of the uniform bin height.
pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 2.0;

/// CLAHE tile grid size along each axis.
pub const DEFAULT_CLAHE_TILES: usize = 8;

/// Non-local-means filter strength.
pub const DEFAULT_NLM_STRENGTH: f32 = 10.0;

/// Non-local-means patch side (odd).
pub const DEFAULT_NLM_TEMPLATE: usize = 3;

/// Non-local-means search window side (odd).
pub const DEFAULT_NLM_SEARCH: usize = 7;

/// Adaptive threshold neighborhood side (odd).
pub const DEFAULT_ADAPTIVE_BLOCK: usize = 15;

/// Offset subtracted from the local mean before comparison.
pub const DEFAULT_ADAPTIVE_OFFSET: i32 = 3;

/// Opening kernel side and iterations.
pub const DEFAULT_OPEN_KERNEL: usize = 2;
pub const DEFAULT_OPEN_ITERATIONS: usize = 1;

/// Closing kernel side and iterations.
pub const DEFAULT_CLOSE_KERNEL: usize = 2;
pub const DEFAULT_CLOSE_ITERATIONS: usize = 2;

// ---------------------------------------------------------------------------
// Texture defaults
// ---------------------------------------------------------------------------

/// A region counts as a contour only when `min < area < max`.
pub const DEFAULT_CONTOUR_MIN_AREA: usize = 20;
pub const DEFAULT_CONTOUR_MAX_AREA: usize = 2000;

/// Sobel magnitude above which a pixel is an edge pixel.
pub const DEFAULT_GRADIENT_THRESHOLD: f64 = 25.0;

/// Divisor bringing summed 3x3 local variance into contour-count range.
pub const DEFAULT_LOCAL_VARIANCE_DIVISOR: f64 = 10_000.0;

/// Divisor bringing the edge pixel count into contour-count range.
pub const DEFAULT_EDGE_DIVISOR: f64 = 100.0;

// ---------------------------------------------------------------------------
// Source defaults
// ---------------------------------------------------------------------------

/// Frame rate assumed when a source carries no timestamps.
pub const DEFAULT_FPS: f64 = 30.0;

/// Longest wait for a single frame before it is skipped.
pub const DEFAULT_FRAME_WAIT_MS: u64 = 5_000;

/// Consecutive skipped frames after which acquisition is considered failed.
pub const DEFAULT_MAX_CONSECUTIVE_TIMEOUTS: u32 = 5;

/// Frames buffered between a prefetch decode thread and the session.
pub const PREFETCH_QUEUE_DEPTH: usize = 4;

/// SER trailer timestamps tick in 100 ns units.
pub const SER_TICKS_PER_SECOND: f64 = 10_000_000.0;

/// Seconds per minute, for statistics and export.
pub const SECONDS_PER_MINUTE: f64 = 60.0;
