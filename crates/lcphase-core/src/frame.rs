use ndarray::Array2;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, MAX_INTENSITY};
use crate::error::{LcPhaseError, Result};

/// Single-channel 8-bit intensities, shape = (height, width).
pub type GrayBuffer = Array2<u8>;

/// Binarized image, `true` = foreground (rendered as 255).
pub type BinaryImage = Array2<bool>;

/// Channel layout of a raw frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// A decoded video frame with interleaved 8-bit color samples.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    /// Row-major interleaved R,G,B[,A] bytes.
    pub pixels: Vec<u8>,
    /// Index of this frame in the source video (not the sample count).
    pub index: usize,
    /// Seconds since the start of the video.
    pub timestamp_seconds: f64,
}

impl Frame {
    pub fn new(
        width: usize,
        height: usize,
        layout: PixelLayout,
        pixels: Vec<u8>,
        index: usize,
        timestamp_seconds: f64,
    ) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
            index,
            timestamp_seconds,
        }
    }

    /// Build an RGB frame where every pixel has the same gray level.
    pub fn uniform(width: usize, height: usize, level: u8, index: usize, timestamp_seconds: f64) -> Self {
        Self::new(
            width,
            height,
            PixelLayout::Rgb,
            vec![level; width * height * 3],
            index,
            timestamp_seconds,
        )
    }

    /// Build an RGB frame from a grayscale buffer (each level copied to R, G and B).
    pub fn from_gray(gray: &GrayBuffer, index: usize, timestamp_seconds: f64) -> Self {
        let (h, w) = gray.dim();
        let mut pixels = Vec::with_capacity(h * w * 3);
        for &v in gray.iter() {
            pixels.extend_from_slice(&[v, v, v]);
        }
        Self::new(w, h, PixelLayout::Rgb, pixels, index, timestamp_seconds)
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Check that the buffer length matches the declared geometry.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LcPhaseError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self.width * self.height * self.layout.channels();
        if self.pixels.len() != expected {
            return Err(LcPhaseError::BufferSizeMismatch {
                index: self.index,
                expected,
                actual: self.pixels.len(),
            });
        }
        Ok(())
    }

    /// Convert to BT.601 luminance, rounded to the nearest 8-bit level.
    pub fn grayscale(&self) -> Result<GrayBuffer> {
        self.validate()?;
        let channels = self.layout.channels();
        let w = self.width;
        let px = &self.pixels;
        Ok(Array2::from_shape_fn((self.height, self.width), |(row, col)| {
            let i = (row * w + col) * channels;
            luminance_u8(px[i], px[i + 1], px[i + 2])
        }))
    }
}

/// BT.601 luminance of one RGB sample.
pub fn luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMINANCE_R * r as f32 + LUMINANCE_G * g as f32 + LUMINANCE_B * b as f32;
    y.round().clamp(0.0, MAX_INTENSITY as f32) as u8
}

/// Per-video analysis mask. `true` marks a liquid-crystal (LC) pixel,
/// `false` an excluded electrode/background pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    data: Array2<bool>,
}

impl Mask {
    /// Mask with every pixel analyzed.
    pub fn all_lc(width: usize, height: usize) -> Self {
        Self {
            data: Array2::from_elem((height, width), true),
        }
    }

    pub fn from_array(data: Array2<bool>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_lc(&self, row: usize, col: usize) -> bool {
        self.data[[row, col]]
    }

    pub fn lc_pixel_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn excluded_pixel_count(&self) -> usize {
        self.data.len() - self.lc_pixel_count()
    }

    /// Exclude the inclusive rectangle `[min_row, max_row] x [min_col, max_col]`,
    /// clamped to the mask bounds.
    pub fn exclude_rect(&mut self, min_row: usize, max_row: usize, min_col: usize, max_col: usize) {
        let (h, w) = self.data.dim();
        if h == 0 || w == 0 || min_row >= h || min_col >= w {
            return;
        }
        let max_row = max_row.min(h - 1);
        let max_col = max_col.min(w - 1);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.data[[row, col]] = false;
            }
        }
    }

    /// Fail with a frame-level error when `frame` does not share this mask's geometry.
    pub fn check_frame(&self, frame: &Frame) -> Result<()> {
        if frame.dim() != self.dim() {
            return Err(LcPhaseError::MaskDimensionMismatch {
                index: frame.index,
                width: frame.width,
                height: frame.height,
                mask_width: self.width(),
                mask_height: self.height(),
            });
        }
        Ok(())
    }
}
