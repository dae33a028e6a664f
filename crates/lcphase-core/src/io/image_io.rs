use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::{LcPhaseError, Result};
use crate::frame::{BinaryImage, Mask};

fn gray_image(width: usize, height: usize, pixel: impl Fn(usize, usize) -> u8) -> GrayImage {
    let mut img = GrayImage::new(width as u32, height as u32);
    for row in 0..height {
        for col in 0..width {
            img.put_pixel(col as u32, row as u32, Luma([pixel(row, col)]));
        }
    }
    img
}

/// Save a binary image as PNG, foreground white.
pub fn save_binary_png(binary: &BinaryImage, path: &Path) -> Result<()> {
    let (h, w) = binary.dim();
    gray_image(w, h, |r, c| if binary[[r, c]] { 255 } else { 0 })
        .save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save a mask as PNG: liquid-crystal pixels white, excluded pixels black.
pub fn save_mask_png(mask: &Mask, path: &Path) -> Result<()> {
    save_binary_png(mask.data(), path)
}

/// Load a mask PNG written by [`save_mask_png`]. Pixels above 127 are liquid crystal.
pub fn load_mask_png(path: &Path) -> Result<Mask> {
    let gray = image::open(path)?.to_luma8();
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return Err(LcPhaseError::InvalidDimensions {
            width: w as usize,
            height: h as usize,
        });
    }
    let data = Array2::from_shape_fn((h as usize, w as usize), |(r, c)| {
        gray.get_pixel(c as u32, r as u32).0[0] > 127
    });
    Ok(Mask::from_array(data))
}
