use crate::consts::HISTOGRAM_BINS;
use crate::frame::GrayBuffer;

use super::map_pixels;

fn histogram<'a>(values: impl Iterator<Item = &'a u8>) -> [u32; HISTOGRAM_BINS] {
    let mut hist = [0u32; HISTOGRAM_BINS];
    for &v in values {
        hist[v as usize] += 1;
    }
    hist
}

/// Lookup table mapping each level through the normalized cumulative histogram.
///
/// A histogram with a single occupied bin maps to itself.
fn equalization_lut(hist: &[u32; HISTOGRAM_BINS]) -> [u8; HISTOGRAM_BINS] {
    let mut lut = [0u8; HISTOGRAM_BINS];
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    let first = hist.iter().position(|&c| c > 0);

    let Some(first) = first else {
        for (i, v) in lut.iter_mut().enumerate() {
            *v = i as u8;
        }
        return lut;
    };
    let cdf_min = hist[first] as u64;
    if cdf_min == total {
        lut.iter_mut().for_each(|v| *v = first as u8);
        return lut;
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut cdf = 0u64;
    for (i, &count) in hist.iter().enumerate() {
        cdf += count as u64;
        let mapped = if cdf <= cdf_min {
            0.0
        } else {
            (cdf - cdf_min) as f64 * scale
        };
        lut[i] = mapped.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Global histogram equalization.
pub fn equalize_histogram(data: &GrayBuffer) -> GrayBuffer {
    let lut = equalization_lut(&histogram(data.iter()));
    data.mapv(|v| lut[v as usize])
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into `tiles x tiles` regions; each region's histogram is
/// clipped at `clip_limit` times the uniform bin height, the excess spread
/// evenly over all bins, and the resulting per-tile mappings are bilinearly
/// interpolated between tile centers.
pub fn clahe(data: &GrayBuffer, tiles: usize, clip_limit: f32) -> GrayBuffer {
    let (h, w) = data.dim();
    if h == 0 || w == 0 || tiles == 0 {
        return data.clone();
    }
    let tile_w = w / tiles;
    let tile_h = h / tiles;
    if tile_w == 0 || tile_h == 0 {
        return equalize_histogram(data);
    }

    // Per-tile clipped-CDF lookup tables.
    let mut maps = vec![[0u8; HISTOGRAM_BINS]; tiles * tiles];
    for ty in 0..tiles {
        for tx in 0..tiles {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles - 1 { w } else { x0 + tile_w };
            let y1 = if ty == tiles - 1 { h } else { y0 + tile_h };
            let tile_pixels = (x1 - x0) * (y1 - y0);

            let tile = data.slice(ndarray::s![y0..y1, x0..x1]);
            let mut hist = histogram(tile.iter());

            let clip = ((clip_limit * tile_pixels as f32 / HISTOGRAM_BINS as f32) as u32).max(1);
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let per_bin = excess / HISTOGRAM_BINS as u32;
            let remainder = (excess % HISTOGRAM_BINS as u32) as usize;
            for (i, bin) in hist.iter_mut().enumerate() {
                *bin += per_bin;
                if i < remainder {
                    *bin += 1;
                }
            }

            maps[ty * tiles + tx] = clipped_cdf_lut(&hist, tile_pixels);
        }
    }

    let tw = tile_w as f32;
    let th = tile_h as f32;
    let last = tiles as isize - 1;
    map_pixels(h, w, |row, col| {
        let level = data[[row, col]] as usize;

        let fx = (col as f32 + 0.5) / tw - 0.5;
        let fy = (row as f32 + 0.5) / th - 0.5;
        let tx0 = (fx.floor() as isize).clamp(0, last) as usize;
        let ty0 = (fy.floor() as isize).clamp(0, last) as usize;
        let tx1 = (tx0 + 1).min(tiles - 1);
        let ty1 = (ty0 + 1).min(tiles - 1);
        let ax = (fx - tx0 as f32).clamp(0.0, 1.0);
        let ay = (fy - ty0 as f32).clamp(0.0, 1.0);

        let v00 = maps[ty0 * tiles + tx0][level] as f32;
        let v01 = maps[ty0 * tiles + tx1][level] as f32;
        let v10 = maps[ty1 * tiles + tx0][level] as f32;
        let v11 = maps[ty1 * tiles + tx1][level] as f32;

        let top = v00 * (1.0 - ax) + v01 * ax;
        let bottom = v10 * (1.0 - ax) + v11 * ax;
        (top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8
    })
}

fn clipped_cdf_lut(hist: &[u32; HISTOGRAM_BINS], tile_pixels: usize) -> [u8; HISTOGRAM_BINS] {
    let mut lut = [0u8; HISTOGRAM_BINS];
    let scale = 255.0 / tile_pixels.max(1) as f32;
    let mut cdf = 0u32;
    for (i, &count) in hist.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
