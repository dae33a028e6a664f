use crate::frame::GrayBuffer;

use super::map_pixels;

/// Non-local means denoising of an 8-bit image.
///
/// Every pixel becomes a weighted mean of the pixels in a `search x search`
/// window around it, weighted by `exp(-d / h^2)` where `d` is the mean squared
/// difference between the `template x template` patches around the two
/// pixels. Patch samples outside the image replicate the nearest edge pixel.
pub fn non_local_means(data: &GrayBuffer, strength: f32, template: usize, search: usize) -> GrayBuffer {
    let (h, w) = data.dim();
    if h == 0 || w == 0 || strength <= 0.0 {
        return data.clone();
    }
    let t_radius = (template / 2) as isize;
    let s_radius = (search / 2) as isize;
    let h2 = strength * strength;
    let patch_len = ((2 * t_radius + 1) * (2 * t_radius + 1)) as f32;

    let at = |row: isize, col: isize| -> f32 {
        let r = row.clamp(0, h as isize - 1) as usize;
        let c = col.clamp(0, w as isize - 1) as usize;
        data[[r, c]] as f32
    };

    map_pixels(h, w, |row, col| {
        let (row, col) = (row as isize, col as isize);
        let mut weighted = 0.0f32;
        let mut total_weight = 0.0f32;

        for dr in -s_radius..=s_radius {
            for dc in -s_radius..=s_radius {
                let (qr, qc) = (row + dr, col + dc);
                if qr < 0 || qr >= h as isize || qc < 0 || qc >= w as isize {
                    continue;
                }

                let mut dist = 0.0f32;
                for pr in -t_radius..=t_radius {
                    for pc in -t_radius..=t_radius {
                        let diff = at(row + pr, col + pc) - at(qr + pr, qc + pc);
                        dist += diff * diff;
                    }
                }
                let weight = (-(dist / patch_len) / h2).exp();
                weighted += weight * at(qr, qc);
                total_weight += weight;
            }
        }

        // The center pixel always contributes weight 1, so total_weight > 0.
        (weighted / total_weight).round().clamp(0.0, 255.0) as u8
    })
}
