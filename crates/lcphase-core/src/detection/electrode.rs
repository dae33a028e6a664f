use ndarray::Array2;
use tracing::{debug, info};

use crate::error::{LcPhaseError, Result};
use crate::frame::{Frame, GrayBuffer, Mask};

use super::components::{label_components, Connectivity};
use super::config::MaskConfig;
use super::morphology::morphological_closing;

/// A bright region that was large enough to be treated as an electrode.
#[derive(Clone, Debug, PartialEq)]
pub struct ExcludedRegion {
    /// Area enclosed by the region's outer boundary, holes included.
    pub area: usize,
    /// Padded, clamped exclusion box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

/// Electrode mask plus the regions that produced it.
#[derive(Clone, Debug)]
pub struct ElectrodeMask {
    pub mask: Mask,
    pub regions: Vec<ExcludedRegion>,
}

/// Build the analysis mask for a video from its reference frame.
///
/// Pipeline: grayscale -> bright threshold -> closing -> connected regions ->
/// exclude the padded bounding box of every region whose outer boundary
/// encloses more than `min_area` pixels.
pub fn build_mask(frame: &Frame, config: &MaskConfig) -> Result<Mask> {
    build_electrode_mask(frame, config).map(|m| m.mask)
}

/// Same as [`build_mask`] but also returns the excluded regions.
pub fn build_electrode_mask(frame: &Frame, config: &MaskConfig) -> Result<ElectrodeMask> {
    let gray = frame
        .grayscale()
        .map_err(|e| LcPhaseError::MaskConstruction(format!("reference frame {}: {e}", frame.index)))?;
    Ok(mask_from_gray(&gray, config))
}

/// Electrode masking on an already converted grayscale image.
pub fn mask_from_gray(gray: &GrayBuffer, config: &MaskConfig) -> ElectrodeMask {
    let (h, w) = gray.dim();
    let mut mask = Mask::all_lc(w, h);

    // Step 1: bright pixels.
    let bright = gray.mapv(|v| v > config.brightness_threshold);

    // A uniformly bright (or uniformly dark) image has no region boundary,
    // so there is nothing to outline.
    let bright_count = bright.iter().filter(|&&v| v).count();
    if bright_count == 0 || bright_count == bright.len() {
        debug!(bright_count, "No bright/dark boundary; mask covers whole frame");
        return ElectrodeMask {
            mask,
            regions: Vec::new(),
        };
    }

    // Step 2: close gaps so electrodes become solid blobs.
    let closed = morphological_closing(&bright, config.closing_kernel, config.closing_iterations);

    // Step 3: exclude every large region with padding.
    let (labels, components) = label_components(&closed, Connectivity::Eight);
    let mut regions = Vec::new();
    for component in components {
        let (min_row, max_row, min_col, max_col) = component.bbox;
        // The enclosed area never exceeds the bounding box.
        if (max_row - min_row + 1) * (max_col - min_col + 1) <= config.min_area {
            continue;
        }
        let area = enclosed_area(&labels, component.label, component.bbox);
        if area <= config.min_area {
            continue;
        }
        let bbox = (
            min_row.saturating_sub(config.padding),
            max_row.saturating_add(config.padding).min(h - 1),
            min_col.saturating_sub(config.padding),
            max_col.saturating_add(config.padding).min(w - 1),
        );
        mask.exclude_rect(bbox.0, bbox.1, bbox.2, bbox.3);
        regions.push(ExcludedRegion { area, bbox });
    }

    info!(
        regions = regions.len(),
        lc_pixels = mask.lc_pixel_count(),
        excluded_pixels = mask.excluded_pixel_count(),
        "Electrode mask built"
    );

    ElectrodeMask { mask, regions }
}

/// Pixels inside the outer boundary of component `label`: its own pixels
/// plus every hole, including holes occupied by other regions.
///
/// Background is flood-filled (4-connected) inward from the edge of `bbox`;
/// whatever the fill cannot reach is enclosed.
fn enclosed_area(labels: &Array2<u32>, label: u32, bbox: (usize, usize, usize, usize)) -> usize {
    let (min_row, max_row, min_col, max_col) = bbox;
    let bh = max_row - min_row + 1;
    let bw = max_col - min_col + 1;
    let open = |r: usize, c: usize| labels[[min_row + r, min_col + c]] != label;

    let mut outside = Array2::<bool>::from_elem((bh, bw), false);
    let mut stack = Vec::new();
    let border = (0..bh)
        .flat_map(|r| [(r, 0), (r, bw - 1)])
        .chain((0..bw).flat_map(|c| [(0, c), (bh - 1, c)]));
    for (r, c) in border {
        if open(r, c) && !outside[[r, c]] {
            outside[[r, c]] = true;
            stack.push((r, c));
        }
    }

    while let Some((r, c)) = stack.pop() {
        let mut visit = |nr: usize, nc: usize| {
            if open(nr, nc) && !outside[[nr, nc]] {
                outside[[nr, nc]] = true;
                stack.push((nr, nc));
            }
        };
        if r > 0 {
            visit(r - 1, c);
        }
        if r + 1 < bh {
            visit(r + 1, c);
        }
        if c > 0 {
            visit(r, c - 1);
        }
        if c + 1 < bw {
            visit(r, c + 1);
        }
    }

    bh * bw - outside.iter().filter(|&&v| v).count()
}
