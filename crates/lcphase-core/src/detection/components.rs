use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Pixel adjacency used when grouping foreground pixels into regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge neighbors only.
    Four,
    /// Edge and corner neighbors.
    #[default]
    Eight,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Four => write!(f, "4-connected"),
            Self::Eight => write!(f, "8-connected"),
        }
    }
}

/// Statistics for a single connected component.
#[derive(Clone, Debug)]
pub struct ComponentStats {
    /// Unique label for this component.
    pub label: u32,
    /// Number of pixels in the component.
    pub area: usize,
    /// Bounding box: (min_row, max_row, min_col, max_col).
    pub bbox: (usize, usize, usize, usize),
}

/// Perform connected component analysis on a binary image using two-pass
/// labeling with union-find.
///
/// Returns component statistics sorted by area descending (largest first).
pub fn connected_components(mask: &Array2<bool>, connectivity: Connectivity) -> Vec<ComponentStats> {
    label_components(mask, connectivity).1
}

/// Same as [`connected_components`], also returning the label image.
///
/// Every foreground pixel holds its component's `label`; background is 0.
pub fn label_components(
    mask: &Array2<bool>,
    connectivity: Connectivity,
) -> (Array2<u32>, Vec<ComponentStats>) {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return (Array2::zeros((h, w)), Vec::new());
    }

    let mut labels = Array2::<u32>::zeros((h, w));
    let mut next_label: u32 = 1;
    // Union-find parent array. Index 0 unused; labels start at 1.
    let mut parent: Vec<u32> = vec![0; h * w / 2 + 2];

    // Pass 1: assign provisional labels from already-visited neighbors.
    let mut neighbors: Vec<u32> = Vec::with_capacity(4);
    for row in 0..h {
        for col in 0..w {
            if !mask[[row, col]] {
                continue;
            }

            neighbors.clear();
            if col > 0 {
                neighbors.push(labels[[row, col - 1]]);
            }
            if row > 0 {
                neighbors.push(labels[[row - 1, col]]);
                if connectivity == Connectivity::Eight {
                    if col > 0 {
                        neighbors.push(labels[[row - 1, col - 1]]);
                    }
                    if col + 1 < w {
                        neighbors.push(labels[[row - 1, col + 1]]);
                    }
                }
            }
            neighbors.retain(|&l| l > 0);

            match neighbors.iter().copied().min() {
                None => {
                    if next_label as usize >= parent.len() {
                        parent.resize(parent.len() * 2, 0);
                    }
                    parent[next_label as usize] = next_label;
                    labels[[row, col]] = next_label;
                    next_label += 1;
                }
                Some(smallest) => {
                    labels[[row, col]] = smallest;
                    for &other in &neighbors {
                        if other != smallest {
                            union(&mut parent, smallest, other);
                        }
                    }
                }
            }
        }
    }

    // Flatten parent references.
    for i in 1..next_label as usize {
        parent[i] = find(&parent, i as u32);
    }

    // Pass 2: resolve labels and collect stats.
    let mut stats_map = HashMap::<u32, ComponentStats>::new();

    for row in 0..h {
        for col in 0..w {
            let lbl = labels[[row, col]];
            if lbl == 0 {
                continue;
            }
            let root = parent[lbl as usize];
            labels[[row, col]] = root;

            let entry = stats_map.entry(root).or_insert(ComponentStats {
                label: root,
                area: 0,
                bbox: (row, row, col, col),
            });

            entry.area += 1;
            entry.bbox.0 = entry.bbox.0.min(row);
            entry.bbox.1 = entry.bbox.1.max(row);
            entry.bbox.2 = entry.bbox.2.min(col);
            entry.bbox.3 = entry.bbox.3.max(col);
        }
    }

    let mut components: Vec<ComponentStats> = stats_map.into_values().collect();
    components.sort_unstable_by(|a, b| b.area.cmp(&a.area).then(a.label.cmp(&b.label)));
    (labels, components)
}

fn find(parent: &[u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // Merge larger root into smaller root to keep labels consistent.
        let (small, big) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[big as usize] = small;
    }
}
