use tracing::debug;

use crate::world::cell::Coord;
use crate::world::topology::{coord_of, index_of, neighbors4, neighbors8};

pub const SOURCE_MIN_ELEVATION: f64 = 0.7;
pub const SOURCE_MIN_MOISTURE: f64 = 0.34;
pub const SEA_LEVEL: f64 = 0.15;
/// A step is only taken if the next cell is below this fraction of the current one.
const BASIN_RATIO: f64 = 0.98;
pub const MAX_STEPS: usize = 100;
const VOLUME_DECAY: f64 = 0.95;
const MIN_VOLUME: f64 = 0.1;
pub const MIN_RIVER_LENGTH: usize = 5;
/// Below this elevation a river spills into its +x/+y neighbor.
pub const WIDENING_ELEVATION: f64 = 0.38;

/// Accepted river paths plus a per-cell river mask.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiverNetwork {
    pub paths: Vec<Vec<Coord>>,
    pub mask: Vec<bool>,
}

impl RiverNetwork {
    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    pub fn cell_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Carves rivers by steepest descent from high, wet peaks.
#[derive(Debug, Clone, Default)]
pub struct RiverCarver;

impl RiverCarver {
    pub fn carve(&self, width: u32, height: u32, elevation: &[f64], moisture: &[f64]) -> RiverNetwork {
        let total = width as usize * height as usize;
        let mut network = RiverNetwork {
            paths: Vec::new(),
            mask: vec![false; total],
        };
        if elevation.len() < total || moisture.len() < total {
            return network;
        }

        let sources = find_sources(width, height, elevation, moisture);
        for source in &sources {
            let Some(path) = descend(*source, width, height, elevation) else {
                continue;
            };
            for &c in &path {
                let Some(idx) = index_of(c, width, height) else {
                    continue;
                };
                network.mask[idx] = true;
                if elevation[idx] < WIDENING_ELEVATION {
                    for spill in [c.offset(1, 0), c.offset(0, 1)] {
                        if let Some(n) = index_of(spill, width, height) {
                            network.mask[n] = true;
                        }
                    }
                }
            }
            network.paths.push(path);
        }

        debug!(
            sources = sources.len(),
            rivers = network.paths.len(),
            cells = network.cell_count(),
            "rivers carved"
        );
        network
    }
}

/// High, wet cells that are at least as tall as all eight neighbors.
pub fn find_sources(width: u32, height: u32, elevation: &[f64], moisture: &[f64]) -> Vec<Coord> {
    let total = width as usize * height as usize;
    (0..total.min(elevation.len()).min(moisture.len()))
        .filter(|&idx| elevation[idx] > SOURCE_MIN_ELEVATION && moisture[idx] > SOURCE_MIN_MOISTURE)
        .map(|idx| coord_of(idx, width))
        .filter(|&c| {
            let Some(idx) = index_of(c, width, height) else {
                return false;
            };
            neighbors8(c, width, height)
                .filter_map(|n| index_of(n, width, height))
                .all(|n| elevation[n] <= elevation[idx])
        })
        .collect()
}

/// Walk downhill from `source`. Returns `None` when the path is abandoned
/// or too short to keep.
fn descend(source: Coord, width: u32, height: u32, elevation: &[f64]) -> Option<Vec<Coord>> {
    let mut path = vec![source];
    let mut current = source;
    let mut volume = 1.0;

    for _ in 0..MAX_STEPS {
        let here = elevation[index_of(current, width, height)?];
        if here < SEA_LEVEL {
            break;
        }
        let lowest = neighbors4(current, width, height)
            .filter_map(|n| index_of(n, width, height).map(|i| (n, elevation[i])))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((next, next_elevation)) = lowest else {
            break;
        };
        if next_elevation >= here * BASIN_RATIO {
            break;
        }
        if path.contains(&next) {
            break;
        }
        volume *= VOLUME_DECAY;
        if volume < MIN_VOLUME {
            return None;
        }
        path.push(next);
        current = next;
    }

    if path.len() < MIN_RIVER_LENGTH {
        None
    } else {
        Some(path)
    }
}
