//! Macro biome regions.
//!
//! Cells are grouped around a handful of well-spread seed points so biomes
//! read as contiguous areas instead of per-cell speckle. Assignment is a
//! weighted nearest-seed search that also accounts for climate; a
//! weighted-majority filter with a rising threshold then cleans the raster.

use glam::DVec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::world::cell::{Coord, Terrain};
use crate::world::noise_field::classify_biome;
use crate::world::topology::{coord_of, index_of};

pub const MIN_REGIONS: usize = 6;
pub const MAX_REGIONS: usize = 32;
/// Cells of map area per region before clamping.
const CELLS_PER_REGION: f64 = 40.0;
pub const CANDIDATE_TRIES: usize = 15;
const EDGE_MARGIN: f64 = 0.08;
const EDGE_PENALTY: f64 = 0.85;
/// Maximum per-axis jitter, in cells, applied to the seed distance.
const DISTANCE_JITTER: f64 = 1.5;
const ELEVATION_WEIGHT: f64 = 90.0;
const MOISTURE_WEIGHT: f64 = 70.0;
const RNG_SALT: u64 = 0x5EED_BA5E;

/// `(radius, threshold)` per smoothing pass.
const SMOOTHING_PASSES: [(i32, u32); 3] = [(1, 8), (2, 12), (2, 12)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeRegion {
    pub seed: Coord,
    pub biome: Terrain,
    pub elevation: f64,
    pub moisture: f64,
    pub spread: f64,
}

/// Distance multiplier: higher keeps a region tight, lower lets it sprawl.
pub fn spread_for(biome: Terrain) -> f64 {
    match biome {
        Terrain::River => 1.4,
        Terrain::Ocean => 1.3,
        Terrain::Beach => 1.2,
        Terrain::Swamp => 1.05,
        Terrain::Grassland | Terrain::Forest => 1.0,
        Terrain::Tundra | Terrain::Snow => 0.95,
        Terrain::Mountain | Terrain::Desert => 0.8,
    }
}

/// Output of region assignment: the regions and one region id per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMap {
    pub regions: Vec<BiomeRegion>,
    pub ids: Vec<usize>,
}

impl RegionMap {
    pub fn biome_at(&self, index: usize) -> Option<Terrain> {
        self.ids
            .get(index)
            .and_then(|&id| self.regions.get(id))
            .map(|r| r.biome)
    }
}

#[derive(Debug, Clone)]
pub struct BiomeRegionAssigner {
    seed: u64,
}

impl BiomeRegionAssigner {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Partition a `width x height` grid into regions.
    ///
    /// `elevation` and `moisture` are row-major and must hold one value per cell.
    pub fn assign(&self, width: u32, height: u32, elevation: &[f64], moisture: &[f64]) -> RegionMap {
        let total = width as usize * height as usize;
        if total == 0 || elevation.len() < total || moisture.len() < total {
            return RegionMap {
                regions: Vec::new(),
                ids: vec![0; total],
            };
        }

        let regions = self.place_seeds(width, height, elevation, moisture);
        let hash_seed = (self.seed ^ (self.seed >> 32)) as u32;

        // Read-only scoring; every cell writes only its own slot.
        let raw: Vec<usize> = (0..total)
            .into_par_iter()
            .map(|idx| {
                nearest_region(
                    coord_of(idx, width),
                    elevation[idx],
                    moisture[idx],
                    &regions,
                    hash_seed,
                )
            })
            .collect();

        let mut ids = raw;
        for (pass, &(radius, threshold)) in SMOOTHING_PASSES.iter().enumerate() {
            let (next, flipped) = smooth_pass(&ids, width, height, radius, threshold);
            debug!(pass, flipped, "region smoothing pass");
            ids = next;
        }

        RegionMap { regions, ids }
    }

    fn place_seeds(&self, width: u32, height: u32, elevation: &[f64], moisture: &[f64]) -> Vec<BiomeRegion> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ RNG_SALT);
        let count = target_region_count(width, height);
        let mut regions: Vec<BiomeRegion> = Vec::with_capacity(count);

        for _ in 0..count {
            let mut best: Option<(f64, Coord)> = None;
            for _ in 0..CANDIDATE_TRIES {
                let candidate = Coord::new(
                    rng.gen_range(0..width) as i32,
                    rng.gen_range(0..height) as i32,
                );
                let score = candidate_score(candidate, &regions, width, height);
                if best.is_none_or(|(s, _)| score > s) {
                    best = Some((score, candidate));
                }
            }
            let Some((_, seed)) = best else { continue };
            let Some(idx) = index_of(seed, width, height) else {
                continue;
            };
            let biome = classify_biome(elevation[idx], moisture[idx]);
            regions.push(BiomeRegion {
                seed,
                biome,
                elevation: elevation[idx],
                moisture: moisture[idx],
                spread: spread_for(biome),
            });
        }
        regions
    }
}

/// Region count scaled to grid area, clamped to `[MIN_REGIONS, MAX_REGIONS]`.
pub fn target_region_count(width: u32, height: u32) -> usize {
    let area = width as f64 * height as f64;
    ((area / CELLS_PER_REGION).round() as usize).clamp(MIN_REGIONS, MAX_REGIONS)
}

fn candidate_score(candidate: Coord, placed: &[BiomeRegion], width: u32, height: u32) -> f64 {
    let p = DVec2::new(candidate.x as f64, candidate.y as f64);
    let nearest = placed
        .iter()
        .map(|r| p.distance(DVec2::new(r.seed.x as f64, r.seed.y as f64)))
        .fold(f64::INFINITY, f64::min);
    // First seed: every candidate is infinitely far, so compare on a finite scale.
    let distance = if nearest.is_finite() {
        nearest
    } else {
        (width as f64).hypot(height as f64)
    };
    if near_edge(candidate, width, height) {
        distance * EDGE_PENALTY
    } else {
        distance
    }
}

fn near_edge(c: Coord, width: u32, height: u32) -> bool {
    let mx = width as f64 * EDGE_MARGIN;
    let my = height as f64 * EDGE_MARGIN;
    let (x, y) = (c.x as f64, c.y as f64);
    x < mx || y < my || x > width as f64 - 1.0 - mx || y > height as f64 - 1.0 - my
}

fn nearest_region(c: Coord, elevation: f64, moisture: f64, regions: &[BiomeRegion], hash_seed: u32) -> usize {
    let jitter = DVec2::new(
        (hash01(c.x as u32, c.y as u32, hash_seed) - 0.5) * 2.0 * DISTANCE_JITTER,
        (hash01(c.x as u32, c.y as u32, hash_seed ^ 0xA5A5_A5A5) - 0.5) * 2.0 * DISTANCE_JITTER,
    );
    let p = DVec2::new(c.x as f64, c.y as f64) + jitter;

    let mut best = 0;
    let mut best_score = f64::INFINITY;
    for (id, region) in regions.iter().enumerate() {
        let warped_distance = p.distance(DVec2::new(region.seed.x as f64, region.seed.y as f64));
        let climate = (elevation - region.elevation).abs() * ELEVATION_WEIGHT
            + (moisture - region.moisture).abs() * MOISTURE_WEIGHT;
        let score = warped_distance * region.spread + climate;
        if score < best_score {
            best_score = score;
            best = id;
        }
    }
    best
}

/// One weighted-majority pass. Returns the new raster and the number of flips.
fn smooth_pass(ids: &[usize], width: u32, height: u32, radius: i32, threshold: u32) -> (Vec<usize>, usize) {
    let mut out = ids.to_vec();
    let mut flipped = 0;
    let mut votes: Vec<(usize, u32)> = Vec::with_capacity(25);

    for (idx, slot) in out.iter_mut().enumerate() {
        let c = coord_of(idx, width);
        votes.clear();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let Some(n) = index_of(c.offset(dx, dy), width, height) else {
                    continue;
                };
                let weight = match dx.abs() + dy.abs() {
                    0 => 3,
                    1 => 2,
                    _ => 1,
                };
                match votes.iter_mut().find(|(id, _)| *id == ids[n]) {
                    Some(entry) => entry.1 += weight,
                    None => votes.push((ids[n], weight)),
                }
            }
        }
        // Heaviest id wins; ties go to the lower id.
        let dominant = votes
            .iter()
            .copied()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)));
        if let Some((id, weight)) = dominant {
            if id != ids[idx] && weight >= threshold {
                *slot = id;
                flipped += 1;
            }
        }
    }
    (out, flipped)
}

/// Reconcile a region's dominant biome with the cell's own classification.
///
/// Water wins outright, whether it comes from the cell or from the region.
/// The stronger land biomes claim a cell only inside the elevation and
/// moisture band where they are plausible; everywhere else the finer local
/// classification is kept, which softens region borders.
pub fn resolve_region_terrain(region: Terrain, local: Terrain, elevation: f64, moisture: f64) -> Terrain {
    if local.is_water() {
        return local;
    }
    if region.is_water() {
        return region;
    }
    let claims = match region {
        Terrain::Snow => elevation >= 0.6,
        Terrain::Mountain => elevation >= 0.55,
        Terrain::Desert => (0.12..0.6).contains(&elevation) && moisture < 0.45,
        Terrain::Swamp => (0.12..0.3).contains(&elevation) && moisture > 0.5,
        Terrain::Tundra => elevation >= 0.4 && moisture < 0.7,
        Terrain::Forest => (0.12..0.7).contains(&elevation) && moisture > 0.3,
        _ => false,
    };
    if claims { region } else { local }
}

fn hash01(x: u32, y: u32, seed: u32) -> f64 {
    let mut n = x ^ seed.rotate_left(16);
    n = n.wrapping_mul(0x6C8E_9CF5) ^ y.wrapping_mul(0xB529_7A4D) ^ seed;
    n ^= n >> 13;
    n = n.wrapping_mul(0x68E3_1DA4);
    n ^= n >> 11;
    n = n.wrapping_mul(0x1B56_C4E9);
    n ^= n >> 16;
    n as f64 / u32::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::noise_field::{elevation_field, moisture_field};

    fn assign(seed: u64, size: u32) -> RegionMap {
        let e = elevation_field(seed as u32, size, size);
        let m = moisture_field(seed as u32, size, size);
        BiomeRegionAssigner::new(seed).assign(size, size, &e, &m)
    }

    #[test]
    fn region_count_is_clamped() {
        assert_eq!(target_region_count(4, 4), MIN_REGIONS);
        assert_eq!(target_region_count(16, 16), MIN_REGIONS);
        assert_eq!(target_region_count(20, 20), 10);
        assert_eq!(target_region_count(40, 40), MAX_REGIONS);
        assert_eq!(target_region_count(200, 200), MAX_REGIONS);
    }

    #[test]
    fn every_cell_has_a_valid_region() {
        let map = assign(12345, 24);
        assert_eq!(map.ids.len(), 24 * 24);
        assert!(!map.regions.is_empty());
        for &id in &map.ids {
            assert!(id < map.regions.len());
        }
    }

    #[test]
    fn seeds_are_distinct() {
        let map = assign(77, 32);
        let mut seeds: Vec<Coord> = map.regions.iter().map(|r| r.seed).collect();
        seeds.sort();
        let before = seeds.len();
        seeds.dedup();
        assert_eq!(before, seeds.len());
    }

    #[test]
    fn region_labels_match_seed_climate() {
        let map = assign(4, 20);
        for r in &map.regions {
            assert_eq!(r.biome, classify_biome(r.elevation, r.moisture));
            assert_eq!(r.spread, spread_for(r.biome));
        }
    }

    #[test]
    fn assignment_is_deterministic() {
        assert_eq!(assign(9001, 20), assign(9001, 20));
    }

    #[test]
    fn smoothing_removes_isolated_cell() {
        let (w, h) = (5, 5);
        let mut ids = vec![0; 25];
        ids[12] = 1;
        let (out, flipped) = smooth_pass(&ids, w, h, 1, 8);
        assert_eq!(out[12], 0);
        assert_eq!(flipped, 1);
    }

    #[test]
    fn smoothing_keeps_straight_boundaries() {
        let (w, h) = (6, 6);
        let ids: Vec<usize> = (0..36).map(|i| if i % 6 < 3 { 0 } else { 1 }).collect();
        let (out, flipped) = smooth_pass(&ids, w, h, 1, 8);
        assert_eq!(out, ids);
        assert_eq!(flipped, 0);
    }

    #[test]
    fn smoothing_respects_threshold() {
        // A corner cell only sees weight 5 from its three neighbors.
        let (w, h) = (5, 5);
        let mut ids = vec![0; 25];
        ids[0] = 1;
        let (out, flipped) = smooth_pass(&ids, w, h, 1, 8);
        assert_eq!(out[0], 1);
        assert_eq!(flipped, 0);
        let (out, _) = smooth_pass(&ids, w, h, 1, 5);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn water_always_wins() {
        assert_eq!(
            resolve_region_terrain(Terrain::Desert, Terrain::Ocean, 0.05, 0.1),
            Terrain::Ocean
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Ocean, Terrain::Grassland, 0.10, 0.4),
            Terrain::Ocean
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Ocean, Terrain::Forest, 0.3, 0.7),
            Terrain::Ocean
        );
    }

    #[test]
    fn regions_override_only_inside_their_band() {
        assert_eq!(
            resolve_region_terrain(Terrain::Mountain, Terrain::Forest, 0.6, 0.5),
            Terrain::Mountain
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Mountain, Terrain::Grassland, 0.2, 0.4),
            Terrain::Grassland
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Desert, Terrain::Grassland, 0.3, 0.3),
            Terrain::Desert
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Desert, Terrain::Forest, 0.3, 0.7),
            Terrain::Forest
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Grassland, Terrain::Forest, 0.3, 0.7),
            Terrain::Forest
        );
        assert_eq!(
            resolve_region_terrain(Terrain::Forest, Terrain::Beach, 0.1, 0.7),
            Terrain::Beach
        );
    }
}
