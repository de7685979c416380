//! Coherent noise fields for elevation and moisture, and the biome table
//! that turns a climate sample into terrain.

use glam::DVec2;
use noise::{NoiseFn, Value};

use crate::world::cell::Terrain;

/// `(frequency, amplitude)` per octave.
pub const OCTAVES: [(f64, f64); 5] = [
    (1.0, 1.0),
    (2.0, 0.5),
    (4.0, 0.25),
    (8.0, 0.125),
    (16.0, 0.0625),
];

const WARP_STRENGTH: f64 = 0.35;
const WARP_FREQUENCY: f64 = 0.5;
const OCTAVE_SEED_OFFSET: u32 = 1013;

/// Number of base-frequency features across the map.
const FEATURES_ACROSS: f64 = 3.0;

/// Elevation is normalized, then raised to this power: flat lowlands, sharp peaks.
pub const ELEVATION_EXPONENT: f64 = 2.5;

const ELEVATION_SALT: u32 = 0;
const MOISTURE_SALT: u32 = 0x9E37_79B9;
const ELEVATION_OFFSET: DVec2 = DVec2::new(0.0, 0.0);
const MOISTURE_OFFSET: DVec2 = DVec2::new(173.31, -91.73);

/// Multi-octave hashed lattice noise with per-octave domain warping.
///
/// Every octave displaces its sample point by a second noise sample before
/// evaluating, which breaks up the axis-aligned and diagonal streaks plain
/// lattice noise shows.
#[derive(Clone)]
pub struct NoiseField {
    base: Vec<Value>,
    warp_x: Vec<Value>,
    warp_y: Vec<Value>,
    offset: DVec2,
    scale: f64,
}

impl NoiseField {
    pub fn new(seed: u32, salt: u32, offset: DVec2, scale: f64) -> Self {
        let salted = seed ^ salt;
        let mut base = Vec::with_capacity(OCTAVES.len());
        let mut warp_x = Vec::with_capacity(OCTAVES.len());
        let mut warp_y = Vec::with_capacity(OCTAVES.len());
        for i in 0..OCTAVES.len() as u32 {
            let octave_seed = salted.wrapping_add(OCTAVE_SEED_OFFSET.wrapping_mul(i + 1));
            base.push(Value::new(salted.wrapping_add(i)));
            warp_x.push(Value::new(octave_seed));
            warp_y.push(Value::new(octave_seed.wrapping_add(7919)));
        }
        Self {
            base,
            warp_x,
            warp_y,
            offset,
            scale,
        }
    }

    /// Elevation field for a `size x size` map.
    pub fn elevation(seed: u32, size: u32) -> Self {
        Self::new(seed, ELEVATION_SALT, ELEVATION_OFFSET, map_scale(size))
    }

    /// Moisture field: different salt and offset so it does not track elevation.
    pub fn moisture(seed: u32, size: u32) -> Self {
        Self::new(seed, MOISTURE_SALT, MOISTURE_OFFSET, map_scale(size))
    }

    /// Raw sample in `[0, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let p = (DVec2::new(x, y) + self.offset) * self.scale;
        let mut sum = 0.0;
        let mut total_amplitude = 0.0;

        for (i, &(frequency, amplitude)) in OCTAVES.iter().enumerate() {
            let q = p * frequency;
            let w = q * WARP_FREQUENCY;
            let warped = DVec2::new(
                q.x + WARP_STRENGTH * self.warp_x[i].get([w.x, w.y]),
                q.y + WARP_STRENGTH * self.warp_y[i].get([w.x + 5.2, w.y + 1.3]),
            );
            sum += amplitude * self.base[i].get([warped.x, warped.y]);
            total_amplitude += amplitude;
        }

        ((sum / total_amplitude + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Sample every cell of a `width x height` grid in row-major order.
    pub fn sample_grid(&self, width: u32, height: u32) -> Vec<f64> {
        let mut out = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                out.push(self.sample(x as f64, y as f64));
            }
        }
        out
    }
}

fn map_scale(size: u32) -> f64 {
    FEATURES_ACROSS / size.max(1) as f64
}

/// Elevation for every cell: sampled, min-max normalized, then shaped.
pub fn elevation_field(seed: u32, width: u32, height: u32) -> Vec<f64> {
    let mut values = NoiseField::elevation(seed, width.max(height)).sample_grid(width, height);
    normalize(&mut values);
    for v in &mut values {
        *v = v.powf(ELEVATION_EXPONENT);
    }
    values
}

/// Moisture for every cell, min-max normalized.
pub fn moisture_field(seed: u32, width: u32, height: u32) -> Vec<f64> {
    let mut values = NoiseField::moisture(seed, width.max(height)).sample_grid(width, height);
    normalize(&mut values);
    values
}

/// Stretch values to span `[0, 1]`. A flat field collapses to 0.5.
fn normalize(values: &mut [f64]) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    for v in values.iter_mut() {
        *v = if range > 1e-12 { (*v - min) / range } else { 0.5 };
    }
}

pub const OCEAN_LEVEL: f64 = 0.08;
pub const BEACH_LEVEL: f64 = 0.12;
pub const LOWLAND_LEVEL: f64 = 0.30;
pub const MIDLAND_LEVEL: f64 = 0.55;
pub const HIGHLAND_LEVEL: f64 = 0.70;
pub const ALPINE_LEVEL: f64 = 0.85;

/// Fixed biome table over `(elevation, moisture)`.
pub fn classify_biome(elevation: f64, moisture: f64) -> Terrain {
    if elevation < OCEAN_LEVEL {
        Terrain::Ocean
    } else if elevation < BEACH_LEVEL {
        Terrain::Beach
    } else if elevation < LOWLAND_LEVEL {
        if moisture < 0.2 {
            Terrain::Desert
        } else if moisture < 0.55 {
            Terrain::Grassland
        } else if moisture < 0.8 {
            Terrain::Forest
        } else {
            Terrain::Swamp
        }
    } else if elevation < MIDLAND_LEVEL {
        if moisture < 0.25 {
            Terrain::Desert
        } else if moisture < 0.5 {
            Terrain::Grassland
        } else {
            Terrain::Forest
        }
    } else if elevation < HIGHLAND_LEVEL {
        if moisture < 0.33 {
            Terrain::Tundra
        } else {
            Terrain::Forest
        }
    } else if elevation < ALPINE_LEVEL {
        if moisture < 0.45 {
            Terrain::Mountain
        } else {
            Terrain::Tundra
        }
    } else if moisture < 0.3 {
        Terrain::Mountain
    } else {
        Terrain::Snow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_in_unit_range() {
        let field = NoiseField::elevation(7, 32);
        for y in 0..32 {
            for x in 0..32 {
                let v = field.sample(x as f64 * 1.37, y as f64 * 0.91);
                assert!((0.0..=1.0).contains(&v), "sample {} out of range", v);
            }
        }
    }

    #[test]
    fn sampling_is_deterministic() {
        let a = NoiseField::moisture(99, 24);
        let b = NoiseField::moisture(99, 24);
        for i in 0..50 {
            let (x, y) = (i as f64 * 0.7, i as f64 * 1.9);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = elevation_field(1, 16, 16);
        let b = elevation_field(2, 16, 16);
        assert_ne!(a, b);
    }

    #[test]
    fn moisture_is_not_elevation() {
        let e = NoiseField::elevation(5, 16).sample_grid(16, 16);
        let m = NoiseField::moisture(5, 16).sample_grid(16, 16);
        assert_ne!(e, m);
    }

    #[test]
    fn fields_are_normalized() {
        let e = elevation_field(12345, 20, 20);
        let m = moisture_field(12345, 20, 20);
        let max_e = e.iter().cloned().fold(f64::MIN, f64::max);
        let min_e = e.iter().cloned().fold(f64::MAX, f64::min);
        assert!((max_e - 1.0).abs() < 1e-9);
        assert!(min_e.abs() < 1e-9);
        let max_m = m.iter().cloned().fold(f64::MIN, f64::max);
        assert!((max_m - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_flat_field() {
        let mut v = vec![0.3; 4];
        normalize(&mut v);
        assert!(v.iter().all(|&x| x == 0.5));
    }

    #[test]
    fn biome_bands() {
        assert_eq!(classify_biome(0.0, 0.9), Terrain::Ocean);
        assert_eq!(classify_biome(0.1, 0.5), Terrain::Beach);
        assert_eq!(classify_biome(0.2, 0.1), Terrain::Desert);
        assert_eq!(classify_biome(0.2, 0.4), Terrain::Grassland);
        assert_eq!(classify_biome(0.2, 0.7), Terrain::Forest);
        assert_eq!(classify_biome(0.2, 0.9), Terrain::Swamp);
        assert_eq!(classify_biome(0.4, 0.6), Terrain::Forest);
        assert_eq!(classify_biome(0.6, 0.2), Terrain::Tundra);
        assert_eq!(classify_biome(0.75, 0.2), Terrain::Mountain);
        assert_eq!(classify_biome(0.9, 0.1), Terrain::Mountain);
        assert_eq!(classify_biome(0.9, 0.8), Terrain::Snow);
    }
}
