use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::world::resources::ResourceKind;

pub const MIN_WORLD_SIZE: u32 = 8;
pub const MAX_WORLD_SIZE: u32 = 256;

/// Opening contents of the village stockpile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarterStockpile {
    #[serde(default = "default_food")]
    pub food: f64,
    #[serde(default = "default_stone")]
    pub stone: f64,
    #[serde(default = "default_wood")]
    pub wood: f64,
    #[serde(default = "default_water")]
    pub water: f64,
}

fn default_food() -> f64 {
    30.0
}
fn default_stone() -> f64 {
    20.0
}
fn default_wood() -> f64 {
    30.0
}
fn default_water() -> f64 {
    20.0
}

impl StarterStockpile {
    pub fn amount(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Food => self.food,
            ResourceKind::Stone => self.stone,
            ResourceKind::Wood => self.wood,
            ResourceKind::Water => self.water,
        }
    }
}

impl Default for StarterStockpile {
    fn default() -> Self {
        StarterStockpile {
            food: default_food(),
            stone: default_stone(),
            wood: default_wood(),
            water: default_water(),
        }
    }
}

/// Parameters used to procedurally generate a world.
/// Terrain is a pure function of `seed` and `size`; a seed of 0 is an ordinary seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    pub size: u32,
    #[serde(default = "default_resource_density")]
    pub resource_density: f64,
    #[serde(default)]
    pub starter_stockpile: StarterStockpile,
}

fn default_resource_density() -> f64 {
    0.35
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            seed: 12345,
            size: 48,
            resource_density: default_resource_density(),
            starter_stockpile: StarterStockpile::default(),
        }
    }
}

impl GenerationParams {
    pub fn new(size: u32, seed: u64) -> Self {
        GenerationParams {
            seed,
            size,
            ..Default::default()
        }
    }

    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self =
            toml::from_str(&content).map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_WORLD_SIZE..=MAX_WORLD_SIZE).contains(&self.size) {
            return Err(format!(
                "size must be {}-{}, got {}",
                MIN_WORLD_SIZE, MAX_WORLD_SIZE, self.size
            ));
        }
        if !(0.0..=1.0).contains(&self.resource_density) {
            return Err(format!(
                "resource_density must be 0.0-1.0, got {}",
                self.resource_density
            ));
        }
        for kind in ResourceKind::ALL {
            let amount = self.starter_stockpile.amount(kind);
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!(
                    "starter_stockpile.{} must be >= 0, got {}",
                    kind.name(),
                    amount
                ));
            }
        }
        Ok(())
    }
}
