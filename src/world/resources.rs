use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::world::cell::{Terrain, WorldCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Food,
    Stone,
    Wood,
    Water,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Food,
        ResourceKind::Stone,
        ResourceKind::Wood,
        ResourceKind::Water,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Stone => "stone",
            ResourceKind::Wood => "wood",
            ResourceKind::Water => "water",
        }
    }

    /// Nominal stock before richness and terrain scaling.
    fn base_cap(self) -> f64 {
        match self {
            ResourceKind::Food => 40.0,
            ResourceKind::Stone => 120.0,
            ResourceKind::Wood => 80.0,
            ResourceKind::Water => 60.0,
        }
    }
}

/// Outer-loop climate flags, supplied each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Climate {
    pub drought: bool,
    pub rain: bool,
}

impl Climate {
    /// Growth multiplier for renewable resources and crops.
    pub fn growth_factor(self) -> f64 {
        match (self.drought, self.rain) {
            (true, _) => 0.25,
            (false, true) => 1.5,
            (false, false) => 1.0,
        }
    }
}

/// A harvestable deposit sitting on a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub kind: ResourceKind,
    pub amount: f64,
    pub renewable: bool,
    pub richness: f64,
}

impl ResourceNode {
    pub fn new(kind: ResourceKind, richness: f64, terrain: Terrain) -> Self {
        let mut node = Self {
            kind,
            amount: 0.0,
            renewable: !matches!(kind, ResourceKind::Stone),
            richness,
        };
        node.amount = node.cap(terrain);
        node
    }

    /// Maximum amount this node can hold on the given terrain.
    pub fn cap(&self, terrain: Terrain) -> f64 {
        let terrain_factor = match (self.kind, terrain) {
            (ResourceKind::Wood, Terrain::Forest) => 1.5,
            (ResourceKind::Wood, Terrain::Swamp | Terrain::Tundra) => 0.6,
            (ResourceKind::Stone, Terrain::Mountain | Terrain::Tundra) => 1.5,
            (ResourceKind::Stone, Terrain::Desert | Terrain::Snow) => 1.2,
            (ResourceKind::Food, Terrain::Grassland) => 1.25,
            (ResourceKind::Food, Terrain::Desert | Terrain::Tundra | Terrain::Snow) => 0.4,
            (ResourceKind::Water, Terrain::Swamp) => 1.3,
            (ResourceKind::Water, Terrain::Desert) => 0.5,
            _ => 1.0,
        };
        self.kind.base_cap() * terrain_factor * self.richness
    }

    /// Add regrowth for one tick; returns the amount added.
    pub fn regrow(&mut self, terrain: Terrain, fertility: f64, climate: Climate, rate: f64) -> f64 {
        if !self.renewable {
            return 0.0;
        }
        let cap = self.cap(terrain);
        let before = self.amount;
        let growth = rate * self.richness * fertility * climate.growth_factor();
        self.amount = (self.amount + growth).clamp(0.0, cap);
        self.amount - before
    }

    /// Remove up to `requested`; returns what was actually taken.
    pub fn take(&mut self, requested: f64) -> f64 {
        let taken = requested.max(0.0).min(self.amount);
        self.amount -= taken;
        taken
    }

    pub fn is_depleted(&self) -> bool {
        self.amount <= f64::EPSILON
    }
}

/// Fertility in `[0, 1]` from terrain, moisture and river adjacency.
pub fn fertility_for(terrain: Terrain, moisture: f64, near_river: bool) -> f64 {
    let base = match terrain {
        Terrain::Ocean | Terrain::River => 0.0,
        Terrain::Mountain | Terrain::Snow => 0.05,
        Terrain::Desert => 0.1,
        Terrain::Tundra => 0.2,
        Terrain::Beach => 0.25,
        Terrain::Swamp => 0.45,
        Terrain::Forest => 0.5,
        Terrain::Grassland => 0.6,
    };
    let river_bonus = if near_river && terrain.is_walkable() {
        0.15
    } else {
        0.0
    };
    (base + moisture * 0.3 + river_bonus).clamp(0.0, 1.0)
}

/// Roll a resource node for one cell. `density` scales every probability.
pub fn roll_resource(
    cell: &WorldCell,
    near_river: bool,
    near_mountain: bool,
    density: f64,
    rng: &mut impl Rng,
) -> Option<ResourceNode> {
    let kind = match cell.terrain {
        Terrain::Ocean | Terrain::River => return None,
        Terrain::Forest => {
            if rng.r#gen::<f64>() < density * 0.7 {
                ResourceKind::Wood
            } else if rng.r#gen::<f64>() < density * 0.2 {
                ResourceKind::Food
            } else {
                return None;
            }
        }
        Terrain::Grassland => {
            if near_river && rng.r#gen::<f64>() < density * 0.3 {
                ResourceKind::Water
            } else if cell.fertility > 0.5 && rng.r#gen::<f64>() < density * 0.5 {
                ResourceKind::Food
            } else if near_mountain && rng.r#gen::<f64>() < density * 0.4 {
                ResourceKind::Stone
            } else {
                return None;
            }
        }
        Terrain::Swamp => {
            if rng.r#gen::<f64>() < density * 0.5 {
                ResourceKind::Water
            } else {
                return None;
            }
        }
        Terrain::Mountain | Terrain::Tundra | Terrain::Desert | Terrain::Snow => {
            if rng.r#gen::<f64>() < density * 0.6 {
                ResourceKind::Stone
            } else {
                return None;
            }
        }
        Terrain::Beach => {
            if near_mountain && rng.r#gen::<f64>() < density * 0.3 {
                ResourceKind::Stone
            } else {
                return None;
            }
        }
    };
    let richness = rng.gen_range(0.6..1.4);
    Some(ResourceNode::new(kind, richness, cell.terrain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cell::Coord;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn stone_is_not_renewable() {
        let node = ResourceNode::new(ResourceKind::Stone, 1.0, Terrain::Mountain);
        assert!(!node.renewable);
        assert_eq!(node.amount, node.cap(Terrain::Mountain));
    }

    #[test]
    fn regrowth_clamps_to_cap() {
        let mut node = ResourceNode::new(ResourceKind::Wood, 1.0, Terrain::Forest);
        let cap = node.cap(Terrain::Forest);
        node.amount = cap - 0.1;
        node.regrow(Terrain::Forest, 1.0, Climate::default(), 5.0);
        assert_eq!(node.amount, cap);
    }

    #[test]
    fn drought_slows_regrowth() {
        let mut normal = ResourceNode::new(ResourceKind::Food, 1.0, Terrain::Grassland);
        let mut dry = normal.clone();
        normal.amount = 0.0;
        dry.amount = 0.0;
        let g_normal = normal.regrow(Terrain::Grassland, 0.8, Climate::default(), 1.0);
        let g_dry = dry.regrow(
            Terrain::Grassland,
            0.8,
            Climate {
                drought: true,
                rain: false,
            },
            1.0,
        );
        assert!(g_dry < g_normal);
        assert!((g_dry * 4.0 - g_normal).abs() < 1e-9);
    }

    #[test]
    fn non_renewable_does_not_regrow() {
        let mut node = ResourceNode::new(ResourceKind::Stone, 1.0, Terrain::Tundra);
        node.amount = 1.0;
        assert_eq!(node.regrow(Terrain::Tundra, 1.0, Climate::default(), 10.0), 0.0);
        assert_eq!(node.amount, 1.0);
    }

    #[test]
    fn take_never_overdraws() {
        let mut node = ResourceNode::new(ResourceKind::Water, 1.0, Terrain::Grassland);
        let all = node.amount;
        assert_eq!(node.take(all + 50.0), all);
        assert!(node.is_depleted());
        assert_eq!(node.take(-3.0), 0.0);
    }

    #[test]
    fn fertility_bounds() {
        for t in Terrain::ALL {
            for m in [0.0, 0.5, 1.0] {
                let f = fertility_for(t, m, true);
                assert!((0.0..=1.0).contains(&f));
            }
        }
        assert_eq!(fertility_for(Terrain::Ocean, 0.0, false), 0.0);
        assert!(fertility_for(Terrain::Grassland, 0.5, true) > fertility_for(Terrain::Grassland, 0.5, false));
    }

    #[test]
    fn water_cells_never_get_resources() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let cell = WorldCell::new(Coord::new(0, 0), Terrain::Ocean);
        for _ in 0..100 {
            assert!(roll_resource(&cell, true, true, 1.0, &mut rng).is_none());
        }
    }
}
