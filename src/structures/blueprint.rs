use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::structures::PlacementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    Campfire,
    Storehouse,
    House,
    Farm,
    Well,
    Workshop,
}

impl StructureKind {
    pub const ALL: [StructureKind; 6] = [
        StructureKind::Campfire,
        StructureKind::Storehouse,
        StructureKind::House,
        StructureKind::Farm,
        StructureKind::Well,
        StructureKind::Workshop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StructureKind::Campfire => "campfire",
            StructureKind::Storehouse => "storehouse",
            StructureKind::House => "house",
            StructureKind::Farm => "farm",
            StructureKind::Well => "well",
            StructureKind::Workshop => "workshop",
        }
    }

    pub fn blueprint(self) -> &'static Blueprint {
        blueprint(self)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StructureKind {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        StructureKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| PlacementError::UnknownStructure(s.to_string()))
    }
}

/// Static build recipe for a structure type.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub kind: StructureKind,
    /// Cell offsets relative to the anchor; `(0, 0)` is the anchor itself.
    pub footprint: &'static [(i32, i32)],
    pub work_required: f64,
    pub stone_cost: f64,
    pub wood_cost: f64,
}

static CAMPFIRE: Blueprint = Blueprint {
    kind: StructureKind::Campfire,
    footprint: &[(0, 0)],
    work_required: 10.0,
    stone_cost: 3.0,
    wood_cost: 2.0,
};

static STOREHOUSE: Blueprint = Blueprint {
    kind: StructureKind::Storehouse,
    footprint: &[(0, 0)],
    work_required: 30.0,
    stone_cost: 10.0,
    wood_cost: 15.0,
};

static HOUSE: Blueprint = Blueprint {
    kind: StructureKind::House,
    footprint: &[(0, 0), (1, 0)],
    work_required: 40.0,
    stone_cost: 12.0,
    wood_cost: 20.0,
};

static FARM: Blueprint = Blueprint {
    kind: StructureKind::Farm,
    footprint: &[(0, 0), (1, 0), (0, 1), (1, 1)],
    work_required: 25.0,
    stone_cost: 0.0,
    wood_cost: 8.0,
};

static WELL: Blueprint = Blueprint {
    kind: StructureKind::Well,
    footprint: &[(0, 0)],
    work_required: 20.0,
    stone_cost: 15.0,
    wood_cost: 2.0,
};

static WORKSHOP: Blueprint = Blueprint {
    kind: StructureKind::Workshop,
    footprint: &[(0, 0), (1, 0), (0, 1)],
    work_required: 50.0,
    stone_cost: 20.0,
    wood_cost: 25.0,
};

/// Return the canonical blueprint for a given [`StructureKind`].
pub fn blueprint(kind: StructureKind) -> &'static Blueprint {
    match kind {
        StructureKind::Campfire => &CAMPFIRE,
        StructureKind::Storehouse => &STOREHOUSE,
        StructureKind::House => &HOUSE,
        StructureKind::Farm => &FARM,
        StructureKind::Well => &WELL,
        StructureKind::Workshop => &WORKSHOP,
    }
}
