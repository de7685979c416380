use std::fmt;

use serde::Serialize;

use crate::structures::{Refund, SiteId, StructureKind};
use crate::world::cell::Coord;
use crate::world::resources::ResourceKind;

/// Things that happened to the world since the outer loop last drained it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    ConstructionCompleted {
        site: SiteId,
        kind: StructureKind,
        anchor: Coord,
    },
    ConstructionCancelled {
        site: SiteId,
        kind: StructureKind,
        refund: Refund,
    },
    ResourceDepleted {
        cell: Coord,
        kind: ResourceKind,
        /// Non-renewable nodes are removed from the cell once empty.
        removed: bool,
    },
    CropRipe {
        cell: Coord,
    },
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldEvent::ConstructionCompleted { site, kind, anchor } => {
                write!(f, "{} completed: {} at {}", site, kind, anchor)
            }
            WorldEvent::ConstructionCancelled { site, kind, refund } => write!(
                f,
                "{} cancelled: {} (refund {:.1} stone, {:.1} wood)",
                site, kind, refund.stone, refund.wood
            ),
            WorldEvent::ResourceDepleted { cell, kind, removed } => {
                if *removed {
                    write!(f, "{} at {} exhausted and removed", kind.name(), cell)
                } else {
                    write!(f, "{} at {} depleted", kind.name(), cell)
                }
            }
            WorldEvent::CropRipe { cell } => write!(f, "crop ripe at {}", cell),
        }
    }
}
