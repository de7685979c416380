pub mod blueprint;
pub mod manager;
pub mod site;
pub mod stockpile;

pub use blueprint::{Blueprint, StructureKind, blueprint};
pub use manager::{CompletedStructure, StructureManager, WorkReport};
pub use site::{
    CancelOptions, ConstructionPhase, ConstructionSite, Delivery, Refund, SiteId, SiteState,
};
pub use stockpile::Stockpile;

use crate::world::cell::{Coord, Terrain};

/// Why a structure could not be placed. The message is shown to players as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("unknown structure type '{0}'")]
    UnknownStructure(String),

    #[error("footprint cell {0} is out of bounds")]
    OutOfBounds(Coord),

    #[error("cell {cell} is {terrain:?} and cannot be built on")]
    Unwalkable { cell: Coord, terrain: Terrain },

    #[error("cell {cell} already holds a {existing}")]
    Occupied { cell: Coord, existing: StructureKind },

    #[error("cell {cell} is already part of {site}")]
    SiteConflict { cell: Coord, site: SiteId },

    #[error("footprint overlaps itself at {0}")]
    SelfOverlap(Coord),
}

/// Failures of work or cancellation calls on an existing site.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    #[error("construction site {0} not found")]
    UnknownSite(SiteId),
}
