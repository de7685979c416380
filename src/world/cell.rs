use std::fmt;

use serde::{Deserialize, Serialize};

use crate::structures::{SiteId, StructureKind};
use crate::world::resources::ResourceNode;

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Terrain {
    Ocean,
    Beach,
    Grassland,
    Forest,
    Desert,
    Tundra,
    Snow,
    Mountain,
    Swamp,
    River,
}

impl Terrain {
    pub const ALL: [Terrain; 10] = [
        Terrain::Ocean,
        Terrain::Beach,
        Terrain::Grassland,
        Terrain::Forest,
        Terrain::Desert,
        Terrain::Tundra,
        Terrain::Snow,
        Terrain::Mountain,
        Terrain::Swamp,
        Terrain::River,
    ];

    /// Whether agents can stand on this terrain.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Terrain::Ocean | Terrain::River | Terrain::Mountain)
    }

    pub fn is_water(self) -> bool {
        matches!(self, Terrain::Ocean | Terrain::River)
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Ocean => "Ocean",
            Terrain::Beach => "Beach",
            Terrain::Grassland => "Grassland",
            Terrain::Forest => "Forest",
            Terrain::Desert => "Desert",
            Terrain::Tundra => "Tundra",
            Terrain::Snow => "Snow",
            Terrain::Mountain => "Mountain",
            Terrain::Swamp => "Swamp",
            Terrain::River => "River",
        }
    }

    /// Single character used by the ASCII map renderer.
    pub fn glyph(self) -> char {
        match self {
            Terrain::Ocean => '~',
            Terrain::Beach => '.',
            Terrain::Grassland => '"',
            Terrain::Forest => 'T',
            Terrain::Desert => ':',
            Terrain::Tundra => '-',
            Terrain::Snow => '*',
            Terrain::Mountain => '^',
            Terrain::Swamp => '%',
            Terrain::River => '=',
        }
    }
}

/// Work designation painted onto a cell for the agents that consume this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    None,
    Build,
    Harvest,
    Farm,
}

// === Coordinates ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Coord {
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn chebyshev(self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// True when `other` is one of the eight cells surrounding `self`.
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.chebyshev(other) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// === Cell ===

/// One cell of the world.
///
/// Coordinates are fixed at construction. `structure` and
/// `construction_site` are never both set; the structure manager is the only
/// writer of either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldCell {
    x: i32,
    y: i32,
    pub terrain: Terrain,
    pub elevation: f64,
    pub moisture: f64,
    pub fertility: f64,
    pub region: usize,
    pub resource: Option<ResourceNode>,
    pub structure: Option<StructureKind>,
    pub construction_site: Option<SiteId>,
    pub priority: Priority,
    pub crop_growth: f64,
}

impl WorldCell {
    /// Create a cell with neutral values; generation overwrites the climate fields.
    pub fn new(coord: Coord, terrain: Terrain) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            terrain,
            elevation: 0.0,
            moisture: 0.5,
            fertility: 0.5,
            region: 0,
            resource: None,
            structure: None,
            construction_site: None,
            priority: Priority::None,
            crop_growth: 0.0,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn is_walkable(&self) -> bool {
        self.terrain.is_walkable()
    }

    /// Walkable and carrying neither a structure nor a construction site.
    pub fn is_buildable(&self) -> bool {
        self.is_walkable() && self.structure.is_none() && self.construction_site.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_is_empty() {
        let cell = WorldCell::new(Coord::new(3, 4), Terrain::Grassland);
        assert_eq!(cell.coord(), Coord::new(3, 4));
        assert_eq!(cell.terrain, Terrain::Grassland);
        assert!(cell.resource.is_none());
        assert!(cell.structure.is_none());
        assert!(cell.construction_site.is_none());
        assert_eq!(cell.priority, Priority::None);
        assert_eq!(cell.crop_growth, 0.0);
        assert!(cell.is_buildable());
    }

    #[test]
    fn walkability_by_terrain() {
        let blocked = [Terrain::Ocean, Terrain::River, Terrain::Mountain];
        for t in Terrain::ALL {
            assert_eq!(t.is_walkable(), !blocked.contains(&t), "{:?}", t);
        }
    }

    #[test]
    fn adjacency_is_eight_way() {
        let c = Coord::new(5, 5);
        assert!(c.is_adjacent(Coord::new(6, 6)));
        assert!(c.is_adjacent(Coord::new(5, 4)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(Coord::new(7, 5)));
        assert_eq!(c.manhattan(Coord::new(7, 3)), 4);
    }

    #[test]
    fn glyphs_are_unique() {
        let mut glyphs: Vec<char> = Terrain::ALL.iter().map(|t| t.glyph()).collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        assert_eq!(glyphs.len(), Terrain::ALL.len());
    }
}
