use serde::{Deserialize, Serialize};

use crate::pathfinding::Walkable;
use crate::world::cell::{Coord, Terrain, WorldCell};
use crate::world::topology;

/// Flat row-major cell buffer with bounds-checked accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    width: u32,
    height: u32,
    cells: Vec<WorldCell>,
}

impl CellGrid {
    /// Build a grid by evaluating `make` for every coordinate in row-major order.
    pub fn from_fn(width: u32, height: u32, mut make: impl FnMut(Coord) -> WorldCell) -> Self {
        let total = width as usize * height as usize;
        let mut cells = Vec::with_capacity(total);
        for idx in 0..total {
            cells.push(make(topology::coord_of(idx, width)));
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// Uniform grid of one terrain. Used by tools and tests that need a
    /// world without running generation.
    pub fn filled(width: u32, height: u32, terrain: Terrain) -> Self {
        Self::from_fn(width, height, |c| WorldCell::new(c, terrain))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        topology::in_bounds(c, self.width, self.height)
    }

    pub fn index_of(&self, c: Coord) -> Option<usize> {
        topology::index_of(c, self.width, self.height)
    }

    pub fn get(&self, c: Coord) -> Option<&WorldCell> {
        self.index_of(c).and_then(|i| self.cells.get(i))
    }

    pub fn get_mut(&mut self, c: Coord) -> Option<&mut WorldCell> {
        self.index_of(c).and_then(|i| self.cells.get_mut(i))
    }

    pub fn is_walkable(&self, c: Coord) -> bool {
        self.get(c).is_some_and(WorldCell::is_walkable)
    }

    /// Replace the terrain of a cell; returns false outside the grid.
    pub fn set_terrain(&mut self, c: Coord, terrain: Terrain) -> bool {
        match self.get_mut(c) {
            Some(cell) => {
                cell.terrain = terrain;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[WorldCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [WorldCell] {
        &mut self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldCell> {
        self.cells.iter()
    }
}

impl Walkable for CellGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn is_walkable(&self, c: Coord) -> bool {
        CellGrid::is_walkable(self, c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_access_is_none() {
        let grid = CellGrid::filled(4, 3, Terrain::Grassland);
        assert_eq!(grid.len(), 12);
        assert!(grid.get(Coord::new(3, 2)).is_some());
        assert!(grid.get(Coord::new(4, 0)).is_none());
        assert!(grid.get(Coord::new(0, -1)).is_none());
        assert!(!grid.is_walkable(Coord::new(-1, -1)));
    }

    #[test]
    fn cells_keep_their_coordinates() {
        let grid = CellGrid::filled(5, 5, Terrain::Forest);
        for y in 0..5 {
            for x in 0..5 {
                let c = Coord::new(x, y);
                assert_eq!(grid.get(c).unwrap().coord(), c);
            }
        }
    }

    #[test]
    fn set_terrain_changes_walkability() {
        let mut grid = CellGrid::filled(3, 3, Terrain::Grassland);
        let c = Coord::new(1, 1);
        assert!(grid.is_walkable(c));
        assert!(grid.set_terrain(c, Terrain::Ocean));
        assert!(!grid.is_walkable(c));
        assert!(!grid.set_terrain(Coord::new(9, 9), Terrain::Ocean));
    }
}
