pub mod cell;
pub mod generation;
pub mod grid;
pub mod noise_field;
pub mod regions;
pub mod resources;
pub mod rivers;
pub mod topology;

use serde::Serialize;
use tracing::debug;

use crate::pathfinding::{PathFinder, PathOptions, PathStats, Walkable};
use crate::simulation::events::WorldEvent;
use crate::structures::{
    CancelOptions, ConstructionError, ConstructionSite, Delivery, PlacementError, Refund, SiteId,
    Stockpile, StructureKind, StructureManager, WorkReport,
};
pub use cell::{Coord, Priority, Terrain, WorldCell};
pub use grid::CellGrid;
use regions::BiomeRegion;
use resources::{Climate, ResourceKind};

/// Food yielded by one ripe farm cell at full fertility.
pub const CROP_YIELD: f64 = 12.0;

/// The generated world and everything living on it.
///
/// Terrain is fixed once generation returns; afterwards only structures,
/// resources, priorities and crops change.
#[derive(Debug, Clone, Serialize)]
pub struct WorldGrid {
    pub seed: u64,
    pub size: u32,
    pub grid: CellGrid,
    pub regions: Vec<BiomeRegion>,
    pub rivers: Vec<Vec<Coord>>,
    pub village_anchor: Coord,
    pub structures: StructureManager,
    pub stockpile: Stockpile,
    pub tick_count: u64,
    #[serde(skip)]
    pathfinder: PathFinder,
    #[serde(skip)]
    events: Vec<WorldEvent>,
}

impl WorldGrid {
    /// Wrap a populated grid. Generation goes through [`generation::generate_world`].
    pub fn new(seed: u64, grid: CellGrid, stockpile: Stockpile) -> Self {
        Self {
            seed,
            size: grid.width().max(grid.height()),
            village_anchor: Coord::new(grid.width() as i32 / 2, grid.height() as i32 / 2),
            grid,
            regions: Vec::new(),
            rivers: Vec::new(),
            structures: StructureManager::new(),
            stockpile,
            tick_count: 0,
            pathfinder: PathFinder::default(),
            events: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.grid.width()
    }

    pub fn height(&self) -> u32 {
        self.grid.height()
    }

    pub fn get_cell(&self, c: Coord) -> Option<&WorldCell> {
        self.grid.get(c)
    }

    pub fn is_walkable(&self, c: Coord) -> bool {
        self.grid.is_walkable(c)
    }

    // --- Paths ---

    pub fn find_path(&mut self, start: Coord, goal: Coord, options: &PathOptions) -> Option<Vec<Coord>> {
        self.pathfinder.find_path(&self.grid, start, goal, options)
    }

    /// Replace the path finder, dropping every cached flow field.
    pub fn set_path_cache_ttl(&mut self, ttl_ms: u64) {
        self.pathfinder = PathFinder::new(ttl_ms);
    }

    pub fn path_stats(&self) -> PathStats {
        self.pathfinder.stats()
    }

    // --- Construction ---

    pub fn plan_structure(&mut self, kind: StructureKind, anchor: Coord) -> Result<SiteId, PlacementError> {
        self.structures.plan_structure(&mut self.grid, kind, anchor)
    }

    /// Plan by structure name, as typed by a player.
    pub fn plan_structure_named(&mut self, kind: &str, anchor: Coord) -> Result<SiteId, PlacementError> {
        let kind: StructureKind = kind.parse()?;
        self.plan_structure(kind, anchor)
    }

    pub fn apply_construction_work(
        &mut self,
        id: SiteId,
        labor: f64,
        delivered: Delivery,
    ) -> Result<WorkReport, ConstructionError> {
        let anchor = self.structures.get_construction_site(id).map(|s| s.anchor);
        let report = self
            .structures
            .apply_construction_work(&mut self.grid, id, labor, delivered)?;
        if report.completed() {
            if let Some(anchor) = anchor {
                self.events.push(WorldEvent::ConstructionCompleted {
                    site: id,
                    kind: report.kind,
                    anchor,
                });
            }
        }
        Ok(report)
    }

    pub fn cancel_construction(&mut self, id: SiteId, options: CancelOptions) -> Result<Refund, ConstructionError> {
        let kind = self.structures.get_construction_site(id).map(|s| s.kind);
        let refund = self
            .structures
            .cancel_construction(&mut self.grid, id, options)?;
        if let Some(kind) = kind {
            self.events.push(WorldEvent::ConstructionCancelled {
                site: id,
                kind,
                refund,
            });
        }
        Ok(refund)
    }

    pub fn get_construction_site(&self, id: SiteId) -> Option<&ConstructionSite> {
        self.structures.get_construction_site(id)
    }

    pub fn get_active_construction_sites(&self) -> Vec<&ConstructionSite> {
        self.structures.active_sites()
    }

    pub fn find_closest_construction_cell<H>(&self, origin: Coord, heuristic: H) -> Option<(SiteId, Coord)>
    where
        H: Fn(Coord, Coord) -> f64,
    {
        self.structures.find_closest_construction_cell(origin, heuristic)
    }

    /// Set a work designation. Cells under construction keep their `Build` priority.
    pub fn designate(&mut self, c: Coord, priority: Priority) -> bool {
        match self.grid.get_mut(c) {
            Some(cell) if cell.construction_site.is_none() => {
                cell.priority = priority;
                true
            }
            _ => false,
        }
    }

    // --- Stockpile ---

    pub fn deposit(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        self.stockpile.deposit(kind, amount)
    }

    pub fn consume(&mut self, kind: ResourceKind, amount: f64) -> f64 {
        self.stockpile.consume(kind, amount)
    }

    // --- Resources and crops ---

    /// Take up to `amount` from the node on `c`. Emptied non-renewable nodes are removed.
    pub fn harvest(&mut self, c: Coord, amount: f64) -> f64 {
        let Some(cell) = self.grid.get_mut(c) else {
            return 0.0;
        };
        let Some(node) = cell.resource.as_mut() else {
            return 0.0;
        };
        let taken = node.take(amount);
        if taken > 0.0 && node.is_depleted() {
            let kind = node.kind;
            let removed = !node.renewable;
            if removed {
                cell.resource = None;
            }
            debug!(cell = %c, kind = kind.name(), removed, "resource depleted");
            self.events.push(WorldEvent::ResourceDepleted { cell: c, kind, removed });
        }
        taken
    }

    /// Pick a ripe crop. Yield scales with the cell's fertility; growth restarts at zero.
    pub fn harvest_crop(&mut self, c: Coord) -> f64 {
        match self.grid.get_mut(c) {
            Some(cell) if cell.structure == Some(StructureKind::Farm) && cell.crop_growth >= 1.0 => {
                cell.crop_growth = 0.0;
                CROP_YIELD * (0.5 + cell.fertility)
            }
            _ => 0.0,
        }
    }

    /// Regrow every renewable node; returns the total amount added.
    pub fn regrow_resources(&mut self, climate: Climate, rate: f64) -> f64 {
        let mut added = 0.0;
        for cell in self.grid.cells_mut() {
            let (terrain, fertility) = (cell.terrain, cell.fertility);
            if let Some(node) = cell.resource.as_mut() {
                added += node.regrow(terrain, fertility, climate, rate);
            }
        }
        added
    }

    /// Advance crops on farm cells; returns how many ripened this call.
    pub fn grow_crops(&mut self, climate: Climate, rate: f64) -> usize {
        let factor = climate.growth_factor();
        let mut ripened = Vec::new();
        for cell in self.grid.cells_mut() {
            if cell.structure != Some(StructureKind::Farm) || cell.crop_growth >= 1.0 {
                continue;
            }
            cell.crop_growth = (cell.crop_growth + rate * cell.fertility * factor).min(1.0);
            if cell.crop_growth >= 1.0 {
                ripened.push(cell.coord());
            }
        }
        let count = ripened.len();
        self.events
            .extend(ripened.into_iter().map(|cell| WorldEvent::CropRipe { cell }));
        count
    }

    pub fn pending_events(&self) -> &[WorldEvent] {
        &self.events
    }

    /// Hand every pending event to the caller.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Walkable for WorldGrid {
    fn width(&self) -> u32 {
        self.grid.width()
    }

    fn height(&self) -> u32 {
        self.grid.height()
    }

    fn is_walkable(&self, c: Coord) -> bool {
        self.grid.is_walkable(c)
    }
}
