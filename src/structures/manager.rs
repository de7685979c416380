//! Construction-site lifecycle.
//!
//! A site is planned onto free walkable cells, fed stone and wood until its
//! bill of materials is met, and only then advanced by labor. Once enough
//! work is done the footprint becomes a finished structure and the site
//! leaves the active registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::structures::blueprint::{StructureKind, blueprint};
use crate::structures::site::{
    CancelOptions, ConstructionPhase, ConstructionSite, Delivery, Refund, SiteId, SiteState,
};
use crate::structures::{ConstructionError, PlacementError};
use crate::world::cell::{Coord, Priority};
use crate::world::grid::CellGrid;

/// A finished structure, kept for the lifetime of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedStructure {
    pub kind: StructureKind,
    pub anchor: Coord,
    pub footprint: Vec<Coord>,
    /// `None` for structures placed directly during world setup.
    pub site_id: Option<SiteId>,
}

/// Outcome of one [`StructureManager::apply_construction_work`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkReport {
    pub site_id: SiteId,
    pub kind: StructureKind,
    /// Materials actually taken; anything beyond this stays with the caller.
    pub accepted: Delivery,
    pub work_applied: f64,
    pub work_done: f64,
    pub work_required: f64,
    pub materials_complete: bool,
    pub phase: ConstructionPhase,
    pub state: SiteState,
}

impl WorkReport {
    pub fn completed(&self) -> bool {
        self.state == SiteState::Completed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureManager {
    next_id: u64,
    active: BTreeMap<SiteId, ConstructionSite>,
    completed: Vec<CompletedStructure>,
}

impl StructureManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute footprint of `kind` at `anchor`, or the first reason it cannot go there.
    pub fn validate_footprint(
        &self,
        grid: &CellGrid,
        kind: StructureKind,
        anchor: Coord,
    ) -> Result<Vec<Coord>, PlacementError> {
        let mut cells: Vec<Coord> = Vec::with_capacity(blueprint(kind).footprint.len());
        for &(dx, dy) in blueprint(kind).footprint {
            let c = anchor.offset(dx, dy);
            if cells.contains(&c) {
                return Err(PlacementError::SelfOverlap(c));
            }
            let cell = grid.get(c).ok_or(PlacementError::OutOfBounds(c))?;
            if !cell.is_walkable() {
                return Err(PlacementError::Unwalkable {
                    cell: c,
                    terrain: cell.terrain,
                });
            }
            if let Some(existing) = cell.structure {
                return Err(PlacementError::Occupied { cell: c, existing });
            }
            if let Some(site) = cell.construction_site {
                return Err(PlacementError::SiteConflict { cell: c, site });
            }
            cells.push(c);
        }
        Ok(cells)
    }

    /// Reserve a footprint for construction and open a site on it.
    pub fn plan_structure(
        &mut self,
        grid: &mut CellGrid,
        kind: StructureKind,
        anchor: Coord,
    ) -> Result<SiteId, PlacementError> {
        let footprint = self.validate_footprint(grid, kind, anchor)?;
        let bp = blueprint(kind);

        self.next_id += 1;
        let id = SiteId(self.next_id);
        for &c in &footprint {
            if let Some(cell) = grid.get_mut(c) {
                cell.construction_site = Some(id);
                cell.priority = Priority::Build;
            }
        }

        self.active.insert(
            id,
            ConstructionSite {
                id,
                kind,
                anchor,
                footprint,
                work_required: bp.work_required,
                work_done: 0.0,
                stone_required: bp.stone_cost,
                stone_delivered: 0.0,
                wood_required: bp.wood_cost,
                wood_delivered: 0.0,
                state: SiteState::Planned,
                phase: ConstructionPhase::Foundation,
            },
        );
        info!(site = %id, kind = %kind, %anchor, "construction planned");
        Ok(id)
    }

    /// Put a finished structure down without a construction phase.
    pub fn place_completed(
        &mut self,
        grid: &mut CellGrid,
        kind: StructureKind,
        anchor: Coord,
    ) -> Result<(), PlacementError> {
        let footprint = self.validate_footprint(grid, kind, anchor)?;
        for &c in &footprint {
            if let Some(cell) = grid.get_mut(c) {
                cell.structure = Some(kind);
            }
        }
        debug!(kind = %kind, %anchor, "structure placed");
        self.completed.push(CompletedStructure {
            kind,
            anchor,
            footprint,
            site_id: None,
        });
        Ok(())
    }

    /// Deliver materials and labor to a site.
    ///
    /// Materials are accepted only up to what is still missing. Labor counts
    /// only once every material is in; until then it is ignored.
    pub fn apply_construction_work(
        &mut self,
        grid: &mut CellGrid,
        id: SiteId,
        labor: f64,
        delivered: Delivery,
    ) -> Result<WorkReport, ConstructionError> {
        let site = self
            .active
            .get_mut(&id)
            .ok_or(ConstructionError::UnknownSite(id))?;

        let accepted = Delivery::new(
            delivered.stone.max(0.0).min(site.stone_remaining()),
            delivered.wood.max(0.0).min(site.wood_remaining()),
        );
        site.stone_delivered += accepted.stone;
        site.wood_delivered += accepted.wood;

        let materials_complete = site.materials_complete();
        let mut work_applied = 0.0;
        if materials_complete && labor > 0.0 {
            work_applied = labor.min((site.work_required - site.work_done).max(0.0));
            site.work_done += work_applied;
        }
        site.phase = ConstructionPhase::from_progress(site.progress());

        let finished = site.is_finished();
        let mut report = WorkReport {
            site_id: id,
            kind: site.kind,
            accepted,
            work_applied,
            work_done: site.work_done,
            work_required: site.work_required,
            materials_complete,
            phase: site.phase,
            state: site.state,
        };

        if finished {
            self.complete(grid, id);
            report.state = SiteState::Completed;
        }
        Ok(report)
    }

    fn complete(&mut self, grid: &mut CellGrid, id: SiteId) {
        let Some(mut site) = self.active.remove(&id) else {
            return;
        };
        site.state = SiteState::Completed;
        for &c in &site.footprint {
            if let Some(cell) = grid.get_mut(c) {
                cell.structure = Some(site.kind);
                cell.construction_site = None;
                if cell.priority == Priority::Build {
                    cell.priority = Priority::None;
                }
            }
        }
        info!(site = %id, kind = %site.kind, anchor = %site.anchor, "construction completed");
        self.completed.push(CompletedStructure {
            kind: site.kind,
            anchor: site.anchor,
            footprint: site.footprint,
            site_id: Some(id),
        });
    }

    /// Abandon a site and free its cells.
    ///
    /// With `refund_materials` the delivered stone and wood are reported back;
    /// they are never put anywhere by the manager itself.
    pub fn cancel_construction(
        &mut self,
        grid: &mut CellGrid,
        id: SiteId,
        options: CancelOptions,
    ) -> Result<Refund, ConstructionError> {
        let site = self
            .active
            .remove(&id)
            .ok_or(ConstructionError::UnknownSite(id))?;

        for &c in &site.footprint {
            if let Some(cell) = grid.get_mut(c) {
                if cell.construction_site == Some(id) {
                    cell.construction_site = None;
                }
                if cell.priority == Priority::Build {
                    cell.priority = Priority::None;
                }
            }
        }

        // Deliveries are clamped on entry, so this never exceeds the bill.
        let refund = if options.refund_materials {
            site.delivered()
        } else {
            Delivery::default()
        };
        info!(site = %id, kind = %site.kind, stone = refund.stone, wood = refund.wood, "construction cancelled");
        Ok(refund)
    }

    pub fn get_construction_site(&self, id: SiteId) -> Option<&ConstructionSite> {
        self.active.get(&id)
    }

    /// Active sites in planning order.
    pub fn active_sites(&self) -> Vec<&ConstructionSite> {
        self.active.values().collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn completed_structures(&self) -> &[CompletedStructure] {
        &self.completed
    }

    /// The footprint cell of any active site that minimizes `heuristic(origin, cell)`.
    ///
    /// Ties keep the earliest site and footprint order.
    pub fn find_closest_construction_cell<H>(&self, origin: Coord, heuristic: H) -> Option<(SiteId, Coord)>
    where
        H: Fn(Coord, Coord) -> f64,
    {
        let mut best: Option<(f64, SiteId, Coord)> = None;
        for site in self.active.values() {
            for &c in &site.footprint {
                let score = heuristic(origin, c);
                if best.is_none_or(|(s, _, _)| score < s) {
                    best = Some((score, site.id, c));
                }
            }
        }
        best.map(|(_, id, c)| (id, c))
    }
}
