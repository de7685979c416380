use std::fmt;

use serde::{Deserialize, Serialize};

use crate::structures::blueprint::StructureKind;
use crate::world::cell::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub u64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteState {
    Planned,
    Completed,
}

/// Display phase derived from the work ratio; independent of [`SiteState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionPhase {
    Foundation,
    Structure,
    Finishing,
}

impl ConstructionPhase {
    pub fn from_progress(ratio: f64) -> Self {
        if ratio < 0.33 {
            ConstructionPhase::Foundation
        } else if ratio < 0.66 {
            ConstructionPhase::Structure
        } else {
            ConstructionPhase::Finishing
        }
    }
}

/// Materials handed to a site in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub stone: f64,
    pub wood: f64,
}

impl Delivery {
    pub fn new(stone: f64, wood: f64) -> Self {
        Self { stone, wood }
    }
}

/// Materials reported back on cancellation; the caller re-deposits them.
pub type Refund = Delivery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOptions {
    pub refund_materials: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSite {
    pub id: SiteId,
    pub kind: StructureKind,
    pub anchor: Coord,
    pub footprint: Vec<Coord>,
    pub work_required: f64,
    pub work_done: f64,
    pub stone_required: f64,
    pub stone_delivered: f64,
    pub wood_required: f64,
    pub wood_delivered: f64,
    pub state: SiteState,
    pub phase: ConstructionPhase,
}

impl ConstructionSite {
    pub fn stone_remaining(&self) -> f64 {
        (self.stone_required - self.stone_delivered).max(0.0)
    }

    pub fn wood_remaining(&self) -> f64 {
        (self.wood_required - self.wood_delivered).max(0.0)
    }

    pub fn materials_complete(&self) -> bool {
        self.stone_delivered >= self.stone_required && self.wood_delivered >= self.wood_required
    }

    pub fn progress(&self) -> f64 {
        if self.work_required <= 0.0 {
            1.0
        } else {
            (self.work_done / self.work_required).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.materials_complete() && self.work_done >= self.work_required
    }

    pub fn delivered(&self) -> Delivery {
        Delivery::new(self.stone_delivered, self.wood_delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_thresholds() {
        assert_eq!(ConstructionPhase::from_progress(0.0), ConstructionPhase::Foundation);
        assert_eq!(ConstructionPhase::from_progress(0.329), ConstructionPhase::Foundation);
        assert_eq!(ConstructionPhase::from_progress(0.33), ConstructionPhase::Structure);
        assert_eq!(ConstructionPhase::from_progress(0.659), ConstructionPhase::Structure);
        assert_eq!(ConstructionPhase::from_progress(0.66), ConstructionPhase::Finishing);
        assert_eq!(ConstructionPhase::from_progress(1.0), ConstructionPhase::Finishing);
    }

    #[test]
    fn site_id_display() {
        assert_eq!(SiteId(7).to_string(), "site-7");
    }
}
