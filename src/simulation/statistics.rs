use std::collections::HashMap;

use crate::world::WorldGrid;
use crate::world::cell::Terrain;

/// Per-tick aggregate metrics for introspection.
#[derive(Debug, Clone)]
pub struct TickStatistics {
    pub tick: u64,
    pub terrain_distribution: HashMap<Terrain, u32>,
    pub active_sites: usize,
    pub completed_structures: usize,
    /// Sum of every resource node's current amount.
    pub resource_stock: f64,
    pub stockpile_total: f64,
    pub ripe_crops: u32,
    pub diversity_index: f32,
    pub tick_duration_ms: f32,
}

/// Compute statistics for the current world state after a tick.
pub fn compute_statistics(world: &WorldGrid, tick_duration_ms: f32) -> TickStatistics {
    let mut terrain_dist: HashMap<Terrain, u32> = HashMap::new();
    let mut resource_stock = 0.0_f64;
    let mut ripe_crops = 0_u32;

    for cell in world.grid.iter() {
        *terrain_dist.entry(cell.terrain).or_insert(0) += 1;
        if let Some(node) = &cell.resource {
            resource_stock += node.amount;
        }
        if cell.crop_growth >= 1.0 {
            ripe_crops += 1;
        }
    }

    let diversity = shannon_diversity(&terrain_dist, world.grid.len() as u32);

    TickStatistics {
        tick: world.tick_count,
        terrain_distribution: terrain_dist,
        active_sites: world.structures.active_count(),
        completed_structures: world.structures.completed_structures().len(),
        resource_stock,
        stockpile_total: world.stockpile.total(),
        ripe_crops,
        diversity_index: diversity,
        tick_duration_ms,
    }
}

/// Shannon diversity index normalized to [0, 1].
/// 0 = a single terrain everywhere, 1 = every present terrain equally common.
fn shannon_diversity(distribution: &HashMap<Terrain, u32>, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let mut entropy = 0.0_f64;
    let mut non_zero_types = 0_u32;

    for &count in distribution.values() {
        if count > 0 {
            non_zero_types += 1;
            let p = count as f64 / total_f;
            entropy -= p * p.ln();
        }
    }

    if non_zero_types <= 1 {
        return 0.0;
    }

    let max_entropy = (non_zero_types as f64).ln();
    (entropy / max_entropy) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{Delivery, Stockpile, StructureKind};
    use crate::world::cell::Coord;
    use crate::world::grid::CellGrid;
    use crate::world::resources::{ResourceKind, ResourceNode};

    fn make_test_world(size: u32) -> WorldGrid {
        WorldGrid::new(1, CellGrid::filled(size, size, Terrain::Grassland), Stockpile::new(50.0))
    }

    #[test]
    fn terrain_distribution_counted() {
        let mut world = make_test_world(2);
        world.grid.set_terrain(Coord::new(0, 0), Terrain::Desert);
        world.grid.set_terrain(Coord::new(1, 0), Terrain::Ocean);

        let stats = compute_statistics(&world, 5.0);

        assert_eq!(stats.terrain_distribution[&Terrain::Grassland], 2);
        assert_eq!(stats.terrain_distribution[&Terrain::Desert], 1);
        assert_eq!(stats.terrain_distribution[&Terrain::Ocean], 1);
        assert!((stats.tick_duration_ms - 5.0).abs() < 0.01);
    }

    #[test]
    fn diversity_index_monoculture_is_zero() {
        let world = make_test_world(3);
        let stats = compute_statistics(&world, 1.0);
        assert_eq!(stats.diversity_index, 0.0);
    }

    #[test]
    fn diversity_index_even_split_is_one() {
        let mut world = make_test_world(2);
        world.grid.set_terrain(Coord::new(0, 0), Terrain::Desert);
        world.grid.set_terrain(Coord::new(1, 0), Terrain::Ocean);
        world.grid.set_terrain(Coord::new(0, 1), Terrain::Tundra);

        let stats = compute_statistics(&world, 1.0);
        // 4 equal types: Shannon entropy = ln(4), normalized = 1.0
        assert!((stats.diversity_index - 1.0).abs() < 0.01);
    }

    #[test]
    fn structures_and_stock_are_reported() {
        let mut world = make_test_world(4);
        world.grid.get_mut(Coord::new(3, 3)).unwrap().resource =
            Some(ResourceNode::new(ResourceKind::Wood, 1.0, Terrain::Grassland));
        world.deposit(ResourceKind::Food, 12.0);
        let id = world.plan_structure(StructureKind::Campfire, Coord::new(0, 0)).unwrap();
        world.plan_structure(StructureKind::Well, Coord::new(2, 2)).unwrap();
        world
            .apply_construction_work(id, 10.0, Delivery::new(3.0, 2.0))
            .unwrap();

        let stats = compute_statistics(&world, 0.0);
        assert_eq!(stats.active_sites, 1);
        assert_eq!(stats.completed_structures, 1);
        assert_eq!(stats.resource_stock, 80.0);
        assert_eq!(stats.stockpile_total, 12.0);
        assert_eq!(stats.ripe_crops, 0);
    }

    #[test]
    fn empty_world_returns_zeroed_stats() {
        let world = WorldGrid::new(0, CellGrid::filled(0, 0, Terrain::Ocean), Stockpile::new(1.0));
        let stats = compute_statistics(&world, 0.0);
        assert_eq!(stats.diversity_index, 0.0);
        assert!(stats.terrain_distribution.is_empty());
    }
}
