use std::collections::HashMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::generation::{GenerationParams, MAX_WORLD_SIZE, MIN_WORLD_SIZE};
use crate::structures::{Stockpile, StructureKind};
use crate::world::WorldGrid;
use crate::world::cell::{Coord, Terrain, WorldCell};
use crate::world::grid::CellGrid;
use crate::world::noise_field::{classify_biome, elevation_field, moisture_field};
use crate::world::regions::{BiomeRegionAssigner, resolve_region_terrain};
use crate::world::resources::{ResourceKind, fertility_for, roll_resource};
use crate::world::rivers::RiverCarver;
use crate::world::topology::{ORTHOGONAL, neighbors8};

/// Per-kind stockpile limit for a freshly generated world.
pub const DEFAULT_STOCKPILE_CAPACITY: f64 = 200.0;

const RESOURCE_RNG_SALT: u64 = 0x5CA7_7E2E_D000_0001;
/// Search radius, in Chebyshev rings, for the starter house.
const HOUSE_SEARCH_RADIUS: i32 = 5;

/// Side length actually generated for a requested `size`.
pub fn effective_size(requested: u32) -> u32 {
    requested.clamp(MIN_WORLD_SIZE, MAX_WORLD_SIZE)
}

/// Generate a world with default parameters.
///
/// The grid is `effective_size(size)` on a side, which `WorldGrid::size`
/// also reports; check it when passing sizes outside the supported range.
pub fn generate(size: u32, seed: u64) -> WorldGrid {
    generate_world(&GenerationParams::new(size, seed))
}

/// Generate a new world from the given parameters.
///
/// Never fails: an out-of-range size is clamped, and a village site is
/// forced open if the terrain offers none.
pub fn generate_world(params: &GenerationParams) -> WorldGrid {
    let size = effective_size(params.size);
    if size != params.size {
        warn!(requested = params.size, size, "World size clamped");
    }
    let seed = params.seed;
    info!(seed, size, "Generating world");

    let noise_seed = fold_seed(seed);
    let elevation = elevation_field(noise_seed, size, size);
    let moisture = moisture_field(noise_seed, size, size);
    let region_map = BiomeRegionAssigner::new(seed).assign(size, size, &elevation, &moisture);
    let rivers = RiverCarver.carve(size, size, &elevation, &moisture);
    debug!(
        regions = region_map.regions.len(),
        rivers = rivers.paths.len(),
        river_cells = rivers.cell_count(),
        "Macro features placed"
    );

    let width = size as usize;
    let mut grid = CellGrid::from_fn(size, size, |c| {
        let idx = c.y as usize * width + c.x as usize;
        let (e, m) = (elevation[idx], moisture[idx]);
        let local = classify_biome(e, m);
        let terrain = if rivers.contains(idx) {
            Terrain::River
        } else {
            let region_biome = region_map.biome_at(idx).unwrap_or(local);
            resolve_region_terrain(region_biome, local, e, m)
        };
        let mut cell = WorldCell::new(c, terrain);
        cell.elevation = e;
        cell.moisture = m;
        cell.region = region_map.ids.get(idx).copied().unwrap_or(0);
        cell
    });

    assign_fertility(&mut grid);
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ RESOURCE_RNG_SALT);
    scatter_resources(&mut grid, &mut rng, params.resource_density);

    let mut stockpile = Stockpile::new(DEFAULT_STOCKPILE_CAPACITY);
    for kind in ResourceKind::ALL {
        stockpile.deposit(kind, params.starter_stockpile.amount(kind));
    }

    let mut world = WorldGrid::new(seed, grid, stockpile);
    world.size = size;
    world.regions = region_map.regions;
    world.rivers = rivers.paths;
    found_village(&mut world);

    info!(
        anchor = %world.village_anchor,
        structures = world.structures.completed_structures().len(),
        "World ready"
    );
    world
}

/// Noise lattices take a 32-bit seed; fold the high half in so both halves matter.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Print a summary of the generated world.
pub fn print_world_summary(world: &WorldGrid) {
    let total = world.grid.len();
    println!("=== World Summary ===");
    println!("Seed: {}", world.seed);
    println!("Size: {}x{} ({} cells)", world.width(), world.height(), total);
    println!("Regions: {}", world.regions.len());
    println!("Rivers: {}", world.rivers.len());

    let mut terrain_counts: HashMap<&str, u32> = HashMap::new();
    for cell in world.grid.iter() {
        *terrain_counts.entry(cell.terrain.name()).or_insert(0) += 1;
    }
    let mut terrain_sorted: Vec<_> = terrain_counts.into_iter().collect();
    terrain_sorted.sort_by_key(|&(name, _)| name);
    println!("\nTerrain:");
    for (name, count) in &terrain_sorted {
        let pct = *count as f32 / total.max(1) as f32 * 100.0;
        println!("  {:<12} {:>5} ({:.1}%)", name, count, pct);
    }

    let mut resource_totals: HashMap<&str, (u32, f64)> = HashMap::new();
    for node in world.grid.iter().filter_map(|c| c.resource.as_ref()) {
        let entry = resource_totals.entry(node.kind.name()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += node.amount;
    }
    if !resource_totals.is_empty() {
        let mut resource_sorted: Vec<_> = resource_totals.into_iter().collect();
        resource_sorted.sort_by_key(|&(name, _)| name);
        println!("\nResources:");
        for (name, (count, amount)) in &resource_sorted {
            println!("  {:<12} {:>5} nodes, {:.0} total", name, count, amount);
        }
    }

    println!("\nVillage: {}", world.village_anchor);
    for s in world.structures.completed_structures() {
        println!("  {:<12} at {}", s.kind.name(), s.anchor);
    }
    println!("\nStockpile (capacity {:.0} per kind):", world.stockpile.capacity());
    for kind in ResourceKind::ALL {
        println!("  {:<12} {:>6.1}", kind.name(), world.stockpile.amount(kind));
    }
}

fn structure_glyph(kind: StructureKind) -> char {
    match kind {
        StructureKind::Campfire => 'c',
        StructureKind::Storehouse => 'S',
        StructureKind::House => 'H',
        StructureKind::Farm => 'F',
        StructureKind::Well => 'W',
        StructureKind::Workshop => 'K',
    }
}

/// One line per row; odd rows are shifted half a cell to suggest the hex layout.
pub fn render_ascii(world: &WorldGrid) -> String {
    let mut out = String::with_capacity(world.grid.len() * 2 + world.height() as usize * 2);
    for y in 0..world.height() as i32 {
        if y % 2 == 1 {
            out.push(' ');
        }
        for x in 0..world.width() as i32 {
            let glyph = match world.get_cell(Coord::new(x, y)) {
                Some(cell) => match (cell.structure, cell.construction_site) {
                    (Some(kind), _) => structure_glyph(kind),
                    (None, Some(_)) => '#',
                    (None, None) => cell.terrain.glyph(),
                },
                None => ' ',
            };
            out.push(glyph);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

// --- Internal generation functions ---

/// Per-cell flag: does any eight-way neighbor carry `terrain`?
fn adjacent_to(grid: &CellGrid, terrain: Terrain) -> Vec<bool> {
    let (w, h) = (grid.width(), grid.height());
    grid.iter()
        .map(|cell| neighbors8(cell.coord(), w, h).any(|n| grid.get(n).is_some_and(|c| c.terrain == terrain)))
        .collect()
}

fn assign_fertility(grid: &mut CellGrid) {
    let near_river = adjacent_to(grid, Terrain::River);
    for (cell, near) in grid.cells_mut().iter_mut().zip(near_river) {
        cell.fertility = fertility_for(cell.terrain, cell.moisture, near);
    }
}

fn scatter_resources(grid: &mut CellGrid, rng: &mut impl Rng, density: f64) {
    let near_river = adjacent_to(grid, Terrain::River);
    let near_mountain = adjacent_to(grid, Terrain::Mountain);
    let mut placed = 0usize;
    for (i, cell) in grid.cells_mut().iter_mut().enumerate() {
        let node = roll_resource(cell, near_river[i], near_mountain[i], density, &mut *rng);
        cell.resource = node;
        if cell.resource.is_some() {
            placed += 1;
        }
    }
    debug!(placed, density, "Resources scattered");
}

/// Best interior grassland, forest or beach cell near the middle of the map.
///
/// Lower score wins: squared distance to the center plus a terrain penalty,
/// minus a fertility bonus. Ties keep the lower cell index.
fn choose_village_anchor(grid: &CellGrid) -> Option<Coord> {
    let (w, h) = (grid.width() as i32, grid.height() as i32);
    let cx = (w - 1) as f64 / 2.0;
    let cy = (h - 1) as f64 / 2.0;
    grid.iter()
        .filter(|cell| cell.x() > 0 && cell.y() > 0 && cell.x() < w - 1 && cell.y() < h - 1)
        .filter_map(|cell| {
            let penalty = match cell.terrain {
                Terrain::Grassland => 0.0,
                Terrain::Forest => 2.0,
                Terrain::Beach => 4.0,
                _ => return None,
            };
            let dx = cell.x() as f64 - cx;
            let dy = cell.y() as f64 - cy;
            Some((dx * dx + dy * dy + penalty - cell.fertility * 2.0, cell.coord()))
        })
        .fold(None, |best: Option<(f64, Coord)>, (score, c)| match best {
            Some((best_score, _)) if best_score <= score => best,
            _ => Some((score, c)),
        })
        .map(|(_, c)| c)
}

/// Turn a cell into plain grassland so the village has somewhere to stand.
fn clear_to_grassland(grid: &mut CellGrid, c: Coord) {
    if let Some(cell) = grid.get_mut(c) {
        cell.terrain = Terrain::Grassland;
        cell.resource = None;
        cell.fertility = fertility_for(Terrain::Grassland, cell.moisture, false);
    }
}

fn found_village(world: &mut WorldGrid) {
    let anchor = match choose_village_anchor(&world.grid) {
        Some(c) => c,
        None => {
            let center = Coord::new(world.width() as i32 / 2, world.height() as i32 / 2);
            warn!(%center, "No natural village site, clearing the map center");
            clear_to_grassland(&mut world.grid, center);
            center
        }
    };

    let open_neighbor = ORTHOGONAL
        .iter()
        .any(|&(dx, dy)| world.is_walkable(anchor.offset(dx, dy)));
    if !open_neighbor {
        let c = anchor.offset(1, 0);
        debug!(cell = %c, "Opening a cell beside the village anchor");
        clear_to_grassland(&mut world.grid, c);
    }

    world.village_anchor = anchor;
    if let Err(e) = world
        .structures
        .place_completed(&mut world.grid, StructureKind::Storehouse, anchor)
    {
        warn!(error = %e, "Cannot place starter storehouse");
    }

    match find_house_spot(world, anchor) {
        Some(spot) => {
            if let Err(e) = world
                .structures
                .place_completed(&mut world.grid, StructureKind::House, spot)
            {
                warn!(error = %e, "Cannot place starter house");
            }
        }
        None => warn!(%anchor, "No room for a starter house"),
    }
}

/// First house anchor, ring by ring, whose whole footprint keeps clear of the
/// anchor's eight neighbors.
fn find_house_spot(world: &WorldGrid, anchor: Coord) -> Option<Coord> {
    for radius in 2..=HOUSE_SEARCH_RADIUS {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs().max(dy.abs()) != radius {
                    continue;
                }
                let spot = anchor.offset(dx, dy);
                let Ok(footprint) = world
                    .structures
                    .validate_footprint(&world.grid, StructureKind::House, spot)
                else {
                    continue;
                };
                if footprint.iter().all(|c| c.chebyshev(anchor) >= 2) {
                    return Some(spot);
                }
            }
        }
    }
    None
}
