use std::collections::HashMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::generation::GenerationParams;
use crate::config::simulation::SimulationConfig;
use crate::pathfinding::{PathOptions, find_path_direct};
use crate::simulation;
use crate::structures::{Delivery, StructureKind, blueprint};
use crate::world::WorldGrid;
use crate::world::cell::Coord;
use crate::world::generation::{generate_world, print_world_summary, render_ascii};
use crate::world::resources::{Climate, ResourceKind};

const DROUGHT_CHANCE: f64 = 0.1;
const RAIN_CHANCE: f64 = 0.25;
/// Rings searched around the village anchor when placing a new structure.
const BUILD_SEARCH_RADIUS: i32 = 6;

/// Generate a world and apply the runtime knobs from the simulation config.
pub fn load_world(params: &GenerationParams, config: &SimulationConfig) -> WorldGrid {
    let mut world = generate_world(params);
    world.set_path_cache_ttl(config.path_cache_ttl_ms);
    world.stockpile.set_capacity(config.stockpile_capacity);
    world
}

/// Print a world summary, optionally followed by the ASCII map.
pub fn generate(params: &GenerationParams, config: &SimulationConfig, show_map: bool) -> Result<(), String> {
    let world = load_world(params, config);
    print_world_summary(&world);
    if show_map {
        println!();
        print!("{}", render_ascii(&world));
    }
    Ok(())
}

/// Dump one cell, as text or JSON.
pub fn inspect(
    params: &GenerationParams,
    config: &SimulationConfig,
    at: Coord,
    as_json: bool,
) -> Result<(), String> {
    let world = load_world(params, config);
    let cell = world.get_cell(at).ok_or_else(|| {
        format!(
            "Cell {} not found (world is {}x{})",
            at,
            world.width(),
            world.height()
        )
    })?;

    if as_json {
        let json = serde_json::to_string_pretty(cell).map_err(|e| format!("Cannot encode cell: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    println!("=== Cell {} ===", at);
    println!("  Terrain: {}", cell.terrain.name());
    println!("  Walkable: {}", cell.is_walkable());
    println!("  Elevation: {:.3}", cell.elevation);
    println!("  Moisture: {:.3}", cell.moisture);
    println!("  Fertility: {:.3}", cell.fertility);
    println!("  Region: {}", cell.region);
    println!("  Priority: {:?}", cell.priority);
    println!();
    println!("--- Resource ---");
    match &cell.resource {
        Some(node) => println!(
            "  {}: {:.1}/{:.1} (richness {:.2}, {})",
            node.kind.name(),
            node.amount,
            node.cap(cell.terrain),
            node.richness,
            if node.renewable { "renewable" } else { "finite" }
        ),
        None => println!("  (none)"),
    }
    println!();
    println!("--- Structure ---");
    match (cell.structure, cell.construction_site) {
        (Some(kind), _) => println!("  {}", kind),
        (None, Some(id)) => match world.get_construction_site(id) {
            Some(site) => println!(
                "  {} ({}): {:.0}/{:.0} work, {:?}",
                site.kind, id, site.work_done, site.work_required, site.phase
            ),
            None => println!("  {}", id),
        },
        (None, None) => println!("  (none)"),
    }
    if cell.crop_growth > 0.0 {
        println!("  Crop growth: {:.0}%", cell.crop_growth * 100.0);
    }
    Ok(())
}

/// Route between two cells with both strategies and print the results.
pub fn path(
    params: &GenerationParams,
    config: &SimulationConfig,
    from: Coord,
    to: Coord,
) -> Result<(), String> {
    let mut world = load_world(params, config);
    for (label, c) in [("Start", from), ("Goal", to)] {
        if world.get_cell(c).is_none() {
            return Err(format!("{} {} is outside the {}x{} world", label, c, world.width(), world.height()));
        }
    }

    let direct = find_path_direct(&world.grid, from, to);
    let cached = world.find_path(from, to, &PathOptions::cached("cli"));

    for (label, route) in [("A*", &direct), ("Flow field", &cached)] {
        match route {
            Some(steps) => {
                let shown: Vec<String> = steps.iter().map(|c| c.to_string()).collect();
                println!("{:<11} {:>3} steps: {}", label, steps.len(), shown.join(" "));
            }
            None => println!("{:<11} no path", label),
        }
    }
    let stats = world.path_stats();
    println!(
        "\nCache: {} built, {} hits, {} evictions",
        stats.cache_builds, stats.cache_hits, stats.evictions
    );
    Ok(())
}

/// Closest spot to the village anchor where `kind` can be planned.
fn find_build_spot(world: &WorldGrid, kind: StructureKind) -> Option<Coord> {
    let anchor = world.village_anchor;
    for radius in 1..=BUILD_SEARCH_RADIUS {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs().max(dy.abs()) != radius {
                    continue;
                }
                let spot = anchor.offset(dx, dy);
                if world
                    .structures
                    .validate_footprint(&world.grid, kind, spot)
                    .is_ok()
                {
                    return Some(spot);
                }
            }
        }
    }
    None
}

/// Plan a structure beside the village, fund it from the stockpile and work it to completion.
pub fn build(
    params: &GenerationParams,
    config: &SimulationConfig,
    kind: &str,
    labor_per_step: f64,
) -> Result<(), String> {
    if labor_per_step <= 0.0 {
        return Err(format!("labor must be > 0, got {}", labor_per_step));
    }
    let kind: StructureKind = kind.parse().map_err(|e| format!("{}", e))?;
    let mut world = load_world(params, config);
    let bp = blueprint(kind);

    let stone = world.stockpile.amount(ResourceKind::Stone);
    let wood = world.stockpile.amount(ResourceKind::Wood);
    if stone < bp.stone_cost || wood < bp.wood_cost {
        return Err(format!(
            "Not enough materials for a {}: need {:.0} stone and {:.0} wood, have {:.0} and {:.0}",
            kind, bp.stone_cost, bp.wood_cost, stone, wood
        ));
    }

    let spot = find_build_spot(&world, kind)
        .ok_or_else(|| format!("No room for a {} near the village at {}", kind, world.village_anchor))?;
    let id = world.plan_structure(kind, spot).map_err(|e| e.to_string())?;
    println!("Planned {} {} at {}", kind, id, spot);

    let delivered = Delivery::new(
        world.consume(ResourceKind::Stone, bp.stone_cost),
        world.consume(ResourceKind::Wood, bp.wood_cost),
    );
    let mut report = world
        .apply_construction_work(id, 0.0, delivered)
        .map_err(|e| e.to_string())?;
    println!(
        "Delivered {:.0} stone, {:.0} wood",
        report.accepted.stone, report.accepted.wood
    );

    let mut step = 0;
    while !report.completed() {
        step += 1;
        report = world
            .apply_construction_work(id, labor_per_step, Delivery::default())
            .map_err(|e| e.to_string())?;
        println!(
            "  step {:>3}: {:>5.1}/{:.0} work ({:?})",
            step, report.work_done, report.work_required, report.phase
        );
        if report.work_applied <= 0.0 && !report.completed() {
            return Err(format!("{} stopped making progress", id));
        }
    }

    for event in world.drain_events() {
        println!("{}", event);
    }
    Ok(())
}

/// Run the tick driver with seeded random weather and print statistics.
pub fn simulate(
    params: &GenerationParams,
    config: &SimulationConfig,
    ticks: u32,
    report_every: u32,
) -> Result<(), String> {
    if report_every == 0 {
        return Err("report_every must be > 0".to_string());
    }
    let mut world = load_world(params, config);
    let mut weather = ChaCha8Rng::seed_from_u64(world.seed.wrapping_add(1));
    let mut event_counts: HashMap<&'static str, u32> = HashMap::new();

    println!(
        "{:>6} {:>10} {:>10} {:>8} {:>9} {:>8}",
        "Tick", "Resources", "Stockpile", "Ripe", "Diversity", "ms"
    );
    for _ in 0..ticks {
        let climate = Climate {
            drought: weather.r#gen::<f64>() < DROUGHT_CHANCE,
            rain: weather.r#gen::<f64>() < RAIN_CHANCE,
        };
        let result = simulation::execute_tick(&mut world, climate, config);

        for event in world.drain_events() {
            let name = match event {
                simulation::WorldEvent::ConstructionCompleted { .. } => "construction completed",
                simulation::WorldEvent::ConstructionCancelled { .. } => "construction cancelled",
                simulation::WorldEvent::ResourceDepleted { .. } => "resource depleted",
                simulation::WorldEvent::CropRipe { .. } => "crop ripe",
            };
            *event_counts.entry(name).or_insert(0) += 1;
        }

        let stats = &result.statistics;
        if stats.tick % report_every as u64 == 0 || stats.tick == ticks as u64 {
            println!(
                "{:>6} {:>10.1} {:>10.1} {:>8} {:>9.3} {:>8.2}",
                stats.tick,
                stats.resource_stock,
                stats.stockpile_total,
                stats.ripe_crops,
                stats.diversity_index,
                stats.tick_duration_ms
            );
        }
    }

    if !event_counts.is_empty() {
        let mut sorted: Vec<_> = event_counts.into_iter().collect();
        sorted.sort_by_key(|&(name, _)| name);
        println!("\nEvents:");
        for (name, count) in &sorted {
            println!("  {:<24} {:>5}", name, count);
        }
    }
    Ok(())
}
