pub mod astar;
pub mod flow_field;

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, trace};

use crate::world::cell::Coord;

pub use astar::find_path_direct;
pub use flow_field::{Extraction, PathCacheEntry};

/// Default lifetime of a cached flow field.
pub const DEFAULT_CACHE_TTL_MS: u64 = 5_000;

/// Anything the path finder can route across.
pub trait Walkable {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Out-of-bounds coordinates must report `false`.
    fn is_walkable(&self, c: Coord) -> bool;
}

/// Per-query knobs. Without a cache key the query always runs A*.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOptions {
    pub cache_key: Option<String>,
    /// Override the clock, in milliseconds. Defaults to time since the finder was created.
    pub now_ms: Option<u64>,
}

impl PathOptions {
    pub fn cached(key: impl Into<String>) -> Self {
        Self {
            cache_key: Some(key.into()),
            now_ms: None,
        }
    }

    pub fn at(mut self, now_ms: u64) -> Self {
        self.now_ms = Some(now_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathStats {
    pub cache_hits: u64,
    pub cache_builds: u64,
    pub astar_runs: u64,
    pub evictions: u64,
}

/// A* plus a keyed cache of goal-rooted flow fields.
#[derive(Debug, Clone)]
pub struct PathFinder {
    cache: HashMap<String, PathCacheEntry>,
    ttl_ms: u64,
    epoch: Instant,
    stats: PathStats,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_MS)
    }
}

impl PathFinder {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            cache: HashMap::new(),
            ttl_ms,
            epoch: Instant::now(),
            stats: PathStats::default(),
        }
    }

    pub fn stats(&self) -> PathStats {
        self.stats
    }

    pub fn cached_goal(&self, key: &str) -> Option<Coord> {
        self.cache.get(key).map(|e| e.goal)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Route from `start` to `goal`.
    ///
    /// The returned steps exclude `start` and end at `goal`; `start == goal`
    /// yields an empty path. `None` means no route exists right now.
    pub fn find_path<G: Walkable + ?Sized>(
        &mut self,
        grid: &G,
        start: Coord,
        goal: Coord,
        options: &PathOptions,
    ) -> Option<Vec<Coord>> {
        if start == goal {
            return Some(Vec::new());
        }
        if !grid.is_walkable(goal) {
            self.evict_goal(goal);
            return None;
        }
        if !grid.is_walkable(start) {
            return None;
        }
        let Some(key) = options.cache_key.as_deref() else {
            return self.run_astar(grid, start, goal);
        };
        let now = options
            .now_ms
            .unwrap_or_else(|| self.epoch.elapsed().as_millis() as u64);
        self.find_cached(grid, start, goal, key, now)
    }

    fn find_cached<G: Walkable + ?Sized>(
        &mut self,
        grid: &G,
        start: Coord,
        goal: Coord,
        key: &str,
        now: u64,
    ) -> Option<Vec<Coord>> {
        let reusable = self
            .cache
            .get(key)
            .is_some_and(|e| e.goal == goal && e.fits(grid) && e.age_ms(now) <= self.ttl_ms);

        if reusable {
            self.stats.cache_hits += 1;
        } else {
            self.sweep_expired(now);
            let entry = PathCacheEntry::build(grid, goal, now);
            debug!(
                key,
                goal = %goal,
                reached = entry.reached_count(),
                "Flow field rebuilt"
            );
            self.stats.cache_builds += 1;
            self.cache.insert(key.to_string(), entry);
        }

        let extraction = match self.cache.get(key) {
            Some(entry) => entry.extract(grid, start),
            None => Extraction::Broken,
        };
        match extraction {
            Extraction::Path(path) => Some(path),
            Extraction::Blocked(cell) => {
                debug!(key, cell = %cell, "Cached route blocked, evicting");
                self.cache.remove(key);
                self.stats.evictions += 1;
                self.run_astar(grid, start, goal)
            }
            // A fresh field covers every cell that can reach the goal.
            Extraction::Broken if !reusable => None,
            Extraction::Broken => self.run_astar(grid, start, goal),
        }
    }

    fn run_astar<G: Walkable + ?Sized>(&mut self, grid: &G, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
        self.stats.astar_runs += 1;
        let path = find_path_direct(grid, start, goal);
        trace!(start = %start, goal = %goal, found = path.is_some(), "A* query");
        path
    }

    /// Drop every entry older than the TTL, whatever its key.
    fn sweep_expired(&mut self, now: u64) {
        let before = self.cache.len();
        let ttl = self.ttl_ms;
        self.cache.retain(|_, e| e.age_ms(now) <= ttl);
        let swept = before - self.cache.len();
        if swept > 0 {
            debug!(swept, "Expired flow fields dropped");
            self.stats.evictions += swept as u64;
        }
    }

    fn evict_goal(&mut self, goal: Coord) {
        let before = self.cache.len();
        self.cache.retain(|_, e| e.goal != goal);
        let evicted = before - self.cache.len();
        if evicted > 0 {
            debug!(goal = %goal, evicted, "Goal became unwalkable, evicting cached fields");
            self.stats.evictions += evicted as u64;
        }
    }
}
