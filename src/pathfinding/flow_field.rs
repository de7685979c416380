use std::collections::VecDeque;

use crate::pathfinding::Walkable;
use crate::world::cell::Coord;
use crate::world::topology::{EIGHT_WAY, coord_of, index_of};

/// Reverse-BFS predecessor map rooted at one goal.
///
/// `next[i]` is the neighbor one step closer to the goal for every cell that
/// could reach it when the entry was built.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCacheEntry {
    pub goal: Coord,
    pub built_at_ms: u64,
    width: u32,
    height: u32,
    next: Vec<Option<usize>>,
    reached: Vec<bool>,
}

/// Result of walking a cached field from a start cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Path(Vec<Coord>),
    /// The start is not in the field, or the chain loops.
    Broken,
    /// A cell on the chain has become unwalkable since the build.
    Blocked(Coord),
}

impl PathCacheEntry {
    /// Breadth-first flood from `goal` over walkable cells, eight-way and unweighted.
    pub fn build<G: Walkable + ?Sized>(grid: &G, goal: Coord, now_ms: u64) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let total = width as usize * height as usize;
        let mut next: Vec<Option<usize>> = vec![None; total];
        let mut reached = vec![false; total];
        let mut queue = VecDeque::new();

        if let Some(goal_idx) = index_of(goal, width, height) {
            reached[goal_idx] = true;
            queue.push_back(goal_idx);
        }

        while let Some(idx) = queue.pop_front() {
            let c = coord_of(idx, width);
            for (dx, dy) in EIGHT_WAY {
                let n = c.offset(dx, dy);
                let Some(n_idx) = index_of(n, width, height) else {
                    continue;
                };
                if reached[n_idx] || !grid.is_walkable(n) {
                    continue;
                }
                reached[n_idx] = true;
                next[n_idx] = Some(idx);
                queue.push_back(n_idx);
            }
        }

        Self {
            goal,
            built_at_ms: now_ms,
            width,
            height,
            next,
            reached,
        }
    }

    pub fn fits<G: Walkable + ?Sized>(&self, grid: &G) -> bool {
        self.width == grid.width() && self.height == grid.height()
    }

    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.built_at_ms)
    }

    pub fn reached_count(&self) -> usize {
        self.reached.iter().filter(|&&r| r).count()
    }

    /// Follow predecessors from `start` to the goal, re-checking every step.
    pub fn extract<G: Walkable + ?Sized>(&self, grid: &G, start: Coord) -> Extraction {
        let Some(start_idx) = index_of(start, self.width, self.height) else {
            return Extraction::Broken;
        };
        let Some(goal_idx) = index_of(self.goal, self.width, self.height) else {
            return Extraction::Broken;
        };
        if !self.reached.get(start_idx).copied().unwrap_or(false) {
            return Extraction::Broken;
        }

        let mut visited = vec![false; self.next.len()];
        visited[start_idx] = true;
        let mut path = Vec::new();
        let mut cur = start_idx;
        while cur != goal_idx {
            let Some(step) = self.next[cur] else {
                return Extraction::Broken;
            };
            if visited[step] {
                return Extraction::Broken;
            }
            visited[step] = true;
            let c = coord_of(step, self.width);
            if !grid.is_walkable(c) {
                return Extraction::Blocked(c);
            }
            path.push(c);
            cur = step;
        }
        Extraction::Path(path)
    }
}
