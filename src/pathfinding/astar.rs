use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

use crate::pathfinding::Walkable;
use crate::world::cell::Coord;
use crate::world::topology::{EIGHT_WAY, coord_of, index_of};

/// Open-set entry. Ordered so the max-heap pops the lowest f-score first;
/// ties go to the lower coordinate sum, then the lower cell index.
#[derive(Clone, Copy)]
struct OpenNode {
    f: f64,
    coord_sum: i32,
    idx: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.coord_sum.cmp(&self.coord_sum))
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

fn step_cost(dx: i32, dy: i32) -> f64 {
    if dx != 0 && dy != 0 { SQRT_2 } else { 1.0 }
}

/// Eight-directional A* with a Manhattan heuristic.
///
/// Returns the steps after `start` up to and including `goal`, or `None`
/// when either end is blocked or the goal cannot be reached.
pub fn find_path_direct<G: Walkable + ?Sized>(grid: &G, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
    let (width, height) = (grid.width(), grid.height());
    if start == goal {
        return Some(Vec::new());
    }
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return None;
    }
    let start_idx = index_of(start, width, height)?;
    let goal_idx = index_of(goal, width, height)?;

    let total = width as usize * height as usize;
    let mut g_score = vec![f64::INFINITY; total];
    let mut came_from: Vec<Option<usize>> = vec![None; total];
    let mut closed = vec![false; total];
    let mut open = BinaryHeap::new();

    g_score[start_idx] = 0.0;
    open.push(OpenNode {
        f: start.manhattan(goal) as f64,
        coord_sum: start.x + start.y,
        idx: start_idx,
    });

    while let Some(node) = open.pop() {
        if node.idx == goal_idx {
            return Some(reconstruct(&came_from, goal_idx, start_idx, width));
        }
        if closed[node.idx] {
            continue;
        }
        closed[node.idx] = true;

        let current = coord_of(node.idx, width);
        for (dx, dy) in EIGHT_WAY {
            let next = current.offset(dx, dy);
            let Some(next_idx) = index_of(next, width, height) else {
                continue;
            };
            if closed[next_idx] || !grid.is_walkable(next) {
                continue;
            }
            let tentative = g_score[node.idx] + step_cost(dx, dy);
            if tentative < g_score[next_idx] {
                g_score[next_idx] = tentative;
                came_from[next_idx] = Some(node.idx);
                open.push(OpenNode {
                    f: tentative + next.manhattan(goal) as f64,
                    coord_sum: next.x + next.y,
                    idx: next_idx,
                });
            }
        }
    }
    None
}

fn reconstruct(came_from: &[Option<usize>], goal_idx: usize, start_idx: usize, width: u32) -> Vec<Coord> {
    let mut path = Vec::new();
    let mut cur = goal_idx;
    while cur != start_idx {
        path.push(coord_of(cur, width));
        match came_from[cur] {
            Some(prev) => cur = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::cell::Terrain;
    use crate::world::grid::CellGrid;

    fn assert_valid(grid: &CellGrid, start: Coord, goal: Coord, path: &[Coord]) {
        let mut prev = start;
        for &step in path {
            assert!(grid.is_walkable(step), "step {} not walkable", step);
            assert!(prev.is_adjacent(step), "{} -> {} not adjacent", prev, step);
            prev = step;
        }
        assert_eq!(path.last().copied(), Some(goal));
    }

    #[test]
    fn straight_line() {
        let grid = CellGrid::filled(10, 10, Terrain::Grassland);
        let path = find_path_direct(&grid, Coord::new(0, 0), Coord::new(5, 0)).unwrap();
        assert_eq!(path.len(), 5);
        assert_valid(&grid, Coord::new(0, 0), Coord::new(5, 0), &path);
    }

    #[test]
    fn diagonal_moves_are_used() {
        let grid = CellGrid::filled(10, 10, Terrain::Grassland);
        let path = find_path_direct(&grid, Coord::new(0, 0), Coord::new(4, 4)).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn routes_around_a_wall() {
        let mut grid = CellGrid::filled(10, 10, Terrain::Grassland);
        for y in 0..9 {
            grid.set_terrain(Coord::new(5, y), Terrain::Mountain);
        }
        let start = Coord::new(0, 0);
        let goal = Coord::new(9, 0);
        let path = find_path_direct(&grid, start, goal).unwrap();
        assert_valid(&grid, start, goal, &path);
        assert!(path.contains(&Coord::new(5, 9)));
    }

    #[test]
    fn trivial_and_blocked_endpoints() {
        let mut grid = CellGrid::filled(4, 4, Terrain::Grassland);
        assert_eq!(
            find_path_direct(&grid, Coord::new(1, 1), Coord::new(1, 1)),
            Some(vec![])
        );
        grid.set_terrain(Coord::new(3, 3), Terrain::Ocean);
        assert!(find_path_direct(&grid, Coord::new(0, 0), Coord::new(3, 3)).is_none());
        assert!(find_path_direct(&grid, Coord::new(3, 3), Coord::new(0, 0)).is_none());
        assert!(find_path_direct(&grid, Coord::new(0, 0), Coord::new(9, 9)).is_none());
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let mut grid = CellGrid::filled(9, 9, Terrain::Grassland);
        let goal = Coord::new(4, 4);
        for (dx, dy) in EIGHT_WAY {
            grid.set_terrain(goal.offset(dx, dy), Terrain::River);
        }
        assert!(find_path_direct(&grid, Coord::new(0, 0), goal).is_none());
    }

    #[test]
    fn tie_break_is_stable() {
        let grid = CellGrid::filled(6, 6, Terrain::Grassland);
        let a = find_path_direct(&grid, Coord::new(0, 2), Coord::new(5, 3)).unwrap();
        let b = find_path_direct(&grid, Coord::new(0, 2), Coord::new(5, 3)).unwrap();
        assert_eq!(a, b);
    }
}
