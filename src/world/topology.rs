use crate::world::cell::Coord;

/// Orthogonal neighbor offsets: east, west, north, south.
pub const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, -1), (0, 1)];

/// Eight-way neighbor offsets, orthogonal moves first.
pub const EIGHT_WAY: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, -1),
    (0, 1),
    (1, -1),
    (-1, -1),
    (1, 1),
    (-1, 1),
];

/// In-bounds orthogonal neighbors of `c` on a `width x height` grid.
pub fn neighbors4(c: Coord, width: u32, height: u32) -> impl Iterator<Item = Coord> {
    ORTHOGONAL
        .into_iter()
        .map(move |(dx, dy)| c.offset(dx, dy))
        .filter(move |n| in_bounds(*n, width, height))
}

/// In-bounds eight-way neighbors of `c` on a `width x height` grid.
pub fn neighbors8(c: Coord, width: u32, height: u32) -> impl Iterator<Item = Coord> {
    EIGHT_WAY
        .into_iter()
        .map(move |(dx, dy)| c.offset(dx, dy))
        .filter(move |n| in_bounds(*n, width, height))
}

pub fn in_bounds(c: Coord, width: u32, height: u32) -> bool {
    c.x >= 0 && c.y >= 0 && (c.x as i64) < width as i64 && (c.y as i64) < height as i64
}

/// Row-major index of `c`, or `None` outside the grid.
pub fn index_of(c: Coord, width: u32, height: u32) -> Option<usize> {
    if in_bounds(c, width, height) {
        Some(c.y as usize * width as usize + c.x as usize)
    } else {
        None
    }
}

pub fn coord_of(index: usize, width: u32) -> Coord {
    let w = width.max(1) as usize;
    Coord::new((index % w) as i32, (index / w) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_has_three_neighbors() {
        let n: Vec<_> = neighbors8(Coord::new(0, 0), 4, 4).collect();
        assert_eq!(n.len(), 3);
        assert!(n.contains(&Coord::new(1, 1)));
    }

    #[test]
    fn interior_neighbor_counts() {
        assert_eq!(neighbors4(Coord::new(2, 2), 5, 5).count(), 4);
        assert_eq!(neighbors8(Coord::new(2, 2), 5, 5).count(), 8);
    }

    #[test]
    fn index_round_trips_within_bounds() {
        for y in 0..3 {
            for x in 0..7 {
                let c = Coord::new(x, y);
                let idx = index_of(c, 7, 3).unwrap();
                assert_eq!(coord_of(idx, 7), c);
            }
        }
        assert_eq!(index_of(Coord::new(7, 0), 7, 3), None);
        assert_eq!(index_of(Coord::new(-1, 0), 7, 3), None);
        assert_eq!(index_of(Coord::new(0, 3), 7, 3), None);
    }
}
