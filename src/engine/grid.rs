use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, RwLock};

use super::config::{DIAGONAL_COST, STRAIGHT_COST};
use super::geometry::TilePos;
use super::room::Room;

/// Boolean walkability matrix mirroring the collision layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkabilityGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl WalkabilityGrid {
    /// All cells walkable.
    pub fn open(width: usize, height: usize) -> Self {
        WalkabilityGrid {
            width,
            height,
            cells: vec![true; width * height],
        }
    }

    /// Build from the room's collision layer: solid sprites are blocked.
    pub fn from_room(room: &Room) -> Self {
        let mut grid = WalkabilityGrid::open(room.width, room.height);
        for y in 0..room.height {
            for x in 0..room.width {
                let tile = TilePos::new(x as i32, y as i32);
                grid.cells[y * room.width + x] = !room.is_solid(tile);
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, tile: TilePos) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 {
            return None;
        }
        let (x, y) = (tile.x as usize, tile.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn in_bounds(&self, tile: TilePos) -> bool {
        self.index(tile).is_some()
    }

    /// Off-grid cells are never walkable.
    pub fn is_walkable(&self, tile: TilePos) -> bool {
        self.index(tile).is_some_and(|i| self.cells[i])
    }

    /// Returns false if the cell is off-grid.
    pub fn set_walkable(&mut self, tile: TilePos, walkable: bool) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.cells[i] = walkable;
                true
            }
            None => false,
        }
    }

    /// A* search, 8-way, no corner cutting: a diagonal step needs both
    /// orthogonal neighbours walkable. The start cell may itself be blocked.
    pub fn find_path(&self, from: TilePos, to: TilePos) -> Option<Vec<TilePos>> {
        let start_idx = self.index(from)?;
        let end_idx = self.index(to)?;
        if !self.cells[end_idx] {
            return None;
        }
        if start_idx == end_idx {
            return Some(vec![to]);
        }

        let w = self.width;
        let size = w * self.height;
        let mut g_score = vec![i32::MAX; size];
        let mut came_from = vec![usize::MAX; size];
        let mut closed = vec![false; size];

        g_score[start_idx] = 0;

        let mut open = BinaryHeap::new();
        open.push(AStarNode {
            cost: octile(from, to),
            h: octile(from, to),
            tile: from,
        });

        while let Some(current) = open.pop() {
            let cidx = current.tile.y as usize * w + current.tile.x as usize;

            if cidx == end_idx {
                let mut path = Vec::new();
                let mut idx = end_idx;
                while idx != start_idx {
                    path.push(TilePos::new((idx % w) as i32, (idx / w) as i32));
                    idx = came_from[idx];
                }
                path.push(from);
                path.reverse();
                return Some(path);
            }

            if closed[cidx] {
                continue;
            }
            closed[cidx] = true;

            let current_g = g_score[cidx];

            for &(dx, dy) in &NEIGHBOURS {
                let next = current.tile.offset(dx, dy);
                let Some(nidx) = self.index(next) else {
                    continue;
                };
                if !self.cells[nidx] || closed[nidx] {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal
                    && !(self.is_walkable(current.tile.offset(dx, 0))
                        && self.is_walkable(current.tile.offset(0, dy)))
                {
                    continue;
                }

                let step = if diagonal { DIAGONAL_COST } else { STRAIGHT_COST };
                let tentative_g = current_g + step;
                if tentative_g < g_score[nidx] {
                    g_score[nidx] = tentative_g;
                    came_from[nidx] = cidx;
                    let h = octile(next, to);
                    open.push(AStarNode {
                        cost: tentative_g + h,
                        h,
                        tile: next,
                    });
                }
            }
        }

        None
    }
}

// --- A* internals ---

const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

fn octile(a: TilePos, b: TilePos) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    STRAIGHT_COST * (dx + dy) + (DIAGONAL_COST - 2 * STRAIGHT_COST) * dx.min(dy)
}

#[derive(Copy, Clone, Eq, PartialEq)]
struct AStarNode {
    cost: i32,
    h: i32,
    tile: TilePos,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on cost, then prefer nodes closer to the goal, then tile
        // order so equal-cost frontiers pop deterministically
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.tile.cmp(&self.tile))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* front-end over a shared, live-editable grid.
///
/// Queries snapshot the grid under a short read lock and search the copy,
/// so door edits never race an in-flight search.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    grid: Arc<RwLock<WalkabilityGrid>>,
}

impl Pathfinder {
    pub fn new(grid: WalkabilityGrid) -> Self {
        Pathfinder {
            grid: Arc::new(RwLock::new(grid)),
        }
    }

    pub fn from_room(room: &Room) -> Self {
        Pathfinder::new(WalkabilityGrid::from_room(room))
    }

    /// Copy of the current grid.
    pub fn snapshot(&self) -> WalkabilityGrid {
        self.grid.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_walkable(&self, tile: TilePos) -> bool {
        self.grid
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_walkable(tile)
    }

    /// Idempotent in-place edit, visible to every later query.
    /// Returns false for off-grid cells.
    pub fn update_cell(&self, tile: TilePos, walkable: bool) -> bool {
        self.grid
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_walkable(tile, walkable)
    }

    pub fn find_path(&self, from: TilePos, to: TilePos) -> Option<Path> {
        let grid = self.snapshot();
        let cells = grid.find_path(from, to);
        if cells.is_none() {
            tracing::debug!(?from, ?to, "No path");
            crate::metrics::UNREACHABLE_PATHS.inc();
        }
        cells.map(Path::new)
    }
}

/// A cached route. The first cell is where the walker stood when it was
/// computed; `advance` hands out the rest one cell at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    cells: Vec<TilePos>,
    cursor: usize,
}

impl Path {
    pub fn new(cells: Vec<TilePos>) -> Self {
        Path { cells, cursor: 1 }
    }

    pub fn destination(&self) -> Option<TilePos> {
        self.cells.last().copied()
    }

    pub fn peek(&self) -> Option<TilePos> {
        self.cells.get(self.cursor).copied()
    }

    pub fn advance(&mut self) -> Option<TilePos> {
        let next = self.peek()?;
        self.cursor += 1;
        Some(next)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.cells.len()
    }

    pub fn remaining(&self) -> usize {
        self.cells.len().saturating_sub(self.cursor)
    }

    pub fn cells(&self) -> &[TilePos] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: i32, y: i32) -> TilePos {
        TilePos::new(x, y)
    }

    fn assert_valid_path(grid: &WalkabilityGrid, path: &[TilePos], from: TilePos, to: TilePos) {
        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            assert!(dx.abs() <= 1 && dy.abs() <= 1 && (dx, dy) != (0, 0));
            assert!(grid.is_walkable(b));
            if dx != 0 && dy != 0 {
                assert!(grid.is_walkable(a.offset(dx, 0)));
                assert!(grid.is_walkable(a.offset(0, dy)));
            }
        }
    }

    #[test]
    fn test_straight_path() {
        let grid = WalkabilityGrid::open(10, 10);
        let path = grid.find_path(t(0, 0), t(5, 0)).unwrap();
        assert_eq!(path.len(), 6);
        assert_valid_path(&grid, &path, t(0, 0), t(5, 0));
    }

    #[test]
    fn test_diagonal_path_is_shortest() {
        let grid = WalkabilityGrid::open(10, 10);
        let path = grid.find_path(t(0, 0), t(4, 4)).unwrap();
        assert_eq!(path.len(), 5);
        assert_valid_path(&grid, &path, t(0, 0), t(4, 4));
    }

    #[test]
    fn test_same_cell() {
        let grid = WalkabilityGrid::open(3, 3);
        assert_eq!(grid.find_path(t(1, 1), t(1, 1)), Some(vec![t(1, 1)]));
    }

    #[test]
    fn test_no_corner_cutting() {
        let mut grid = WalkabilityGrid::open(3, 3);
        grid.set_walkable(t(1, 0), false);
        let path = grid.find_path(t(0, 0), t(1, 1)).unwrap();
        // Diagonal step blocked by (1,0); must go down then right
        assert_eq!(path, vec![t(0, 0), t(0, 1), t(1, 1)]);
        assert_valid_path(&grid, &path, t(0, 0), t(1, 1));
    }

    #[test]
    fn test_around_wall() {
        let mut grid = WalkabilityGrid::open(7, 7);
        for y in 0..6 {
            grid.set_walkable(t(3, y), false);
        }
        let path = grid.find_path(t(0, 0), t(6, 0)).unwrap();
        assert_valid_path(&grid, &path, t(0, 0), t(6, 0));
        assert!(path.contains(&t(3, 6)));
    }

    #[test]
    fn test_unreachable() {
        let mut grid = WalkabilityGrid::open(5, 5);
        for y in 0..5 {
            grid.set_walkable(t(2, y), false);
        }
        assert!(grid.find_path(t(0, 0), t(4, 4)).is_none());
        // Blocked target
        assert!(grid.find_path(t(0, 0), t(2, 2)).is_none());
        // Off-grid endpoints
        assert!(grid.find_path(t(-1, 0), t(1, 1)).is_none());
        assert!(grid.find_path(t(0, 0), t(5, 0)).is_none());
    }

    #[test]
    fn test_blocked_start_allowed() {
        let mut grid = WalkabilityGrid::open(4, 1);
        grid.set_walkable(t(0, 0), false);
        let path = grid.find_path(t(0, 0), t(3, 0)).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let grid = WalkabilityGrid::open(12, 12);
        let a = grid.find_path(t(1, 2), t(10, 7));
        let b = grid.find_path(t(1, 2), t(10, 7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_cell_round_trip() {
        let pf = Pathfinder::new(WalkabilityGrid::open(3, 1));
        assert!(pf.find_path(t(0, 0), t(2, 0)).is_some());
        assert!(pf.update_cell(t(1, 0), false));
        assert!(pf.find_path(t(0, 0), t(2, 0)).is_none());
        // Idempotent
        assert!(pf.update_cell(t(1, 0), false));
        assert!(pf.find_path(t(0, 0), t(2, 0)).is_none());
        assert!(pf.update_cell(t(1, 0), true));
        assert!(pf.find_path(t(0, 0), t(2, 0)).is_some());
        assert!(!pf.update_cell(t(3, 0), true));
    }

    #[test]
    fn test_path_cursor() {
        let mut path = Path::new(vec![t(0, 0), t(1, 0), t(2, 0)]);
        assert_eq!(path.destination(), Some(t(2, 0)));
        assert_eq!(path.remaining(), 2);
        assert_eq!(path.advance(), Some(t(1, 0)));
        assert_eq!(path.advance(), Some(t(2, 0)));
        assert!(path.is_exhausted());
        assert_eq!(path.advance(), None);
    }
}
