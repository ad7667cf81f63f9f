//! World and tile coordinates.
//!
//! World positions are in world units and always land on tile corners
//! (multiples of `TILE_SIZE`). Pathfinding and occupancy work in tile
//! coordinates. The two are separate types so every crossing between them
//! is an explicit `to_tile()` / `to_world()` call.

use serde::{Deserialize, Serialize};

use super::config::TILE_SIZE;

/// A position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i32,
    pub y: i32,
}

/// A position in tile units (world / TILE_SIZE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl WorldPos {
    pub const fn new(x: i32, y: i32) -> Self {
        WorldPos { x, y }
    }

    /// Convert to the containing tile (floor division).
    pub fn to_tile(self) -> TilePos {
        TilePos {
            x: self.x.div_euclid(TILE_SIZE),
            y: self.y.div_euclid(TILE_SIZE),
        }
    }

    pub fn is_tile_aligned(self) -> bool {
        self.x.rem_euclid(TILE_SIZE) == 0 && self.y.rem_euclid(TILE_SIZE) == 0
    }

    /// Squared euclidean distance, avoids the sqrt for comparisons.
    pub fn distance_sq(self, other: WorldPos) -> i64 {
        let dx = (other.x - self.x) as i64;
        let dy = (other.y - self.y) as i64;
        dx * dx + dy * dy
    }
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        TilePos { x, y }
    }

    /// World position of the tile's corner.
    pub fn to_world(self) -> WorldPos {
        WorldPos {
            x: self.x * TILE_SIZE,
            y: self.y * TILE_SIZE,
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> TilePos {
        TilePos {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Largest per-axis distance (king-move distance).
    pub fn chebyshev(self, other: TilePos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_tile() {
        assert_eq!(WorldPos::new(0, 0).to_tile(), TilePos::new(0, 0));
        assert_eq!(WorldPos::new(15, 31).to_tile(), TilePos::new(0, 1));
        assert_eq!(WorldPos::new(96, 16).to_tile(), TilePos::new(6, 1));
        // Off-map probes left of the origin land in negative tiles
        assert_eq!(WorldPos::new(-1, -17).to_tile(), TilePos::new(-1, -2));
    }

    #[test]
    fn test_tile_to_world() {
        assert_eq!(TilePos::new(5, 2).to_world(), WorldPos::new(80, 32));
        assert_eq!(TilePos::new(5, 2).to_world().to_tile(), TilePos::new(5, 2));
    }

    #[test]
    fn test_alignment() {
        assert!(WorldPos::new(32, 48).is_tile_aligned());
        assert!(!WorldPos::new(33, 48).is_tile_aligned());
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(TilePos::new(0, 0).chebyshev(TilePos::new(3, -1)), 3);
        assert_eq!(TilePos::new(2, 2).chebyshev(TilePos::new(2, 2)), 0);
    }
}
