// World constants
pub const TILE_SIZE: i32 = 16; // world units per tile
pub const MAX_ROOM_DIM: usize = 100;
/// Index of the tile layer whose sprites decide solidity and opacity.
pub const COLLISION_LAYER: usize = 1;
/// Cell value meaning "no sprite" in a tile layer.
pub const EMPTY_CELL: u32 = 0;

// Resource pools
pub const POOL_MAX: i32 = 100;

// Guard behaviour
/// Displacement from origin (world units, either axis) that sends a guard home.
pub const GUARD_RANGE: i32 = 80;
/// Players further than this on either axis are never considered.
pub const SIGHT_CUTOFF: i32 = 300;
/// Melee reach in tiles, checked on both axes.
pub const MELEE_RANGE_TILES: i32 = 1;
pub const MAX_DECISION_ATTEMPTS: usize = 10;

// Line of sight
pub const PROBE_STEP: f64 = 8.0;
pub const PROBE_RADIUS: f64 = 8.0;

// A* step costs (x10 so diagonals stay integral)
pub const STRAIGHT_COST: i32 = 10;
pub const DIAGONAL_COST: i32 = 14;

// Combat tuning (percent chances)
pub const BASE_HIT_CHANCE: i32 = 60;
pub const MIN_HIT_CHANCE: i32 = 5;
pub const MAX_HIT_CHANCE: i32 = 95;
pub const MAX_BLOCK_CHANCE: i32 = 60;
pub const MAX_PARRY_CHANCE: i32 = 50;
/// Share of the parrying defender's strength returned as counter-damage.
pub const PARRY_COUNTER_DIVISOR: i32 = 5;
pub const MAX_EFFECT_CHANCE: i32 = 80;

/// A compass step used by wandering creatures, in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub name: &'static str,
    /// Numpad key for the direction (8 = north).
    pub numpad: u8,
    pub dx: i32,
    pub dy: i32,
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction { name: "North", numpad: 8, dx: 0, dy: -1 },
    Direction { name: "South", numpad: 2, dx: 0, dy: 1 },
    Direction { name: "West", numpad: 4, dx: -1, dy: 0 },
    Direction { name: "East", numpad: 6, dx: 1, dy: 0 },
    Direction { name: "North West", numpad: 7, dx: -1, dy: -1 },
    Direction { name: "North East", numpad: 9, dx: 1, dy: -1 },
    Direction { name: "South West", numpad: 1, dx: -1, dy: 1 },
    Direction { name: "South East", numpad: 3, dx: 1, dy: 1 },
];
