use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{AiError, Result};

use super::config::*;
use super::creature::Creature;
use super::geometry::{TilePos, WorldPos};
use super::player::Player;

/// One layer of tile data, row-major, `width * height` cells.
#[derive(Debug, Clone, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub data: Vec<u32>,
}

/// Which sprite values block movement and which block sight.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpriteCatalog {
    #[serde(default)]
    pub solid: HashSet<u32>,
    #[serde(default)]
    pub opaque: HashSet<u32>,
}

/// A map room: tile layers plus the live creatures and players in it.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub layers: Vec<TileLayer>,
    pub sprites: SpriteCatalog,
    pub creatures: BTreeMap<String, Creature>,
    pub players: BTreeMap<u32, Player>,
}

// --- JSON deserialization helpers ---

#[derive(Deserialize)]
struct RoomJson {
    name: String,
    width: usize,
    height: usize,
    #[serde(default)]
    layers: Vec<TileLayer>,
    #[serde(default)]
    sprites: SpriteCatalog,
    #[serde(default)]
    creatures: Vec<Creature>,
    #[serde(default)]
    players: Vec<Player>,
}

impl Room {
    /// An empty open room with no tile layers.
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        Room {
            name: name.to_string(),
            width,
            height,
            layers: Vec::new(),
            sprites: SpriteCatalog::default(),
            creatures: BTreeMap::new(),
            players: BTreeMap::new(),
        }
    }

    /// Parse and validate a room snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RoomJson = serde_json::from_str(json)?;
        let mut room = Room {
            name: raw.name,
            width: raw.width,
            height: raw.height,
            layers: raw.layers,
            sprites: raw.sprites,
            creatures: BTreeMap::new(),
            players: BTreeMap::new(),
        };
        for creature in raw.creatures {
            if room.creatures.contains_key(&creature.name) {
                return Err(AiError::invalid_room(
                    &room.name,
                    format!("duplicate creature name '{}'", creature.name),
                ));
            }
            room.creatures.insert(creature.name.clone(), creature);
        }
        for player in raw.players {
            room.players.insert(player.id, player);
        }
        room.validate()?;
        Ok(room)
    }

    /// Check dimensions, layer sizes and that every position is
    /// tile-aligned and on the map.
    pub fn validate(&self) -> Result<()> {
        let bad = |reason: String| -> Result<()> { Err(AiError::invalid_room(&self.name, reason)) };

        if !(1..=MAX_ROOM_DIM).contains(&self.width) || !(1..=MAX_ROOM_DIM).contains(&self.height) {
            return bad(format!(
                "dimensions {}x{} outside 1..={MAX_ROOM_DIM}",
                self.width, self.height
            ));
        }
        let cells = self.width * self.height;
        for layer in &self.layers {
            if layer.data.len() != cells {
                return bad(format!(
                    "layer '{}' has {} cells, expected {cells}",
                    layer.name,
                    layer.data.len()
                ));
            }
        }
        for c in self.creatures.values() {
            for (what, pos) in [("position", c.pos), ("origin", c.origin)] {
                if !self.is_valid_position(pos) {
                    return bad(format!("creature '{}' {what} ({}, {}) invalid", c.name, pos.x, pos.y));
                }
            }
        }
        for p in self.players.values() {
            if !self.is_valid_position(p.pos) {
                return bad(format!("player {} position ({}, {}) invalid", p.id, p.pos.x, p.pos.y));
            }
        }
        Ok(())
    }

    fn is_valid_position(&self, pos: WorldPos) -> bool {
        pos.is_tile_aligned() && self.in_bounds(pos.to_tile())
    }

    /// Load one room file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Room::from_json(&contents)
    }

    // --- Index helper ---

    #[inline]
    fn index(&self, tile: TilePos) -> Option<usize> {
        if self.in_bounds(tile) {
            Some(tile.y as usize * self.width + tile.x as usize)
        } else {
            None
        }
    }

    // --- Tile queries ---

    pub fn in_bounds(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as usize) < self.width && (tile.y as usize) < self.height
    }

    /// Sprite value on the collision layer. Rooms without one are open floor.
    /// None off-map or past the end of a short layer.
    pub fn collision_cell(&self, tile: TilePos) -> Option<u32> {
        let idx = self.index(tile)?;
        match self.layers.get(COLLISION_LAYER) {
            Some(layer) => layer.data.get(idx).copied(),
            None => Some(EMPTY_CELL),
        }
    }

    /// Solid or off-map.
    pub fn is_solid(&self, tile: TilePos) -> bool {
        match self.collision_cell(tile) {
            Some(cell) => self.sprites.solid.contains(&cell),
            None => true,
        }
    }

    /// Blocks line of sight. Off-map counts as opaque.
    pub fn is_opaque(&self, tile: TilePos) -> bool {
        match self.collision_cell(tile) {
            Some(cell) => self.sprites.opaque.contains(&cell),
            None => true,
        }
    }

    /// Overwrite the collision sprite at `tile`. No-op off-map or when the
    /// room has no collision layer.
    pub fn set_collision_cell(&mut self, tile: TilePos, sprite: u32) -> bool {
        let Some(idx) = self.index(tile) else {
            return false;
        };
        match self
            .layers
            .get_mut(COLLISION_LAYER)
            .and_then(|layer| layer.data.get_mut(idx))
        {
            Some(cell) => {
                *cell = sprite;
                true
            }
            None => false,
        }
    }

    // --- Occupants ---

    /// Name of a creature standing on `tile`, other than `except`.
    pub fn creature_at(&self, tile: TilePos, except: &str) -> Option<&str> {
        self.creatures
            .values()
            .find(|c| c.name != except && c.pos.to_tile() == tile)
            .map(|c| c.name.as_str())
    }

    pub fn remove_creature(&mut self, name: &str) -> Option<Creature> {
        self.creatures.remove(name)
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        self.players.remove(&id)
    }

    /// Borrow a creature and a player mutably at once, for combat.
    pub fn creature_and_player_mut(
        &mut self,
        creature: &str,
        player_id: u32,
    ) -> Option<(&mut Creature, &mut Player)> {
        let c = self.creatures.get_mut(creature)?;
        let p = self.players.get_mut(&player_id)?;
        Some((c, p))
    }
}

/// Load every `*.json` room in a directory, sorted by file name.
/// Files that fail to parse are logged and skipped.
pub fn load_rooms(dir: &Path) -> Result<Vec<Room>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut rooms = Vec::new();
    for path in paths {
        match Room::load(&path) {
            Ok(room) => rooms.push(room),
            Err(e) => tracing::warn!(path = %path.display(), "Skipping room file: {e}"),
        }
    }
    Ok(rooms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::creature::{Archetype, Disposition};

    const WALL: u32 = 5;

    fn room_json(layer1: &str) -> String {
        format!(
            r#"{{
                "name": "crypt",
                "width": 3, "height": 2,
                "layers": [
                    {{"name": "Floor", "data": [1,1,1,1,1,1]}},
                    {{"name": "Walls", "data": {layer1}}}
                ],
                "sprites": {{"solid": [5], "opaque": [5]}},
                "creatures": [{{"name": "skeleton", "pos": {{"x": 32, "y": 16}},
                    "origin": {{"x": 32, "y": 16}}, "disposition": "hostile", "archetype": "guard"}}],
                "players": [{{"id": 3, "name": "alice", "pos": {{"x": 0, "y": 0}}}}]
            }}"#
        )
    }

    #[test]
    fn test_from_json() {
        let room = Room::from_json(&room_json("[0,5,0,0,0,0]")).unwrap();
        assert_eq!(room.width, 3);
        assert!(room.is_solid(TilePos::new(1, 0)));
        assert!(room.is_opaque(TilePos::new(1, 0)));
        assert!(!room.is_solid(TilePos::new(0, 0)));
        assert!(room.is_solid(TilePos::new(3, 0)));
        assert!(room.is_opaque(TilePos::new(-1, 0)));
        assert_eq!(room.creatures["skeleton"].archetype, Archetype::Guard);
        assert_eq!(room.players[&3].name, "alice");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(Room::from_json("not json"), Err(AiError::Json(_))));
        // Wrong layer length
        assert!(matches!(
            Room::from_json(&room_json("[0,0,0]")),
            Err(AiError::InvalidRoom { .. })
        ));
        let too_big = r#"{"name": "x", "width": 101, "height": 1}"#;
        assert!(matches!(Room::from_json(too_big), Err(AiError::InvalidRoom { .. })));
        let zero = r#"{"name": "x", "width": 0, "height": 4}"#;
        assert!(Room::from_json(zero).is_err());
    }

    #[test]
    fn test_unaligned_creature_rejected() {
        let mut room = Room::new("r", 4, 4);
        let c = Creature::new("bat", WorldPos::new(17, 0), Disposition::Hostile, Archetype::Meander);
        room.creatures.insert(c.name.clone(), c);
        assert!(room.validate().is_err());
    }

    #[test]
    fn test_open_room_without_layers() {
        let room = Room::new("open", 2, 2);
        assert_eq!(room.collision_cell(TilePos::new(1, 1)), Some(EMPTY_CELL));
        assert!(!room.is_solid(TilePos::new(1, 1)));
        assert!(room.is_solid(TilePos::new(2, 1)));
    }

    #[test]
    fn test_set_collision_cell() {
        let mut room = Room::from_json(&room_json("[0,0,0,0,0,0]")).unwrap();
        assert!(room.set_collision_cell(TilePos::new(2, 1), WALL));
        assert!(room.is_solid(TilePos::new(2, 1)));
        assert!(!room.set_collision_cell(TilePos::new(9, 9), WALL));
    }

    #[test]
    fn test_creature_at_excludes_self() {
        let room = Room::from_json(&room_json("[0,0,0,0,0,0]")).unwrap();
        let tile = TilePos::new(2, 1);
        assert_eq!(room.creature_at(tile, "other"), Some("skeleton"));
        assert_eq!(room.creature_at(tile, "skeleton"), None);
    }

    #[test]
    fn test_creature_and_player_mut() {
        let mut room = Room::from_json(&room_json("[0,0,0,0,0,0]")).unwrap();
        assert!(room.creature_and_player_mut("skeleton", 3).is_some());
        assert!(room.creature_and_player_mut("skeleton", 4).is_none());
        assert!(room.creature_and_player_mut("ghost", 3).is_none());
    }
}
