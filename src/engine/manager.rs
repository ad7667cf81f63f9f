use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{AiError, Result};
use crate::metrics;

use super::ai::{Ai, DoorEvent};
use super::combat::{AttackResult, CombatPolicy};
use super::notification::Notification;
use super::player::Player;
use super::room::Room;

/// Everything one room tick produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomTick {
    pub updates: Vec<Notification>,
    /// Players downed since the previous tick, each reported once.
    pub downed: Vec<u32>,
}

impl RoomTick {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.downed.is_empty()
    }
}

/// Called with the room name whenever a room's AI is removed.
pub type TeardownHook = Box<dyn Fn(&str) + Send + Sync>;

/// Registry of one AI per active room.
///
/// Each AI sits behind its own mutex so different rooms can tick on
/// different threads. The manager itself is shared by reference.
pub struct AiManager {
    rooms: RwLock<HashMap<String, Arc<Mutex<Ai>>>>,
    hooks: RwLock<Vec<TeardownHook>>,
    seed: Option<u64>,
    policy: CombatPolicy,
}

impl Default for AiManager {
    fn default() -> Self {
        AiManager::new(None, CombatPolicy::default())
    }
}

impl AiManager {
    pub fn new(seed: Option<u64>, policy: CombatPolicy) -> Self {
        AiManager {
            rooms: RwLock::new(HashMap::new()),
            hooks: RwLock::new(Vec::new()),
            seed,
            policy,
        }
    }

    /// Register a hook run after every room teardown.
    pub fn on_teardown<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.hooks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(hook));
    }

    /// Validate a shared room, then build and register its AI. Replaces
    /// (and tears down) any AI already registered under the same name.
    pub fn add_room(&self, room: Arc<Mutex<Room>>) -> Result<String> {
        room.lock().unwrap_or_else(|e| e.into_inner()).validate()?;
        let ai = Ai::new(room, self.seed, self.policy);
        let name = ai.room_name().to_string();
        let previous = self
            .rooms
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.clone(), Arc::new(Mutex::new(ai)));
        match previous {
            Some(old) => self.teardown(&name, &old),
            None => metrics::ACTIVE_ROOMS.inc(),
        }
        tracing::info!(room = %name, "Room registered");
        Ok(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Ai>>> {
        self.rooms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    fn require(&self, name: &str) -> Result<Arc<Mutex<Ai>>> {
        self.get(name)
            .ok_or_else(|| AiError::RoomNotFound(name.to_string()))
    }

    /// Sorted names of every registered room.
    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rooms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rooms.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a room's AI, running its teardown and every hook.
    /// Returns false if the room was not registered.
    pub fn remove_room(&self, name: &str) -> bool {
        let removed = self
            .rooms
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        match removed {
            Some(ai) => {
                self.teardown(name, &ai);
                metrics::ACTIVE_ROOMS.dec();
                tracing::info!(room = %name, "Room removed");
                true
            }
            None => false,
        }
    }

    fn teardown(&self, name: &str, ai: &Arc<Mutex<Ai>>) {
        ai.lock().unwrap_or_else(|e| e.into_inner()).teardown();
        for hook in self.hooks.read().unwrap_or_else(|e| e.into_inner()).iter() {
            hook(name);
        }
    }

    /// Run one tick for a room and drain its notifications and downed
    /// players. Unknown rooms yield nothing.
    pub fn tick(&self, name: &str) -> RoomTick {
        let Some(ai) = self.get(name) else {
            return RoomTick::default();
        };
        let mut ai = ai.lock().unwrap_or_else(|e| e.into_inner());
        ai.process_npc_actions();
        metrics::ROOM_TICKS_TOTAL.inc();
        RoomTick {
            updates: ai.get_updates(),
            downed: ai.take_downed_players(),
        }
    }

    /// Add a player to a room. A player already present (same id) is
    /// replaced, never duplicated.
    pub fn add_player_to_room(&self, name: &str, player: Player) -> Result<()> {
        let ai = self.require(name)?;
        let room = Arc::clone(ai.lock().unwrap_or_else(|e| e.into_inner()).room());
        let id = player.id;
        room.lock().unwrap_or_else(|e| e.into_inner()).add_player(player);
        tracing::info!(room = %name, player = id, "Player joined");
        Ok(())
    }

    /// Remove a player. When the last player leaves, the room is torn down.
    /// Returns true if that happened.
    pub fn remove_player_from_room(&self, name: &str, player_id: u32) -> Result<bool> {
        let ai = self.require(name)?;
        let room = Arc::clone(ai.lock().unwrap_or_else(|e| e.into_inner()).room());
        let empty = {
            let mut room = room.lock().unwrap_or_else(|e| e.into_inner());
            room.remove_player(player_id);
            room.players.is_empty()
        };
        tracing::info!(room = %name, player = player_id, "Player left");
        if empty {
            self.remove_room(name);
        }
        Ok(empty)
    }

    pub fn apply_door_event(&self, name: &str, event: &DoorEvent) -> Result<bool> {
        let ai = self.require(name)?;
        let applied = ai
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply_door_event(event);
        Ok(applied)
    }

    /// Player-initiated attack on a creature in a room.
    pub fn resolve_player_attack(
        &self,
        name: &str,
        player_id: u32,
        creature: &str,
    ) -> Result<AttackResult> {
        let ai = self.require(name)?;
        let mut ai = ai.lock().unwrap_or_else(|e| e.into_inner());
        ai.resolve_player_attack(player_id, creature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::creature::{Archetype, Creature, Disposition};
    use crate::engine::geometry::WorldPos;
    use crate::engine::room::TileLayer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shared_room(name: &str) -> Arc<Mutex<Room>> {
        let mut room = Room::new(name, 10, 10);
        let c = Creature::new("g", WorldPos::new(96, 0), Disposition::Hostile, Archetype::Guard)
            .with_origin(WorldPos::new(0, 0));
        room.creatures.insert(c.name.clone(), c);
        Arc::new(Mutex::new(room))
    }

    #[test]
    fn test_add_get_remove() {
        let mgr = AiManager::new(Some(1), CombatPolicy::default());
        assert!(mgr.is_empty());
        assert_eq!(mgr.add_room(shared_room("a")).unwrap(), "a");
        mgr.add_room(shared_room("b")).unwrap();
        assert_eq!(mgr.room_names(), vec!["a", "b"]);
        assert!(mgr.get("a").is_some());
        assert!(mgr.remove_room("a"));
        assert!(!mgr.remove_room("a"));
        assert!(mgr.get("a").is_none());
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_tick_unknown_room_is_empty() {
        let mgr = AiManager::default();
        assert!(mgr.tick("nowhere").is_empty());
    }

    #[test]
    fn test_tick_returns_updates() {
        let mgr = AiManager::new(Some(1), CombatPolicy::default());
        mgr.add_room(shared_room("a")).unwrap();
        let tick = mgr.tick("a");
        assert_eq!(tick.updates, vec![Notification::walk("g", WorldPos::new(80, 0))]);
        assert!(tick.downed.is_empty());
    }

    #[test]
    fn test_teardown_hooks_run() {
        let mgr = AiManager::new(Some(1), CombatPolicy::default());
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        mgr.on_teardown(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        mgr.add_room(shared_room("a")).unwrap();
        // Re-registering tears down the old AI
        mgr.add_room(shared_room("a")).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        mgr.remove_room("a");
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_players_dedup_and_last_leaves() {
        let mgr = AiManager::new(Some(1), CombatPolicy::default());
        let room = shared_room("a");
        mgr.add_room(Arc::clone(&room)).unwrap();
        mgr.add_player_to_room("a", Player::new(1, "alice", WorldPos::new(0, 144)))
            .unwrap();
        mgr.add_player_to_room("a", Player::new(1, "alice", WorldPos::new(16, 144)))
            .unwrap();
        mgr.add_player_to_room("a", Player::new(2, "bob", WorldPos::new(32, 144)))
            .unwrap();
        assert_eq!(room.lock().unwrap().players.len(), 2);

        assert!(!mgr.remove_player_from_room("a", 1).unwrap());
        assert!(mgr.remove_player_from_room("a", 2).unwrap());
        assert!(mgr.get("a").is_none());
        assert!(matches!(
            mgr.remove_player_from_room("a", 2),
            Err(AiError::RoomNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_room_rejected() {
        let mgr = AiManager::default();
        let mut room = Room::new("bad", 3, 3);
        room.layers = vec![
            TileLayer {
                name: "Floor".into(),
                data: vec![1; 9],
            },
            TileLayer {
                name: "Walls".into(),
                data: vec![0, 0],
            },
        ];
        assert!(matches!(
            mgr.add_room(Arc::new(Mutex::new(room))),
            Err(AiError::InvalidRoom { .. })
        ));
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_tick_drains_downed_players() {
        let mgr = AiManager::new(Some(3), CombatPolicy::default());
        let mut room = Room::new("arena", 6, 6);
        let mut orc = Creature::new("orc", WorldPos::new(32, 32), Disposition::Hostile, Archetype::Guard);
        orc.ratings.accuracy = 200;
        orc.ratings.strength = 400;
        room.creatures.insert(orc.name.clone(), orc);
        let mut p = Player::new(4, "alice", WorldPos::new(48, 32));
        p.ratings.evasion = 0;
        p.ratings.parry = 0;
        p.pools = crate::engine::body::Pools::new(1, 100, 100);
        room.add_player(p);
        mgr.add_room(Arc::new(Mutex::new(room))).unwrap();

        let mut downed = Vec::new();
        for _ in 0..20 {
            downed.extend(mgr.tick("arena").downed);
        }
        assert_eq!(downed, vec![4]);
        let ai = mgr.get("arena").unwrap();
        assert!(ai.lock().unwrap().take_downed_players().is_empty());
    }

    #[test]
    fn test_unknown_room_errors() {
        let mgr = AiManager::default();
        let door = DoorEvent {
            x: 0,
            y: 0,
            walkable: false,
            sprite: None,
        };
        assert!(matches!(
            mgr.apply_door_event("x", &door),
            Err(AiError::RoomNotFound(_))
        ));
        assert!(mgr
            .add_player_to_room("x", Player::new(1, "a", WorldPos::new(0, 0)))
            .is_err());
    }
}
