use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{AiError, Result};
use crate::metrics;

use super::ai_creature::{AiCreature, Decision};
use super::combat::{AttackResult, CombatPolicy, CombatResolver};
use super::effect::EffectProcessor;
use super::geometry::TilePos;
use super::grid::Pathfinder;
use super::notification::Notification;
use super::player::Player;
use super::room::Room;

/// A door opened or closed at a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorEvent {
    pub x: i32,
    pub y: i32,
    pub walkable: bool,
    /// New collision-layer sprite, if the door's graphic changes too.
    pub sprite: Option<u32>,
}

impl DoorEvent {
    /// Build from a row-major cell index into a room `width` tiles wide.
    /// None for a zero width.
    pub fn from_cell_index(index: usize, width: usize, walkable: bool, sprite: Option<u32>) -> Option<Self> {
        if width == 0 {
            return None;
        }
        Some(DoorEvent {
            x: (index % width) as i32,
            y: (index / width) as i32,
            walkable,
            sprite,
        })
    }

    pub fn tile(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }
}

/// Why a creature died, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeathCause {
    /// Entered the tick with no blood left.
    Wounds,
    Effects,
    Combat,
    /// Parry counter-damage taken while attacking.
    Counter,
}

impl DeathCause {
    fn label(self) -> &'static str {
        match self {
            DeathCause::Wounds => "wounds",
            DeathCause::Effects => "effects",
            DeathCause::Combat => "combat",
            DeathCause::Counter => "counter",
        }
    }
}

/// Runs every creature in one room.
///
/// Owns the room's pathfinder and one controller per live creature. The
/// room itself is shared with the surrounding world layer.
pub struct Ai {
    room_name: String,
    room: Arc<Mutex<Room>>,
    pathfinder: Pathfinder,
    controllers: BTreeMap<String, AiCreature>,
    resolver: CombatResolver,
    rng: StdRng,
    updates: Vec<Notification>,
    downed: Vec<u32>,
}

impl Ai {
    /// Build the AI for a room. `seed` fixes the RNG for reproducible runs.
    pub fn new(room: Arc<Mutex<Room>>, seed: Option<u64>, policy: CombatPolicy) -> Self {
        let (room_name, pathfinder, controllers) = {
            let guard = room.lock().unwrap_or_else(|e| e.into_inner());
            let controllers: BTreeMap<String, AiCreature> = guard
                .creatures
                .values()
                .map(|c| (c.name.clone(), AiCreature::new(c)))
                .collect();
            (guard.name.clone(), Pathfinder::from_room(&guard), controllers)
        };
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        tracing::info!(room = %room_name, creatures = controllers.len(), "AI created");
        Ai {
            room_name,
            room,
            pathfinder,
            controllers,
            resolver: CombatResolver::new(policy),
            rng,
            updates: Vec::new(),
            downed: Vec::new(),
        }
    }

    pub fn room_name(&self) -> &str {
        &self.room_name
    }

    pub fn room(&self) -> &Arc<Mutex<Room>> {
        &self.room
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    pub fn controller(&self, name: &str) -> Option<&AiCreature> {
        self.controllers.get(name)
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Add controllers for new creatures and drop those whose creature left.
    fn reconcile(&mut self, room: &Room) {
        self.controllers
            .retain(|name, _| room.creatures.contains_key(name));
        for c in room.creatures.values() {
            self.controllers
                .entry(c.name.clone())
                .or_insert_with(|| AiCreature::new(c));
        }
    }

    /// Run one turn for every creature, in name order. A failing or
    /// panicking turn is logged and skipped; the rest of the room continues.
    pub fn process_npc_actions(&mut self) {
        self.process_turns(|ai, name, room| ai.run_turn(name, room));
    }

    fn process_turns<F>(&mut self, mut turn: F)
    where
        F: FnMut(&mut Ai, &str, &mut Room) -> Result<Option<Notification>>,
    {
        let tick_start = std::time::Instant::now();
        let handle = Arc::clone(&self.room);
        let mut room = handle.lock().unwrap_or_else(|e| e.into_inner());
        self.reconcile(&room);

        let names: Vec<String> = self.controllers.keys().cloned().collect();
        for name in names {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| turn(self, name.as_str(), &mut *room)));
            match outcome {
                Ok(Ok(Some(note))) => {
                    metrics::NPC_ACTIONS_TOTAL
                        .with_label_values(&[note.action.label()])
                        .inc();
                    self.updates.push(note);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    metrics::TURN_FAILURES_TOTAL.inc();
                    tracing::warn!(room = %self.room_name, creature = %name, "Turn failed: {e}");
                }
                Err(panic_info) => {
                    metrics::TURN_FAILURES_TOTAL.inc();
                    let msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic".to_string()
                    };
                    tracing::error!(room = %self.room_name, creature = %name, "Turn panicked: {msg}");
                }
            }
        }

        let elapsed_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
        metrics::ROOM_TICK_DURATION_MS.observe(elapsed_ms);
    }

    /// One creature's turn: death check, effects, decision, effects again,
    /// death check. Returns the single notification the creature produced,
    /// if any. Each effect pass consumes one turn of every effect.
    fn run_turn(&mut self, name: &str, room: &mut Room) -> Result<Option<Notification>> {
        let creature = room
            .creatures
            .get_mut(name)
            .ok_or_else(|| AiError::CreatureMissing(name.to_string()))?;

        if creature.is_dead() {
            return Ok(Some(self.kill(name, room, DeathCause::Wounds)));
        }
        let effects = EffectProcessor::process(&mut creature.pools, &mut creature.body);
        if effects.died {
            return Ok(Some(self.kill(name, room, DeathCause::Effects)));
        }

        let controller = self
            .controllers
            .get_mut(name)
            .ok_or_else(|| AiError::CreatureMissing(name.to_string()))?;
        let decision = controller.decide(room, &self.pathfinder, &mut self.rng);

        let note = match decision {
            Decision::Walk(to) => {
                let creature = room
                    .creatures
                    .get_mut(name)
                    .ok_or_else(|| AiError::CreatureMissing(name.to_string()))?;
                creature.pos = to;
                Some(Notification::walk(name, to))
            }
            Decision::Attack(player_id) => self
                .attack_player(name, player_id, room)
                .map(|result| Notification::attack(name, result)),
            Decision::Hold => None,
        };

        // Death after acting replaces the action
        let creature = room
            .creatures
            .get_mut(name)
            .ok_or_else(|| AiError::CreatureMissing(name.to_string()))?;
        if creature.is_dead() {
            return Ok(Some(self.kill(name, room, DeathCause::Counter)));
        }
        let effects = EffectProcessor::process(&mut creature.pools, &mut creature.body);
        if effects.died {
            return Ok(Some(self.kill(name, room, DeathCause::Effects)));
        }
        Ok(note)
    }

    fn attack_player(&mut self, name: &str, player_id: u32, room: &mut Room) -> Option<AttackResult> {
        let Some((creature, player)) = room.creature_and_player_mut(name, player_id) else {
            let err = AiError::TargetMissing(player_id.to_string());
            tracing::warn!(room = %self.room_name, creature = %name, "Attack dropped: {err}");
            return None;
        };
        let result = self.resolver.resolve(creature, player, &mut self.rng);
        if player.is_down() {
            self.mark_downed(player);
        }
        Some(result)
    }

    fn mark_downed(&mut self, player: &mut Player) {
        if !self.downed.contains(&player.id) {
            player.clear_effects();
            tracing::info!(room = %self.room_name, player = player.id, "Player down");
            self.downed.push(player.id);
        }
    }

    /// Remove a creature and its controller. Returns its `die` notification.
    fn kill(&mut self, name: &str, room: &mut Room, cause: DeathCause) -> Notification {
        room.remove_creature(name);
        if let Some(mut controller) = self.controllers.remove(name) {
            controller.mark_dead();
        }
        metrics::CREATURE_DEATHS_TOTAL
            .with_label_values(&[cause.label()])
            .inc();
        tracing::info!(room = %self.room_name, creature = %name, cause = cause.label(), "Creature died");
        Notification::die(name)
    }

    /// A player strikes a creature. A creature killed this way is removed
    /// and its `die` notification queued for the next drain.
    pub fn resolve_player_attack(&mut self, player_id: u32, creature_name: &str) -> Result<AttackResult> {
        let handle = Arc::clone(&self.room);
        let mut room = handle.lock().unwrap_or_else(|e| e.into_inner());
        if !room.players.contains_key(&player_id) {
            return Err(AiError::PlayerMissing(player_id));
        }
        let (creature, player) = room
            .creature_and_player_mut(creature_name, player_id)
            .ok_or_else(|| AiError::TargetMissing(creature_name.to_string()))?;

        let result = self.resolver.resolve(player, creature, &mut self.rng);
        let creature_dead = creature.is_dead();
        if player.is_down() {
            self.mark_downed(player);
        }
        if creature_dead {
            let note = self.kill(creature_name, &mut room, DeathCause::Combat);
            metrics::NPC_ACTIONS_TOTAL
                .with_label_values(&[note.action.label()])
                .inc();
            self.updates.push(note);
        }
        Ok(result)
    }

    /// Apply a door open/close. Returns false if the tile is off the grid.
    pub fn apply_door_event(&self, event: &DoorEvent) -> bool {
        let tile = event.tile();
        if !self.pathfinder.update_cell(tile, event.walkable) {
            tracing::warn!(room = %self.room_name, ?tile, "Door event outside the room");
            return false;
        }
        if let Some(sprite) = event.sprite {
            let mut room = self.room.lock().unwrap_or_else(|e| e.into_inner());
            room.set_collision_cell(tile, sprite);
        }
        tracing::debug!(room = %self.room_name, ?tile, walkable = event.walkable, "Door updated");
        true
    }

    /// Drain the notifications collected since the last call.
    pub fn get_updates(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.updates)
    }

    /// Drain the ids of players downed since the last call.
    pub fn take_downed_players(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.downed)
    }

    /// Release controllers and pending output. The room itself belongs to
    /// the world layer and is left alone.
    pub fn teardown(&mut self) {
        self.controllers.clear();
        self.updates.clear();
        self.downed.clear();
        tracing::info!(room = %self.room_name, "AI torn down");
    }
}
