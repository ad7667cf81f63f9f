//! Per-creature decision state.
//!
//! Each creature runs an ordered list of rules. The first rule to return a
//! concrete verdict decides the turn; a rule that defers hands over to the
//! next. If every rule defers, the whole chain is retried a bounded number
//! of times before the creature holds.

use rand::Rng;

use super::config::*;
use super::creature::{Archetype, Creature, Disposition};
use super::geometry::{TilePos, WorldPos};
use super::grid::{Path, Pathfinder};
use super::player::Player;
use super::room::Room;
use super::visibility::can_see;

/// What a creature does this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Walk(WorldPos),
    /// Attack the player with this id.
    Attack(u32),
    /// No action this tick.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Act(Decision),
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Guards too far from origin walk home.
    GuardHoming,
    /// Hostile guards chase and attack the closest visible player.
    HostilePursuit,
    /// Continue a cached path or take a random step.
    IdleFallback,
    /// Archetypes with no defined policy. Always holds.
    Unspecified,
}

const HOSTILE_GUARD: &[Rule] = &[Rule::GuardHoming, Rule::HostilePursuit, Rule::IdleFallback];
const FRIENDLY_GUARD: &[Rule] = &[Rule::GuardHoming, Rule::IdleFallback];
const UNSPECIFIED: &[Rule] = &[Rule::Unspecified];

impl Rule {
    pub fn chain_for(archetype: Archetype, disposition: Disposition) -> &'static [Rule] {
        match (archetype, disposition) {
            (Archetype::Guard, Disposition::Hostile) => HOSTILE_GUARD,
            (Archetype::Guard, Disposition::Friendly) => FRIENDLY_GUARD,
            (Archetype::Patrol | Archetype::Meander, _) => UNSPECIFIED,
        }
    }
}

/// Conceptual state, tracked for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureState {
    Idle,
    ReturningToOrigin,
    Pursuing,
    Attacking,
    Wandering,
    Dead,
}

/// Decision controller for one creature.
#[derive(Debug, Clone)]
pub struct AiCreature {
    name: String,
    rules: &'static [Rule],
    path: Option<Path>,
    last_seen: Option<TilePos>,
    state: CreatureState,
}

impl AiCreature {
    pub fn new(creature: &Creature) -> Self {
        AiCreature {
            name: creature.name.clone(),
            rules: Rule::chain_for(creature.archetype, creature.disposition),
            path: None,
            last_seen: None,
            state: CreatureState::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &'static [Rule] {
        self.rules
    }

    pub fn state(&self) -> CreatureState {
        self.state
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    pub fn last_seen(&self) -> Option<TilePos> {
        self.last_seen
    }

    pub fn mark_dead(&mut self) {
        self.state = CreatureState::Dead;
        self.path = None;
    }

    /// Pick this tick's action. Reads the room, never mutates it.
    pub fn decide<R: Rng>(&mut self, room: &Room, pathfinder: &Pathfinder, rng: &mut R) -> Decision {
        let Some(me) = room.creatures.get(&self.name) else {
            return Decision::Hold;
        };
        let rules = self.rules;
        for attempt in 0..MAX_DECISION_ATTEMPTS {
            for &rule in rules {
                if let Verdict::Act(decision) = self.apply(rule, me, room, pathfinder, rng) {
                    tracing::debug!(creature = %self.name, ?rule, ?decision, attempt, "Decided");
                    return decision;
                }
            }
        }
        tracing::debug!(creature = %self.name, "Every rule deferred, holding");
        self.state = CreatureState::Idle;
        Decision::Hold
    }

    fn apply<R: Rng>(
        &mut self,
        rule: Rule,
        me: &Creature,
        room: &Room,
        pathfinder: &Pathfinder,
        rng: &mut R,
    ) -> Verdict {
        match rule {
            Rule::GuardHoming => self.guard_homing(me, room, pathfinder),
            Rule::HostilePursuit => self.hostile_pursuit(me, room, pathfinder),
            Rule::IdleFallback => self.idle_fallback(me, room, pathfinder, rng),
            Rule::Unspecified => {
                tracing::debug!(
                    creature = %self.name,
                    archetype = ?me.archetype,
                    "No policy for archetype"
                );
                Verdict::Act(Decision::Hold)
            }
        }
    }

    fn guard_homing(&mut self, me: &Creature, room: &Room, pathfinder: &Pathfinder) -> Verdict {
        let (dx, dy) = me.displacement();
        if dx < GUARD_RANGE && dy < GUARD_RANGE {
            return Verdict::Defer;
        }
        let home = me.origin.to_tile();
        self.follow_to(home, me, room, pathfinder, CreatureState::ReturningToOrigin)
    }

    fn hostile_pursuit(&mut self, me: &Creature, room: &Room, pathfinder: &Pathfinder) -> Verdict {
        if !me.is_hostile() {
            return Verdict::Defer;
        }
        let Some(player) = closest_visible_player(me, room) else {
            return Verdict::Defer;
        };
        let seen = player.pos.to_tile();
        self.last_seen = Some(seen);

        if me.pos.to_tile().chebyshev(seen) <= MELEE_RANGE_TILES {
            self.state = CreatureState::Attacking;
            return Verdict::Act(Decision::Attack(player.id));
        }
        self.follow_to(seen, me, room, pathfinder, CreatureState::Pursuing)
    }

    fn idle_fallback<R: Rng>(
        &mut self,
        me: &Creature,
        room: &Room,
        pathfinder: &Pathfinder,
        rng: &mut R,
    ) -> Verdict {
        if self.path.is_some() {
            return self.step_path(me, room, pathfinder);
        }

        let dir = DIRECTIONS[rng.gen_range(0..DIRECTIONS.len())];
        let to = me.pos.to_tile().offset(dir.dx, dir.dy);
        if pathfinder.is_walkable(to) && room.creature_at(to, &me.name).is_none() {
            tracing::debug!(creature = %self.name, direction = dir.name, "Wandering");
            self.state = CreatureState::Wandering;
            Verdict::Act(Decision::Walk(to.to_world()))
        } else {
            Verdict::Defer
        }
    }

    /// Keep the cached path if it already ends at `goal`, otherwise plan a
    /// new one, then take one step. Defers when `goal` is unreachable.
    fn follow_to(
        &mut self,
        goal: TilePos,
        me: &Creature,
        room: &Room,
        pathfinder: &Pathfinder,
        state: CreatureState,
    ) -> Verdict {
        let cached = self.path.as_ref().and_then(Path::destination) == Some(goal);
        if !cached {
            self.path = pathfinder.find_path(me.pos.to_tile(), goal);
        }
        if self.path.is_none() {
            return Verdict::Defer;
        }
        self.state = state;
        self.step_path(me, room, pathfinder)
    }

    /// Advance the cached path by one cell.
    fn step_path(&mut self, me: &Creature, room: &Room, pathfinder: &Pathfinder) -> Verdict {
        let Some(next) = self.path.as_mut().and_then(Path::advance) else {
            self.path = None;
            return Verdict::Defer;
        };
        if !pathfinder.is_walkable(next) || room.creature_at(next, &me.name).is_some() {
            tracing::debug!(creature = %self.name, ?next, "Path blocked, dropping it");
            self.path = None;
            return Verdict::Act(Decision::Hold);
        }
        Verdict::Act(Decision::Walk(next.to_world()))
    }
}

/// Closest player inside the sight cutoff square that this creature can
/// actually see. Downed players are ignored.
pub fn closest_visible_player<'a>(me: &Creature, room: &'a Room) -> Option<&'a Player> {
    let mut best: Option<(&Player, i64)> = None;
    for player in room.players.values() {
        if player.is_down() {
            continue;
        }
        if (player.pos.x - me.pos.x).abs() > SIGHT_CUTOFF
            || (player.pos.y - me.pos.y).abs() > SIGHT_CUTOFF
        {
            continue;
        }
        let dist = me.pos.distance_sq(player.pos);
        if best.is_some_and(|(_, d)| dist >= d) {
            continue;
        }
        if can_see(me.pos, player.pos, room) {
            best = Some((player, dist));
        }
    }
    best.map(|(p, _)| p)
}
