use serde::{Deserialize, Serialize};

use super::body::{Body, CombatRatings, Pools, Weapon};
use super::combat::Combatant;
use super::geometry::WorldPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Friendly,
    Hostile,
}

/// Behavioural archetype. Only guards have a concrete policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Guard,
    Patrol,
    Meander,
}

/// A non-player creature living in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub name: String,
    pub pos: WorldPos,
    /// Home position guards return to.
    pub origin: WorldPos,
    pub disposition: Disposition,
    pub archetype: Archetype,
    #[serde(default)]
    pub pools: Pools,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub ratings: CombatRatings,
    #[serde(default)]
    pub weapon: Weapon,
}

impl Creature {
    /// A creature standing on its origin with full pools and a humanoid body.
    pub fn new(name: &str, pos: WorldPos, disposition: Disposition, archetype: Archetype) -> Self {
        Creature {
            name: name.to_string(),
            pos,
            origin: pos,
            disposition,
            archetype,
            pools: Pools::full(),
            body: Body::humanoid(),
            ratings: CombatRatings::default(),
            weapon: Weapon::default(),
        }
    }

    pub fn with_origin(mut self, origin: WorldPos) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_dead(&self) -> bool {
        self.pools.is_bled_out()
    }

    pub fn is_hostile(&self) -> bool {
        self.disposition == Disposition::Hostile
    }

    /// Absolute displacement from origin on each axis, in world units.
    pub fn displacement(&self) -> (i32, i32) {
        (
            (self.pos.x - self.origin.x).abs(),
            (self.pos.y - self.origin.y).abs(),
        )
    }
}

impl Combatant for Creature {
    fn name(&self) -> &str {
        &self.name
    }
    fn position(&self) -> WorldPos {
        self.pos
    }
    fn pools(&self) -> &Pools {
        &self.pools
    }
    fn pools_mut(&mut self) -> &mut Pools {
        &mut self.pools
    }
    fn body(&self) -> &Body {
        &self.body
    }
    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
    fn ratings(&self) -> &CombatRatings {
        &self.ratings
    }
    fn weapon(&self) -> &Weapon {
        &self.weapon
    }
}
