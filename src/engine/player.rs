use serde::{Deserialize, Serialize};

use super::body::{Body, CombatRatings, Pools, Weapon};
use super::combat::Combatant;
use super::effect::EffectProcessor;
use super::geometry::WorldPos;

/// A human-controlled participant. The AI only reads players as sight and
/// attack targets, and mutates them only through combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub pos: WorldPos,
    #[serde(default)]
    pub pools: Pools,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub ratings: CombatRatings,
    #[serde(default)]
    pub weapon: Weapon,
}

impl Player {
    pub fn new(id: u32, name: &str, pos: WorldPos) -> Self {
        Player {
            id,
            name: name.to_string(),
            pos,
            pools: Pools::full(),
            body: Body::humanoid(),
            ratings: CombatRatings::default(),
            weapon: Weapon::default(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.pools.is_bled_out()
    }

    /// Drop every standing effect. Called once a player goes down.
    pub fn clear_effects(&mut self) {
        EffectProcessor::clear_all(&mut self.body);
    }
}

impl Combatant for Player {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::effect::{Effect, EffectKind};

    #[test]
    fn test_new_player() {
        let p = Player::new(7, "alice", WorldPos::new(48, 48));
        assert_eq!(p.id, 7);
        assert!(!p.is_down());
        assert_eq!(Combatant::name(&p), "alice");
    }

    #[test]
    fn test_clear_effects_on_down() {
        let mut p = Player::new(1, "bob", WorldPos::new(0, 0));
        p.body.effects.push(Effect::new(EffectKind::Bleeding, 5, 3));
        p.body.parts[2]
            .effects
            .push(Effect::new(EffectKind::Bruised, 2, 1));
        p.clear_effects();
        assert!(!p.body.has_effects());
    }
}
