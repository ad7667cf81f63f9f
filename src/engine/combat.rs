use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};

use crate::metrics;

use super::body::{Body, CombatRatings, PoolDamage, PoolPercentages, Pools, Weapon, WeaponKind};
use super::config::*;
use super::effect::{Effect, EffectKind, EffectTag};
use super::geometry::WorldPos;

/// Anything that can attack or be attacked.
pub trait Combatant {
    fn name(&self) -> &str;
    fn position(&self) -> WorldPos;
    fn pools(&self) -> &Pools;
    fn pools_mut(&mut self) -> &mut Pools;
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn ratings(&self) -> &CombatRatings;
    fn weapon(&self) -> &Weapon;
}

/// Tunable combat rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CombatPolicy {
    /// A successful parry strikes back at the attacker's blood and stamina.
    #[serde(default)]
    pub parry_counter: bool,
}

/// Why an attack did no damage. Serialized as its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deflection {
    Miss = 0,
    Block = 1,
    Parry = 2,
}

impl Serialize for Deflection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// A struck part and the effects the hit attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartHit {
    #[serde(rename = "p")]
    pub part: usize,
    #[serde(rename = "e")]
    pub effects: Vec<EffectTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageReport {
    #[serde(rename = "p")]
    pub parts: Vec<PartHit>,
    /// Defender pools after the hit, in percent.
    #[serde(rename = "s")]
    pub pools: PoolPercentages,
    #[serde(rename = "e")]
    pub body_effects: Vec<EffectTag>,
    #[serde(skip)]
    pub damage: PoolDamage,
}

/// Exactly one of: deflected (miss/block/parry) or damaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttackOutcome {
    Deflected { d: Deflection },
    Damaged(DamageReport),
}

impl AttackOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AttackOutcome::Deflected { d: Deflection::Miss } => "miss",
            AttackOutcome::Deflected { d: Deflection::Block } => "block",
            AttackOutcome::Deflected { d: Deflection::Parry } => "parry",
            AttackOutcome::Damaged(_) => "hit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackResult {
    #[serde(rename = "t")]
    pub target: String,
    #[serde(flatten)]
    pub outcome: AttackOutcome,
    /// Damage a parry dealt back to the attacker, if the policy allows it.
    #[serde(skip)]
    pub counter: Option<PoolDamage>,
}

/// Resolves one attack between two combatants.
///
/// Stages short-circuit in order: hit check, block, parry, damage. The
/// resolver only mutates pools, part condition and effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver {
    policy: CombatPolicy,
}

impl CombatResolver {
    pub fn new(policy: CombatPolicy) -> Self {
        CombatResolver { policy }
    }

    pub fn policy(&self) -> CombatPolicy {
        self.policy
    }

    /// Percent chance to land a blow. Accuracy is scaled by the attacker's
    /// consciousness so a dazed fighter swings wild.
    pub fn hit_chance<A, D>(attacker: &A, defender: &D) -> i32
    where
        A: Combatant + ?Sized,
        D: Combatant + ?Sized,
    {
        let effective =
            attacker.ratings().accuracy * attacker.pools().consciousness() / POOL_MAX;
        (BASE_HIT_CHANCE + effective - defender.ratings().evasion)
            .clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE)
    }

    pub fn block_chance<A, D>(attacker: &A, defender: &D) -> i32
    where
        A: Combatant + ?Sized,
        D: Combatant + ?Sized,
    {
        (defender.ratings().block - attacker.ratings().accuracy / 4).clamp(0, MAX_BLOCK_CHANCE)
    }

    pub fn parry_chance<A, D>(attacker: &A, defender: &D) -> i32
    where
        A: Combatant + ?Sized,
        D: Combatant + ?Sized,
    {
        (defender.ratings().parry - attacker.ratings().accuracy / 4).clamp(0, MAX_PARRY_CHANCE)
    }

    pub fn resolve<A, D, R>(&self, attacker: &mut A, defender: &mut D, rng: &mut R) -> AttackResult
    where
        A: Combatant + ?Sized,
        D: Combatant + ?Sized,
        R: Rng,
    {
        let target = defender.name().to_string();
        let mut counter = None;

        let outcome = if !roll(rng, Self::hit_chance(attacker, defender)) {
            AttackOutcome::Deflected { d: Deflection::Miss }
        } else if roll(rng, Self::block_chance(attacker, defender)) {
            AttackOutcome::Deflected { d: Deflection::Block }
        } else if roll(rng, Self::parry_chance(attacker, defender)) {
            if self.policy.parry_counter {
                let amount = defender.ratings().strength / PARRY_COUNTER_DIVISOR;
                let hit = PoolDamage {
                    blood: amount,
                    consciousness: 0,
                    stamina: amount,
                };
                attacker.pools_mut().apply_damage(&hit);
                counter = Some(hit);
            }
            AttackOutcome::Deflected { d: Deflection::Parry }
        } else {
            AttackOutcome::Damaged(Self::apply_hit(attacker, defender, rng))
        };

        metrics::ATTACK_OUTCOMES_TOTAL
            .with_label_values(&[outcome.label()])
            .inc();
        tracing::debug!(
            attacker = attacker.name(),
            defender = %target,
            outcome = outcome.label(),
            "Attack resolved"
        );

        AttackResult {
            target,
            outcome,
            counter,
        }
    }

    /// Damage stage: pick a part, roll and scale damage, split it across
    /// pools and attach effects.
    fn apply_hit<A, D, R>(attacker: &A, defender: &mut D, rng: &mut R) -> DamageReport
    where
        A: Combatant + ?Sized,
        D: Combatant + ?Sized,
        R: Rng,
    {
        let weapon = *attacker.weapon();
        let part_idx = pick_part(defender.body(), rng);

        let base = weapon.kind.base_damage();
        let raw = base + attacker.ratings().strength / 4 + rng.gen_range(0..=base);
        let armor = part_idx
            .map(|i| defender.body().parts[i].armor.hardness())
            .unwrap_or(0);
        let dealt = (raw * (10 + weapon.material.hardness() - armor) / 10).max(1);

        let vital = part_idx.is_some_and(|i| defender.body().parts[i].vital);
        let mut split = weapon.kind.split(dealt);
        if vital {
            split.consciousness *= 2;
        }
        defender.pools_mut().apply_damage(&split);

        let effect_chance = (dealt * 4).min(MAX_EFFECT_CHANCE);
        let mut part_effects = Vec::new();
        let mut body_effects = Vec::new();

        if let Some(i) = part_idx {
            let part = &mut defender.body_mut().parts[i];
            part.wound(dealt);
            if roll(rng, effect_chance) {
                let kind = if weapon.kind.cuts() {
                    EffectKind::Bleeding
                } else {
                    EffectKind::Bruised
                };
                let effect = Effect::new(kind, 3, (dealt / 4).max(1));
                part_effects.push(effect.tag());
                part.effects.push(effect);
            }
        }
        if vital && roll(rng, effect_chance) {
            body_effects.push(Effect::new(EffectKind::Concussed, 2, (dealt / 3).max(1)));
        } else if !vital && weapon.kind == WeaponKind::Blunt && roll(rng, effect_chance / 2) {
            body_effects.push(Effect::new(EffectKind::Winded, 1, (dealt / 2).max(1)));
        }
        let body_tags = body_effects.iter().map(Effect::tag).collect();
        defender.body_mut().effects.extend(body_effects);

        DamageReport {
            parts: part_idx
                .map(|part| {
                    vec![PartHit {
                        part,
                        effects: part_effects,
                    }]
                })
                .unwrap_or_default(),
            pools: defender.pools().percentages(),
            body_effects: body_tags,
            damage: split,
        }
    }
}

fn roll<R: Rng>(rng: &mut R, chance: i32) -> bool {
    rng.gen_range(0..100) < chance
}

/// Weighted by exposure. None for a body with no parts or no exposure.
fn pick_part<R: Rng>(body: &Body, rng: &mut R) -> Option<usize> {
    let dist = WeightedIndex::new(body.parts.iter().map(|p| p.exposure)).ok()?;
    Some(dist.sample(rng))
}
