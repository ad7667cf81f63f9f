use serde::{Deserialize, Serialize};

use super::body::{Body, Pool, Pools};

/// Status effect kinds. Each drains (or restores) pools once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Bleeding,
    Bruised,
    Concussed,
    Winded,
    Poisoned,
    Regenerating,
}

/// A standing effect attached to a body or a body part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    #[serde(rename = "turns")]
    pub turns_remaining: u32,
    pub magnitude: i32,
}

/// Compact form of an effect for attack packages: `{"i": kind, "t": turns}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectTag {
    pub i: EffectKind,
    pub t: u32,
}

impl Effect {
    pub fn new(kind: EffectKind, turns: u32, magnitude: i32) -> Self {
        Effect {
            kind,
            turns_remaining: turns,
            magnitude,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.turns_remaining == 0
    }

    pub fn tag(&self) -> EffectTag {
        EffectTag {
            i: self.kind,
            t: self.turns_remaining,
        }
    }

    /// Apply one turn of this effect to the pools.
    fn apply(&self, pools: &mut Pools) {
        let m = self.magnitude.max(0);
        match self.kind {
            EffectKind::Bleeding => {
                pools.drain(Pool::Blood, m);
            }
            EffectKind::Bruised | EffectKind::Winded => {
                pools.drain(Pool::Stamina, m);
            }
            EffectKind::Concussed => {
                pools.drain(Pool::Consciousness, m);
            }
            EffectKind::Poisoned => {
                pools.drain(Pool::Blood, m);
                pools.drain(Pool::Consciousness, m / 2);
            }
            EffectKind::Regenerating => {
                pools.restore(Pool::Blood, m);
            }
        }
    }
}

/// What one effect pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectOutcome {
    pub applied: usize,
    pub expired: usize,
    /// Blood reached zero during the pass; remaining effects were skipped.
    pub died: bool,
}

pub struct EffectProcessor;

impl EffectProcessor {
    /// Run one tick of effects: whole-body effects first, then each part's
    /// effects in part order. Stops as soon as blood reaches zero.
    pub fn process(pools: &mut Pools, body: &mut Body) -> EffectOutcome {
        let mut outcome = EffectOutcome::default();
        if Self::run_list(pools, &mut body.effects, &mut outcome) {
            return outcome;
        }
        for part in body.parts.iter_mut() {
            if Self::run_list(pools, &mut part.effects, &mut outcome) {
                return outcome;
            }
        }
        outcome
    }

    /// Returns true if the holder bled out.
    fn run_list(pools: &mut Pools, effects: &mut Vec<Effect>, outcome: &mut EffectOutcome) -> bool {
        let mut i = 0;
        while i < effects.len() {
            let effect = &mut effects[i];
            if !effect.is_expired() {
                effect.apply(pools);
                effect.turns_remaining -= 1;
                outcome.applied += 1;
            }
            if effect.is_expired() {
                effects.remove(i);
                outcome.expired += 1;
            } else {
                i += 1;
            }
            if pools.is_bled_out() {
                outcome.died = true;
                return true;
            }
        }
        false
    }

    /// Full cure: drop every effect on the body and its parts.
    pub fn clear_all(body: &mut Body) {
        body.effects.clear();
        for part in body.parts.iter_mut() {
            part.effects.clear();
        }
    }
}
