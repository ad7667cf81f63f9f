//! Resource pools, bodies and equipment shared by creatures and players.
use serde::{Deserialize, Serialize};

use super::config::POOL_MAX;
use super::effect::Effect;

/// One of the three parallel resource pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Blood,
    Consciousness,
    Stamina,
}

/// Blood, consciousness and stamina, each kept in [0, POOL_MAX].
///
/// Fields are private so every write goes through a clamping method;
/// no consumer can ever observe a negative pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPools")]
pub struct Pools {
    blood: i32,
    consciousness: i32,
    stamina: i32,
}

#[derive(Deserialize)]
struct RawPools {
    blood: i32,
    consciousness: i32,
    stamina: i32,
}

impl From<RawPools> for Pools {
    fn from(raw: RawPools) -> Self {
        Pools::new(raw.blood, raw.consciousness, raw.stamina)
    }
}

impl Default for Pools {
    fn default() -> Self {
        Pools::full()
    }
}

impl Pools {
    pub fn new(blood: i32, consciousness: i32, stamina: i32) -> Self {
        Pools {
            blood: blood.clamp(0, POOL_MAX),
            consciousness: consciousness.clamp(0, POOL_MAX),
            stamina: stamina.clamp(0, POOL_MAX),
        }
    }

    pub fn full() -> Self {
        Pools::new(POOL_MAX, POOL_MAX, POOL_MAX)
    }

    pub fn blood(&self) -> i32 {
        self.blood
    }

    pub fn consciousness(&self) -> i32 {
        self.consciousness
    }

    pub fn stamina(&self) -> i32 {
        self.stamina
    }

    pub fn get(&self, pool: Pool) -> i32 {
        match pool {
            Pool::Blood => self.blood,
            Pool::Consciousness => self.consciousness,
            Pool::Stamina => self.stamina,
        }
    }

    fn slot(&mut self, pool: Pool) -> &mut i32 {
        match pool {
            Pool::Blood => &mut self.blood,
            Pool::Consciousness => &mut self.consciousness,
            Pool::Stamina => &mut self.stamina,
        }
    }

    /// Change a pool by `delta`, clamping to [0, POOL_MAX].
    /// Returns the change actually applied.
    pub fn adjust(&mut self, pool: Pool, delta: i32) -> i32 {
        let slot = self.slot(pool);
        let old = *slot;
        *slot = (old.saturating_add(delta)).clamp(0, POOL_MAX);
        *slot - old
    }

    /// Remove up to `amount` from a pool. Returns how much was removed.
    pub fn drain(&mut self, pool: Pool, amount: i32) -> i32 {
        -self.adjust(pool, -amount.max(0))
    }

    pub fn restore(&mut self, pool: Pool, amount: i32) -> i32 {
        self.adjust(pool, amount.max(0))
    }

    /// Drain all three pools by a damage split.
    pub fn apply_damage(&mut self, damage: &PoolDamage) {
        self.drain(Pool::Blood, damage.blood);
        self.drain(Pool::Consciousness, damage.consciousness);
        self.drain(Pool::Stamina, damage.stamina);
    }

    pub fn is_bled_out(&self) -> bool {
        self.blood == 0
    }

    /// Pools as whole-number percentages of POOL_MAX.
    pub fn percentages(&self) -> PoolPercentages {
        let pct = |v: i32| v * 100 / POOL_MAX;
        PoolPercentages {
            consciousness: pct(self.consciousness),
            blood: pct(self.blood),
            stamina: pct(self.stamina),
        }
    }
}

/// Pool state after an attack, as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolPercentages {
    #[serde(rename = "c")]
    pub consciousness: i32,
    #[serde(rename = "b")]
    pub blood: i32,
    #[serde(rename = "s")]
    pub stamina: i32,
}

/// Damage split across the three pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolDamage {
    pub blood: i32,
    pub consciousness: i32,
    pub stamina: i32,
}

impl PoolDamage {
    pub fn total(&self) -> i32 {
        self.blood + self.consciousness + self.stamina
    }
}

/// Armour and weapon material. Harder materials hit harder and absorb more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Cloth,
    Leather,
    Wood,
    Bone,
    Bronze,
    Iron,
    Steel,
}

impl Material {
    pub fn hardness(self) -> i32 {
        match self {
            Material::Cloth => 1,
            Material::Leather => 3,
            Material::Wood => 4,
            Material::Bone => 5,
            Material::Bronze => 6,
            Material::Iron => 8,
            Material::Steel => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    /// Claws, teeth and fists.
    #[default]
    Natural,
    Blunt,
    Edged,
    Piercing,
}

impl WeaponKind {
    pub fn base_damage(self) -> i32 {
        match self {
            WeaponKind::Natural => 4,
            WeaponKind::Blunt => 8,
            WeaponKind::Edged => 9,
            WeaponKind::Piercing => 7,
        }
    }

    /// Whether a hit with this weapon opens wounds that bleed.
    pub fn cuts(self) -> bool {
        matches!(
            self,
            WeaponKind::Natural | WeaponKind::Edged | WeaponKind::Piercing
        )
    }

    /// Split `damage` across the pools. Whatever the percentages round
    /// away goes to the weapon's primary pool so the split sums to `damage`.
    pub fn split(self, damage: i32) -> PoolDamage {
        let (blood_pct, cons_pct, stam_pct) = match self {
            WeaponKind::Natural => (50, 0, 50),
            WeaponKind::Blunt => (10, 50, 40),
            WeaponKind::Edged => (70, 0, 30),
            WeaponKind::Piercing => (85, 15, 0),
        };
        let mut split = PoolDamage {
            blood: damage * blood_pct / 100,
            consciousness: damage * cons_pct / 100,
            stamina: damage * stam_pct / 100,
        };
        let rest = damage - split.total();
        match self {
            WeaponKind::Blunt => split.consciousness += rest,
            _ => split.blood += rest,
        }
        split
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    #[serde(default)]
    pub kind: WeaponKind,
    #[serde(default)]
    pub material: Material,
}

impl Weapon {
    pub fn new(kind: WeaponKind, material: Material) -> Self {
        Weapon { kind, material }
    }
}

/// Offense and defense ratings used by the combat pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRatings {
    pub accuracy: i32,
    pub evasion: i32,
    pub block: i32,
    pub parry: i32,
    pub strength: i32,
}

impl Default for CombatRatings {
    fn default() -> Self {
        CombatRatings {
            accuracy: 40,
            evasion: 20,
            block: 0,
            parry: 10,
            strength: 20,
        }
    }
}

fn full_condition() -> i32 {
    POOL_MAX
}

/// A named part of a body that can be struck and carry its own effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPart {
    pub name: String,
    /// Relative weight of this part in the struck-part roll.
    pub exposure: u32,
    /// Vital parts (heads) take double consciousness damage.
    #[serde(default)]
    pub vital: bool,
    #[serde(default)]
    pub armor: Material,
    #[serde(default = "full_condition")]
    condition: i32,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl BodyPart {
    pub fn new(name: &str, exposure: u32, vital: bool) -> Self {
        BodyPart {
            name: name.to_string(),
            exposure,
            vital,
            armor: Material::default(),
            condition: POOL_MAX,
            effects: Vec::new(),
        }
    }

    pub fn with_armor(mut self, armor: Material) -> Self {
        self.armor = armor;
        self
    }

    pub fn condition(&self) -> i32 {
        self.condition
    }

    /// Reduce the part's condition, never below zero.
    pub fn wound(&mut self, amount: i32) {
        self.condition = (self.condition - amount.max(0)).max(0);
    }
}

/// Whole-body effects plus the list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub parts: Vec<BodyPart>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Default for Body {
    fn default() -> Self {
        Body::humanoid()
    }
}

impl Body {
    pub fn humanoid() -> Self {
        Body {
            parts: vec![
                BodyPart::new("head", 10, true),
                BodyPart::new("torso", 40, false),
                BodyPart::new("left arm", 15, false),
                BodyPart::new("right arm", 15, false),
                BodyPart::new("left leg", 10, false),
                BodyPart::new("right leg", 10, false),
            ],
            effects: Vec::new(),
        }
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty() || self.parts.iter().any(|p| !p.effects.is_empty())
    }

    /// Sum of all part exposures.
    pub fn total_exposure(&self) -> u32 {
        self.parts.iter().map(|p| p.exposure).sum()
    }
}
