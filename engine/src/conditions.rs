use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bonus::Ability;
use crate::dice::RollStrategy;
use crate::error::RulesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 14] = [
        ConditionKind::Blinded,
        ConditionKind::Charmed,
        ConditionKind::Deafened,
        ConditionKind::Frightened,
        ConditionKind::Grappled,
        ConditionKind::Incapacitated,
        ConditionKind::Invisible,
        ConditionKind::Paralyzed,
        ConditionKind::Petrified,
        ConditionKind::Poisoned,
        ConditionKind::Prone,
        ConditionKind::Restrained,
        ConditionKind::Stunned,
        ConditionKind::Unconscious,
    ];

    pub fn effects(self) -> ConditionEffects {
        use ConditionKind::*;
        let none = ConditionEffects::default();
        match self {
            Charmed | Deafened => none,
            Blinded => ConditionEffects {
                grants_attack_advantage_to_others: true,
                forces_disadvantage_on_self_attacks: true,
                ..none
            },
            Frightened | Poisoned => ConditionEffects {
                forces_disadvantage_on_self_attacks: true,
                ..none
            },
            Grappled => ConditionEffects {
                immobilizes: true,
                ..none
            },
            Incapacitated => ConditionEffects {
                incapacitates: true,
                ..none
            },
            Invisible => ConditionEffects {
                grants_self_attack_advantage: true,
                imposes_disadvantage_on_attackers: true,
                ..none
            },
            Paralyzed | Unconscious => ConditionEffects {
                grants_attack_advantage_to_others: true,
                incapacitates: true,
                auto_fail_str_dex_saves: true,
                melee_hits_are_critical: true,
                immobilizes: true,
                ..none
            },
            Petrified | Stunned => ConditionEffects {
                grants_attack_advantage_to_others: true,
                incapacitates: true,
                auto_fail_str_dex_saves: true,
                immobilizes: true,
                ..none
            },
            Prone => ConditionEffects {
                grants_attack_advantage_to_others: true,
                forces_disadvantage_on_self_attacks: true,
                ..none
            },
            Restrained => ConditionEffects {
                grants_attack_advantage_to_others: true,
                forces_disadvantage_on_self_attacks: true,
                forces_save_disadvantage: true,
                immobilizes: true,
                ..none
            },
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for ConditionKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConditionKind::ALL
            .into_iter()
            .find(|k| k.to_string().to_lowercase() == wanted)
            .ok_or_else(|| RulesError::UnknownConditionKind(s.to_string()))
    }
}

/// Rule effects of a condition. Fixed per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConditionEffects {
    pub grants_attack_advantage_to_others: bool,
    pub forces_disadvantage_on_self_attacks: bool,
    /// Disadvantage on Dexterity saving throws.
    pub forces_save_disadvantage: bool,
    pub incapacitates: bool,
    pub auto_fail_str_dex_saves: bool,
    /// Any hit from a melee attacker is a critical hit.
    pub melee_hits_are_critical: bool,
    pub immobilizes: bool,
    pub grants_self_attack_advantage: bool,
    pub imposes_disadvantage_on_attackers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionDuration {
    /// Expires after this many round ends.
    Rounds(u32),
    UntilRemoved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub duration: ConditionDuration,
}

impl Condition {
    pub fn until_removed(kind: ConditionKind) -> Self {
        Self {
            kind,
            duration: ConditionDuration::UntilRemoved,
        }
    }

    pub fn for_rounds(kind: ConditionKind, rounds: u32) -> Self {
        Self {
            kind,
            duration: ConditionDuration::Rounds(rounds),
        }
    }

    pub fn effects(&self) -> ConditionEffects {
        self.kind.effects()
    }
}

/// Melee or ranged; prone targets care about the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStyle {
    #[default]
    Melee,
    Ranged,
}

/// Active conditions on one combatant, unique by kind.
///
/// Expiry only happens in [`ConditionTracker::tick_round_end`]; queries never
/// drop anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionTracker {
    active: IndexMap<ConditionKind, Condition>,
}

impl ConditionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the condition. A kind already present gets the new duration
    /// instead of a second copy. Returns true when the kind was not active.
    pub fn add(&mut self, condition: Condition) -> bool {
        self.active.insert(condition.kind, condition).is_none()
    }

    pub fn remove(&mut self, kind: ConditionKind) -> Option<Condition> {
        self.active.shift_remove(&kind)
    }

    pub fn has(&self, kind: ConditionKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn get(&self, kind: ConditionKind) -> Option<&Condition> {
        self.active.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.active.values()
    }

    pub fn kinds(&self) -> Vec<ConditionKind> {
        self.active.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    fn any(&self, f: impl Fn(ConditionEffects) -> bool) -> bool {
        self.active.values().any(|c| f(c.effects()))
    }

    pub fn incapacitated(&self) -> bool {
        self.any(|e| e.incapacitates)
    }

    pub fn immobilized(&self) -> bool {
        self.any(|e| e.immobilizes)
    }

    /// (advantage, disadvantage) sources from this combatant's own conditions.
    fn own_attack_sources(&self) -> (bool, bool) {
        (
            self.any(|e| e.grants_self_attack_advantage),
            self.any(|e| e.forces_disadvantage_on_self_attacks),
        )
    }

    /// (advantage, disadvantage) sources this combatant's conditions hand to
    /// anyone attacking it.
    fn incoming_attack_sources(&self, style: AttackStyle) -> (bool, bool) {
        let mut adv = false;
        let mut dis = false;
        for c in self.active.values() {
            let effects = c.effects();
            if c.kind == ConditionKind::Prone && style == AttackStyle::Ranged {
                dis = true;
            } else if effects.grants_attack_advantage_to_others {
                adv = true;
            }
            dis |= effects.imposes_disadvantage_on_attackers;
        }
        (adv, dis)
    }

    /// Vantage from this combatant's own conditions alone.
    pub fn effective_attack_strategy(&self) -> RollStrategy {
        let (adv, dis) = self.own_attack_sources();
        vantage(adv, dis)
    }

    pub fn save_strategy(&self, ability: Ability) -> RollStrategy {
        if ability == Ability::Dex && self.any(|e| e.forces_save_disadvantage) {
            RollStrategy::DISADVANTAGE
        } else {
            RollStrategy::Normal
        }
    }

    pub fn auto_fails_save(&self, ability: Ability) -> bool {
        matches!(ability, Ability::Str | Ability::Dex) && self.any(|e| e.auto_fail_str_dex_saves)
    }

    pub fn melee_hits_are_critical(&self) -> bool {
        self.any(|e| e.melee_hits_are_critical)
    }

    /// Counts down round-limited conditions and returns the kinds that ran out.
    pub fn tick_round_end(&mut self) -> Vec<ConditionKind> {
        let mut expired = Vec::new();
        for c in self.active.values_mut() {
            if let ConditionDuration::Rounds(n) = &mut c.duration {
                *n = n.saturating_sub(1);
                if *n == 0 {
                    expired.push(c.kind);
                }
            }
        }
        for kind in &expired {
            self.active.shift_remove(kind);
        }
        expired
    }
}

/// Net vantage for `attacker` swinging at `target`. If advantage and
/// disadvantage both apply they cancel.
pub fn attack_strategy(
    attacker: &ConditionTracker,
    target: &ConditionTracker,
    style: AttackStyle,
) -> RollStrategy {
    let (own_adv, own_dis) = attacker.own_attack_sources();
    let (in_adv, in_dis) = target.incoming_attack_sources(style);
    vantage(own_adv || in_adv, own_dis || in_dis)
}

fn vantage(advantage: bool, disadvantage: bool) -> RollStrategy {
    match (advantage, disadvantage) {
        (true, false) => RollStrategy::ADVANTAGE,
        (false, true) => RollStrategy::DISADVANTAGE,
        _ => RollStrategy::Normal,
    }
}
