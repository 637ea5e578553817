use serde::{Deserialize, Serialize};

use crate::conditions::{Condition, ConditionKind, ConditionTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Conscious,
    Unconscious { stable: bool },
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u8, // 0..=3
    pub failures: u8,  // 0..=3
}

/// What happens when a combatant hits 0 HP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroHpPolicy {
    /// Falls unconscious and rolls death saves (player characters).
    #[default]
    DeathSaves,
    /// Dies outright (most monsters).
    Dies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
    pub state: LifeState,
    pub death: DeathSaves,
}

impl Health {
    pub fn new(max_hp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            state: LifeState::Conscious,
            death: DeathSaves::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == LifeState::Dead
    }

    /// At 0 HP, unconscious and not yet stable.
    pub fn is_dying(&self) -> bool {
        self.hp == 0 && self.state == LifeState::Unconscious { stable: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageResult {
    /// Still standing, or took damage while already dying.
    Absorbed,
    DroppedUnconscious,
    Died,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub before: i32,
    pub after: i32,
    pub result: DamageResult,
}

/// Apply damage and handle drop-to-0 transitions.
///
/// Damage taken at 0 HP counts as a failed death save (two on a critical) and
/// undoes stabilization. Damage that overflows 0 HP by at least max HP kills
/// outright.
pub fn apply_damage(
    health: &mut Health,
    conditions: &mut ConditionTracker,
    dmg: i32,
    critical: bool,
    policy: ZeroHpPolicy,
) -> DamageOutcome {
    let before = health.hp;
    let dmg = dmg.max(0);
    if health.is_dead() {
        return DamageOutcome {
            before,
            after: before,
            result: DamageResult::Absorbed,
        };
    }

    health.hp = (health.hp - dmg).max(0);
    let after = health.hp;
    let overflow = dmg - before;

    let result = if before > 0 && after == 0 {
        if policy == ZeroHpPolicy::Dies || overflow >= health.max_hp {
            health.state = LifeState::Dead;
            DamageResult::Died
        } else {
            health.state = LifeState::Unconscious { stable: false };
            health.death = DeathSaves::default();
            conditions.add(Condition::until_removed(ConditionKind::Unconscious));
            conditions.add(Condition::until_removed(ConditionKind::Prone));
            DamageResult::DroppedUnconscious
        }
    } else if before == 0 && dmg > 0 {
        health.state = LifeState::Unconscious { stable: false };
        let add = if critical { 2 } else { 1 };
        health.death.failures = (health.death.failures + add).min(3);
        if health.death.failures >= 3 || dmg >= health.max_hp {
            health.state = LifeState::Dead;
            DamageResult::Died
        } else {
            DamageResult::Absorbed
        }
    } else {
        DamageResult::Absorbed
    };

    DamageOutcome {
        before,
        after,
        result,
    }
}

/// Healing; if at 0/unconscious, wakes and resets death saves.
/// Returns the HP actually restored.
pub fn heal(health: &mut Health, conditions: &mut ConditionTracker, amount: i32) -> i32 {
    if amount <= 0 || health.is_dead() {
        return 0;
    }
    let before = health.hp;
    health.hp = (health.hp + amount).min(health.max_hp);
    if matches!(health.state, LifeState::Unconscious { .. }) && health.hp > 0 {
        health.state = LifeState::Conscious;
        health.death = DeathSaves::default();
        conditions.remove(ConditionKind::Unconscious);
    }
    health.hp - before
}

/// Stabilize an unconscious creature at 0 HP (no more death saves).
pub fn stabilize(health: &mut Health) -> bool {
    if health.is_dying() {
        health.state = LifeState::Unconscious { stable: true };
        health.death = DeathSaves::default();
        true
    } else {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathSaveResult {
    Success,
    Failure,
    /// Natural 20: back on its feet with 1 HP.
    Revived,
    Stabilized,
    Died,
}

/// One death saving throw from the kept d20 face. Nat 20 → 1 HP and wake;
/// nat 1 → 2 failures; otherwise success at `dc` or above.
pub fn death_save(
    health: &mut Health,
    conditions: &mut ConditionTracker,
    roll: u32,
    dc: i32,
) -> DeathSaveResult {
    if roll == 20 {
        health.death = DeathSaves::default();
        health.hp = 1;
        health.state = LifeState::Conscious;
        conditions.remove(ConditionKind::Unconscious);
        return DeathSaveResult::Revived;
    }

    let success = roll != 1 && roll as i32 >= dc;
    if roll == 1 {
        health.death.failures = (health.death.failures + 2).min(3);
    } else if success {
        health.death.successes = (health.death.successes + 1).min(3);
    } else {
        health.death.failures = (health.death.failures + 1).min(3);
    }

    if health.death.failures >= 3 {
        health.state = LifeState::Dead;
        DeathSaveResult::Died
    } else if health.death.successes >= 3 {
        health.state = LifeState::Unconscious { stable: true };
        health.death = DeathSaves::default();
        DeathSaveResult::Stabilized
    } else if success {
        DeathSaveResult::Success
    } else {
        DeathSaveResult::Failure
    }
}
