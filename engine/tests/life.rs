use rules5e::conditions::{ConditionKind, ConditionTracker};
use rules5e::life::*;

fn dying(successes: u8, failures: u8) -> Health {
    Health {
        hp: 0,
        max_hp: 10,
        state: LifeState::Unconscious { stable: false },
        death: DeathSaves {
            successes,
            failures,
        },
    }
}

#[test]
fn nat20_wakes_to_one_hp() {
    let mut h = dying(0, 0);
    let mut conds = ConditionTracker::new();
    let result = death_save(&mut h, &mut conds, 20, 10);
    assert_eq!(result, DeathSaveResult::Revived);
    assert_eq!(h.state, LifeState::Conscious);
    assert_eq!(h.hp, 1);
}

#[test]
fn nat1_counts_two_failures_and_can_kill() {
    let mut h = dying(0, 1);
    let mut conds = ConditionTracker::new();
    let result = death_save(&mut h, &mut conds, 1, 10);
    assert_eq!(result, DeathSaveResult::Died);
    assert!(matches!(h.state, LifeState::Dead));
}

#[test]
fn three_successes_stabilize() {
    let mut h = dying(2, 0);
    let mut conds = ConditionTracker::new();
    let result = death_save(&mut h, &mut conds, 10, 10);
    assert_eq!(result, DeathSaveResult::Stabilized);
    assert!(matches!(h.state, LifeState::Unconscious { stable: true }));
    assert!(!h.is_dying());
}

#[test]
fn below_dc_is_one_failure() {
    let mut h = dying(0, 0);
    let mut conds = ConditionTracker::new();
    assert_eq!(death_save(&mut h, &mut conds, 9, 10), DeathSaveResult::Failure);
    assert_eq!(h.death.failures, 1);
}

#[test]
fn healing_resets_death_saves_and_wakes() {
    let mut h = Health {
        max_hp: 12,
        ..dying(2, 2)
    };
    let mut conds = ConditionTracker::new();
    conds.add(rules5e::Condition::until_removed(ConditionKind::Unconscious));
    let healed = heal(&mut h, &mut conds, 6);
    assert_eq!(healed, 6);
    assert_eq!(h.hp, 6);
    assert_eq!(h.death, DeathSaves::default());
    assert_eq!(h.state, LifeState::Conscious);
    assert!(!conds.has(ConditionKind::Unconscious));
}

#[test]
fn healing_caps_at_max() {
    let mut h = Health::new(10);
    h.hp = 8;
    let mut conds = ConditionTracker::new();
    assert_eq!(heal(&mut h, &mut conds, 5), 2);
    assert_eq!(h.hp, 10);
}

#[test]
fn drop_to_zero_knocks_prone_and_unconscious() {
    let mut h = Health::new(10);
    let mut conds = ConditionTracker::new();
    let out = apply_damage(&mut h, &mut conds, 12, false, ZeroHpPolicy::DeathSaves);
    assert_eq!(out.result, DamageResult::DroppedUnconscious);
    assert_eq!(out.after, 0);
    assert!(conds.has(ConditionKind::Unconscious));
    assert!(conds.has(ConditionKind::Prone));
}

#[test]
fn massive_damage_kills_outright() {
    let mut h = Health::new(10);
    let mut conds = ConditionTracker::new();
    let out = apply_damage(&mut h, &mut conds, 20, false, ZeroHpPolicy::DeathSaves);
    assert_eq!(out.result, DamageResult::Died);
    assert!(h.is_dead());
}

#[test]
fn monsters_die_at_zero() {
    let mut h = Health::new(7);
    let mut conds = ConditionTracker::new();
    let out = apply_damage(&mut h, &mut conds, 7, false, ZeroHpPolicy::Dies);
    assert_eq!(out.result, DamageResult::Died);
    assert!(conds.is_empty());
}

#[test]
fn critical_while_dying_is_two_failures() {
    let mut h = dying(0, 0);
    let mut conds = ConditionTracker::new();
    let out = apply_damage(&mut h, &mut conds, 3, true, ZeroHpPolicy::DeathSaves);
    assert_eq!(out.result, DamageResult::Absorbed);
    assert_eq!(h.death.failures, 2);
}

#[test]
fn damage_breaks_stabilization() {
    let mut h = dying(0, 0);
    assert!(stabilize(&mut h));
    assert!(!h.is_dying());
    let mut conds = ConditionTracker::new();
    apply_damage(&mut h, &mut conds, 1, false, ZeroHpPolicy::DeathSaves);
    assert!(h.is_dying());
    assert_eq!(h.death.failures, 1);
}
