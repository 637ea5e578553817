use rules5e::conditions::{
    AttackStyle, Condition, ConditionDuration, ConditionKind, ConditionTracker, attack_strategy,
};
use rules5e::{Ability, RollStrategy, RulesError};

fn with(kinds: &[ConditionKind]) -> ConditionTracker {
    let mut t = ConditionTracker::new();
    for &k in kinds {
        t.add(Condition::until_removed(k));
    }
    t
}

#[test]
fn poisoned_gives_attacker_disadvantage() {
    let attacker = with(&[ConditionKind::Poisoned]);
    let target = ConditionTracker::new();
    assert_eq!(
        attack_strategy(&attacker, &target, AttackStyle::Melee),
        RollStrategy::DISADVANTAGE
    );
    assert_eq!(attacker.effective_attack_strategy(), RollStrategy::DISADVANTAGE);
}

#[test]
fn prone_interactions_melee_and_ranged() {
    let attacker = ConditionTracker::new();
    let target = with(&[ConditionKind::Prone]);
    assert_eq!(
        attack_strategy(&attacker, &target, AttackStyle::Melee),
        RollStrategy::ADVANTAGE
    );
    assert_eq!(
        attack_strategy(&attacker, &target, AttackStyle::Ranged),
        RollStrategy::DISADVANTAGE
    );
}

#[test]
fn advantage_and_disadvantage_cancel_regardless_of_count() {
    let attacker = with(&[ConditionKind::Poisoned, ConditionKind::Frightened]);
    let target = with(&[ConditionKind::Restrained]);
    assert_eq!(
        attack_strategy(&attacker, &target, AttackStyle::Melee),
        RollStrategy::Normal
    );
}

#[test]
fn invisible_attacker_and_target() {
    let hidden = with(&[ConditionKind::Invisible]);
    let plain = ConditionTracker::new();
    assert_eq!(
        attack_strategy(&hidden, &plain, AttackStyle::Ranged),
        RollStrategy::ADVANTAGE
    );
    assert_eq!(
        attack_strategy(&plain, &hidden, AttackStyle::Melee),
        RollStrategy::DISADVANTAGE
    );
}

#[test]
fn restrained_dex_saves_at_disadvantage() {
    let t = with(&[ConditionKind::Restrained]);
    assert_eq!(t.save_strategy(Ability::Dex), RollStrategy::DISADVANTAGE);
    assert_eq!(t.save_strategy(Ability::Wis), RollStrategy::Normal);
    assert!(t.immobilized());
    assert!(!t.incapacitated());
}

#[test]
fn paralyzed_auto_fails_str_and_dex() {
    let t = with(&[ConditionKind::Paralyzed]);
    assert!(t.auto_fails_save(Ability::Str));
    assert!(t.auto_fails_save(Ability::Dex));
    assert!(!t.auto_fails_save(Ability::Con));
    assert!(t.incapacitated());
    assert!(t.melee_hits_are_critical());
}

#[test]
fn adding_twice_refreshes_duration() {
    let mut t = ConditionTracker::new();
    assert!(t.add(Condition::for_rounds(ConditionKind::Poisoned, 1)));
    assert!(!t.add(Condition::for_rounds(ConditionKind::Poisoned, 3)));
    assert_eq!(t.kinds(), vec![ConditionKind::Poisoned]);
    assert_eq!(
        t.get(ConditionKind::Poisoned).map(|c| c.duration),
        Some(ConditionDuration::Rounds(3))
    );
}

#[test]
fn round_end_expires_timed_conditions_only() {
    let mut t = ConditionTracker::new();
    t.add(Condition::for_rounds(ConditionKind::Frightened, 2));
    t.add(Condition::until_removed(ConditionKind::Prone));

    assert!(t.tick_round_end().is_empty());
    assert!(t.has(ConditionKind::Frightened));

    assert_eq!(t.tick_round_end(), vec![ConditionKind::Frightened]);
    assert!(!t.has(ConditionKind::Frightened));
    assert!(t.has(ConditionKind::Prone));
}

#[test]
fn parse_condition_names() {
    assert_eq!("prone".parse::<ConditionKind>(), Ok(ConditionKind::Prone));
    assert_eq!(" Stunned ".parse::<ConditionKind>(), Ok(ConditionKind::Stunned));
    assert_eq!(
        "dazed".parse::<ConditionKind>(),
        Err(RulesError::UnknownConditionKind("dazed".into()))
    );
}
