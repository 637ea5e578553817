use rules5e::combat::{ActionKind, AttackProfile, CombatEvent, CombatResult, EndReason, Phase};
use rules5e::conditions::{AttackStyle, Condition};
use rules5e::life::ZeroHpPolicy;
use rules5e::{
    Ability, AbilityScores, ActionRequest, Combatant, CombatantBuilder, CombatantId,
    ConditionKind, Dice, DiceSpec, Encounter, EncounterOptions, ProficiencyLevel, RulesError,
    Side, Skill, start_encounter,
};

fn id(s: &str) -> CombatantId {
    CombatantId::from(s)
}

fn dagger() -> AttackProfile {
    AttackProfile {
        name: "Dagger".into(),
        ability: Ability::Dex,
        proficient: true,
        magic_bonus: 0,
        damage: DiceSpec::new(1, 4, 0).unwrap(),
        style: AttackStyle::Melee,
        on_hit: None,
    }
}

fn member(name: &str, side: Side, dex: i32) -> CombatantBuilder {
    CombatantBuilder::new(name, name, side)
        .max_hp(10)
        .abilities(AbilityScores {
            dex,
            ..AbilityScores::default()
        })
        .attack(dagger())
}

fn build(b: CombatantBuilder) -> Combatant {
    b.build().unwrap()
}

#[test]
fn initiative_orders_by_total_then_dex_then_roster() {
    let roster = vec![
        build(member("a", Side::Party, 14)), // 10 + 2
        build(member("b", Side::Party, 18)), // 8 + 4
        build(member("c", Side::Foes, 14)),  // 10 + 2
        build(member("d", Side::Foes, 10)),  // 15 + 0
    ];
    let mut dice = Dice::from_scripted(vec![10, 8, 10, 15]);
    let enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    assert_eq!(enc.turn_order(), &[id("d"), id("b"), id("a"), id("c")]);
    assert_eq!(enc.round(), 1);
    assert_eq!(enc.phase(), Phase::TurnActive);
    assert_eq!(enc.ready_for_action(), Some(&id("d")));
}

#[test]
fn turn_order_survives_stat_changes() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10)),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    let order = enc.turn_order().to_vec();

    enc.set_ability_score(&id("b"), Ability::Dex, 30).unwrap();
    assert_eq!(enc.turn_order(), order.as_slice());
    assert_eq!(enc.combatant(&id("b")).unwrap().ability_mod(Ability::Dex), 10);
    assert_eq!(
        enc.set_ability_score(&id("b"), Ability::Dex, 0),
        Err(RulesError::InvalidAbilityScore(0))
    );

    enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    enc.submit_action(ActionRequest::end_turn("b"), &mut dice).unwrap();
    assert_eq!(enc.round(), 2);
    assert_eq!(enc.turn_order(), order.as_slice());
}

#[test]
fn round_end_expires_conditions_and_refills_resources() {
    let roster = vec![
        build(member("a", Side::Party, 10).condition(Condition::for_rounds(ConditionKind::Poisoned, 1))),
        build(member("b", Side::Foes, 10)),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11, 1]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();

    enc.submit_action(ActionRequest::attack("a", "b", 0), &mut dice).unwrap();
    assert!(enc.combatant(&id("a")).unwrap().resources.action_used);

    enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    let out = enc.submit_action(ActionRequest::end_turn("b"), &mut dice).unwrap();

    assert!(out.events.contains(&CombatEvent::ConditionExpired {
        combatant: id("a"),
        kind: ConditionKind::Poisoned,
    }));
    assert!(out.events.contains(&CombatEvent::RoundStarted { round: 2 }));
    assert_eq!(enc.ready_for_action(), Some(&id("a")));
    let a = enc.combatant(&id("a")).unwrap();
    assert!(!a.resources.action_used);
    assert!(a.conditions.is_empty());
}

#[test]
fn incapacitated_turns_are_skipped() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10).condition(Condition::until_removed(ConditionKind::Stunned))),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();

    let out = enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    assert_eq!(
        out.events,
        vec![
            CombatEvent::TurnEnded { combatant: id("a") },
            CombatEvent::TurnStarted {
                combatant: id("b"),
                round: 1
            },
            CombatEvent::TurnEnded { combatant: id("b") },
            CombatEvent::RoundStarted { round: 2 },
            CombatEvent::TurnStarted {
                combatant: id("a"),
                round: 2
            },
        ]
    );
    assert_eq!(enc.ready_for_action(), Some(&id("a")));

    assert!(enc.remove_condition(&id("b"), ConditionKind::Stunned).unwrap());
    enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    assert_eq!(enc.ready_for_action(), Some(&id("b")));
}

/// Goblin acts first and drops the hero; the cleric keeps the party in it.
fn downed_hero(extra: &[u32]) -> (Encounter, Dice) {
    let roster = vec![
        build(member("hero", Side::Party, 10).max_hp(5)),
        build(
            member("cleric", Side::Party, 10)
                .abilities(AbilityScores {
                    wis: 16,
                    ..AbilityScores::default()
                })
                .skill(Skill::Medicine, ProficiencyLevel::Proficient),
        ),
        build(
            member("gob", Side::Foes, 14)
                .zero_hp(ZeroHpPolicy::Dies)
                .attack(AttackProfile {
                    name: "Club".into(),
                    ability: Ability::Str,
                    damage: DiceSpec::new(1, 6, 2).unwrap(),
                    ..dagger()
                }),
        ),
    ];
    // initiative: hero 5, cleric 3, goblin 18+2
    let mut script = vec![5, 3, 18, 15, 4];
    script.extend_from_slice(extra);
    let mut dice = Dice::from_scripted(script);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    assert_eq!(enc.ready_for_action(), Some(&id("gob")));

    // Club: 1d6+2, face 4 → 6 damage, 1 past zero
    let out = enc
        .submit_action(ActionRequest::attack("gob", "hero", 1), &mut dice)
        .unwrap();
    assert!(out.events.contains(&CombatEvent::DroppedToZero { combatant: id("hero") }));
    assert_eq!(enc.phase(), Phase::TurnActive);
    (enc, dice)
}

#[test]
fn dying_combatant_rolls_a_death_save_on_its_turn() {
    let (mut enc, mut dice) = downed_hero(&[1]);
    let out = enc.submit_action(ActionRequest::end_turn("gob"), &mut dice).unwrap();
    assert!(out.events.iter().any(|e| matches!(
        e,
        CombatEvent::DeathSave { combatant, failures: 2, .. } if *combatant == id("hero")
    )));
    // still dying, so the cleric is up
    assert_eq!(enc.ready_for_action(), Some(&id("cleric")));
}

#[test]
fn natural_20_death_save_gets_back_up() {
    let (mut enc, mut dice) = downed_hero(&[20]);
    enc.submit_action(ActionRequest::end_turn("gob"), &mut dice).unwrap();
    assert_eq!(enc.ready_for_action(), Some(&id("hero")));
    let hero = enc.combatant(&id("hero")).unwrap();
    assert_eq!(hero.current_hp(), 1);
    assert!(!hero.conditions.has(ConditionKind::Unconscious));
}

#[test]
fn cleric_stabilizes_then_heals() {
    // death save 9 (fail), medicine 12 + 3 + 2, heal 1d8 face 3
    let (mut enc, mut dice) = downed_hero(&[9, 12, 3]);
    enc.submit_action(ActionRequest::end_turn("gob"), &mut dice).unwrap();

    let out = enc
        .submit_action(
            ActionRequest::new("cleric", ActionKind::Stabilize { target: id("hero") }),
            &mut dice,
        )
        .unwrap();
    assert!(matches!(
        out.events.first(),
        Some(CombatEvent::StabilizeAttempt { success: true, total: 17, .. })
    ));
    assert!(!enc.combatant(&id("hero")).unwrap().health.is_dying());

    let heal = ActionRequest::new(
        "cleric",
        ActionKind::Heal {
            target: id("hero"),
            dice: DiceSpec::new(1, 8, 0).unwrap(),
        },
    )
    .using(rules5e::ActionSlot::BonusAction);
    let out = enc.submit_action(heal, &mut dice).unwrap();
    assert!(out.events.contains(&CombatEvent::ConditionRemoved {
        combatant: id("hero"),
        kind: ConditionKind::Unconscious,
    }));
    assert_eq!(enc.combatant(&id("hero")).unwrap().current_hp(), 3);

    // the action went on stabilizing
    assert_eq!(
        enc.submit_action(
            ActionRequest::new("cleric", ActionKind::Stabilize { target: id("hero") }),
            &mut dice,
        ),
        Err(RulesError::ResourceAlreadyUsed {
            actor: id("cleric"),
            resource: rules5e::combat::Resource::Action,
        })
    );
}

#[test]
fn last_foe_down_ends_combat() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10).max_hp(1).zero_hp(ZeroHpPolicy::Dies)),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11, 19, 1]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    let out = enc.submit_action(ActionRequest::attack("a", "b", 0), &mut dice).unwrap();

    assert_eq!(out.phase, Phase::CombatEnded);
    assert!(out.events.contains(&CombatEvent::Died { combatant: id("b") }));
    assert_eq!(
        enc.result(),
        Some(CombatResult {
            winner: Some(Side::Party),
            reason: EndReason::SideDefeated,
            rounds: 1,
        })
    );
    assert!(matches!(
        enc.submit_action(ActionRequest::end_turn("a"), &mut dice),
        Err(RulesError::OutOfSequenceAction {
            phase: Phase::CombatEnded,
            ..
        })
    ));
}

#[test]
fn fleeing_the_field_concedes() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10)),
    ];
    let mut dice = Dice::from_scripted(vec![5, 11]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    let out = enc
        .submit_action(ActionRequest::new("b", ActionKind::Flee), &mut dice)
        .unwrap();
    assert_eq!(out.events[0], CombatEvent::Fled { combatant: id("b") });
    assert_eq!(enc.result().and_then(|r| r.winner), Some(Side::Party));
}

#[test]
fn movement_is_budgeted_and_blocked_by_grapple() {
    let roster = vec![
        build(member("a", Side::Party, 10).speed(25)),
        build(member("b", Side::Foes, 10).condition(Condition::until_removed(ConditionKind::Grappled))),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();

    let out = enc
        .submit_action(ActionRequest::new("a", ActionKind::Move { feet: 20 }), &mut dice)
        .unwrap();
    assert_eq!(
        out.events[0],
        CombatEvent::Moved {
            combatant: id("a"),
            feet: 20,
            remaining: 5
        }
    );
    assert_eq!(
        enc.submit_action(ActionRequest::new("a", ActionKind::Move { feet: 10 }), &mut dice),
        Err(RulesError::InsufficientMovement {
            actor: id("a"),
            requested: 10,
            remaining: 5
        })
    );

    enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    assert_eq!(
        enc.submit_action(ActionRequest::new("b", ActionKind::Move { feet: 5 }), &mut dice),
        Err(RulesError::InsufficientMovement {
            actor: id("b"),
            requested: 5,
            remaining: 0
        })
    );
}

#[test]
fn round_limit_is_a_draw() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10)),
    ];
    let options = EncounterOptions {
        max_rounds: 1,
        ..EncounterOptions::default()
    };
    let mut dice = Dice::from_scripted(vec![12, 11]);
    let mut enc = start_encounter(roster, options, &mut dice).unwrap();
    enc.submit_action(ActionRequest::end_turn("a"), &mut dice).unwrap();
    let out = enc.submit_action(ActionRequest::end_turn("b"), &mut dice).unwrap();
    assert_eq!(
        out.events.last(),
        Some(&CombatEvent::CombatEnded {
            winner: None,
            reason: EndReason::RoundLimit
        })
    );
}

#[test]
fn abort_stops_everything() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10)),
    ];
    let mut dice = Dice::from_scripted(vec![12, 11]);
    let mut enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    enc.abort();
    assert_eq!(enc.phase(), Phase::CombatEnded);
    assert_eq!(enc.ready_for_action(), None);
    assert_eq!(enc.result().map(|r| r.reason), Some(EndReason::Aborted));
}

#[test]
fn roster_is_validated() {
    let dup = vec![
        build(member("a", Side::Party, 10)),
        build(member("a", Side::Foes, 10)),
    ];
    assert_eq!(
        Encounter::new(dup, EncounterOptions::default()),
        Err(RulesError::DuplicateCombatant(id("a")))
    );
    let lonely = vec![build(member("a", Side::Party, 10))];
    assert_eq!(
        Encounter::new(lonely, EncounterOptions::default()),
        Err(RulesError::EmptySide)
    );
}

#[test]
fn actions_before_initiative_are_out_of_sequence() {
    let roster = vec![
        build(member("a", Side::Party, 10)),
        build(member("b", Side::Foes, 10)),
    ];
    let mut enc = Encounter::new(roster, EncounterOptions::default()).unwrap();
    let mut dice = Dice::from_seed(1);
    assert_eq!(enc.phase(), Phase::NotStarted);
    assert!(matches!(
        enc.submit_action(ActionRequest::attack("a", "b", 0), &mut dice),
        Err(RulesError::OutOfSequenceAction {
            phase: Phase::NotStarted,
            ..
        })
    ));
    enc.start(&mut dice).unwrap();
    assert!(enc.start(&mut dice).is_err());
}
