use rules5e::combat::{AttackProfile, CombatEvent};
use rules5e::conditions::AttackStyle;
use rules5e::content::builtin_combatant;
use rules5e::life::LifeState;
use rules5e::{
    Ability, AbilityScores, ActionRequest, ActionSlot, CombatantBuilder, Condition,
    ConditionKind, Dice, DiceSpec, Encounter, EncounterOptions, EncounterSnapshot, Side,
    start_encounter,
};

fn skirmish(seed: u64) -> (Encounter, Dice) {
    let roster = vec![
        builtin_combatant("fighter", "hero").unwrap(),
        builtin_combatant("goblin", "gob-1").unwrap(),
        builtin_combatant("skeleton", "skel").unwrap(),
    ];
    let mut dice = Dice::from_seed(seed);
    let enc = start_encounter(roster, EncounterOptions::default(), &mut dice).unwrap();
    (enc, dice)
}

#[test]
fn json_round_trip_preserves_state() {
    let (enc, _) = skirmish(7);
    let json = enc.snapshot().to_json().unwrap();
    let back = EncounterSnapshot::from_json(&json).unwrap();
    assert_eq!(back, enc.snapshot());
    assert_eq!(Encounter::restore(back), enc);
}

#[test]
fn restored_encounter_resolves_identically() {
    let (mut original, dice) = skirmish(11);
    let json = original.snapshot().to_json().unwrap();
    let mut restored = Encounter::restore(EncounterSnapshot::from_json(&json).unwrap());

    let mut dice_a = dice.clone();
    let mut dice_b = dice;
    let actor = original.ready_for_action().cloned().unwrap();
    let target = if actor.0 == "hero" { "skel" } else { "hero" };

    let a = original
        .submit_action(ActionRequest::attack(actor.clone(), target, 0), &mut dice_a)
        .unwrap();
    let b = restored
        .submit_action(ActionRequest::attack(actor, target, 0), &mut dice_b)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(original, restored);
}

fn club() -> AttackProfile {
    AttackProfile {
        name: "Club".into(),
        ability: Ability::Str,
        proficient: true,
        magic_bonus: 0,
        damage: DiceSpec::new(1, 8, 0).unwrap(),
        style: AttackStyle::Melee,
        on_hit: None,
    }
}

/// Round 2, hero's turn: hero's action spent, goblin prone for 3 rounds,
/// squire dying with one failed death save.
fn mid_round() -> (Encounter, Dice) {
    let hero = CombatantBuilder::new("hero", "Hero", Side::Party)
        .max_hp(20)
        .abilities(AbilityScores {
            str_: 16,
            dex: 14,
            ..AbilityScores::default()
        })
        .attack(club())
        .build()
        .unwrap();
    let squire = CombatantBuilder::new("squire", "Squire", Side::Party)
        .max_hp(4)
        .attack(club())
        .build()
        .unwrap();
    let gob = CombatantBuilder::new("gob", "Goblin", Side::Foes)
        .max_hp(30)
        .attack(club())
        .build()
        .unwrap();

    let mut dice = Dice::from_scripted(vec![
        18, 2, 10, // initiative in roster order: hero, squire, goblin
        15, 6, // hero hits goblin for 9
        15, 4, // goblin's reaction drops the squire
        5,  // squire's death save fails
        15, 6, // round 2: hero hits goblin for 9
        12, 7, 4, // bonus attack with advantage on the prone goblin
    ]);
    let mut enc =
        start_encounter(vec![hero, squire, gob], EncounterOptions::default(), &mut dice).unwrap();

    enc.submit_action(ActionRequest::attack("hero", "gob", 0), &mut dice)
        .unwrap();
    enc.submit_action(
        ActionRequest::attack("gob", "squire", 0).using(ActionSlot::Reaction),
        &mut dice,
    )
    .unwrap();
    enc.submit_action(ActionRequest::end_turn("hero"), &mut dice)
        .unwrap();
    enc.submit_action(ActionRequest::end_turn("gob"), &mut dice)
        .unwrap();
    assert_eq!(enc.round(), 2);
    assert_eq!(enc.ready_for_action().map(|id| id.0.as_str()), Some("hero"));

    enc.submit_action(ActionRequest::attack("hero", "gob", 0), &mut dice)
        .unwrap();
    enc.add_condition(&"gob".into(), Condition::for_rounds(ConditionKind::Prone, 3))
        .unwrap();
    (enc, dice)
}

#[test]
fn mid_round_state_survives_json() {
    let (enc, _) = mid_round();
    let hero = enc.combatant(&"hero".into()).unwrap();
    assert!(hero.resources.action_used);
    assert!(!hero.resources.bonus_action_used);
    let squire = enc.combatant(&"squire".into()).unwrap();
    assert_eq!(squire.health.state, LifeState::Unconscious { stable: false });
    assert_eq!(squire.health.death.failures, 1);
    let gob = enc.combatant(&"gob".into()).unwrap();
    assert_eq!(gob.current_hp(), 12);
    assert!(gob.conditions.has(ConditionKind::Prone));
    assert!(
        enc.current_state()
            .log
            .iter()
            .any(|e| matches!(e, CombatEvent::Attack(a) if a.hit))
    );

    let json = enc.snapshot().to_json().unwrap();
    let back = EncounterSnapshot::from_json(&json).unwrap();
    assert_eq!(back, enc.snapshot());
    assert_eq!(Encounter::restore(back), enc);
}

#[test]
fn mid_round_restore_resolves_the_next_action_identically() {
    let (mut original, dice) = mid_round();
    let json = original.snapshot().to_json().unwrap();
    let mut restored = Encounter::restore(EncounterSnapshot::from_json(&json).unwrap());

    let mut dice_a = dice.clone();
    let mut dice_b = dice;
    let bonus = || ActionRequest::attack("hero", "gob", 0).using(ActionSlot::BonusAction);
    let a = original.submit_action(bonus(), &mut dice_a).unwrap();
    let b = restored.submit_action(bonus(), &mut dice_b).unwrap();
    assert_eq!(a, b);
    assert_eq!(original, restored);

    match a.primary() {
        Some(CombatEvent::Attack(hit)) => {
            assert_eq!(hit.rolls, vec![12, 7]);
            assert!(hit.hit);
            assert_eq!(hit.resulting_hp, 5);
        }
        other => panic!("expected an attack, got {other:?}"),
    }
}

#[test]
fn unknown_version_is_rejected() {
    let (enc, _) = skirmish(3);
    let mut snap = enc.snapshot();
    snap.version = 99;
    let json = serde_json::to_string(&snap).unwrap();
    let err = EncounterSnapshot::from_json(&json).unwrap_err();
    assert!(err.to_string().contains("version 99"));
}

#[test]
fn garbage_is_an_error() {
    assert!(EncounterSnapshot::from_json("{\"version\": 1}").is_err());
}
