use std::collections::HashMap;

use rules5e::bonus::{POINT_BUY_BUDGET, attack_bonus, proficiency_bonus};
use rules5e::{
    Ability, AbilityScores, Dice, GenerationMethod, ProficiencyLevel, RulesError, Skill,
    SkillOrSave, point_buy_cost, roll_ability_scores, total_bonus,
};

fn strong() -> AbilityScores {
    AbilityScores {
        str_: 16,
        ..AbilityScores::default()
    }
}

#[test]
fn proficient_skill_with_and_without_armor_penalty() {
    let athletics = SkillOrSave::for_skill(Skill::Athletics, ProficiencyLevel::Proficient);
    let mut penalties = HashMap::new();
    assert_eq!(total_bonus(&strong(), &athletics, 5, &penalties).unwrap(), 6);

    penalties.insert("armor".to_string(), 2);
    assert_eq!(total_bonus(&strong(), &athletics, 5, &penalties).unwrap(), 4);
}

#[test]
fn penalties_only_hit_tagged_entries() {
    let mut penalties = HashMap::new();
    penalties.insert("armor".to_string(), 2);
    let save = SkillOrSave::for_save(Ability::Str, ProficiencyLevel::Proficient);
    assert_eq!(total_bonus(&strong(), &save, 5, &penalties).unwrap(), 6);
}

#[test]
fn expertise_and_situational_bonus() {
    let scores = AbilityScores {
        dex: 14,
        ..AbilityScores::default()
    };
    let stealth = SkillOrSave::for_skill(Skill::Stealth, ProficiencyLevel::Expert).with_situational(1);
    // +2 DEX, 2 × 2 proficiency, +1 situational
    assert_eq!(total_bonus(&scores, &stealth, 1, &HashMap::new()).unwrap(), 7);
}

#[test]
fn proficiency_by_level_band() {
    let expected = [(1, 2), (4, 2), (5, 3), (8, 3), (9, 4), (13, 5), (17, 6), (20, 6)];
    for (level, pb) in expected {
        assert_eq!(proficiency_bonus(level).unwrap(), pb, "level {level}");
    }
    assert_eq!(proficiency_bonus(0), Err(RulesError::InvalidLevel(0)));
    assert_eq!(proficiency_bonus(21), Err(RulesError::InvalidLevel(21)));
}

#[test]
fn attack_bonus_adds_magic_and_proficiency() {
    assert_eq!(attack_bonus(&strong(), Ability::Str, 1, true, 0).unwrap(), 5);
    assert_eq!(attack_bonus(&strong(), Ability::Str, 1, false, 1).unwrap(), 4);
}

#[test]
fn scores_are_validated() {
    let mut scores = AbilityScores::default();
    assert_eq!(scores.set(Ability::Cha, 31), Err(RulesError::InvalidAbilityScore(31)));
    assert_eq!(scores.set(Ability::Cha, 0), Err(RulesError::InvalidAbilityScore(0)));
    scores.set(Ability::Cha, 18).unwrap();
    assert_eq!(scores.mod_of(Ability::Cha), 4);
}

#[test]
fn standard_array_spends_the_whole_point_buy_budget() {
    let scores = AbilityScores::standard_array();
    assert_eq!(scores.score(Ability::Str), 15);
    assert_eq!(scores.score(Ability::Cha), 8);
    assert_eq!(point_buy_cost(&scores).unwrap(), POINT_BUY_BUDGET);
}

#[test]
fn point_buy_prices_follow_the_table() {
    let floor = AbilityScores {
        str_: 8,
        dex: 8,
        con: 8,
        int_: 8,
        wis: 8,
        cha: 8,
    };
    assert_eq!(point_buy_cost(&floor).unwrap(), 0);
    let expensive = AbilityScores {
        str_: 20,
        dex: 16,
        ..floor
    };
    assert_eq!(point_buy_cost(&expensive).unwrap(), 30 + 12);
    let peak = AbilityScores { con: 14, ..floor };
    assert_eq!(point_buy_cost(&peak).unwrap(), 7);
}

#[test]
fn point_buy_rejects_scores_off_the_table() {
    let low = AbilityScores {
        wis: 7,
        ..AbilityScores::standard_array()
    };
    assert_eq!(point_buy_cost(&low), Err(RulesError::PointBuyOutOfRange(7)));
    let high = AbilityScores {
        str_: 21,
        ..AbilityScores::standard_array()
    };
    assert_eq!(point_buy_cost(&high), Err(RulesError::PointBuyOutOfRange(21)));
}

#[test]
fn four_d6_drops_the_lowest_die() {
    let mut dice = Dice::from_scripted(vec![
        6, 6, 6, 1, // 18
        5, 4, 3, 2, // 12
        1, 1, 1, 1, // 3
        2, 6, 2, 5, // 13: only one 2 goes
        3, 3, 4, 4, // 11
        6, 1, 6, 6, // 18
    ]);
    let scores = roll_ability_scores(GenerationMethod::FourDropLowest, &mut dice).unwrap();
    assert_eq!(
        scores,
        AbilityScores {
            str_: 18,
            dex: 12,
            con: 3,
            int_: 13,
            wis: 11,
            cha: 18,
        }
    );
}

#[test]
fn heroic_is_3d6_plus_6() {
    let mut dice = Dice::from_scripted(vec![
        1, 1, 1, // 9
        6, 6, 6, // 24
        2, 3, 4, // 15
        1, 2, 3, // 12
        5, 5, 5, // 21
        4, 4, 1, // 15
    ]);
    let scores = roll_ability_scores(GenerationMethod::Heroic, &mut dice).unwrap();
    assert_eq!(
        scores,
        AbilityScores {
            str_: 9,
            dex: 24,
            con: 15,
            int_: 12,
            wis: 21,
            cha: 15,
        }
    );
}

#[test]
fn seeded_rolls_stay_in_range() {
    for seed in 0..50 {
        let mut dice = Dice::from_seed(seed);
        let normal = roll_ability_scores(GenerationMethod::FourDropLowest, &mut dice).unwrap();
        let heroic = roll_ability_scores(GenerationMethod::Heroic, &mut dice).unwrap();
        for a in Ability::ALL {
            assert!((3..=18).contains(&normal.score(a)));
            assert!((9..=24).contains(&heroic.score(a)));
        }
    }
}
