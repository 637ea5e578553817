use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dice::{self, DiceSpec, RandomSource};
use crate::error::{RulesError, RulesResult};

pub const MIN_SCORE: i32 = 1;
/// Natural scores stop at 20; magic can push a score up to 30.
pub const MAX_SCORE: i32 = 30;
pub const MAX_LEVEL: u8 = 20;
pub const POINT_BUY_BUDGET: u32 = 27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ability::Str => "STR",
            Ability::Dex => "DEX",
            Ability::Con => "CON",
            Ability::Int => "INT",
            Ability::Wis => "WIS",
            Ability::Cha => "CHA",
        };
        f.write_str(name)
    }
}

/// D&D ability modifier = floor((score - 10) / 2) for integer scores.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    (score - 10).div_euclid(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub kind: Ability,
    pub score: i32,
}

impl Attribute {
    pub fn new(kind: Ability, score: i32) -> RulesResult<Self> {
        validate_score(score)?;
        Ok(Self { kind, score })
    }

    pub fn modifier(&self) -> i32 {
        ability_mod(self.score)
    }
}

fn validate_score(score: i32) -> RulesResult<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(RulesError::InvalidAbilityScore(score))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub str_: i32,
    pub dex: i32,
    pub con: i32,
    #[serde(rename = "int")]
    pub int_: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            str_: 10,
            dex: 10,
            con: 10,
            int_: 10,
            wis: 10,
            cha: 10,
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str_,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int_,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    pub fn attribute(&self, ability: Ability) -> Attribute {
        Attribute {
            kind: ability,
            score: self.score(ability),
        }
    }

    pub fn mod_of(&self, ability: Ability) -> i32 {
        ability_mod(self.score(ability))
    }

    pub fn set(&mut self, ability: Ability, score: i32) -> RulesResult<()> {
        validate_score(score)?;
        let slot = match ability {
            Ability::Str => &mut self.str_,
            Ability::Dex => &mut self.dex,
            Ability::Con => &mut self.con,
            Ability::Int => &mut self.int_,
            Ability::Wis => &mut self.wis,
            Ability::Cha => &mut self.cha,
        };
        *slot = score;
        Ok(())
    }

    pub fn validate(&self) -> RulesResult<()> {
        Ability::ALL
            .iter()
            .try_for_each(|&a| validate_score(self.score(a)))
    }

    /// 15, 14, 13, 12, 10, 8 assigned STR through CHA.
    pub fn standard_array() -> Self {
        Self {
            str_: 15,
            dex: 14,
            con: 13,
            int_: 12,
            wis: 10,
            cha: 8,
        }
    }
}

fn point_buy_price(score: i32) -> RulesResult<u32> {
    let cost = match score {
        8 => 0,
        9 => 1,
        10 => 2,
        11 => 3,
        12 => 4,
        13 => 5,
        14 => 7,
        15 => 9,
        16 => 12,
        17 => 15,
        18 => 19,
        19 => 24,
        20 => 30,
        _ => return Err(RulesError::PointBuyOutOfRange(score)),
    };
    Ok(cost)
}

/// Total point-buy cost of a set of scores. Compare against
/// [`POINT_BUY_BUDGET`]; the standard array costs exactly 27.
pub fn point_buy_cost(scores: &AbilityScores) -> RulesResult<u32> {
    Ability::ALL
        .iter()
        .map(|&a| point_buy_price(scores.score(a)))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    /// 4d6, drop the lowest die.
    FourDropLowest,
    /// 3d6 + 6.
    Heroic,
}

/// Roll one score per ability, STR through CHA.
pub fn roll_ability_scores(
    method: GenerationMethod,
    source: &mut impl RandomSource,
) -> RulesResult<AbilityScores> {
    let mut scores = AbilityScores::default();
    for ability in Ability::ALL {
        let score = match method {
            GenerationMethod::FourDropLowest => {
                let sum = dice::roll_sum(DiceSpec::new(4, 6, 0)?, 4, source)?;
                let lowest = sum.rolls.iter().copied().min().unwrap_or(0);
                sum.total - lowest as i32
            }
            GenerationMethod::Heroic => dice::roll_sum(DiceSpec::new(3, 6, 6)?, 3, source)?.total,
        };
        debug!(%ability, ?method, score, "ability rolled");
        scores.set(ability, score)?;
    }
    Ok(scores)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    #[default]
    None,
    Proficient,
    Expert,
}

impl ProficiencyLevel {
    /// Contribution for a given proficiency bonus; expertise doubles it.
    pub fn contribution(self, proficiency_bonus: i32) -> i32 {
        match self {
            ProficiencyLevel::None => 0,
            ProficiencyLevel::Proficient => proficiency_bonus,
            ProficiencyLevel::Expert => proficiency_bonus * 2,
        }
    }
}

pub fn validate_level(level: u8) -> RulesResult<()> {
    if (1..=MAX_LEVEL).contains(&level) {
        Ok(())
    } else {
        Err(RulesError::InvalidLevel(level))
    }
}

/// +2 at levels 1-4, +3 at 5-8, ... +6 at 17-20.
pub fn proficiency_bonus(level: u8) -> RulesResult<i32> {
    validate_level(level)?;
    Ok(2 + i32::from(level - 1) / 4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    pub fn ability(self) -> Ability {
        use Skill::*;
        match self {
            Athletics => Ability::Str,
            Acrobatics | SleightOfHand | Stealth => Ability::Dex,
            Arcana | History | Investigation | Nature | Religion => Ability::Int,
            AnimalHandling | Insight | Medicine | Perception | Survival => Ability::Wis,
            Deception | Intimidation | Performance | Persuasion => Ability::Cha,
        }
    }

    /// Named penalties that apply to this skill.
    pub fn penalty_tags(self) -> &'static [&'static str] {
        use Skill::*;
        match self {
            Athletics | Acrobatics | SleightOfHand | Stealth => &["armor"],
            Arcana => &["magic"],
            _ => &[],
        }
    }
}

/// One skill or saving throw, ready for bonus computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillOrSave {
    pub ability: Ability,
    pub proficiency: ProficiencyLevel,
    #[serde(default)]
    pub penalty_tags: Vec<String>,
    #[serde(default)]
    pub situational_bonus: i32,
}

impl SkillOrSave {
    pub fn for_skill(skill: Skill, proficiency: ProficiencyLevel) -> Self {
        Self {
            ability: skill.ability(),
            proficiency,
            penalty_tags: skill.penalty_tags().iter().map(|t| t.to_string()).collect(),
            situational_bonus: 0,
        }
    }

    pub fn for_save(ability: Ability, proficiency: ProficiencyLevel) -> Self {
        Self {
            ability,
            proficiency,
            penalty_tags: Vec::new(),
            situational_bonus: 0,
        }
    }

    pub fn with_situational(mut self, bonus: i32) -> Self {
        self.situational_bonus = bonus;
        self
    }
}

/// modifier + proficiency contribution + situational − matching penalties.
///
/// Penalties are looked up by tag; tags the skill does not list are ignored.
/// Magnitudes are positive numbers that get subtracted.
pub fn total_bonus(
    scores: &AbilityScores,
    entry: &SkillOrSave,
    level: u8,
    penalties: &HashMap<String, i32>,
) -> RulesResult<i32> {
    let pb = proficiency_bonus(level)?;
    let penalty: i32 = entry
        .penalty_tags
        .iter()
        .filter_map(|tag| penalties.get(tag))
        .sum();
    Ok(scores.mod_of(entry.ability) + entry.proficiency.contribution(pb) + entry.situational_bonus
        - penalty)
}

/// To-hit bonus for a weapon or spell attack.
pub fn attack_bonus(
    scores: &AbilityScores,
    ability: Ability,
    level: u8,
    proficient: bool,
    magic_bonus: i32,
) -> RulesResult<i32> {
    let pb = if proficient { proficiency_bonus(level)? } else { 0 };
    Ok(scores.mod_of(ability) + pb + magic_bonus)
}

pub fn damage_modifier(scores: &AbilityScores, ability: Ability, magic_bonus: i32) -> i32 {
    scores.mod_of(ability) + magic_bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_floors_toward_negative_infinity() {
        assert_eq!(ability_mod(1), -5);
        assert_eq!(ability_mod(3), -4);
        assert_eq!(ability_mod(30), 10);
    }

    #[test]
    fn expert_doubles_contribution() {
        assert_eq!(ProficiencyLevel::Expert.contribution(3), 6);
        assert_eq!(ProficiencyLevel::None.contribution(3), 0);
    }
}
