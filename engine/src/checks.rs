use crate::bonus::{Ability, Skill};
use crate::combat::Combatant;
use crate::dice::{self, DiceResult, DiceSpec, RandomSource, RollStrategy};
use crate::error::RulesResult;

/// Result of a contested check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestOutcome {
    AttackerWins,
    DefenderWins,
    TieDefender,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestRolls {
    pub attacker: DiceResult,
    pub defender: DiceResult,
    pub outcome: ContestOutcome,
}

/// Roll contested d20 + mod; ties go to defender.
pub fn contested_check(
    source: &mut impl RandomSource,
    att_mod: i32,
    att_strategy: RollStrategy,
    def_mod: i32,
    def_strategy: RollStrategy,
) -> RulesResult<ContestRolls> {
    let attacker = dice::roll(DiceSpec::d20(att_mod), att_strategy, source)?;
    let defender = dice::roll(DiceSpec::d20(def_mod), def_strategy, source)?;
    let outcome = if attacker.total > defender.total {
        ContestOutcome::AttackerWins
    } else if attacker.total == defender.total {
        ContestOutcome::TieDefender
    } else {
        ContestOutcome::DefenderWins
    };
    Ok(ContestRolls {
        attacker,
        defender,
        outcome,
    })
}

/// Defender's better escape skill.
pub fn best_escape_skill(defender: &Combatant) -> RulesResult<(Skill, i32)> {
    let athletics = defender.skill_mod(Skill::Athletics)?;
    let acrobatics = defender.skill_mod(Skill::Acrobatics)?;
    if acrobatics > athletics {
        Ok((Skill::Acrobatics, acrobatics))
    } else {
        Ok((Skill::Athletics, athletics))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub ability: Ability,
    pub dc: i32,
    pub roll: Option<DiceResult>,
    pub total: i32,
    pub success: bool,
    /// Failed without rolling (e.g. a paralyzed creature's DEX save).
    pub auto_fail: bool,
}

/// Saving throw honoring the combatant's proficiency and conditions.
pub fn saving_throw(
    combatant: &Combatant,
    ability: Ability,
    dc: i32,
    source: &mut impl RandomSource,
) -> RulesResult<SaveResult> {
    if combatant.conditions.auto_fails_save(ability) {
        return Ok(SaveResult {
            ability,
            dc,
            roll: None,
            total: 0,
            success: false,
            auto_fail: true,
        });
    }
    let modifier = combatant.save_mod(ability)?;
    let strategy = combatant.conditions.save_strategy(ability);
    let roll = dice::roll(DiceSpec::d20(modifier), strategy, source)?;
    let total = roll.total;
    Ok(SaveResult {
        ability,
        dc,
        roll: Some(roll),
        total,
        success: total >= dc,
        auto_fail: false,
    })
}

/// Skill check vs a DC. Conditions that hurt attack rolls (poisoned,
/// frightened) hurt ability checks too.
pub fn skill_check(
    combatant: &Combatant,
    skill: Skill,
    dc: i32,
    source: &mut impl RandomSource,
) -> RulesResult<dice::CheckResult> {
    let modifier = combatant.skill_mod(skill)?;
    let strategy = check_strategy(combatant);
    dice::check(
        source,
        dice::CheckInput {
            dc,
            modifier,
            strategy,
        },
    )
}

pub(crate) fn check_strategy(combatant: &Combatant) -> RollStrategy {
    use crate::conditions::ConditionKind::*;
    if combatant.conditions.has(Poisoned) || combatant.conditions.has(Frightened) {
        RollStrategy::DISADVANTAGE
    } else {
        RollStrategy::Normal
    }
}
