//! Rules resolution for fifth-edition tabletop combat: dice, bonuses,
//! conditions and a turn-based encounter engine.

pub mod bonus;
pub mod checks;
pub mod combat;
pub mod conditions;
pub mod content;
pub mod dice;
pub mod error;
pub mod life;
pub mod tables;

pub use bonus::{
    Ability, AbilityScores, Attribute, GenerationMethod, ProficiencyLevel, Skill, SkillOrSave,
    ability_mod, point_buy_cost, proficiency_bonus, roll_ability_scores, total_bonus,
};
pub use combat::{
    ActionKind, ActionOutcome, ActionRequest, ActionSlot, Combatant, CombatantBuilder,
    CombatantId, CombatEvent, CombatState, Encounter, EncounterOptions, EncounterSnapshot, Phase,
    Side, start_encounter,
};
pub use conditions::{Condition, ConditionKind, ConditionTracker};
pub use dice::{CheckInput, CheckResult, Dice, DiceResult, DiceSpec, RandomSource, RollStrategy};
pub use error::{RulesError, RulesResult};
pub use tables::DiceTables;
