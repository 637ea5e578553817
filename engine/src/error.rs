use thiserror::Error;

use crate::combat::{CombatantId, Phase, Resource};

/// Every way a single rules request can be rejected.
///
/// None of these are fatal: the encounter is left exactly as it was before the
/// failed call, so the caller can re-prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid dice spec {count}d{sides}{modifier:+}: {reason}")]
    InvalidDiceSpec {
        count: u32,
        sides: u32,
        modifier: i32,
        reason: &'static str,
    },
    #[error("cannot parse dice notation '{0}'")]
    DiceNotation(String),
    #[error("unknown dice type '{0}'")]
    UnknownDiceName(String),
    #[error("unknown roll modifier '{0}'")]
    UnknownRollModifier(String),
    #[error("{resource:?} already used this turn by {actor}")]
    ResourceAlreadyUsed { actor: CombatantId, resource: Resource },
    #[error("invalid target {0}")]
    InvalidTarget(CombatantId),
    #[error("unknown combatant {0}")]
    UnknownCombatant(CombatantId),
    #[error("duplicate combatant id {0}")]
    DuplicateCombatant(CombatantId),
    #[error("an encounter needs combatants on both sides")]
    EmptySide,
    #[error("{actor} cannot act now (phase {phase:?})")]
    OutOfSequenceAction { actor: CombatantId, phase: Phase },
    #[error("{0} is incapacitated")]
    ActorIncapacitated(CombatantId),
    #[error("{actor} has {remaining} ft of movement left, {requested} ft requested")]
    InsufficientMovement {
        actor: CombatantId,
        requested: u32,
        remaining: u32,
    },
    #[error("{actor} has no attack #{index}")]
    UnknownAttack { actor: CombatantId, index: usize },
    #[error("unknown condition kind '{0}'")]
    UnknownConditionKind(String),
    #[error("ability score {0} outside 1..=30")]
    InvalidAbilityScore(i32),
    #[error("character level {0} outside 1..=20")]
    InvalidLevel(u8),
    #[error("maximum hit points must be positive, got {0}")]
    InvalidHitPoints(i32),
    #[error("point buy only prices scores within 8..=20, got {0}")]
    PointBuyOutOfRange(i32),
}

pub type RulesResult<T> = Result<T, RulesError>;
