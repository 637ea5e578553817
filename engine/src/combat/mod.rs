//! Turn-based encounter resolution.

pub mod actions;
pub mod combatant;
pub mod encounter;
pub mod event;
pub mod snapshot;

pub use actions::{ActionKind, ActionRequest, ActionSlot};
pub use combatant::{
    AttackProfile, Combatant, CombatantBuilder, CombatantData, CombatantId, OnHitCondition,
    Resource, SavingThrow, Side, TurnResources,
};
pub use encounter::{
    ActionOutcome, CombatResult, CombatState, Encounter, EncounterOptions, Phase, start_encounter,
};
pub use event::{AttackEvent, CombatEvent, ContestEvent, EndReason, Maneuver};
pub use snapshot::{EncounterSnapshot, SNAPSHOT_VERSION};
