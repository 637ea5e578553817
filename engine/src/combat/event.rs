use std::fmt;

use serde::{Deserialize, Serialize};

use super::combatant::{CombatantId, Side};
use crate::bonus::Ability;
use crate::conditions::ConditionKind;
use crate::dice::RollStrategy;
use crate::life::DeathSaveResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    pub actor: CombatantId,
    pub target: CombatantId,
    pub attack: String,
    pub strategy: RollStrategy,
    /// Raw d20 faces in roll order.
    pub rolls: Vec<u32>,
    pub natural: u32,
    pub roll_total: i32,
    pub target_ac: i32,
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
    pub resulting_hp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maneuver {
    Grapple,
    Shove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestEvent {
    pub actor: CombatantId,
    pub target: CombatantId,
    pub maneuver: Maneuver,
    pub actor_roll: u32,
    pub actor_total: i32,
    pub target_roll: u32,
    pub target_total: i32,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    SideDefeated,
    RoundLimit,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum CombatEvent {
    InitiativeRolled {
        combatant: CombatantId,
        roll: u32,
        total: i32,
    },
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        combatant: CombatantId,
        round: u32,
    },
    TurnEnded {
        combatant: CombatantId,
    },
    Attack(AttackEvent),
    Contest(ContestEvent),
    SavingThrow {
        combatant: CombatantId,
        ability: Ability,
        dc: i32,
        roll: u32,
        total: i32,
        success: bool,
        auto_fail: bool,
    },
    ConditionAdded {
        combatant: CombatantId,
        kind: ConditionKind,
    },
    ConditionRemoved {
        combatant: CombatantId,
        kind: ConditionKind,
    },
    ConditionExpired {
        combatant: CombatantId,
        kind: ConditionKind,
    },
    DroppedToZero {
        combatant: CombatantId,
    },
    Died {
        combatant: CombatantId,
    },
    DeathSave {
        combatant: CombatantId,
        roll: u32,
        result: DeathSaveResult,
        successes: u8,
        failures: u8,
    },
    Healed {
        actor: CombatantId,
        target: CombatantId,
        amount: i32,
        resulting_hp: i32,
    },
    StabilizeAttempt {
        actor: CombatantId,
        target: CombatantId,
        roll: u32,
        total: i32,
        dc: i32,
        success: bool,
    },
    Moved {
        combatant: CombatantId,
        feet: u32,
        remaining: u32,
    },
    Fled {
        combatant: CombatantId,
    },
    CombatEnded {
        winner: Option<Side>,
        reason: EndReason,
    },
}

fn mark(ok: bool) -> &'static str {
    if ok { "✔" } else { "✖" }
}

fn format_d20_sequence(raw: &[u32], kept: u32) -> String {
    match raw {
        [] => format!("d20=? (keep={})", kept),
        [only] => format!("d20={}", only),
        [first, second] => format!("d20={} vs d20={} (keep={})", first, second, kept),
        _ => {
            let joined = raw
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("d20s=[{}] (keep={})", joined, kept)
        }
    }
}

impl fmt::Display for AttackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.critical {
            "CRIT!"
        } else if self.hit {
            "HIT"
        } else if self.natural == 1 {
            "MISS (NAT1)"
        } else {
            "MISS"
        };
        write!(
            f,
            "[ATTACK][{}] {} vs {}: {} → {} to-hit={} vs AC={} {}",
            self.actor,
            self.attack,
            self.target,
            format_d20_sequence(&self.rolls, self.natural),
            outcome,
            self.roll_total,
            self.target_ac,
            mark(self.hit)
        )?;
        if self.hit {
            write!(f, " dmg={} hp={}", self.damage, self.resulting_hp)?;
        }
        Ok(())
    }
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CombatEvent::*;
        match self {
            InitiativeRolled {
                combatant,
                roll,
                total,
            } => write!(f, "[INIT][{}] d20={} total={}", combatant, roll, total),
            RoundStarted { round } => write!(f, "[ROUND] {}", round),
            TurnStarted { combatant, round } => {
                write!(f, "[TURN][{}] round {}", combatant, round)
            }
            TurnEnded { combatant } => write!(f, "[TURN][{}] ends", combatant),
            Attack(a) => a.fmt(f),
            Contest(c) => write!(
                f,
                "[CONTEST][{}] {:?} vs {}: d20={} ({} total) vs d20={} ({} total) {}",
                c.actor,
                c.maneuver,
                c.target,
                c.actor_roll,
                c.actor_total,
                c.target_roll,
                c.target_total,
                mark(c.success)
            ),
            SavingThrow {
                combatant,
                ability,
                dc,
                roll,
                total,
                success,
                auto_fail,
            } => {
                if *auto_fail {
                    write!(f, "[SAVE][{}] {} DC {} → auto-fail ✖", combatant, ability, dc)
                } else {
                    write!(
                        f,
                        "[SAVE][{}] {} DC {}: roll={} total={} {}",
                        combatant,
                        ability,
                        dc,
                        roll,
                        total,
                        mark(*success)
                    )
                }
            }
            ConditionAdded { combatant, kind } => {
                write!(f, "[COND][{}] gains {}", combatant, kind)
            }
            ConditionRemoved { combatant, kind } => {
                write!(f, "[COND][{}] is no longer {}", combatant, kind)
            }
            ConditionExpired { combatant, kind } => {
                write!(f, "[COND][{}] {} expires", combatant, kind)
            }
            DroppedToZero { combatant } => {
                write!(f, "[STATE][{}] drops to 0 HP → Unconscious", combatant)
            }
            Died { combatant } => write!(f, "[STATE][{}] dies", combatant),
            DeathSave {
                combatant,
                roll,
                result,
                successes,
                failures,
            } => write!(
                f,
                "[DEATHSAVE][{}] roll={} → {:?} (S={}, F={})",
                combatant, roll, result, successes, failures
            ),
            Healed {
                actor,
                target,
                amount,
                resulting_hp,
            } => write!(
                f,
                "[HEAL][{}] {} +{} HP → {}",
                actor, target, amount, resulting_hp
            ),
            StabilizeAttempt {
                actor,
                target,
                roll,
                total,
                dc,
                success,
            } => write!(
                f,
                "[STABILIZE][{}] {}: roll={} total={} vs DC {} {}",
                actor,
                target,
                roll,
                total,
                dc,
                mark(*success)
            ),
            Moved {
                combatant,
                feet,
                remaining,
            } => write!(
                f,
                "[MOVE][{}] {} ft ({} ft left)",
                combatant, feet, remaining
            ),
            Fled { combatant } => write!(f, "[FLEE][{}] leaves the fight", combatant),
            CombatEnded { winner, reason } => match winner {
                Some(side) => write!(f, "[END] winner={:?} ({:?})", side, reason),
                None => write!(f, "[END] draw ({:?})", reason),
            },
        }
    }
}
