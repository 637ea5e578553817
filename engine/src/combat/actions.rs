use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combatant::{Combatant, CombatantId, Resource};
use super::event::{AttackEvent, CombatEvent, ContestEvent, Maneuver};
use crate::bonus::Skill;
use crate::checks::{self, ContestOutcome, SaveResult, best_escape_skill, contested_check};
use crate::conditions::{self, AttackStyle, Condition, ConditionKind, ConditionTracker};
use crate::dice::{self, DiceSpec, RandomSource, RollStrategy};
use crate::error::RulesResult;
use crate::life::{self, DamageResult};

/// Which part of the action economy a request spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSlot {
    #[default]
    Action,
    BonusAction,
    Reaction,
}

impl From<ActionSlot> for Resource {
    fn from(slot: ActionSlot) -> Self {
        match slot {
            ActionSlot::Action => Resource::Action,
            ActionSlot::BonusAction => Resource::BonusAction,
            ActionSlot::Reaction => Resource::Reaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ActionKind {
    /// `attack` indexes the actor's attack list.
    Attack { target: CombatantId, attack: usize },
    Grapple { target: CombatantId },
    Shove { target: CombatantId },
    Heal { target: CombatantId, dice: DiceSpec },
    /// Wisdom (Medicine) check on a dying creature.
    Stabilize { target: CombatantId },
    Move { feet: u32 },
    Flee,
    EndTurn,
}

impl ActionKind {
    pub fn target(&self) -> Option<&CombatantId> {
        match self {
            ActionKind::Attack { target, .. }
            | ActionKind::Grapple { target }
            | ActionKind::Shove { target }
            | ActionKind::Heal { target, .. }
            | ActionKind::Stabilize { target } => Some(target),
            ActionKind::Move { .. } | ActionKind::Flee | ActionKind::EndTurn => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub actor: CombatantId,
    pub kind: ActionKind,
    #[serde(default)]
    pub slot: ActionSlot,
}

impl ActionRequest {
    pub fn new(actor: impl Into<CombatantId>, kind: ActionKind) -> Self {
        Self {
            actor: actor.into(),
            kind,
            slot: ActionSlot::Action,
        }
    }

    pub fn attack(
        actor: impl Into<CombatantId>,
        target: impl Into<CombatantId>,
        attack: usize,
    ) -> Self {
        Self::new(
            actor,
            ActionKind::Attack {
                target: target.into(),
                attack,
            },
        )
    }

    pub fn end_turn(actor: impl Into<CombatantId>) -> Self {
        Self::new(actor, ActionKind::EndTurn)
    }

    pub fn using(mut self, slot: ActionSlot) -> Self {
        self.slot = slot;
        self
    }

    /// The resource this request consumes; `None` for ending the turn.
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            ActionKind::EndTurn => None,
            ActionKind::Move { .. } => Some(Resource::Movement),
            _ => Some(self.slot.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OnHitPlan {
    condition: Condition,
    save: Option<SaveResult>,
}

/// Everything an action decided, with all dice already rolled. Applying a
/// plan cannot fail.
#[derive(Debug, Clone)]
pub(crate) enum Plan {
    Attack {
        event: AttackEvent,
        on_hit: Option<OnHitPlan>,
    },
    Contest(ContestEvent),
    Heal {
        actor: CombatantId,
        target: CombatantId,
        amount: i32,
    },
    Stabilize {
        actor: CombatantId,
        target: CombatantId,
        roll: u32,
        total: i32,
        dc: i32,
        success: bool,
    },
    Move {
        actor: CombatantId,
        feet: u32,
    },
    Flee {
        actor: CombatantId,
    },
}

pub(crate) fn plan_attack(
    attacker: &Combatant,
    target: &Combatant,
    attack_index: usize,
    source: &mut impl RandomSource,
) -> RulesResult<Plan> {
    let profile = attacker.attacks.get(attack_index).ok_or_else(|| {
        crate::error::RulesError::UnknownAttack {
            actor: attacker.id.clone(),
            index: attack_index,
        }
    })?;

    let mut strategy =
        conditions::attack_strategy(&attacker.conditions, &target.conditions, profile.style);
    if attacker.elven_accuracy && strategy.is_advantage() {
        strategy = RollStrategy::BestOfN(3);
    }

    let bonus = attacker.attack_bonus(profile)?;
    let d20 = dice::roll(DiceSpec::d20(bonus), strategy, source)?;

    let natural = d20.chosen_value;
    let nat20 = d20.is_natural_max;
    let nat1 = d20.is_natural_min;
    let hit = nat20 || (!nat1 && d20.total >= target.armor_class);
    let critical = nat20
        || (hit && profile.style == AttackStyle::Melee && target.conditions.melee_hits_are_critical());

    let damage = if hit {
        let spec = attacker.damage_spec(profile)?;
        let count = if critical { spec.count * 2 } else { spec.count };
        dice::roll_sum(spec, count, source)?.total.max(0)
    } else {
        0
    };

    let on_hit = match (hit, profile.on_hit) {
        (true, Some(effect)) => {
            // Saved against the target as it stands after the damage.
            let mut struck = target.clone();
            life::apply_damage(
                &mut struck.health,
                &mut struck.conditions,
                damage,
                critical,
                struck.zero_hp,
            );
            let save = match effect.save {
                Some(_) if struck.health.is_dead() => None,
                Some(st) => Some(checks::saving_throw(&struck, st.ability, st.dc, source)?),
                None => None,
            };
            let condition = match effect.rounds {
                Some(rounds) => Condition::for_rounds(effect.kind, rounds),
                None => Condition::until_removed(effect.kind),
            };
            Some(OnHitPlan { condition, save })
        }
        _ => None,
    };

    debug!(
        actor = %attacker.id,
        target = %target.id,
        natural,
        total = d20.total,
        hit,
        critical,
        damage,
        "attack planned"
    );

    Ok(Plan::Attack {
        event: AttackEvent {
            actor: attacker.id.clone(),
            target: target.id.clone(),
            attack: profile.name.clone(),
            strategy,
            rolls: d20.rolls,
            natural,
            roll_total: d20.total,
            target_ac: target.armor_class,
            hit,
            critical,
            damage,
            resulting_hp: target.current_hp(),
        },
        on_hit,
    })
}

/// Contested Athletics against the defender's Athletics or Acrobatics.
pub(crate) fn plan_contest(
    attacker: &Combatant,
    defender: &Combatant,
    maneuver: Maneuver,
    source: &mut impl RandomSource,
) -> RulesResult<Plan> {
    let att_mod = attacker.skill_mod(Skill::Athletics)?;
    let (_, def_mod) = best_escape_skill(defender)?;
    let rolls = contested_check(
        source,
        att_mod,
        checks::check_strategy(attacker),
        def_mod,
        checks::check_strategy(defender),
    )?;
    Ok(Plan::Contest(ContestEvent {
        actor: attacker.id.clone(),
        target: defender.id.clone(),
        maneuver,
        actor_roll: rolls.attacker.chosen_value,
        actor_total: rolls.attacker.total,
        target_roll: rolls.defender.chosen_value,
        target_total: rolls.defender.total,
        success: rolls.outcome == ContestOutcome::AttackerWins,
    }))
}

pub(crate) fn plan_heal(
    actor: &Combatant,
    target: &Combatant,
    spec: DiceSpec,
    source: &mut impl RandomSource,
) -> RulesResult<Plan> {
    let amount = dice::roll_sum(spec, spec.count, source)?.total.max(0);
    Ok(Plan::Heal {
        actor: actor.id.clone(),
        target: target.id.clone(),
        amount,
    })
}

pub(crate) fn plan_stabilize(
    actor: &Combatant,
    target: &Combatant,
    dc: i32,
    source: &mut impl RandomSource,
) -> RulesResult<Plan> {
    let check = checks::skill_check(actor, Skill::Medicine, dc, source)?;
    Ok(Plan::Stabilize {
        actor: actor.id.clone(),
        target: target.id.clone(),
        roll: check.roll.chosen_value,
        total: check.total,
        dc,
        success: check.passed,
    })
}

pub(crate) fn plan_move(actor: &Combatant, feet: u32) -> Plan {
    Plan::Move {
        actor: actor.id.clone(),
        feet,
    }
}

pub(crate) fn plan_flee(actor: &Combatant) -> Plan {
    Plan::Flee {
        actor: actor.id.clone(),
    }
}

fn condition_events(
    id: &CombatantId,
    before: &[ConditionKind],
    after: &ConditionTracker,
) -> Vec<CombatEvent> {
    after
        .kinds()
        .into_iter()
        .filter(|k| !before.contains(k))
        .map(|kind| CombatEvent::ConditionAdded {
            combatant: id.clone(),
            kind,
        })
        .chain(
            before
                .iter()
                .filter(|k| !after.has(**k))
                .map(|&kind| CombatEvent::ConditionRemoved {
                    combatant: id.clone(),
                    kind,
                }),
        )
        .collect()
}

impl Plan {
    /// The one combatant this plan mutates.
    pub(crate) fn subject(&self) -> &CombatantId {
        match self {
            Plan::Attack { event, .. } => &event.target,
            Plan::Contest(contest) => &contest.target,
            Plan::Heal { target, .. } | Plan::Stabilize { target, .. } => target,
            Plan::Move { actor, .. } | Plan::Flee { actor } => actor,
        }
    }
}

/// Mutates the plan's subject. Returns the events to log, primary event
/// first.
pub(crate) fn apply(plan: Plan, subject: &mut Combatant) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    match plan {
        Plan::Attack { mut event, on_hit } => {
            let target = &mut *subject;
            let mut follow_up = Vec::new();
            if event.hit {
                let before = target.conditions.kinds();
                let outcome = life::apply_damage(
                    &mut target.health,
                    &mut target.conditions,
                    event.damage,
                    event.critical,
                    target.zero_hp,
                );
                match outcome.result {
                    DamageResult::DroppedUnconscious => {
                        follow_up.push(CombatEvent::DroppedToZero {
                            combatant: target.id.clone(),
                        })
                    }
                    DamageResult::Died => follow_up.push(CombatEvent::Died {
                        combatant: target.id.clone(),
                    }),
                    DamageResult::Absorbed => {}
                }
                follow_up.extend(condition_events(&target.id, &before, &target.conditions));

                if let Some(effect) = on_hit.filter(|_| !target.health.is_dead()) {
                    let resisted = match &effect.save {
                        Some(save) => {
                            follow_up.push(CombatEvent::SavingThrow {
                                combatant: target.id.clone(),
                                ability: save.ability,
                                dc: save.dc,
                                roll: save.roll.as_ref().map_or(0, |r| r.chosen_value),
                                total: save.total,
                                success: save.success,
                                auto_fail: save.auto_fail,
                            });
                            save.success
                        }
                        None => false,
                    };
                    if !resisted {
                        target.conditions.add(effect.condition);
                        follow_up.push(CombatEvent::ConditionAdded {
                            combatant: target.id.clone(),
                            kind: effect.condition.kind,
                        });
                    }
                }
            }
            event.resulting_hp = target.current_hp();
            events.push(CombatEvent::Attack(event));
            events.extend(follow_up);
        }
        Plan::Contest(contest) => {
            let target = &mut *subject;
            let kind = match contest.maneuver {
                Maneuver::Grapple => ConditionKind::Grappled,
                Maneuver::Shove => ConditionKind::Prone,
            };
            let success = contest.success;
            events.push(CombatEvent::Contest(contest));
            if success && target.conditions.add(Condition::until_removed(kind)) {
                events.push(CombatEvent::ConditionAdded {
                    combatant: target.id.clone(),
                    kind,
                });
            }
        }
        Plan::Heal {
            actor,
            target: target_id,
            amount,
        } => {
            let target = &mut *subject;
            let before = target.conditions.kinds();
            let healed = life::heal(&mut target.health, &mut target.conditions, amount);
            events.push(CombatEvent::Healed {
                actor,
                target: target_id,
                amount: healed,
                resulting_hp: target.current_hp(),
            });
            events.extend(condition_events(&target.id, &before, &target.conditions));
        }
        Plan::Stabilize {
            actor,
            target: target_id,
            roll,
            total,
            dc,
            success,
        } => {
            if success {
                life::stabilize(&mut subject.health);
            }
            events.push(CombatEvent::StabilizeAttempt {
                actor,
                target: target_id,
                roll,
                total,
                dc,
                success,
            });
        }
        Plan::Move { actor: id, feet } => {
            subject.resources.spend_movement(feet);
            events.push(CombatEvent::Moved {
                combatant: id,
                feet,
                remaining: subject.resources.movement_left,
            });
        }
        Plan::Flee { actor: id } => {
            subject.fled = true;
            events.push(CombatEvent::Fled { combatant: id });
        }
    }
    events
}
