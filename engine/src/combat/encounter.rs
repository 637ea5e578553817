use std::cmp::Reverse;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::actions::{self, ActionKind, ActionRequest, Plan};
use super::combatant::{Combatant, CombatantId, Resource, Side, TurnResources};
use super::event::{CombatEvent, EndReason, Maneuver};
use crate::bonus::Ability;
use crate::dice::{self, DiceSpec, RandomSource, RollStrategy};
use crate::error::{RulesError, RulesResult};
use crate::life;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    RollingInitiative,
    TurnActive,
    ResolvingAction,
    RoundEnd,
    CombatEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterOptions {
    /// Combat ends in a draw once this many rounds have passed.
    pub max_rounds: u32,
    pub death_save_dc: i32,
    pub stabilize_dc: i32,
}

impl Default for EncounterOptions {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            death_save_dc: 10,
            stabilize_dc: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    pub winner: Option<Side>,
    pub reason: EndReason,
    pub rounds: u32,
}

/// The whole encounter. Owned by the caller; nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Insertion order is the final initiative tiebreak.
    pub combatants: IndexMap<CombatantId, Combatant>,
    /// Frozen after initiative.
    pub turn_order: Vec<CombatantId>,
    pub round: u32,
    pub current: usize,
    pub phase: Phase,
    pub log: Vec<CombatEvent>,
    pub options: EncounterOptions,
    pub result: Option<CombatResult>,
}

impl CombatState {
    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn current_actor(&self) -> Option<&CombatantId> {
        match self.phase {
            Phase::TurnActive | Phase::ResolvingAction => self.turn_order.get(self.current),
            _ => None,
        }
    }

    fn side_defeated(&self, side: Side) -> bool {
        self.combatants
            .values()
            .filter(|c| c.side == side)
            .all(Combatant::is_down)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Primary event first, then consequences (conditions, turn changes).
    pub events: Vec<CombatEvent>,
    pub phase: Phase,
}

impl ActionOutcome {
    pub fn primary(&self) -> Option<&CombatEvent> {
        self.events.first()
    }
}

/// Drives one encounter through its state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    state: CombatState,
}

/// Build an encounter and roll initiative in one step.
pub fn start_encounter(
    combatants: Vec<Combatant>,
    options: EncounterOptions,
    source: &mut impl RandomSource,
) -> RulesResult<Encounter> {
    let mut encounter = Encounter::new(combatants, options)?;
    encounter.start(source)?;
    Ok(encounter)
}

impl Encounter {
    pub fn new(combatants: Vec<Combatant>, options: EncounterOptions) -> RulesResult<Self> {
        let mut roster = IndexMap::new();
        for c in combatants {
            if roster.contains_key(&c.id) {
                return Err(RulesError::DuplicateCombatant(c.id));
            }
            roster.insert(c.id.clone(), c);
        }
        for side in [Side::Party, Side::Foes] {
            if !roster.values().any(|c| c.side == side) {
                return Err(RulesError::EmptySide);
            }
        }
        Ok(Self {
            state: CombatState {
                combatants: roster,
                turn_order: Vec::new(),
                round: 0,
                current: 0,
                phase: Phase::NotStarted,
                log: Vec::new(),
                options,
                result: None,
            },
        })
    }

    pub(crate) fn from_state(state: CombatState) -> Self {
        Self { state }
    }

    /// Read-only view for rendering.
    pub fn current_state(&self) -> &CombatState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn result(&self) -> Option<CombatResult> {
        self.state.result
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.state.combatant(id)
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        &self.state.turn_order
    }

    /// Whose decision the engine is waiting on, if anyone's.
    pub fn ready_for_action(&self) -> Option<&CombatantId> {
        match self.state.phase {
            Phase::TurnActive => self.state.turn_order.get(self.state.current),
            _ => None,
        }
    }

    /// Roll 1d20 + DEX for everyone and freeze the turn order: higher total
    /// first, then higher DEX modifier, then roster order.
    pub fn start(&mut self, source: &mut impl RandomSource) -> RulesResult<()> {
        if self.state.phase != Phase::NotStarted {
            return Err(self.out_of_sequence(None));
        }

        let mut rolls = Vec::with_capacity(self.state.combatants.len());
        for (idx, c) in self.state.combatants.values().enumerate() {
            let dex = c.ability_mod(Ability::Dex);
            let roll = dice::roll(DiceSpec::d20(dex), RollStrategy::Normal, source)?;
            rolls.push((idx, c.id.clone(), dex, roll));
        }

        self.state.phase = Phase::RollingInitiative;
        for (_, id, _, roll) in &rolls {
            if let Some(c) = self.state.combatants.get_mut(id) {
                c.initiative_roll = Some(roll.total);
            }
            self.state.log.push(CombatEvent::InitiativeRolled {
                combatant: id.clone(),
                roll: roll.chosen_value,
                total: roll.total,
            });
        }

        rolls.sort_by_key(|(idx, _, dex, roll)| (Reverse(roll.total), Reverse(*dex), *idx));
        self.state.turn_order = rolls.into_iter().map(|(_, id, _, _)| id).collect();

        info!(order = ?self.state.turn_order, "initiative rolled");

        self.state.round = 1;
        self.state.current = 0;
        self.state.log.push(CombatEvent::RoundStarted { round: 1 });
        let mut events = Vec::new();
        self.settle(source, &mut events);
        self.state.log.extend(events);
        Ok(())
    }

    /// Ends the encounter immediately. Nothing in flight is kept.
    pub fn abort(&mut self) {
        if self.state.phase == Phase::CombatEnded {
            return;
        }
        let mut events = Vec::new();
        self.finish(None, EndReason::Aborted, &mut events);
        self.state.log.extend(events);
    }

    /// Change an ability score mid-fight (a spell, a potion). The turn order
    /// stays as rolled.
    pub fn set_ability_score(
        &mut self,
        id: &CombatantId,
        ability: Ability,
        score: i32,
    ) -> RulesResult<()> {
        let c = self
            .state
            .combatants
            .get_mut(id)
            .ok_or_else(|| RulesError::UnknownCombatant(id.clone()))?;
        c.abilities.set(ability, score)
    }

    /// Add or refresh a condition from an external effect.
    pub fn add_condition(
        &mut self,
        id: &CombatantId,
        condition: crate::conditions::Condition,
    ) -> RulesResult<()> {
        let c = self
            .state
            .combatants
            .get_mut(id)
            .ok_or_else(|| RulesError::UnknownCombatant(id.clone()))?;
        c.conditions.add(condition);
        self.state.log.push(CombatEvent::ConditionAdded {
            combatant: id.clone(),
            kind: condition.kind,
        });
        Ok(())
    }

    pub fn remove_condition(
        &mut self,
        id: &CombatantId,
        kind: crate::conditions::ConditionKind,
    ) -> RulesResult<bool> {
        let c = self
            .state
            .combatants
            .get_mut(id)
            .ok_or_else(|| RulesError::UnknownCombatant(id.clone()))?;
        let removed = c.conditions.remove(kind).is_some();
        if removed {
            self.state.log.push(CombatEvent::ConditionRemoved {
                combatant: id.clone(),
                kind,
            });
        }
        Ok(removed)
    }

    /// Validate, roll, then commit. A rejected request leaves the state
    /// untouched and draws nothing from `source`.
    pub fn submit_action(
        &mut self,
        request: ActionRequest,
        source: &mut impl RandomSource,
    ) -> RulesResult<ActionOutcome> {
        if let Err(err) = self.validate(&request) {
            warn!(actor = %request.actor, error = %err, "action rejected");
            return Err(err);
        }

        let mut events = Vec::new();
        if let ActionKind::EndTurn = request.kind {
            self.end_turn(source, &mut events);
            self.state.log.extend(events.iter().cloned());
            return Ok(ActionOutcome {
                events,
                phase: self.state.phase,
            });
        }

        let plan = self.plan(&request, source)?;

        self.state.phase = Phase::ResolvingAction;
        if let (Some(resource), Some(actor)) = (
            request.resource(),
            self.state.combatants.get_mut(&request.actor),
        ) {
            if resource != Resource::Movement {
                actor.resources.spend(resource);
            }
        }
        let subject = plan.subject().clone();
        if let Some(c) = self.state.combatants.get_mut(&subject) {
            events.extend(actions::apply(plan, c));
        }
        for event in &events {
            debug!(%event, "resolved");
        }
        self.state.phase = Phase::TurnActive;

        self.check_end(&mut events);
        if self.state.phase == Phase::TurnActive && self.active_actor_is_gone() {
            self.end_turn(source, &mut events);
        }

        self.state.log.extend(events.iter().cloned());
        Ok(ActionOutcome {
            events,
            phase: self.state.phase,
        })
    }

    fn out_of_sequence(&self, actor: Option<&CombatantId>) -> RulesError {
        RulesError::OutOfSequenceAction {
            actor: actor.cloned().unwrap_or_else(|| CombatantId(String::new())),
            phase: self.state.phase,
        }
    }

    fn validate(&self, request: &ActionRequest) -> RulesResult<()> {
        let actor_id = &request.actor;
        if self.state.phase != Phase::TurnActive {
            return Err(self.out_of_sequence(Some(actor_id)));
        }
        let actor = self
            .state
            .combatants
            .get(actor_id)
            .ok_or_else(|| RulesError::UnknownCombatant(actor_id.clone()))?;

        let resource = request.resource();
        let is_current = self.state.turn_order.get(self.state.current) == Some(actor_id);
        if !is_current && resource != Some(Resource::Reaction) {
            return Err(self.out_of_sequence(Some(actor_id)));
        }
        let Some(resource) = resource else {
            return Ok(());
        };

        if !actor.can_act() {
            return Err(RulesError::ActorIncapacitated(actor_id.clone()));
        }
        if !actor.resources.is_available(resource) {
            return Err(RulesError::ResourceAlreadyUsed {
                actor: actor_id.clone(),
                resource,
            });
        }

        if let Some(target_id) = request.kind.target() {
            let target = self
                .state
                .combatants
                .get(target_id)
                .filter(|t| t.is_present())
                .ok_or_else(|| RulesError::InvalidTarget(target_id.clone()))?;
            let self_target_ok = matches!(request.kind, ActionKind::Heal { .. });
            if target.id == actor.id && !self_target_ok {
                return Err(RulesError::InvalidTarget(target_id.clone()));
            }
            if matches!(request.kind, ActionKind::Stabilize { .. }) && !target.health.is_dying() {
                return Err(RulesError::InvalidTarget(target_id.clone()));
            }
        }

        match &request.kind {
            ActionKind::Attack { attack, .. } if *attack >= actor.attacks.len() => {
                Err(RulesError::UnknownAttack {
                    actor: actor_id.clone(),
                    index: *attack,
                })
            }
            ActionKind::Heal { dice, .. } => dice.validate(),
            ActionKind::Move { feet } => {
                let remaining = if actor.conditions.immobilized() {
                    0
                } else {
                    actor.resources.movement_left
                };
                if *feet > remaining {
                    Err(RulesError::InsufficientMovement {
                        actor: actor_id.clone(),
                        requested: *feet,
                        remaining,
                    })
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn plan(&self, request: &ActionRequest, source: &mut impl RandomSource) -> RulesResult<Plan> {
        let actor = self
            .state
            .combatants
            .get(&request.actor)
            .ok_or_else(|| RulesError::UnknownCombatant(request.actor.clone()))?;
        let target = |id: &CombatantId| {
            self.state
                .combatants
                .get(id)
                .ok_or_else(|| RulesError::InvalidTarget(id.clone()))
        };
        match &request.kind {
            ActionKind::Attack { target: t, attack } => {
                actions::plan_attack(actor, target(t)?, *attack, source)
            }
            ActionKind::Grapple { target: t } => {
                actions::plan_contest(actor, target(t)?, Maneuver::Grapple, source)
            }
            ActionKind::Shove { target: t } => {
                actions::plan_contest(actor, target(t)?, Maneuver::Shove, source)
            }
            ActionKind::Heal { target: t, dice } => {
                actions::plan_heal(actor, target(t)?, *dice, source)
            }
            ActionKind::Stabilize { target: t } => {
                actions::plan_stabilize(actor, target(t)?, self.state.options.stabilize_dc, source)
            }
            ActionKind::Move { feet } => Ok(actions::plan_move(actor, *feet)),
            ActionKind::Flee => Ok(actions::plan_flee(actor)),
            ActionKind::EndTurn => Err(self.out_of_sequence(Some(&request.actor))),
        }
    }

    fn active_actor_is_gone(&self) -> bool {
        self.state
            .turn_order
            .get(self.state.current)
            .and_then(|id| self.state.combatants.get(id))
            .is_none_or(|c| c.fled || c.health.is_dead())
    }

    fn end_turn(&mut self, source: &mut impl RandomSource, events: &mut Vec<CombatEvent>) {
        if let Some(id) = self.state.turn_order.get(self.state.current) {
            events.push(CombatEvent::TurnEnded {
                combatant: id.clone(),
            });
        }
        self.step(events);
        self.settle(source, events);
    }

    /// Move the cursor one slot, closing the round when it wraps.
    fn step(&mut self, events: &mut Vec<CombatEvent>) {
        self.state.current += 1;
        if self.state.current < self.state.turn_order.len() {
            return;
        }

        self.state.phase = Phase::RoundEnd;
        for c in self.state.combatants.values_mut() {
            for kind in c.conditions.tick_round_end() {
                events.push(CombatEvent::ConditionExpired {
                    combatant: c.id.clone(),
                    kind,
                });
            }
        }
        info!(round = self.state.round, "round ended");

        if self.state.round >= self.state.options.max_rounds {
            self.finish(None, EndReason::RoundLimit, events);
            return;
        }
        self.state.round += 1;
        self.state.current = 0;
        events.push(CombatEvent::RoundStarted {
            round: self.state.round,
        });
    }

    /// Starting at the cursor, begin turns until someone can act or the
    /// fight is over.
    fn settle(&mut self, source: &mut impl RandomSource, events: &mut Vec<CombatEvent>) {
        loop {
            self.check_end(events);
            if self.state.phase == Phase::CombatEnded {
                return;
            }
            let Some(id) = self.state.turn_order.get(self.state.current).cloned() else {
                self.finish(None, EndReason::Aborted, events);
                return;
            };
            if self.begin_turn(&id, source, events) {
                self.state.phase = Phase::TurnActive;
                return;
            }
            events.push(CombatEvent::TurnEnded { combatant: id });
            self.step(events);
        }
    }

    /// Refill resources, roll a death save if dying. Returns whether the
    /// combatant can take its turn.
    fn begin_turn(
        &mut self,
        id: &CombatantId,
        source: &mut impl RandomSource,
        events: &mut Vec<CombatEvent>,
    ) -> bool {
        let round = self.state.round;
        let dc = self.state.options.death_save_dc;
        let Some(c) = self.state.combatants.get_mut(id) else {
            return false;
        };
        if !c.is_present() {
            return false;
        }

        c.resources = TurnResources::fresh(c.speed);
        events.push(CombatEvent::TurnStarted {
            combatant: id.clone(),
            round,
        });

        if c.health.is_dying() {
            let roll = source.roll_die(20);
            let result = life::death_save(&mut c.health, &mut c.conditions, roll, dc);
            debug!(combatant = %id, roll, ?result, "death save");
            events.push(CombatEvent::DeathSave {
                combatant: id.clone(),
                roll,
                result,
                successes: c.health.death.successes,
                failures: c.health.death.failures,
            });
            match result {
                life::DeathSaveResult::Died => events.push(CombatEvent::Died {
                    combatant: id.clone(),
                }),
                life::DeathSaveResult::Revived => events.push(CombatEvent::ConditionRemoved {
                    combatant: id.clone(),
                    kind: crate::conditions::ConditionKind::Unconscious,
                }),
                _ => {}
            }
        }

        c.can_act()
    }

    fn check_end(&mut self, events: &mut Vec<CombatEvent>) {
        if self.state.phase == Phase::CombatEnded {
            return;
        }
        let party_down = self.state.side_defeated(Side::Party);
        let foes_down = self.state.side_defeated(Side::Foes);
        match (party_down, foes_down) {
            (false, false) => {}
            (true, true) => self.finish(None, EndReason::SideDefeated, events),
            (true, false) => self.finish(Some(Side::Foes), EndReason::SideDefeated, events),
            (false, true) => self.finish(Some(Side::Party), EndReason::SideDefeated, events),
        }
    }

    fn finish(&mut self, winner: Option<Side>, reason: EndReason, events: &mut Vec<CombatEvent>) {
        self.state.phase = Phase::CombatEnded;
        self.state.result = Some(CombatResult {
            winner,
            reason,
            rounds: self.state.round,
        });
        info!(?winner, ?reason, rounds = self.state.round, "combat ended");
        events.push(CombatEvent::CombatEnded { winner, reason });
    }

    pub(crate) fn state(&self) -> &CombatState {
        &self.state
    }
}
