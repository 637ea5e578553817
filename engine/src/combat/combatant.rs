use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::bonus::{
    self, Ability, AbilityScores, ProficiencyLevel, Skill, SkillOrSave, validate_level,
};
use crate::conditions::{AttackStyle, ConditionKind, ConditionTracker};
use crate::dice::DiceSpec;
use crate::error::{RulesError, RulesResult};
use crate::life::{Health, LifeState, ZeroHpPolicy};

pub const DEFAULT_SPEED: u32 = 30;

/// Stable identifier; turn order refers to combatants only through this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub String);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CombatantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CombatantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Party,
    Foes,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Party => Side::Foes,
            Side::Foes => Side::Party,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Action,
    BonusAction,
    Reaction,
    Movement,
}

/// Per-turn budget. Refilled at the start of the owner's own turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResources {
    pub action_used: bool,
    pub bonus_action_used: bool,
    pub reaction_used: bool,
    pub movement_left: u32,
}

impl TurnResources {
    pub fn fresh(speed: u32) -> Self {
        Self {
            action_used: false,
            bonus_action_used: false,
            reaction_used: false,
            movement_left: speed,
        }
    }

    pub fn is_available(&self, resource: Resource) -> bool {
        match resource {
            Resource::Action => !self.action_used,
            Resource::BonusAction => !self.bonus_action_used,
            Resource::Reaction => !self.reaction_used,
            Resource::Movement => self.movement_left > 0,
        }
    }

    pub(crate) fn spend(&mut self, resource: Resource) {
        match resource {
            Resource::Action => self.action_used = true,
            Resource::BonusAction => self.bonus_action_used = true,
            Resource::Reaction => self.reaction_used = true,
            Resource::Movement => self.movement_left = 0,
        }
    }

    pub(crate) fn spend_movement(&mut self, feet: u32) {
        self.movement_left = self.movement_left.saturating_sub(feet);
    }
}

/// Saving throw forced on a target that gets hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingThrow {
    pub ability: Ability,
    pub dc: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnHitCondition {
    pub kind: ConditionKind,
    /// If present, the target makes this save to resist.
    #[serde(default)]
    pub save: Option<SavingThrow>,
    /// Rounds the condition lasts; absent means until removed.
    #[serde(default)]
    pub rounds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProfile {
    pub name: String,
    pub ability: Ability,
    #[serde(default = "default_true")]
    pub proficient: bool,
    #[serde(default)]
    pub magic_bonus: i32,
    /// Weapon dice; its modifier is added on top of the ability modifier.
    pub damage: DiceSpec,
    #[serde(default)]
    pub style: AttackStyle,
    #[serde(default)]
    pub on_hit: Option<OnHitCondition>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub level: u8,
    pub health: Health,
    pub armor_class: i32,
    pub speed: u32,
    pub initiative_roll: Option<i32>,
    pub abilities: AbilityScores,
    pub saves: IndexMap<Ability, ProficiencyLevel>,
    pub skills: IndexMap<Skill, ProficiencyLevel>,
    /// Active named penalties (tag → magnitude), e.g. `armor` → 2.
    pub penalties: HashMap<String, i32>,
    pub attacks: Vec<AttackProfile>,
    pub conditions: ConditionTracker,
    pub resources: TurnResources,
    pub zero_hp: ZeroHpPolicy,
    /// Advantage on attacks rolls three dice instead of two.
    pub elven_accuracy: bool,
    pub fled: bool,
}

impl Combatant {
    pub fn current_hp(&self) -> i32 {
        self.health.hp
    }

    pub fn ability_mod(&self, ability: Ability) -> i32 {
        self.abilities.mod_of(ability)
    }

    pub fn save_entry(&self, ability: Ability) -> SkillOrSave {
        let prof = self.saves.get(&ability).copied().unwrap_or_default();
        SkillOrSave::for_save(ability, prof)
    }

    pub fn skill_entry(&self, skill: Skill) -> SkillOrSave {
        let prof = self.skills.get(&skill).copied().unwrap_or_default();
        SkillOrSave::for_skill(skill, prof)
    }

    pub fn save_mod(&self, ability: Ability) -> RulesResult<i32> {
        bonus::total_bonus(
            &self.abilities,
            &self.save_entry(ability),
            self.level,
            &self.penalties,
        )
    }

    pub fn skill_mod(&self, skill: Skill) -> RulesResult<i32> {
        bonus::total_bonus(
            &self.abilities,
            &self.skill_entry(skill),
            self.level,
            &self.penalties,
        )
    }

    pub fn attack_bonus(&self, attack: &AttackProfile) -> RulesResult<i32> {
        bonus::attack_bonus(
            &self.abilities,
            attack.ability,
            self.level,
            attack.proficient,
            attack.magic_bonus,
        )
    }

    /// Damage dice with the ability and magic modifiers folded in.
    pub fn damage_spec(&self, attack: &AttackProfile) -> RulesResult<DiceSpec> {
        let modifier = attack.damage.modifier
            + bonus::damage_modifier(&self.abilities, attack.ability, attack.magic_bonus);
        DiceSpec::new(attack.damage.count, attack.damage.sides, modifier)
    }

    /// Out of the fight: 0 HP, dead or fled.
    pub fn is_down(&self) -> bool {
        self.fled || self.health.hp == 0 || self.health.state == LifeState::Dead
    }

    /// Still part of the encounter and able to be targeted.
    pub fn is_present(&self) -> bool {
        !self.fled && !self.health.is_dead()
    }

    pub fn can_act(&self) -> bool {
        !self.is_down() && !self.conditions.incapacitated()
    }
}

/// Plain-data construction of a [`Combatant`].
#[derive(Debug, Clone)]
pub struct CombatantBuilder {
    id: CombatantId,
    name: String,
    side: Side,
    level: u8,
    max_hp: i32,
    armor_class: i32,
    speed: u32,
    abilities: AbilityScores,
    saves: IndexMap<Ability, ProficiencyLevel>,
    skills: IndexMap<Skill, ProficiencyLevel>,
    penalties: HashMap<String, i32>,
    attacks: Vec<AttackProfile>,
    conditions: ConditionTracker,
    zero_hp: ZeroHpPolicy,
    elven_accuracy: bool,
}

impl CombatantBuilder {
    pub fn new(id: impl Into<CombatantId>, name: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            side,
            level: 1,
            max_hp: 1,
            armor_class: 10,
            speed: DEFAULT_SPEED,
            abilities: AbilityScores::default(),
            saves: IndexMap::new(),
            skills: IndexMap::new(),
            penalties: HashMap::new(),
            attacks: Vec::new(),
            conditions: ConditionTracker::new(),
            zero_hp: ZeroHpPolicy::default(),
            elven_accuracy: false,
        }
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn max_hp(mut self, hp: i32) -> Self {
        self.max_hp = hp;
        self
    }

    pub fn armor_class(mut self, ac: i32) -> Self {
        self.armor_class = ac;
        self
    }

    pub fn speed(mut self, feet: u32) -> Self {
        self.speed = feet;
        self
    }

    pub fn abilities(mut self, scores: AbilityScores) -> Self {
        self.abilities = scores;
        self
    }

    pub fn save(mut self, ability: Ability, prof: ProficiencyLevel) -> Self {
        self.saves.insert(ability, prof);
        self
    }

    pub fn skill(mut self, skill: Skill, prof: ProficiencyLevel) -> Self {
        self.skills.insert(skill, prof);
        self
    }

    pub fn penalty(mut self, tag: impl Into<String>, magnitude: i32) -> Self {
        self.penalties.insert(tag.into(), magnitude);
        self
    }

    pub fn attack(mut self, attack: AttackProfile) -> Self {
        self.attacks.push(attack);
        self
    }

    pub fn condition(mut self, condition: crate::conditions::Condition) -> Self {
        self.conditions.add(condition);
        self
    }

    pub fn zero_hp(mut self, policy: ZeroHpPolicy) -> Self {
        self.zero_hp = policy;
        self
    }

    pub fn elven_accuracy(mut self, on: bool) -> Self {
        self.elven_accuracy = on;
        self
    }

    pub fn build(self) -> RulesResult<Combatant> {
        validate_level(self.level)?;
        self.abilities.validate()?;
        if self.max_hp < 1 {
            return Err(RulesError::InvalidHitPoints(self.max_hp));
        }
        let max_hp = self.max_hp;
        let combatant = Combatant {
            id: self.id,
            name: self.name,
            side: self.side,
            level: self.level,
            health: Health::new(max_hp),
            armor_class: self.armor_class,
            speed: self.speed,
            initiative_roll: None,
            abilities: self.abilities,
            saves: self.saves,
            skills: self.skills,
            penalties: self.penalties,
            attacks: self.attacks,
            conditions: self.conditions,
            resources: TurnResources::fresh(self.speed),
            zero_hp: self.zero_hp,
            elven_accuracy: self.elven_accuracy,
            fled: false,
        };
        // Folded damage must be a valid spec before any attack is rolled.
        for attack in &combatant.attacks {
            attack.damage.validate()?;
            combatant.damage_spec(attack)?;
        }
        Ok(combatant)
    }
}

/// Character or monster sheet as loaded from JSON content.
#[derive(Debug, Clone, Deserialize)]
pub struct CombatantData {
    pub name: String,
    pub side: Side,
    #[serde(default = "default_level")]
    pub level: u8,
    pub ac: i32,
    pub hp: i32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub saves: IndexMap<Ability, ProficiencyLevel>,
    #[serde(default)]
    pub skills: IndexMap<Skill, ProficiencyLevel>,
    #[serde(default)]
    pub penalties: HashMap<String, i32>,
    #[serde(default)]
    pub attacks: Vec<AttackProfile>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub zero_hp: ZeroHpPolicy,
    #[serde(default)]
    pub elven_accuracy: bool,
}

fn default_level() -> u8 {
    1
}

fn default_speed() -> u32 {
    DEFAULT_SPEED
}

impl CombatantData {
    pub fn into_combatant(self, id: impl Into<CombatantId>) -> RulesResult<Combatant> {
        let mut builder = CombatantBuilder::new(id, self.name, self.side)
            .level(self.level)
            .armor_class(self.ac)
            .max_hp(self.hp)
            .speed(self.speed)
            .abilities(self.abilities)
            .zero_hp(self.zero_hp)
            .elven_accuracy(self.elven_accuracy);
        for (ability, prof) in self.saves {
            builder = builder.save(ability, prof);
        }
        for (skill, prof) in self.skills {
            builder = builder.skill(skill, prof);
        }
        for (tag, magnitude) in self.penalties {
            builder = builder.penalty(tag, magnitude);
        }
        for attack in self.attacks {
            builder = builder.attack(attack);
        }
        for name in &self.conditions {
            let kind: ConditionKind = name.parse()?;
            builder = builder.condition(crate::conditions::Condition::until_removed(kind));
        }
        builder.build()
    }
}
