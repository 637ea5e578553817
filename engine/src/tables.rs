use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::dice::{DiceSpec, MAX_SIDES, MIN_SIDES, RollStrategy};
use crate::error::{RulesError, RulesResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Selection {
    Normal,
    BestOf,
    WorstOf,
}

#[derive(Debug, Deserialize)]
struct DiceTypeEntry {
    sides: u32,
}

#[derive(Debug, Deserialize)]
struct RollModifierEntry {
    #[serde(rename = "type")]
    selection: Selection,
    rolls: u8,
}

#[derive(Debug, Deserialize)]
struct TablesFile {
    #[serde(default)]
    dice_types: IndexMap<String, DiceTypeEntry>,
    #[serde(default)]
    roll_modifiers: IndexMap<String, RollModifierEntry>,
}

/// Named dice (`d20` → 20 sides) and named roll modifiers
/// (`advantage` → best of 2). Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceTables {
    dice: IndexMap<String, u32>,
    modifiers: IndexMap<String, RollStrategy>,
}

impl DiceTables {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: TablesFile = serde_yaml::from_str(text).context("failed to parse dice tables")?;

        let mut dice = IndexMap::new();
        for (name, entry) in file.dice_types {
            if !(MIN_SIDES..=MAX_SIDES).contains(&entry.sides) {
                bail!("dice type '{}' has {} sides", name, entry.sides);
            }
            dice.insert(name.to_lowercase(), entry.sides);
        }

        let mut modifiers = IndexMap::new();
        for (name, entry) in file.roll_modifiers {
            if entry.rolls == 0 {
                bail!("roll modifier '{}' rolls no dice", name);
            }
            let strategy = match (entry.selection, entry.rolls) {
                (_, 1) | (Selection::Normal, _) => RollStrategy::Normal,
                (Selection::BestOf, n) => RollStrategy::BestOfN(n),
                (Selection::WorstOf, n) => RollStrategy::WorstOfN(n),
            };
            modifiers.insert(name.to_lowercase(), strategy);
        }

        Ok(Self { dice, modifiers })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read dice tables: {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid dice tables: {}", path.display()))
    }

    pub fn sides(&self, name: &str) -> RulesResult<u32> {
        self.dice
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| RulesError::UnknownDiceName(name.to_string()))
    }

    pub fn strategy(&self, name: &str) -> RulesResult<RollStrategy> {
        self.modifiers
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| RulesError::UnknownRollModifier(name.to_string()))
    }

    /// `count` dice of the named type, e.g. `spec("d6", 2, 3)` → 2d6+3.
    pub fn spec(&self, name: &str, count: u32, modifier: i32) -> RulesResult<DiceSpec> {
        DiceSpec::new(count, self.sides(name)?, modifier)
    }

    pub fn dice_names(&self) -> impl Iterator<Item = &str> {
        self.dice.keys().map(String::as_str)
    }

    pub fn modifier_names(&self) -> impl Iterator<Item = &str> {
        self.modifiers.keys().map(String::as_str)
    }
}

impl Default for DiceTables {
    /// The standard polyhedral set and the five stock roll modifiers.
    fn default() -> Self {
        let dice = [4, 6, 8, 10, 12, 20, 100]
            .into_iter()
            .map(|sides| (format!("d{sides}"), sides))
            .collect();
        let modifiers = [
            ("normal", RollStrategy::Normal),
            ("advantage", RollStrategy::BestOfN(2)),
            ("disadvantage", RollStrategy::WorstOfN(2)),
            ("triple_advantage", RollStrategy::BestOfN(3)),
            ("triple_disadvantage", RollStrategy::WorstOfN(3)),
        ]
        .into_iter()
        .map(|(name, strategy)| (name.to_string(), strategy))
        .collect();
        Self { dice, modifiers }
    }
}
