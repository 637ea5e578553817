use std::path::Path;

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;

use crate::combat::{Combatant, CombatantData, CombatantId};

pub const BUILTIN_DICE_TABLES: &str = include_str!("../content/dice/core_dice.yaml");

pub fn builtin_combatants() -> IndexMap<&'static str, &'static str> {
    IndexMap::from([
        ("fighter", include_str!("../content/combatants/fighter.json")),
        ("goblin", include_str!("../content/combatants/goblin.json")),
        ("skeleton", include_str!("../content/combatants/skeleton.json")),
    ])
}

pub fn combatant_from_json(text: &str, id: impl Into<CombatantId>) -> Result<Combatant> {
    let data: CombatantData = serde_json::from_str(text).context("parsing combatant JSON")?;
    Ok(data.into_combatant(id)?)
}

/// A bundled sheet by name, e.g. `builtin_combatant("goblin", "goblin-2")`.
pub fn builtin_combatant(name: &str, id: impl Into<CombatantId>) -> Result<Combatant> {
    let text = builtin_combatants()
        .get(name)
        .copied()
        .ok_or_else(|| anyhow!("unknown builtin combatant '{name}'"))?;
    combatant_from_json(text, id).with_context(|| format!("builtin combatant '{name}'"))
}

pub fn load_combatant(path: &Path, id: impl Into<CombatantId>) -> Result<Combatant> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading combatant file {}", path.display()))?;
    combatant_from_json(&text, id).with_context(|| format!("loading {}", path.display()))
}
