//! Shared plumbing for the command-line harnesses.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;
use rules5e::combat::CombatEvent;
use rules5e::content::{builtin_combatant, combatant_from_json};
use rules5e::{ActionRequest, Combatant, Encounter, RandomSource, Side};
use tracing::{debug, info};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Reads a text file, honoring a UTF-8/UTF-16 byte-order mark if present.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

/// A combatant JSON file, always fighting for the party.
pub fn load_combatant_file(path: &Path, id: &str) -> Result<Combatant> {
    let text = read_text_auto(path)?;
    let mut c =
        combatant_from_json(&text, id).with_context(|| format!("loading {}", path.display()))?;
    c.side = Side::Party;
    Ok(c)
}

/// Builtin sheets by name for one side; duplicates get numbered ids
/// (`goblin-1`, `goblin-2`).
pub fn side(names: &[String], side: Side) -> Result<Vec<Combatant>> {
    if names.is_empty() {
        bail!("each side needs at least one combatant");
    }
    names
        .iter()
        .enumerate()
        .map(|(i, name)| -> Result<Combatant> {
            let repeats = names.iter().filter(|n| *n == name).count();
            let id = if repeats > 1 {
                format!("{name}-{}", i + 1)
            } else {
                name.clone()
            };
            let mut c = builtin_combatant(name, id.as_str())?;
            c.side = side;
            Ok(c)
        })
        .collect()
}

pub fn roster(party: &[String], foes: &[String]) -> Result<Vec<Combatant>> {
    let mut out = side(party, Side::Party)?;
    out.extend(side(foes, Side::Foes)?);
    Ok(out)
}

/// Everyone swings their first attack at the first opponent still standing,
/// then ends the turn. Stops when the encounter ends or `max_steps` runs out.
pub fn autoplay(
    encounter: &mut Encounter,
    source: &mut impl RandomSource,
    max_steps: usize,
) -> Result<Vec<CombatEvent>> {
    let mut events = Vec::new();
    for _ in 0..max_steps {
        let Some(actor_id) = encounter.ready_for_action().cloned() else {
            break;
        };
        let state = encounter.current_state();
        let Some(actor) = state.combatant(&actor_id) else {
            bail!("turn order names unknown combatant {actor_id}");
        };
        let target = state
            .combatants
            .values()
            .find(|c| c.side == actor.side.opponent() && !c.is_down())
            .map(|c| c.id.clone());

        let request = match target {
            Some(target) if !actor.attacks.is_empty() && !actor.resources.action_used => {
                ActionRequest::attack(actor_id.clone(), target, 0)
            }
            _ => ActionRequest::end_turn(actor_id.clone()),
        };
        debug!(?request, "autoplay");
        let outcome = encounter.submit_action(request, source)?;
        events.extend(outcome.events);
    }
    if let Some(result) = encounter.result() {
        info!(?result, "autoplay finished");
    }
    Ok(events)
}
