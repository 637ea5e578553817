use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::encounter::{CombatState, Encounter};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume an encounter exactly where it stopped.
/// Restoring and replaying the same dice yields the same events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub version: u32,
    pub state: CombatState,
}

impl EncounterSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing encounter snapshot")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let snap: Self = serde_json::from_str(text).context("parsing encounter snapshot")?;
        if snap.version != SNAPSHOT_VERSION {
            bail!(
                "unsupported snapshot version {} (expected {})",
                snap.version,
                SNAPSHOT_VERSION
            );
        }
        Ok(snap)
    }
}

impl Encounter {
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            version: SNAPSHOT_VERSION,
            state: self.state().clone(),
        }
    }

    pub fn restore(snapshot: EncounterSnapshot) -> Self {
        Encounter::from_state(snapshot.state)
    }
}
