//! Per-object audio behaviours, resolved once when the world is built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configured behaviour for one named object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEntry {
    pub name: String,
    pub program: String,
    #[serde(default = "default_spatial")]
    pub spatial: bool,
}

fn default_spatial() -> bool {
    true
}

/// Audio program an object runs.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBehavior {
    pub program: String,
    pub spatial: bool,
}

impl AudioBehavior {
    /// Behaviour for objects with no table entry: `<name>player.ck`, positional.
    pub fn fallback(name: &str) -> Self {
        Self {
            program: format!("{}player.ck", name),
            spatial: true,
        }
    }
}

/// Lookup from object name to audio behaviour.
#[derive(Clone, Debug, Default)]
pub struct BehaviorTable {
    entries: HashMap<String, AudioBehavior>,
}

impl BehaviorTable {
    pub fn from_entries(entries: &[BehaviorEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| {
                    (
                        e.name.clone(),
                        AudioBehavior {
                            program: e.program.clone(),
                            spatial: e.spatial,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> AudioBehavior {
        self.entries
            .get(name)
            .cloned()
            .unwrap_or_else(|| AudioBehavior::fallback(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
