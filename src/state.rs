//! The single mutable aggregate every component reads and mutates.
//!
//! `GameState` owns no game behavior beyond serialization and small
//! clamped accessors; the managers hold the rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::daemon::Daemon;
use crate::quest::Quest;

const DEFAULT_STORY_NODE: &str = "start";
const DEFAULT_LANGUAGE: &str = "en";

fn default_story_node() -> String {
    DEFAULT_STORY_NODE.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_unlocked_actions() -> Vec<String> {
    vec!["gather_energy".to_string()]
}

/// Aggregate root for one session/save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Resource amounts; never negative, never above the matching cap.
    #[serde(default)]
    pub resources: BTreeMap<String, f64>,
    /// Storage ceilings; recomputed whenever a building level changes.
    #[serde(default)]
    pub storage_caps: BTreeMap<String, f64>,
    /// Owned building levels (absent means level 0).
    #[serde(default)]
    pub buildings: BTreeMap<String, u32>,
    #[serde(default)]
    pub daemons: Vec<Daemon>,
    /// Index of the daemon used in combat/UI; meaningful only when the
    /// roster is non-empty.
    #[serde(default)]
    pub active_daemon_index: usize,
    #[serde(default)]
    pub active_quests: Vec<Quest>,
    #[serde(default)]
    pub story_flags: Vec<String>,
    #[serde(default = "default_story_node")]
    pub current_story_node: String,
    #[serde(default = "default_unlocked_actions")]
    pub unlocked_actions: Vec<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub tick_count: u64,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            storage_caps: BTreeMap::new(),
            buildings: BTreeMap::new(),
            daemons: Vec::new(),
            active_daemon_index: 0,
            active_quests: Vec::new(),
            story_flags: Vec::new(),
            current_story_node: default_story_node(),
            unlocked_actions: default_unlocked_actions(),
            seed: 0,
            tick_count: 0,
            language: default_language(),
        }
    }
}

impl GameState {
    /// Fresh state carrying the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Wipe everything back to a new-session state, keeping the seed.
    pub fn reset(&mut self) {
        *self = Self::with_seed(self.seed);
    }

    /// Current amount of a resource, defaulting to zero.
    #[must_use]
    pub fn resource(&self, id: &str) -> f64 {
        self.resources.get(id).copied().unwrap_or(0.0)
    }

    /// Storage cap for a resource; uncapped resources are unbounded.
    #[must_use]
    pub fn storage_cap(&self, id: &str) -> f64 {
        self.storage_caps.get(id).copied().unwrap_or(f64::INFINITY)
    }

    /// Add a (possibly negative) delta, clamping into `[0, cap]`.
    pub fn add_resource(&mut self, id: &str, delta: f64) {
        let cap = self.storage_cap(id);
        let entry = self.resources.entry(id.to_string()).or_insert(0.0);
        *entry = (*entry + delta).clamp(0.0, cap);
    }

    /// Remove up to `amount`, flooring at zero.
    pub fn drain_resource(&mut self, id: &str, amount: f64) {
        let entry = self.resources.entry(id.to_string()).or_insert(0.0);
        *entry = (*entry - amount).max(0.0);
    }

    /// Re-clamp every resource into `[0, cap]`.
    pub fn clamp_resources(&mut self) {
        for (id, amount) in &mut self.resources {
            let cap = self.storage_caps.get(id).copied().unwrap_or(f64::INFINITY);
            *amount = amount.clamp(0.0, cap);
        }
    }

    /// Level of a building (0 when unowned).
    #[must_use]
    pub fn building_level(&self, id: &str) -> u32 {
        self.buildings.get(id).copied().unwrap_or(0)
    }

    /// The daemon currently fielded in combat, if any.
    #[must_use]
    pub fn active_daemon(&self) -> Option<&Daemon> {
        self.daemons.get(self.active_daemon_index)
    }
}
