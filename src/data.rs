//! Definition records consumed as pre-parsed structured data.
//!
//! The surrounding platform owns file/asset transport; this module owns the
//! shapes, the defaults for optional fields, and load-time validation of
//! cross-references so that lookups during play cannot dangle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constants::{DEFAULT_COST_MULTIPLIER, DEFAULT_EVENT_WEIGHT, DEFAULT_STORAGE_CAP};
use crate::daemon::StatBlock;

/// A resource that the economy can generate and store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDef {
    /// Passive generation rate per second, if any.
    #[serde(default)]
    pub auto_gen: Option<f64>,
    /// Storage ceiling before building bonuses.
    #[serde(default = "default_storage_cap")]
    pub base_cap: f64,
}

impl Default for ResourceDef {
    fn default() -> Self {
        Self {
            auto_gen: None,
            base_cap: default_storage_cap(),
        }
    }
}

fn default_storage_cap() -> f64 {
    DEFAULT_STORAGE_CAP
}

/// Per-level effects contributed by a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BuildingEffects {
    #[serde(default)]
    pub auto_gen: BTreeMap<String, f64>,
    #[serde(default)]
    pub consume: BTreeMap<String, f64>,
    #[serde(default)]
    pub storage: BTreeMap<String, f64>,
}

/// A purchasable, levelable building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: String,
    /// Base cost per resource for the first level.
    pub cost: BTreeMap<String, f64>,
    /// Geometric growth applied to the cost per owned level.
    #[serde(default = "default_cost_multiplier")]
    pub cost_multiplier: f64,
    #[serde(default)]
    pub effects: BuildingEffects,
    #[serde(default)]
    pub category: String,
}

fn default_cost_multiplier() -> f64 {
    DEFAULT_COST_MULTIPLIER
}

/// A weighted random event evaluated by the economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    /// Resource thresholds that must all be met for candidacy.
    #[serde(default)]
    pub requirements: BTreeMap<String, f64>,
    /// Resource deltas applied on trigger; negatives drain.
    #[serde(default)]
    pub effect: BTreeMap<String, f64>,
    #[serde(default = "default_event_weight")]
    pub weight: u32,
    pub description: String,
}

fn default_event_weight() -> u32 {
    DEFAULT_EVENT_WEIGHT
}

/// Whether a skill occupies a combat slot or applies passively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    #[default]
    Active,
    Passive,
}

/// One node of a daemon's skill tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    pub sp_cost: i64,
    /// Damage multiplier against the daemon's intrusion stat.
    #[serde(default = "default_skill_power")]
    pub power: f64,
    /// Bandwidth consumed when used in combat.
    #[serde(default)]
    pub bw_cost: i32,
    /// Prerequisite skill id within the same tree.
    #[serde(default)]
    pub req: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: SkillKind,
    #[serde(default)]
    pub desc: String,
}

fn default_skill_power() -> f64 {
    1.0
}

/// Definition of a capturable daemon archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonDef {
    pub name: String,
    pub base_stats: StatBlock,
    pub growth: StatBlock,
    #[serde(default)]
    pub skill_tree: Vec<SkillDef>,
}

impl DaemonDef {
    /// Look up a skill node by id.
    #[must_use]
    pub fn skill(&self, skill_id: &str) -> Option<&SkillDef> {
        self.skill_tree.iter().find(|s| s.id == skill_id)
    }
}

/// Progress category of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestKind {
    Collect,
    Combat,
    Explore,
}

/// A quest template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDef {
    #[serde(rename = "type")]
    pub kind: QuestKind,
    /// Resource tracked by collect quests.
    #[serde(default)]
    pub target_id: Option<String>,
    pub target_amount: f64,
    #[serde(default)]
    pub reward: BTreeMap<String, f64>,
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

/// One selectable choice on a story node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryChoice {
    pub label: String,
    /// Resource deltas applied when chosen; negatives drain.
    #[serde(default)]
    pub reward: BTreeMap<String, f64>,
    /// Resource gates for showing/consuming this choice.
    #[serde(default)]
    pub requirements: BTreeMap<String, f64>,
    /// When set, requirements are deducted rather than merely checked.
    #[serde(default)]
    pub consume: bool,
    #[serde(default)]
    pub next_node: Option<String>,
    /// Quest accepted as a side effect of the choice.
    #[serde(default)]
    pub quest_id: Option<String>,
}

/// A node of the branching story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryNodeDef {
    pub text: String,
    #[serde(default)]
    pub requirements: BTreeMap<String, f64>,
    #[serde(default)]
    pub actions: BTreeMap<String, StoryChoice>,
}

/// Validation failure raised while ingesting definition data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("daemon `{daemon}` skill `{skill}` requires unknown skill `{prereq}`")]
    DanglingSkillPrereq {
        daemon: String,
        skill: String,
        prereq: String,
    },
    #[error("story node `{node}` choice `{choice}` points at unknown node `{target}`")]
    DanglingStoryNode {
        node: String,
        choice: String,
        target: String,
    },
    #[error("story node `{node}` choice `{choice}` accepts unknown quest `{quest}`")]
    DanglingQuest {
        node: String,
        choice: String,
        quest: String,
    },
    #[error("collect quest `{quest}` tracks unknown resource `{resource}`")]
    DanglingQuestTarget { quest: String, resource: String },
    #[error("collect quest `{0}` has no target resource")]
    MissingQuestTarget(String),
}

/// Container for every definition table the core consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameData {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
    #[serde(default)]
    pub buildings: BTreeMap<String, BuildingDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub daemons: BTreeMap<String, DaemonDef>,
    #[serde(default)]
    pub quests: BTreeMap<String, QuestDef>,
    #[serde(default)]
    pub story: BTreeMap<String, StoryNodeDef>,
}

impl GameData {
    /// Create empty definition data (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the full definition bundle from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid definitions.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check every cross-reference the tables carry.
    ///
    /// # Errors
    ///
    /// Returns the first dangling reference encountered.
    pub fn validate(&self) -> Result<(), DataError> {
        for (daemon_id, daemon) in &self.daemons {
            for skill in &daemon.skill_tree {
                if let Some(prereq) = &skill.req
                    && daemon.skill(prereq).is_none()
                {
                    return Err(DataError::DanglingSkillPrereq {
                        daemon: daemon_id.clone(),
                        skill: skill.id.clone(),
                        prereq: prereq.clone(),
                    });
                }
            }
        }
        for (node_id, node) in &self.story {
            for (choice_id, choice) in &node.actions {
                if let Some(target) = &choice.next_node
                    && !self.story.contains_key(target)
                {
                    return Err(DataError::DanglingStoryNode {
                        node: node_id.clone(),
                        choice: choice_id.clone(),
                        target: target.clone(),
                    });
                }
                if let Some(quest) = &choice.quest_id
                    && !self.quests.contains_key(quest)
                {
                    return Err(DataError::DanglingQuest {
                        node: node_id.clone(),
                        choice: choice_id.clone(),
                        quest: quest.clone(),
                    });
                }
            }
        }
        for (quest_id, quest) in &self.quests {
            if quest.kind == QuestKind::Collect {
                let Some(target) = &quest.target_id else {
                    return Err(DataError::MissingQuestTarget(quest_id.clone()));
                };
                if !self.resources.contains_key(target) {
                    return Err(DataError::DanglingQuestTarget {
                        quest: quest_id.clone(),
                        resource: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
