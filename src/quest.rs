//! Quest tracking: acceptance, category-driven progress, one-shot rewards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::data::{GameData, QuestKind};
use crate::error::GameError;
use crate::state::GameState;

/// An accepted quest instance. Claimed quests leave the active list and
/// are not retained for history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    /// Semantics depend on the definition kind: absolute resource amount
    /// for collect quests, accumulated count for combat, high-water mark
    /// for explore.
    pub progress: f64,
    pub completed: bool,
    pub claimed: bool,
}

/// Tracks accepted quests against the definition table.
#[derive(Debug, Clone)]
pub struct QuestManager {
    data: Rc<GameData>,
}

impl QuestManager {
    #[must_use]
    pub fn new(data: Rc<GameData>) -> Self {
        Self { data }
    }

    /// Accept a quest by id. Returns `false` (no mutation) when the id is
    /// unknown or the quest is already active.
    ///
    /// Collect quests seed initial progress from the current resource
    /// amount, so they track the absolute amount rather than net gain.
    pub fn accept(&self, state: &mut GameState, quest_id: &str) -> bool {
        let Some(def) = self.data.quests.get(quest_id) else {
            return false;
        };
        if state.active_quests.iter().any(|q| q.id == quest_id) {
            return false;
        }
        let progress = match (&def.kind, &def.target_id) {
            (QuestKind::Collect, Some(target)) => state.resource(target),
            _ => 0.0,
        };
        state.active_quests.push(Quest {
            id: quest_id.to_string(),
            progress,
            completed: progress >= def.target_amount,
            claimed: false,
        });
        true
    }

    /// Advance every active quest matching the given category.
    ///
    /// Collect sets progress to the tracked resource's current amount,
    /// combat accumulates, explore keeps a monotone high-water mark.
    /// Returns whether anything changed.
    pub fn update_progress(
        &self,
        state: &mut GameState,
        kind: QuestKind,
        target_id: Option<&str>,
        amount: f64,
    ) -> bool {
        let mut changed = false;
        let resources = &state.resources;
        for quest in &mut state.active_quests {
            if quest.completed || quest.claimed {
                continue;
            }
            let Some(def) = self.data.quests.get(&quest.id) else {
                continue;
            };
            if def.kind != kind {
                continue;
            }
            match kind {
                QuestKind::Collect => {
                    if target_id.is_some() && target_id == def.target_id.as_deref() {
                        let current = def
                            .target_id
                            .as_deref()
                            .and_then(|t| resources.get(t))
                            .copied()
                            .unwrap_or(0.0);
                        quest.progress = current;
                        changed = true;
                    }
                }
                QuestKind::Combat => {
                    quest.progress += amount;
                    changed = true;
                }
                QuestKind::Explore => {
                    quest.progress = quest.progress.max(amount);
                    changed = true;
                }
            }
            if quest.progress >= def.target_amount {
                quest.completed = true;
                changed = true;
            }
        }
        changed
    }

    /// Re-sync every active collect quest with its tracked resource.
    ///
    /// Meant to run once per tick so stockpile changes from any source
    /// count toward collection targets.
    pub fn refresh_collect(&self, state: &mut GameState) {
        let resources = &state.resources;
        for quest in &mut state.active_quests {
            if quest.completed || quest.claimed {
                continue;
            }
            if let Some(def) = self.data.quests.get(&quest.id)
                && def.kind == QuestKind::Collect
            {
                quest.progress = def
                    .target_id
                    .as_deref()
                    .and_then(|t| resources.get(t))
                    .copied()
                    .unwrap_or(0.0);
                if quest.progress >= def.target_amount {
                    quest.completed = true;
                }
            }
        }
    }

    /// Issue a completed quest's rewards exactly once.
    ///
    /// On success the rewards are added to the pool (cap-clamped), the
    /// quest leaves the active list, and the reward mapping is returned.
    ///
    /// # Errors
    ///
    /// `QuestNotClaimable` when the quest is unknown, incomplete, or
    /// already claimed.
    pub fn claim_reward(
        &self,
        state: &mut GameState,
        quest_id: &str,
    ) -> Result<BTreeMap<String, f64>, GameError> {
        let position = state
            .active_quests
            .iter()
            .position(|q| q.id == quest_id && q.completed && !q.claimed)
            .ok_or_else(|| GameError::QuestNotClaimable(quest_id.to_string()))?;
        let def = self
            .data
            .quests
            .get(quest_id)
            .ok_or_else(|| GameError::QuestNotClaimable(quest_id.to_string()))?;

        for (res, amount) in &def.reward {
            state.add_resource(res, *amount);
        }
        state.active_quests.remove(position);
        Ok(def.reward.clone())
    }
}
