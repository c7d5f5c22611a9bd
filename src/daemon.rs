//! Daemon roster management: creation, leveling curve, skill tree rules.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::rc::Rc;

use crate::constants::{MAX_EQUIPPED_SKILLS, SP_PER_LEVEL, XP_CURVE_BASE, XP_CURVE_EXPONENT};
use crate::data::{GameData, SkillKind};
use crate::error::GameError;
use crate::numbers::{floor_f64_to_i64, u32_to_f64};
use crate::state::GameState;

/// Derived combat statistics of a daemon.
///
/// Stats are recomputed from `base + (level - 1) * growth` on every level
/// or skill change and are never hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StatBlock {
    /// Doubles as player hp in combat.
    #[serde(default)]
    pub stability: f64,
    /// Attack power.
    #[serde(default)]
    pub intrusion: f64,
    #[serde(default)]
    pub speed: f64,
}

impl StatBlock {
    /// Scale growth by a level delta and add onto a base block.
    #[must_use]
    pub fn scaled(base: Self, growth: Self, level: u32) -> Self {
        let steps = u32_to_f64(level.saturating_sub(1));
        Self {
            stability: base.stability + steps * growth.stability,
            intrusion: base.intrusion + steps * growth.intrusion,
            speed: base.speed + steps * growth.speed,
        }
    }
}

/// Compact slot list; four skills fit inline without allocation.
pub type EquippedSkills = SmallVec<[String; 4]>;

/// A player-controlled unit owned by the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daemon {
    /// Definition id this daemon was created from.
    pub id: String,
    pub name: String,
    pub level: u32,
    pub xp: i64,
    pub xp_to_next: i64,
    /// Spendable skill points.
    pub sp: i64,
    /// Lifetime skill points, kept for the UI.
    pub total_sp: i64,
    pub stats: StatBlock,
    /// Monotonically growing set of unlocked skill ids.
    pub learned_skills: Vec<String>,
    /// Combat loadout; always a subset of `learned_skills`, at most four.
    pub equipped_skills: EquippedSkills,
}

impl Daemon {
    #[must_use]
    pub fn has_learned(&self, skill_id: &str) -> bool {
        self.learned_skills.iter().any(|s| s == skill_id)
    }

    #[must_use]
    pub fn has_equipped(&self, skill_id: &str) -> bool {
        self.equipped_skills.iter().any(|s| s == skill_id)
    }
}

/// Experience required to leave the given level: `floor(100 * level^1.5)`.
#[must_use]
pub fn xp_requirement(level: u32) -> i64 {
    floor_f64_to_i64(XP_CURVE_BASE * u32_to_f64(level).powf(XP_CURVE_EXPONENT))
}

/// Owns daemon creation and progression rules against the definition tables.
#[derive(Debug, Clone)]
pub struct DaemonManager {
    data: Rc<GameData>,
}

impl DaemonManager {
    #[must_use]
    pub fn new(data: Rc<GameData>) -> Self {
        Self { data }
    }

    /// Instantiate a daemon from a definition at the given level.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the definition id is unknown.
    pub fn create(&self, daemon_id: &str, level: u32) -> Result<Daemon, GameError> {
        let def = self.data.daemons.get(daemon_id).ok_or(GameError::NotFound {
            kind: "daemon",
            id: daemon_id.to_string(),
        })?;
        let level = level.max(1);
        Ok(Daemon {
            id: daemon_id.to_string(),
            name: def.name.clone(),
            level,
            xp: 0,
            xp_to_next: xp_requirement(level),
            sp: 0,
            total_sp: 0,
            stats: StatBlock::scaled(def.base_stats, def.growth, level),
            learned_skills: Vec::new(),
            equipped_skills: EquippedSkills::new(),
        })
    }

    /// Grant experience, applying level-ups in a loop until `xp < xp_to_next`.
    ///
    /// Each level grants one skill point and recomputes the threshold and
    /// stats. Returns whether at least one level-up occurred.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the roster index is out of range.
    pub fn add_xp(
        &self,
        state: &mut GameState,
        index: usize,
        amount: i64,
    ) -> Result<bool, GameError> {
        let daemon = state.daemons.get_mut(index).ok_or(GameError::NotFound {
            kind: "daemon",
            id: index.to_string(),
        })?;
        let def = self.data.daemons.get(&daemon.id);
        daemon.xp += amount;

        let mut leveled_up = false;
        while daemon.xp >= daemon.xp_to_next {
            daemon.xp -= daemon.xp_to_next;
            daemon.level += 1;
            daemon.sp += SP_PER_LEVEL;
            daemon.total_sp += SP_PER_LEVEL;
            daemon.xp_to_next = xp_requirement(daemon.level);
            if let Some(def) = def {
                daemon.stats = StatBlock::scaled(def.base_stats, def.growth, daemon.level);
            }
            leveled_up = true;
        }
        Ok(leveled_up)
    }

    /// Unlock a skill, spending skill points.
    ///
    /// Active-kind skills are auto-equipped when a slot is free. Stats are
    /// recomputed afterward (reserved for passive bonuses).
    ///
    /// # Errors
    ///
    /// Checked in order: `NotFound`, `AlreadyLearned`, `InsufficientSp`,
    /// `PrerequisiteMissing`. No mutation happens on any error path.
    pub fn learn_skill(
        &self,
        state: &mut GameState,
        index: usize,
        skill_id: &str,
    ) -> Result<(), GameError> {
        let daemon = state.daemons.get_mut(index).ok_or(GameError::NotFound {
            kind: "daemon",
            id: index.to_string(),
        })?;
        let def = self.data.daemons.get(&daemon.id).ok_or(GameError::NotFound {
            kind: "daemon",
            id: daemon.id.clone(),
        })?;
        let skill = def.skill(skill_id).ok_or(GameError::NotFound {
            kind: "skill",
            id: skill_id.to_string(),
        })?;
        if daemon.has_learned(skill_id) {
            return Err(GameError::AlreadyLearned(skill_id.to_string()));
        }
        if daemon.sp < skill.sp_cost {
            return Err(GameError::InsufficientSp {
                need: skill.sp_cost,
                have: daemon.sp,
            });
        }
        if let Some(prereq) = &skill.req
            && !daemon.has_learned(prereq)
        {
            return Err(GameError::PrerequisiteMissing {
                skill: prereq.clone(),
            });
        }

        daemon.sp -= skill.sp_cost;
        daemon.learned_skills.push(skill_id.to_string());
        if skill.kind == SkillKind::Active && daemon.equipped_skills.len() < MAX_EQUIPPED_SKILLS {
            daemon.equipped_skills.push(skill_id.to_string());
        }
        daemon.stats = StatBlock::scaled(def.base_stats, def.growth, daemon.level);
        Ok(())
    }

    /// Mount a learned skill into a free combat slot.
    ///
    /// # Errors
    ///
    /// Fails with `NotLearned`, `AlreadyEquipped`, or `SlotsFull`.
    pub fn equip_skill(
        &self,
        state: &mut GameState,
        index: usize,
        skill_id: &str,
    ) -> Result<(), GameError> {
        let daemon = state.daemons.get_mut(index).ok_or(GameError::NotFound {
            kind: "daemon",
            id: index.to_string(),
        })?;
        if !daemon.has_learned(skill_id) {
            return Err(GameError::NotLearned(skill_id.to_string()));
        }
        if daemon.has_equipped(skill_id) {
            return Err(GameError::AlreadyEquipped(skill_id.to_string()));
        }
        if daemon.equipped_skills.len() >= MAX_EQUIPPED_SKILLS {
            return Err(GameError::SlotsFull);
        }
        daemon.equipped_skills.push(skill_id.to_string());
        Ok(())
    }
}
