//! Centralized balance and tuning constants for Cybergrid game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "CYBERGRID_DEBUG_LOGS";
pub(crate) const LOG_DUNGEON_COLLISION: &str = "log.dungeon.collision";
pub(crate) const LOG_DUNGEON_INFO: &str = "log.dungeon.info";
pub(crate) const LOG_DUNGEON_QUEST: &str = "log.dungeon.quest";
pub(crate) const LOG_DUNGEON_LOOT: &str = "log.dungeon.loot";
pub(crate) const LOG_DUNGEON_ENEMY: &str = "log.dungeon.enemy";
pub(crate) const LOG_DUNGEON_EXIT: &str = "log.dungeon.exit";

// Economy ------------------------------------------------------------------
pub(crate) const ENERGY_RESOURCE: &str = "energy";
pub(crate) const GATHER_ENERGY_ACTION: &str = "gather_energy";
pub(crate) const GATHER_ENERGY_AMOUNT: f64 = 1.0;
/// Random events are evaluated once per this many accumulated ticks.
pub(crate) const RANDOM_EVENT_INTERVAL_TICKS: u64 = 60;
pub(crate) const DEFAULT_COST_MULTIPLIER: f64 = 1.5;
pub(crate) const DEFAULT_EVENT_WEIGHT: u32 = 1;
pub(crate) const DEFAULT_STORAGE_CAP: f64 = 100.0;

// Daemons ------------------------------------------------------------------
pub(crate) const XP_CURVE_BASE: f64 = 100.0;
pub(crate) const XP_CURVE_EXPONENT: f64 = 1.5;
pub(crate) const SP_PER_LEVEL: i64 = 1;
pub(crate) const MAX_EQUIPPED_SKILLS: usize = 4;

// Dungeon ------------------------------------------------------------------
pub(crate) const DUNGEON_WIDTH: usize = 20;
pub(crate) const DUNGEON_HEIGHT: usize = 10;
/// Extra walk steps granted per dungeon level.
pub(crate) const WALK_STEPS_PER_LEVEL: usize = 2;
pub(crate) const INFO_MARKERS: usize = 2;
pub(crate) const QUEST_MARKERS: usize = 2;
pub(crate) const LOOT_MARKERS: usize = 3;
pub(crate) const ENEMY_MARKERS: usize = 3;

// Combat -------------------------------------------------------------------
pub(crate) const ENEMY_BASE_HP: f64 = 50.0;
pub(crate) const ENEMY_HP_PER_LEVEL: f64 = 20.0;
pub(crate) const ENEMY_BASE_INTRUSION: f64 = 5.0;
pub(crate) const ENEMY_INTRUSION_PER_LEVEL: f64 = 3.0;
pub(crate) const ENEMY_BASE_SPEED: f64 = 5.0;
pub(crate) const ENEMY_SPEED_PER_LEVEL: f64 = 2.0;
/// Player hp when no daemon is active.
pub(crate) const FALLBACK_PLAYER_HP: f64 = 50.0;
pub(crate) const BANDWIDTH_MAX: i32 = 100;
pub(crate) const ATTACK_BW_COST: i32 = 20;
/// Refund applied when a basic attack is attempted without bandwidth.
pub(crate) const CHOKED_ATTACK_BW_REFUND: i32 = 40;
pub(crate) const DEFEND_BW_GAIN: i32 = 20;
pub(crate) const RESET_BW_GAIN: i32 = 50;
/// Skill that drains all remaining bandwidth as a side effect.
pub(crate) const KERNEL_PANIC_SKILL: &str = "kernel_panic";
pub(crate) const VICTORY_XP_BASE: i64 = 20;
pub(crate) const VICTORY_XP_PER_LEVEL: i64 = 5;
pub(crate) const CAPTURE_CHANCE: f64 = 0.15;
pub(crate) const DEFEAT_ENERGY_PENALTY: f64 = 30.0;
