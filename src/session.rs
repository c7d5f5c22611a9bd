//! Single-player session facade.
//!
//! Owns the full engine stack for one running game and routes driver
//! calls to the right subsystem, so a platform shell only ever talks to
//! [`GameSession`].

use std::rc::Rc;

use crate::combat::{CombatEngine, CombatObserver};
use crate::daemon::DaemonManager;
use crate::data::GameData;
use crate::dungeon::{DungeonEngine, DungeonEventKind, MoveOutcome};
use crate::economy::Economy;
use crate::error::GameError;
use crate::quest::QuestManager;
use crate::rng::{RngBundle, choice};
use crate::save::{self, SaveError};
use crate::state::GameState;
use crate::story::StoryManager;

const FALLBACK_ENEMY_KIND: &str = "watchdog";

/// One running game: state, deterministic rng streams, and every
/// subsystem manager, wired together.
pub struct GameSession {
    data: Rc<GameData>,
    state: GameState,
    rng: RngBundle,
    economy: Economy,
    daemons: DaemonManager,
    quests: QuestManager,
    story: StoryManager,
    dungeon: DungeonEngine,
    combat: CombatEngine,
}

impl GameSession {
    /// Start a fresh session from definitions and a run seed.
    #[must_use]
    pub fn new(data: Rc<GameData>, seed: u64) -> Self {
        Self::from_state(data, GameState::with_seed(seed))
    }

    /// Resume a session from a previously saved state.
    ///
    /// The rng bundle is rebuilt from the persisted seed and resource
    /// entries missing from older saves are seeded at zero.
    #[must_use]
    pub fn from_state(data: Rc<GameData>, mut state: GameState) -> Self {
        let economy = Economy::new(Rc::clone(&data));
        economy.initialize_resources(&mut state);
        let rng = RngBundle::from_seed(state.seed);
        Self {
            daemons: DaemonManager::new(Rc::clone(&data)),
            quests: QuestManager::new(Rc::clone(&data)),
            story: StoryManager::new(Rc::clone(&data)),
            dungeon: DungeonEngine::default(),
            combat: CombatEngine::new(Rc::clone(&data)),
            economy,
            data,
            state,
            rng,
        }
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[must_use]
    pub fn data(&self) -> &Rc<GameData> {
        &self.data
    }

    #[must_use]
    pub fn daemons(&self) -> &DaemonManager {
        &self.daemons
    }

    #[must_use]
    pub fn quests(&self) -> &QuestManager {
        &self.quests
    }

    #[must_use]
    pub fn dungeon(&self) -> &DungeonEngine {
        &self.dungeon
    }

    #[must_use]
    pub fn combat(&self) -> &CombatEngine {
        &self.combat
    }

    pub fn subscribe_combat(&mut self, observer: Box<dyn CombatObserver>) {
        self.combat.subscribe(observer);
    }

    /// Advance the idle economy by `delta` seconds.
    ///
    /// Returns the description of a random event when one fires.
    pub fn tick(&mut self, delta: f64) -> Option<String> {
        let event = self.economy.tick(&mut self.state, &self.rng, delta);
        self.quests.refresh_collect(&mut self.state);
        event
    }

    /// Run a manual action such as `gather_energy`.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown action ids.
    pub fn perform_action(&mut self, action_id: &str) -> Result<(), GameError> {
        self.economy.perform_action(&mut self.state, action_id)
    }

    /// Construct one level of a building, spending its cost.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown buildings, `InsufficientResources` when
    /// any cost component is short (nothing is spent in that case).
    pub fn build(&mut self, building_id: &str) -> Result<u32, GameError> {
        self.economy.build(&mut self.state, building_id)
    }

    pub fn learn_skill(&mut self, skill_id: &str) -> Result<(), GameError> {
        let index = self.state.active_daemon_index;
        self.daemons.learn_skill(&mut self.state, index, skill_id)
    }

    pub fn equip_skill(&mut self, skill_id: &str) -> Result<(), GameError> {
        let index = self.state.active_daemon_index;
        self.daemons.equip_skill(&mut self.state, index, skill_id)
    }

    /// Switch which roster daemon fights and learns skills.
    ///
    /// # Errors
    ///
    /// `NotFound` when the index is outside the roster.
    pub fn set_active_daemon(&mut self, index: usize) -> Result<(), GameError> {
        if index >= self.state.daemons.len() {
            return Err(GameError::NotFound {
                kind: "daemon",
                id: index.to_string(),
            });
        }
        self.state.active_daemon_index = index;
        Ok(())
    }

    pub fn accept_quest(&mut self, quest_id: &str) -> bool {
        self.quests.accept(&mut self.state, quest_id)
    }

    pub fn claim_quest_reward(
        &mut self,
        quest_id: &str,
    ) -> Result<std::collections::BTreeMap<String, f64>, GameError> {
        self.quests.claim_reward(&mut self.state, quest_id)
    }

    pub fn trigger_story_choice(&mut self, choice_id: &str) -> Result<(), GameError> {
        self.story
            .trigger_choice(&mut self.state, &self.quests, choice_id)
    }

    /// Definition of the story node the session currently sits on.
    #[must_use]
    pub fn story_node(&self) -> Option<&crate::data::StoryNodeDef> {
        self.story.current_node(&self.state)
    }

    /// Generate a dungeon floor at the given depth.
    pub fn enter_dungeon(&mut self, level: u32) {
        self.dungeon.generate_level(level, &self.rng);
    }

    /// Move in the dungeon.
    ///
    /// Enemy markers flip the session into an encounter at the dungeon's
    /// depth, exit markers descend one level, and quest hooks push the
    /// current depth into exploration quests. Info and loot markers are
    /// reported unchanged for the shell to resolve.
    pub fn dungeon_move(&mut self, dx: i32, dy: i32) -> MoveOutcome {
        let outcome = self.dungeon.move_player(dx, dy);
        match outcome {
            MoveOutcome::Event(DungeonEventKind::Enemy) => {
                let kind = {
                    let ids: Vec<&String> = self.data.daemons.keys().collect();
                    choice(&mut *self.rng.combat(), &ids)
                        .map_or_else(|| FALLBACK_ENEMY_KIND.to_string(), |id| (*id).clone())
                };
                self.combat
                    .start_combat(&self.state, &kind, self.dungeon.current_level(), &self.rng);
            }
            MoveOutcome::Event(DungeonEventKind::Exit) => {
                let next = self.dungeon.current_level() + 1;
                self.dungeon.generate_level(next, &self.rng);
                self.quests.update_progress(
                    &mut self.state,
                    crate::data::QuestKind::Explore,
                    None,
                    f64::from(next),
                );
            }
            MoveOutcome::Event(DungeonEventKind::Quest) => {
                self.quests.update_progress(
                    &mut self.state,
                    crate::data::QuestKind::Explore,
                    None,
                    f64::from(self.dungeon.current_level()),
                );
            }
            _ => {}
        }
        outcome
    }

    /// Run one combat round for the given player action.
    ///
    /// # Errors
    ///
    /// Any [`GameError`] the combat engine reports; round-free failures
    /// leave the encounter untouched.
    pub fn combat_action(&mut self, action_id: &str) -> Result<(), GameError> {
        self.combat.execute_player_action(
            &mut self.state,
            &self.daemons,
            &self.quests,
            &self.rng,
            action_id,
        )
    }

    /// Export the current state as a portable save string.
    ///
    /// # Errors
    ///
    /// Only if state serialization itself fails.
    pub fn export_save(&self) -> Result<String, SaveError> {
        save::export_save(&self.state)
    }

    /// Replace this session's state from a save string.
    ///
    /// # Errors
    ///
    /// [`SaveError`] when the string is malformed; the current state is
    /// untouched on failure.
    pub fn import_save(&mut self, encoded: &str) -> Result<(), SaveError> {
        let state = save::import_save(encoded)?;
        *self = Self::from_state(Rc::clone(&self.data), state);
        Ok(())
    }
}
