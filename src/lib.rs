//! Cybergrid Game Engine
//!
//! Platform-agnostic core logic for the Cybergrid idle/RPG hybrid.
//! This crate provides all game mechanics without UI or platform-specific
//! dependencies; shells supply data loading and persistence through the
//! [`DataLoader`] and [`GameStorage`] traits.

pub mod combat;
pub mod constants;
pub mod daemon;
pub mod data;
pub mod dungeon;
pub mod economy;
pub mod error;
pub mod numbers;
pub mod quest;
pub mod rng;
pub mod save;
pub mod session;
pub mod state;
pub mod story;

// Re-export commonly used types
pub use combat::{
    CombatEngine, CombatLogEntry, CombatObserver, CombatSnapshot, Enemy, IntentId,
};
pub use daemon::{Daemon, DaemonManager, StatBlock, xp_requirement};
pub use data::{
    BuildingDef, DaemonDef, DataError, EventDef, GameData, QuestDef, QuestKind, ResourceDef,
    SkillDef, SkillKind, StoryChoice, StoryNodeDef,
};
pub use dungeon::{Cell, DungeonEngine, DungeonEventKind, MoveOutcome};
pub use economy::Economy;
pub use error::{ErrorClass, GameError};
pub use quest::{Quest, QuestManager};
pub use rng::RngBundle;
pub use save::{SAVE_PREFIX, SaveError, export_save, import_save};
pub use session::GameSession;
pub use state::GameState;
pub use story::StoryManager;

use std::rc::Rc;

/// Trait for abstracting definition loading
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the game definition document from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded or parsed.
    fn load_game_data(&self) -> Result<GameData, Self::Error>;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error>;

    /// Load game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine for managing game instances
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Start a fresh session from the given run seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded or fail
    /// referential validation.
    pub fn create_session(&self, seed: u64) -> Result<GameSession, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let data = self.data_loader.load_game_data().map_err(Into::into)?;
        data.validate()?;
        Ok(GameSession::new(Rc::new(data), seed))
    }

    /// Save a session's state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, session: &GameSession) -> Result<(), S::Error> {
        self.storage.save_game(save_name, session.state())
    }

    /// Load a saved session, rehydrating it with fresh definitions
    ///
    /// # Errors
    ///
    /// Returns an error if the game state or definitions cannot be loaded.
    pub fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(game_state) = self.storage.load_game(save_name).map_err(Into::into)? {
            let data = self.data_loader.load_game_data().map_err(Into::into)?;
            data.validate()?;
            Ok(Some(GameSession::from_state(Rc::new(data), game_state)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_game_data(&self) -> Result<GameData, Self::Error> {
            Ok(GameData::empty())
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, GameState>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), game_state.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_sessions() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::default());
        let mut session = engine.create_session(0xABCD).unwrap();
        session.state_mut().story_flags.push("booted".into());
        session.tick(1.0);
        engine.save_game("slot-one", &session).unwrap();

        let loaded = engine.load_session("slot-one").unwrap().expect("save exists");
        assert_eq!(loaded.state(), session.state());
        assert_eq!(loaded.state().seed, 0xABCD);
        assert!(engine.load_session("missing-slot").unwrap().is_none());
    }
}
