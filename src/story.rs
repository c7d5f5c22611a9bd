//! Branching story graph traversal and choice side effects.

use std::rc::Rc;

use crate::data::{GameData, StoryNodeDef};
use crate::error::GameError;
use crate::quest::QuestManager;
use crate::state::GameState;

/// Traverses the directed graph of narrative nodes.
#[derive(Debug, Clone)]
pub struct StoryManager {
    data: Rc<GameData>,
}

impl StoryManager {
    #[must_use]
    pub fn new(data: Rc<GameData>) -> Self {
        Self { data }
    }

    /// Definition of the node the state currently points at.
    #[must_use]
    pub fn current_node<'a>(&'a self, state: &GameState) -> Option<&'a StoryNodeDef> {
        self.data.story.get(&state.current_story_node)
    }

    /// Resolve a choice on the current node.
    ///
    /// Requirements gate the choice; they are deducted only when the
    /// choice is flagged consuming. On success the reward deltas apply
    /// (negatives drain, floored at zero), a linked quest is accepted,
    /// and the current node moves when a target is present.
    ///
    /// # Errors
    ///
    /// `NotFound` when the current node is unknown or lacks the choice,
    /// `ChoiceUnavailable` when a resource requirement is unmet.
    pub fn trigger_choice(
        &self,
        state: &mut GameState,
        quests: &QuestManager,
        choice_id: &str,
    ) -> Result<(), GameError> {
        let node = self
            .data
            .story
            .get(&state.current_story_node)
            .ok_or_else(|| GameError::NotFound {
                kind: "story node",
                id: state.current_story_node.clone(),
            })?;
        let choice = node.actions.get(choice_id).ok_or_else(|| GameError::NotFound {
            kind: "choice",
            id: choice_id.to_string(),
        })?;
        let affordable = choice
            .requirements
            .iter()
            .all(|(res, amount)| state.resource(res) >= *amount);
        if !affordable {
            return Err(GameError::ChoiceUnavailable(choice_id.to_string()));
        }

        if let Some(quest_id) = &choice.quest_id {
            quests.accept(state, quest_id);
        }
        for (res, delta) in &choice.reward {
            state.add_resource(res, *delta);
        }
        if choice.consume {
            for (res, amount) in &choice.requirements {
                state.drain_resource(res, *amount);
            }
        }
        if let Some(next) = &choice.next_node {
            state.current_story_node = next.clone();
        }
        Ok(())
    }

    /// Whether every resource requirement of a node is currently met.
    #[must_use]
    pub fn check_availability(&self, state: &GameState, node_id: &str) -> bool {
        let Some(node) = self.data.story.get(node_id) else {
            return false;
        };
        node.requirements
            .iter()
            .all(|(res, amount)| state.resource(res) >= *amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{QuestDef, QuestKind, StoryChoice};
    use std::collections::BTreeMap;

    fn fixture_data() -> Rc<GameData> {
        let mut data = GameData::empty();
        data.quests.insert(
            "first_purge".into(),
            QuestDef {
                kind: QuestKind::Combat,
                target_id: None,
                target_amount: 1.0,
                reward: BTreeMap::new(),
                name: "quest.first-purge".into(),
                desc: String::new(),
            },
        );
        data.story.insert(
            "start".into(),
            StoryNodeDef {
                text: "node.start".into(),
                requirements: BTreeMap::new(),
                actions: BTreeMap::from([
                    (
                        "boot".into(),
                        StoryChoice {
                            label: "choice.boot".into(),
                            reward: BTreeMap::from([("energy".into(), 10.0)]),
                            requirements: BTreeMap::new(),
                            consume: false,
                            next_node: Some("uplink".into()),
                            quest_id: Some("first_purge".into()),
                        },
                    ),
                    (
                        "bribe".into(),
                        StoryChoice {
                            label: "choice.bribe".into(),
                            reward: BTreeMap::new(),
                            requirements: BTreeMap::from([("credits".into(), 20.0)]),
                            consume: true,
                            next_node: None,
                            quest_id: None,
                        },
                    ),
                    (
                        "overdraw".into(),
                        StoryChoice {
                            label: "choice.overdraw".into(),
                            reward: BTreeMap::from([("energy".into(), -40.0)]),
                            requirements: BTreeMap::new(),
                            consume: false,
                            next_node: None,
                            quest_id: None,
                        },
                    ),
                ]),
            },
        );
        data.story.insert(
            "uplink".into(),
            StoryNodeDef {
                text: "node.uplink".into(),
                requirements: BTreeMap::from([("energy".into(), 5.0)]),
                actions: BTreeMap::new(),
            },
        );
        Rc::new(data)
    }

    #[test]
    fn choice_applies_rewards_and_moves_node() {
        let data = fixture_data();
        let story = StoryManager::new(Rc::clone(&data));
        let quests = QuestManager::new(data);
        let mut state = GameState::default();

        story.trigger_choice(&mut state, &quests, "boot").unwrap();
        assert!((state.resource("energy") - 10.0).abs() < f64::EPSILON);
        assert_eq!(state.current_story_node, "uplink");
        assert_eq!(state.active_quests[0].id, "first_purge");
    }

    #[test]
    fn unknown_choice_is_a_typed_failure() {
        let data = fixture_data();
        let story = StoryManager::new(Rc::clone(&data));
        let quests = QuestManager::new(data);
        let mut state = GameState::default();
        assert!(matches!(
            story.trigger_choice(&mut state, &quests, "ghost"),
            Err(GameError::NotFound { kind: "choice", .. })
        ));
        assert_eq!(state.current_story_node, "start");
    }

    #[test]
    fn consuming_choice_deducts_requirements() {
        let data = fixture_data();
        let story = StoryManager::new(Rc::clone(&data));
        let quests = QuestManager::new(data);
        let mut state = GameState::default();
        state.resources.insert("credits".into(), 25.0);

        story.trigger_choice(&mut state, &quests, "bribe").unwrap();
        assert!((state.resource("credits") - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unmet_requirements_block_the_choice() {
        let data = fixture_data();
        let story = StoryManager::new(Rc::clone(&data));
        let quests = QuestManager::new(data);
        let mut state = GameState::default();
        state.resources.insert("credits".into(), 12.0);

        assert_eq!(
            story.trigger_choice(&mut state, &quests, "bribe"),
            Err(GameError::ChoiceUnavailable("bribe".into()))
        );
        assert!((state.resource("credits") - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_rewards_floor_at_zero() {
        let data = fixture_data();
        let story = StoryManager::new(Rc::clone(&data));
        let quests = QuestManager::new(data);
        let mut state = GameState::default();
        state.resources.insert("energy".into(), 25.0);

        story
            .trigger_choice(&mut state, &quests, "overdraw")
            .unwrap();
        assert!(state.resource("energy").abs() < f64::EPSILON);
    }

    #[test]
    fn availability_gates_on_requirements() {
        let data = fixture_data();
        let story = StoryManager::new(data);
        let mut state = GameState::default();
        assert!(!story.check_availability(&state, "uplink"));
        state.resources.insert("energy".into(), 5.0);
        assert!(story.check_availability(&state, "uplink"));
        assert!(!story.check_availability(&state, "phantom"));
    }
}
