//! Typed failure modes for player-initiated operations.
//!
//! Nothing in the core is fatal: every failure maps to one of three
//! recovery classes (`NotFound`, `InvalidState`, `MalformedInput`) and
//! performs no mutation on the error path.

use thiserror::Error;

/// Recovery class of a [`GameError`], mirrored by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// An unknown id was referenced.
    NotFound,
    /// Preconditions for the operation were not met.
    InvalidState,
    /// External payload could not be parsed.
    MalformedInput,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("unknown {kind} id `{id}`")]
    NotFound { kind: &'static str, id: String },
    #[error("skill `{0}` already learned")]
    AlreadyLearned(String),
    #[error("insufficient sp: need {need}, have {have}")]
    InsufficientSp { need: i64, have: i64 },
    #[error("prerequisite skill `{skill}` not learned")]
    PrerequisiteMissing { skill: String },
    #[error("skill `{0}` not learned")]
    NotLearned(String),
    #[error("skill `{0}` already equipped")]
    AlreadyEquipped(String),
    #[error("all skill slots are occupied")]
    SlotsFull,
    #[error("insufficient `{resource}`: need {need}")]
    InsufficientResources { resource: String, need: f64 },
    #[error("insufficient bandwidth: need {need}, have {have}")]
    InsufficientBandwidth { need: i32, have: i32 },
    #[error("no combat in progress")]
    CombatInactive,
    #[error("no active daemon in the roster")]
    NoActiveDaemon,
    #[error("quest `{0}` is not claimable")]
    QuestNotClaimable(String),
    #[error("choice `{0}` requirements are not met")]
    ChoiceUnavailable(String),
}

impl GameError {
    /// Classify the error for the caller's recovery policy.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            _ => ErrorClass::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_taxonomy() {
        let missing = GameError::NotFound {
            kind: "daemon",
            id: "ghost".into(),
        };
        assert_eq!(missing.class(), ErrorClass::NotFound);
        assert_eq!(GameError::SlotsFull.class(), ErrorClass::InvalidState);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = GameError::InsufficientResources {
            resource: "credits".into(),
            need: 12.5,
        };
        assert!(err.to_string().contains("credits"));
    }
}
