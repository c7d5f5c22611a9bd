//! Save-string codec: the whole [`GameState`] as JSON, base64-encoded
//! behind a fixed `CYBER-` prefix so pasted strings are recognizable.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::error::ErrorClass;
use crate::state::GameState;

/// Marker prepended to every exported save string.
pub const SAVE_PREFIX: &str = "CYBER-";

/// Reasons an imported save string is rejected. All malformed-input.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save string does not start with {SAVE_PREFIX}")]
    BadPrefix,
    #[error("save payload is not valid base64: {0}")]
    BadBase64(#[from] base64::DecodeError),
    #[error("save payload is not a valid state document: {0}")]
    BadJson(#[from] serde_json::Error),
}

impl SaveError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::MalformedInput
    }
}

/// Serialize the state into a prefixed, base64-wrapped JSON string.
///
/// # Errors
///
/// Only if JSON serialization itself fails, which a well-formed state
/// never does.
pub fn export_save(state: &GameState) -> Result<String, SaveError> {
    let json = serde_json::to_string(state)?;
    Ok(format!("{SAVE_PREFIX}{}", STANDARD.encode(json)))
}

/// Parse a save string produced by [`export_save`].
///
/// Fields absent from the payload fall back to their defaults, so saves
/// from older revisions keep loading.
///
/// # Errors
///
/// [`SaveError`] when the prefix, base64 payload, or JSON document is
/// malformed.
pub fn import_save(encoded: &str) -> Result<GameState, SaveError> {
    let payload = encoded
        .strip_prefix(SAVE_PREFIX)
        .ok_or(SaveError::BadPrefix)?;
    let bytes = STANDARD.decode(payload.trim())?;
    let state = serde_json::from_slice(&bytes)?;
    Ok(state)
}
