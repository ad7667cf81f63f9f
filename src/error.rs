// Error types surfaced by the creature AI engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    /// The inbound room snapshot violates a structural rule
    /// (dimensions, layer sizes, unaligned positions).
    #[error("invalid room '{room}': {reason}")]
    InvalidRoom { room: String, reason: String },

    #[error("no AI registered for room '{0}'")]
    RoomNotFound(String),

    #[error("creature '{0}' is not in the room")]
    CreatureMissing(String),

    #[error("player {0} is not in the room")]
    PlayerMissing(u32),

    /// An attack named a participant that has already left the room.
    #[error("attack target '{0}' is not in the room")]
    TargetMissing(String),

    #[error("failed to parse room snapshot")]
    Json(#[from] serde_json::Error),

    #[error("failed to read room file")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub(crate) fn invalid_room(room: &str, reason: impl Into<String>) -> Self {
        AiError::InvalidRoom {
            room: room.to_string(),
            reason: reason.into(),
        }
    }
}
