use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invitation already exists from {from} to {to}")]
    DuplicateInvitation { from: String, to: String },

    #[error("Feedback already submitted by {username} for session {session_id}")]
    AlreadySubmitted { session_id: u64, username: String },

    #[error("Session {0} is not completed")]
    SessionNotCompleted(u64),

    #[error("{username} is not a participant of {what}")]
    NotParticipant { username: String, what: String },

    #[error("Invalid rating: {0} (expected 1-5)")]
    InvalidRating(u8),

    #[error("Message body is empty")]
    EmptyBody,

    #[error("{0} cannot pair with themselves")]
    SamePerson(String),

    #[error("{user} and {other} are not study buddies")]
    NotBuddy { user: String, other: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<std::io::Error> for BuddyError {
    fn from(err: std::io::Error) -> Self {
        BuddyError::StoreUnavailable(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for BuddyError {
    fn from(err: serde_json::Error) -> Self {
        BuddyError::StoreUnavailable(format!("Serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, BuddyError>;
