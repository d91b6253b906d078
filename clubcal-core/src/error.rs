//! Error types for clubcal.

use thiserror::Error;

use crate::event::EventId;

/// Errors that can occur in clubcal operations.
#[derive(Error, Debug)]
pub enum ClubCalError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("No user is signed in")]
    AuthRequired,

    #[error("Sign-in rejected: {0}")]
    AuthRejected(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClubCalError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        ClubCalError::BackendUnavailable(err.to_string())
    }

    pub fn upload(err: impl std::fmt::Display) -> Self {
        ClubCalError::UploadFailure(err.to_string())
    }
}

impl From<serde_json::Error> for ClubCalError {
    fn from(err: serde_json::Error) -> Self {
        ClubCalError::Serialization(err.to_string())
    }
}

/// Result type alias for clubcal operations.
pub type ClubCalResult<T> = Result<T, ClubCalError>;
