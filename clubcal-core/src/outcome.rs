//! Results of user intents as the views see them.

use crate::constants::NO_REPORT_MESSAGE;
use crate::error::ClubCalError;

/// A message for the user, shown as a toast or alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Notice {
            message: message.into(),
        }
    }

    pub fn no_report() -> Self {
        Notice::new(NO_REPORT_MESSAGE)
    }

    /// Turn a failed `action` (e.g. "add the event") into something a user can read.
    pub fn from_error(action: &str, err: &ClubCalError) -> Self {
        match err {
            ClubCalError::UploadFailure(_) => Notice::new("Upload failed. Please try again."),
            ClubCalError::EventNotFound(_) => Notice::new("This event no longer exists."),
            ClubCalError::InvalidEvent(reason) => Notice::new(format!("Could not {action}: {reason}.")),
            ClubCalError::AuthRejected(reason) => Notice::new(format!("Sign-in failed ({reason}).")),
            _ => Notice::new(format!("Could not {action}. Please try again.")),
        }
    }
}

/// How an intent ended.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    Done(T),
    /// Nothing to do: no signed-in user, nothing selected, or already in progress.
    Ignored,
    Failed(Notice),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored)
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Outcome::Failed(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            _ => None,
        }
    }
}
