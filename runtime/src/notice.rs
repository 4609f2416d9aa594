//! User-facing notices.
//!
//! Every failed operation ends in exactly one notice naming the attempted
//! action and, when the server gave one, its reason.

use checkin_core::error::CheckInError;
use std::fmt;

/// A single message for the staff member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    /// Short heading
    pub title: String,
    /// Details, including the server's reason when available
    pub message: String,
}

impl UserNotice {
    /// Creates a notice
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Notice for a failed `action` (e.g. "Check-in")
    #[must_use]
    pub fn from_error(action: &str, error: &CheckInError) -> Self {
        match error {
            CheckInError::Validation(reason) => {
                Self::new(format!("{action} not possible"), reason.to_string())
            }
            CheckInError::Conflict(reason) => Self::new("Conflict", reason.clone()),
            CheckInError::NotFound(reason) => Self::new("Not found", reason.clone()),
            CheckInError::MalformedPayload(reason) => {
                Self::new(format!("{action} failed"), format!("Unreadable data: {reason}"))
            }
            CheckInError::SeatMapParse(_) => {
                Self::new("Seat map", "Seat map not available")
            }
            CheckInError::RemoteRejection { reason, .. } => {
                Self::new(format!("{action} failed"), reason.clone())
            }
            CheckInError::Transport(reason) => Self::new(
                format!("{action} failed"),
                format!("Could not reach the server: {reason}"),
            ),
            CheckInError::Io(reason) => Self::new(
                format!("{action} failed"),
                format!("Could not save on this device: {reason}"),
            ),
        }
    }
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
