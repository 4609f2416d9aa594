//! Error taxonomy shared by every check-in operation.
//!
//! Validation failures are rejected locally and never reach the remote
//! service. Remote and storage failures are converted by the runtime into a
//! single user-facing notice.

use crate::types::ParkingMethod;
use thiserror::Error;

/// Errors that can occur while working with a local snapshot and the remote service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInError {
    /// Missing local document, ticket, table or chair
    #[error("Not found: {0}")]
    NotFound(String),

    /// Scanned payload or remote roster could not be decoded
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The tables-and-chairs structure could not be decoded
    #[error("Seat map not available: {0}")]
    SeatMapParse(String),

    /// Business-level failure reported by the server, possibly inside a 200 body
    #[error("Rejected by server (status {status}): {reason}")]
    RemoteRejection {
        /// HTTP status of the reply
        status: u16,
        /// Server-provided reason, or a generic message when none was given
        reason: String,
    },

    /// Server refused because the data already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request could not complete
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local persistence failure
    #[error("Storage error: {0}")]
    Io(String),

    /// A precondition was not met
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CheckInError {
    /// Server-provided or locally produced reason, without the category prefix
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::MalformedPayload(msg)
            | Self::SeatMapParse(msg)
            | Self::Conflict(msg)
            | Self::Transport(msg)
            | Self::Io(msg) => msg.clone(),
            Self::RemoteRejection { reason, .. } => reason.clone(),
            Self::Validation(err) => err.to_string(),
        }
    }

    /// Whether the failure was decided locally without contacting the server
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::MalformedPayload(_)
        )
    }
}

impl From<std::io::Error> for CheckInError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Preconditions refused locally with a specific, actionable message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Check-in was already recorded
    #[error("Check-in was already done at {at}")]
    AlreadyCheckedIn {
        /// Recorded check-in timestamp
        at: String,
    },

    /// Check-out requested before check-in
    #[error("Check in before checking out")]
    CheckInRequired,

    /// Check-out was already recorded
    #[error("Check-out was already done at {at}")]
    AlreadyCheckedOut {
        /// Recorded check-out timestamp
        at: String,
    },

    /// Check-out is not offered for this parking method
    #[error("Check-out is not enabled for parking method '{method}'")]
    CheckOutNotApplicable {
        /// The ticket's parking method
        method: ParkingMethod,
    },

    /// Parking slot must be filled before check-out
    #[error("Fill in the parking slot before checking out")]
    ParkingSlotRequired,

    /// Valet parking needs the key slot too
    #[error("Fill in the parking slot and the key slot before checking out")]
    KeySlotRequired,

    /// Chair is occupied; release it instead of assigning it
    #[error("Chair {chair_id} at table {table_id} is already occupied")]
    ChairOccupied {
        /// Table of the chair
        table_id: String,
        /// Occupied chair
        chair_id: String,
    },

    /// Every ticket of the group already has a seat
    #[error("All chairs have been assigned to the group")]
    NoRemainingTickets,

    /// Event id cannot be used as a document key
    #[error("Invalid event id '{0}'")]
    InvalidEventId(String),

    /// Pass code was empty
    #[error("Enter the pass code")]
    MissingPassCode,

    /// Staff name was empty
    #[error("Enter your name")]
    MissingStaffName,
}
