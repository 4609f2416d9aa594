//! Contract with the remote ticket service.
//!
//! Request and reply shapes, the [`RemoteTicketService`] trait implemented by
//! the runtime's HTTP client and by test doubles, and
//! [`interpret_remote_result`], the one place that decides whether a reply
//! counts as acceptance.

use crate::error::CheckInError;
use crate::serde_helpers;
use crate::types::{ChairId, EventId, TableId, TicketId};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Requests
// ============================================================================

/// Redeem a pass code for an event's ticket roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassCodeRequest {
    /// Shared secret for the event
    pub pass_code: String,
    /// Event to download
    pub event_id: EventId,
    /// Staff member in charge
    pub name: String,
}

/// Title sent when the ticket has none
pub const DEFAULT_TITLE: &str = "Default Title";
/// First name sent when the ticket has none
pub const DEFAULT_FIRST_NAME: &str = "Default FirstName";
/// Last name sent when the ticket has none
pub const DEFAULT_LAST_NAME: &str = "Default LastName";
/// Email sent when the ticket has none
pub const DEFAULT_EMAIL: &str = "default@example.com";

/// Record check-in or check-out on a ticket
///
/// The server requires the display fields on every update, so absent values
/// are replaced by placeholders instead of failing the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdateRequest {
    /// Ticket to update
    pub id: TicketId,
    /// Ticket title
    pub title: String,
    /// Attendee first name
    pub first_name: String,
    /// Attendee last name
    pub last_name: String,
    /// Attendee email
    pub email: String,
    /// Check-in timestamp
    pub check_in: Option<String>,
    /// Check-out timestamp
    pub check_out: Option<String>,
}

/// Record parking data on a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingUpdateRequest {
    /// Ticket to update
    pub id: TicketId,
    /// Parking slot
    pub parking_slot: Option<String>,
    /// Key slot, only for valet parking
    pub key_slot: Option<String>,
}

/// Assign or release chairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingRequest {
    /// Event being seated
    pub event_id: EventId,
    /// Pass code of the event
    pub pass_code: String,
    /// Affected tables
    pub tables: Vec<SeatingTable>,
}

/// Table entry of a [`SeatingRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingTable {
    /// Table
    pub table_id: TableId,
    /// Affected chairs
    pub chairs: Vec<SeatingChair>,
}

/// Chair entry of a [`SeatingTable`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingChair {
    /// Chair
    pub chair_id: ChairId,
    /// Ticket to seat; absent on release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by_ticket_id: Option<TicketId>,
}

impl SeatingRequest {
    fn single(
        event_id: EventId,
        pass_code: String,
        table_id: TableId,
        chair: SeatingChair,
    ) -> Self {
        Self {
            event_id,
            pass_code,
            tables: vec![SeatingTable {
                table_id,
                chairs: vec![chair],
            }],
        }
    }

    /// Seat one ticket at one chair
    #[must_use]
    pub fn assign(
        event_id: EventId,
        pass_code: String,
        table_id: TableId,
        chair_id: ChairId,
        ticket_id: TicketId,
    ) -> Self {
        Self::single(
            event_id,
            pass_code,
            table_id,
            SeatingChair {
                chair_id,
                used_by_ticket_id: Some(ticket_id),
            },
        )
    }

    /// Free one chair
    #[must_use]
    pub fn release(
        event_id: EventId,
        pass_code: String,
        table_id: TableId,
        chair_id: ChairId,
    ) -> Self {
        Self::single(
            event_id,
            pass_code,
            table_id,
            SeatingChair {
                chair_id,
                used_by_ticket_id: None,
            },
        )
    }
}

/// A mutating request to the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `POST /PublicEvents/PassCode`
    RedeemPassCode(PassCodeRequest),
    /// `PUT /Ticket`
    UpdateTicket(TicketUpdateRequest),
    /// `PUT /Ticket/Parking`
    UpdateParking(ParkingUpdateRequest),
    /// `POST /PublicTicket/AssignChairToTicket`
    AssignChair(SeatingRequest),
    /// `POST /PublicTicket/ReleaseChairFromTicket`
    ReleaseChair(SeatingRequest),
}

impl RemoteCall {
    /// Short name for logs and notices
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RedeemPassCode(_) => "redeem_pass_code",
            Self::UpdateTicket(_) => "update_ticket",
            Self::UpdateParking(_) => "update_parking",
            Self::AssignChair(_) => "assign_chair",
            Self::ReleaseChair(_) => "release_chair",
        }
    }
}

// ============================================================================
// Replies
// ============================================================================

/// Public event summary from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    /// Event identifier
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub id: String,
    /// Event name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub name: Option<String>,
    /// Start date-time as sent by the server
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub event_start_date: Option<String>,
    /// End date-time as sent by the server
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub event_end_date: Option<String>,
    /// Organizer contact
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub organizer_email: Option<String>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Private event detail, fetched for the authoritative seat map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    /// Seat map, structured or JSON-encoded
    #[serde(default)]
    pub tables_and_chairs: Option<Value>,
    /// Event name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub name: Option<String>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw reply to a [`RemoteCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReply {
    /// HTTP status
    pub status: u16,
    /// Response text as received
    pub text: String,
    /// Response decoded as JSON, or `Null` when it is not JSON
    pub body: Value,
}

impl RemoteReply {
    /// Build a reply from its status and raw text
    #[must_use]
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// Build a reply from a JSON body
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            text: body.to_string(),
            body,
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Business message carried by the body, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        let message = match &self.body {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            _ => None,
        };
        message.filter(|m| !m.trim().is_empty())
    }

    /// Non-empty raw text, if any
    fn raw_text(&self) -> Option<&str> {
        Some(self.text.as_str()).filter(|t| !t.trim().is_empty())
    }
}

// ============================================================================
// Interpretation
// ============================================================================

/// Success marker the release endpoint puts in its message
pub const DEFAULT_RELEASE_SUCCESS_MARKER: &str = "success";

/// Tunables for reply interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePolicy {
    /// Case-insensitive substring marking a successful release
    pub release_success_marker: String,
}

impl Default for RemotePolicy {
    fn default() -> Self {
        Self {
            release_success_marker: DEFAULT_RELEASE_SUCCESS_MARKER.to_string(),
        }
    }
}

/// Decide whether the server accepted a call
///
/// Returns the server's message on acceptance.
///
/// - Release: accepted iff the message contains the success marker, whatever
///   the status. The endpoint reports business failures inside 2xx bodies.
/// - Assign and pass-code redemption: accepted on 2xx; the message is
///   surfaced verbatim on rejection.
/// - Parking: 2xx accepted, 400 is a conflict, anything else invalid data.
/// - Ticket update: 2xx accepted; the response text is the rejection reason.
///
/// # Errors
///
/// Returns [`CheckInError::RemoteRejection`] or [`CheckInError::Conflict`].
pub fn interpret_remote_result(
    call: &RemoteCall,
    reply: &RemoteReply,
    policy: &RemotePolicy,
) -> Result<Option<String>, CheckInError> {
    let message = reply.message().map(str::to_string);
    let reject = |reason: String| CheckInError::RemoteRejection {
        status: reply.status,
        reason,
    };

    match call {
        RemoteCall::ReleaseChair(_) => {
            let marker = policy.release_success_marker.to_lowercase();
            match message {
                Some(msg) if msg.to_lowercase().contains(&marker) => Ok(Some(msg)),
                Some(msg) => Err(reject(msg)),
                None => Err(reject("Failed to release seat.".to_string())),
            }
        }

        RemoteCall::AssignChair(_) => {
            if reply.is_success() {
                Ok(message)
            } else {
                Err(reject(
                    message.unwrap_or_else(|| "Failed to assign seat.".to_string()),
                ))
            }
        }

        RemoteCall::RedeemPassCode(_) => {
            if reply.is_success() {
                Ok(message)
            } else {
                let reason = message
                    .or_else(|| reply.raw_text().map(str::to_string))
                    .unwrap_or_else(|| "Failed to fetch tickets".to_string());
                Err(reject(reason))
            }
        }

        RemoteCall::UpdateParking(_) => match reply.status {
            200..=299 => Ok(message),
            400 => Err(CheckInError::Conflict(
                "Parking data already exists".to_string(),
            )),
            _ => Err(reject("Parking data is not valid".to_string())),
        },

        RemoteCall::UpdateTicket(_) => {
            if reply.is_success() {
                Ok(message)
            } else {
                let reason = reply
                    .raw_text()
                    .map_or_else(|| "Ticket update failed".to_string(), str::to_string);
                Err(reject(reason))
            }
        }
    }
}

// ============================================================================
// Service trait
// ============================================================================

/// Boxed future returned by [`RemoteTicketService`] methods
pub type RemoteFuture<'a, T> = BoxFuture<'a, Result<T, CheckInError>>;

/// The remote ticket and event service
///
/// Implementations only report transport failures as errors; deciding whether
/// a [`RemoteReply`] means acceptance is left to [`interpret_remote_result`].
///
/// Note: Returns boxed futures to stay object-safe (held as `Arc<dyn RemoteTicketService>`).
pub trait RemoteTicketService: Send + Sync {
    /// Fetch public event summaries
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Transport`] or [`CheckInError::RemoteRejection`].
    fn list_events(&self) -> RemoteFuture<'_, Vec<EventSummary>>;

    /// Fetch an event's private detail, including its seat map
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Transport`] or [`CheckInError::RemoteRejection`].
    fn event_detail(&self, event_id: &EventId) -> RemoteFuture<'_, EventDetail>;

    /// Perform a mutating call and return the raw reply
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Transport`] when no reply was received.
    fn send(&self, call: &RemoteCall) -> RemoteFuture<'_, RemoteReply>;
}
