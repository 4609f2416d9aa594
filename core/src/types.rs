//! Domain types for the check-in client.
//!
//! Tickets and snapshots mirror the server's JSON documents. Fields the core
//! does not interpret (payment details, credentials, images) are kept in an
//! `extra` map so rewriting a document never drops data.

use crate::error::{CheckInError, ValidationError};
use crate::seating::SeatMap;
use crate::serde_helpers;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

/// Declares a string identifier that also accepts JSON numbers
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(deserialize_with = "serde_helpers::string_or_number")] String);

        impl $name {
            /// Wrap a raw identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is blank
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a ticket
    TicketId
);
string_id!(
    /// Identifier shared by tickets purchased together
    GroupId
);
string_id!(
    /// Identifier of a table in the venue
    TableId
);
string_id!(
    /// Identifier of a chair within a table
    ChairId
);

/// Identifier of an event; also the key of its local document
///
/// Validated on construction so it is always safe to embed in a file name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    /// Parse and validate an event id
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEventId`] for blank ids and ids containing
    /// path separators, `..` or control characters.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        let invalid = trimmed.is_empty()
            || trimmed.contains(['/', '\\'])
            || trimmed.contains("..")
            || trimmed.chars().any(char::is_control);
        if invalid {
            return Err(ValidationError::InvalidEventId(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventId {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Parking
// ============================================================================

/// How an attendee parks; governs whether check-out applies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ParkingMethod {
    /// No parking (also absent, null, empty or unknown values)
    #[default]
    None,
    /// Free parking, no check-out
    Free,
    /// Standard parking, check-out needs a parking slot
    Standard,
    /// Valet parking, check-out needs a parking slot and a key slot
    Valet,
}

impl ParkingMethod {
    /// Decode the wire value
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("free") => Self::Free,
            Some(s) if s.eq_ignore_ascii_case("standard") => Self::Standard,
            Some(s) if s.eq_ignore_ascii_case("valet") => Self::Valet,
            _ => Self::None,
        }
    }

    /// Wire value (`none` for [`ParkingMethod::None`])
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Valet => "valet",
        }
    }

    /// Label shown to staff
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Free => "Free",
            Self::Standard => "Standard",
            Self::Valet => "VIP",
        }
    }

    /// Whether check-out is offered for this method
    #[must_use]
    pub const fn allows_check_out(self) -> bool {
        matches!(self, Self::Standard | Self::Valet)
    }

    /// Whether a key slot is tracked for this method
    #[must_use]
    pub const fn tracks_key_slot(self) -> bool {
        matches!(self, Self::Valet)
    }
}

impl fmt::Display for ParkingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParkingMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            other => serializer.serialize_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for ParkingMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_raw(value.as_str()))
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// Where a ticket is in its check-in lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// No check-in recorded
    NotCheckedIn,
    /// Checked in, not yet checked out
    CheckedIn,
    /// Checked out (terminal)
    CheckedOut,
}

/// One attendee ticket as stored in the event document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Group of tickets purchased together
    #[serde(default)]
    pub group_id: Option<GroupId>,
    /// Representative ticket of its group in list views
    #[serde(default, deserialize_with = "serde_helpers::lenient_bool")]
    pub group_main: bool,
    /// Assigned table
    #[serde(default)]
    pub table_id: Option<TableId>,
    /// Assigned chair
    #[serde(default)]
    pub chair_id: Option<ChairId>,
    /// Check-in timestamp
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub check_in: Option<String>,
    /// Check-out timestamp
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub check_out: Option<String>,
    /// Parking method
    #[serde(default)]
    pub parking_method: ParkingMethod,
    /// Parking slot
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub parking_slot: Option<String>,
    /// Key slot (valet only)
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub key_slot: Option<String>,
    /// Event title printed on the ticket
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub title: Option<String>,
    /// Attendee first name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub first_name: Option<String>,
    /// Attendee last name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub last_name: Option<String>,
    /// Attendee email
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub email: Option<String>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ticket {
    /// Creates an unassigned, not checked-in ticket
    #[must_use]
    pub fn new(id: TicketId) -> Self {
        Self {
            id,
            group_id: None,
            group_main: false,
            table_id: None,
            chair_id: None,
            check_in: None,
            check_out: None,
            parking_method: ParkingMethod::None,
            parking_slot: None,
            key_slot: None,
            title: None,
            first_name: None,
            last_name: None,
            email: None,
            extra: Map::new(),
        }
    }

    /// Table and chair, when both are set
    ///
    /// A partial assignment (only one of them set) counts as unassigned.
    #[must_use]
    pub fn seat(&self) -> Option<(&TableId, &ChairId)> {
        match (&self.table_id, &self.chair_id) {
            (Some(table), Some(chair)) if !table.is_blank() && !chair.is_blank() => {
                Some((table, chair))
            }
            _ => None,
        }
    }

    /// Whether the ticket has a complete seat assignment
    #[must_use]
    pub fn has_seat(&self) -> bool {
        self.seat().is_some()
    }

    /// Whether the ticket sits at the given chair
    #[must_use]
    pub fn is_seated_at(&self, table_id: &TableId, chair_id: &ChairId) -> bool {
        self.seat() == Some((table_id, chair_id))
    }

    /// Record a seat assignment
    pub fn assign_seat(&mut self, table_id: TableId, chair_id: ChairId) {
        self.table_id = Some(table_id);
        self.chair_id = Some(chair_id);
    }

    /// Clear the seat assignment
    pub fn clear_seat(&mut self) {
        self.table_id = None;
        self.chair_id = None;
    }

    /// Whether the ticket belongs to the given group
    #[must_use]
    pub fn in_group(&self, group_id: &GroupId) -> bool {
        self.group_id.as_ref() == Some(group_id)
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> LifecycleStatus {
        match (&self.check_in, &self.check_out) {
            (_, Some(_)) => LifecycleStatus::CheckedOut,
            (Some(_), None) => LifecycleStatus::CheckedIn,
            (None, None) => LifecycleStatus::NotCheckedIn,
        }
    }

    /// Attendee name, `"first last"`, or `None` when both are missing
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

// ============================================================================
// Event snapshot
// ============================================================================

/// Key holding the ticket list in the canonical document
pub const EVENT_TICKETS_KEY: &str = "eventTickets";

/// Keys older API versions used for the ticket list
const LEGACY_TICKET_KEYS: [&str; 2] = ["tickets", "data"];

/// Name shown for documents without an event name
pub const UNKNOWN_EVENT_NAME: &str = "Unknown Event";

/// The locally persisted roster of one event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    /// Tickets in display order
    #[serde(default)]
    pub event_tickets: Vec<Ticket>,
    /// Raw seat map, either structured or JSON-encoded in a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables_and_chairs: Option<Value>,
    /// Event name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub name: Option<String>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventSnapshot {
    /// Decode the roster returned by a redeemed pass code
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::MalformedPayload`] when the reply is not an object
    /// with an `eventTickets` array, or a ticket cannot be decoded.
    pub fn from_redeemed(value: Value) -> Result<Self, CheckInError> {
        let has_tickets = value
            .get(EVENT_TICKETS_KEY)
            .is_some_and(Value::is_array);
        if !has_tickets {
            return Err(CheckInError::MalformedPayload(
                "response is missing eventTickets".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| CheckInError::MalformedPayload(e.to_string()))
    }

    /// Decode a persisted document, tolerating older layouts
    ///
    /// Accepts the canonical `{ eventTickets: [...] }` object, objects keeping
    /// the list under `tickets` or `data`, and a bare ticket array.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::MalformedPayload`] for scalars, objects without a
    /// ticket list, or undecodable tickets.
    pub fn from_document(value: Value) -> Result<Self, CheckInError> {
        let malformed = |e: serde_json::Error| CheckInError::MalformedPayload(e.to_string());
        match value {
            Value::Array(_) => Ok(Self {
                event_tickets: serde_json::from_value(value).map_err(malformed)?,
                ..Self::default()
            }),
            Value::Object(mut map) => {
                if !map.contains_key(EVENT_TICKETS_KEY) {
                    let legacy = LEGACY_TICKET_KEYS
                        .iter()
                        .find(|key| map.get(**key).is_some_and(Value::is_array));
                    let Some(tickets) = legacy.and_then(|key| map.remove(*key)) else {
                        return Err(CheckInError::MalformedPayload(
                            "document holds no ticket list".to_string(),
                        ));
                    };
                    map.insert(EVENT_TICKETS_KEY.to_string(), tickets);
                }
                serde_json::from_value(Value::Object(map)).map_err(malformed)
            }
            other => Err(CheckInError::MalformedPayload(format!(
                "expected a ticket document, found {other}"
            ))),
        }
    }

    /// Whether the document should appear in the downloaded-events listing
    #[must_use]
    pub fn is_listable(&self) -> bool {
        !self.event_tickets.is_empty()
    }

    /// Event name, or a placeholder
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_EVENT_NAME)
    }

    /// Find a ticket by exact id
    #[must_use]
    pub fn ticket(&self, id: &TicketId) -> Option<&Ticket> {
        self.event_tickets.iter().find(|t| &t.id == id)
    }

    /// Find a ticket by exact id, mutably
    pub fn ticket_mut(&mut self, id: &TicketId) -> Option<&mut Ticket> {
        self.event_tickets.iter_mut().find(|t| &t.id == id)
    }

    /// Replace the stored ticket that has the same id
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::NotFound`] when no ticket has that id.
    pub fn replace_ticket(&mut self, ticket: Ticket) -> Result<(), CheckInError> {
        let slot = self
            .ticket_mut(&ticket.id)
            .ok_or_else(|| CheckInError::NotFound(format!("ticket {}", ticket.id)))?;
        *slot = ticket;
        Ok(())
    }

    /// Tickets of a group, in stored order
    #[must_use]
    pub fn group_tickets(&self, group_id: &GroupId) -> Vec<&Ticket> {
        self.event_tickets
            .iter()
            .filter(|t| t.in_group(group_id))
            .collect()
    }

    /// Tickets of a group still waiting for a seat, in stored order
    #[must_use]
    pub fn unassigned_in_group(&self, group_id: &GroupId) -> Vec<&Ticket> {
        self.event_tickets
            .iter()
            .filter(|t| t.in_group(group_id) && !t.has_seat())
            .collect()
    }

    /// Store a seat map, keeping the string or structured form already on file
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::SeatMapParse`] when the map cannot be encoded.
    pub fn set_seat_map(&mut self, seat_map: &SeatMap) -> Result<(), CheckInError> {
        let encode_error = |e: serde_json::Error| CheckInError::SeatMapParse(e.to_string());
        let structured = serde_json::to_value(seat_map).map_err(encode_error)?;
        let raw = if matches!(self.tables_and_chairs, Some(Value::String(_))) {
            Value::String(serde_json::to_string(&structured).map_err(encode_error)?)
        } else {
            structured
        };
        self.tables_and_chairs = Some(raw);
        Ok(())
    }

    /// Decode the stored seat map
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::SeatMapParse`] when absent or undecodable.
    pub fn seat_map(&self) -> Result<SeatMap, CheckInError> {
        match &self.tables_and_chairs {
            Some(raw) => SeatMap::parse(raw),
            None => Err(CheckInError::SeatMapParse(
                "no tables and chairs stored".to_string(),
            )),
        }
    }
}
