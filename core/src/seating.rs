//! Seat map model and seat assignment reducer.
//!
//! The venue's tables and chairs arrive either as a structured array or as a
//! JSON-encoded string. Both are normalized into [`SeatMap`], where every chair
//! carries a boolean `occupied` flag and an optional back-reference to the
//! occupying ticket. The back-reference is looked up at read time and never
//! cascades.
//!
//! Local occupancy is not authoritative: after every accepted assignment or
//! release the runtime re-fetches the seat map from the remote service.

use crate::effect::{Effect, Effects};
use crate::error::{CheckInError, ValidationError};
use crate::reducer::Reducer;
use crate::remote::{RemoteCall, SeatingRequest};
use crate::serde_helpers;
use crate::smallvec;
use crate::types::{ChairId, EventId, EventSnapshot, GroupId, TableId, Ticket, TicketId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shown when a seat cannot be described
pub const SEAT_NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Seat map
// ============================================================================

/// Tables and chairs of an event's venue, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatMap {
    /// Tables in display order
    pub tables: Vec<Table>,
}

/// One table of the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Table identifier
    pub table_id: TableId,
    /// Display name
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    pub name: Option<String>,
    /// Chairs in display order
    #[serde(default)]
    pub chairs: Vec<Chair>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One chair of a table, with normalized occupancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawChair")]
pub struct Chair {
    /// Chair identifier
    pub chair_id: ChairId,
    /// Seat description shown to staff
    pub description: Option<String>,
    /// Whether someone sits here
    #[serde(rename = "usedChair")]
    pub occupied: bool,
    /// Ticket occupying the chair, when known
    pub used_by_ticket_id: Option<TicketId>,
    /// Fields the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chair exactly as the server sends it
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChair {
    chair_id: ChairId,
    #[serde(default, deserialize_with = "serde_helpers::optional_text")]
    description: Option<String>,
    #[serde(default)]
    used_chair: Value,
    #[serde(default)]
    used_by_ticket_id: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Occupant id carried by a scalar, if any
fn occupant_id(value: &Value) -> Option<TicketId> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(TicketId::new(s.trim())),
        Value::Number(n) => Some(TicketId::new(n.to_string())),
        _ => None,
    }
}

impl From<RawChair> for Chair {
    // `usedChair` is a boolean on some servers and the occupant's ticket id on others
    fn from(raw: RawChair) -> Self {
        let flag = match &raw.used_chair {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") || s.trim().is_empty() => {
                Some(false)
            }
            Value::Null => Some(false),
            _ => None,
        };
        let used_by_ticket_id = occupant_id(&raw.used_by_ticket_id).or_else(|| {
            if flag.is_none() {
                occupant_id(&raw.used_chair)
            } else {
                None
            }
        });
        let occupied = flag.unwrap_or(true) || used_by_ticket_id.is_some();

        Self {
            chair_id: raw.chair_id,
            description: raw.description,
            occupied,
            used_by_ticket_id,
            extra: raw.extra,
        }
    }
}

impl SeatMap {
    /// Decode a seat map from its structured or JSON-string form
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::SeatMapParse`] when the value is neither an array
    /// of tables nor a string holding one.
    pub fn parse(raw: &Value) -> Result<Self, CheckInError> {
        let parse_error = |e: serde_json::Error| CheckInError::SeatMapParse(e.to_string());
        match raw {
            Value::String(encoded) => {
                let decoded: Value = serde_json::from_str(encoded).map_err(parse_error)?;
                if decoded.is_array() {
                    serde_json::from_value(decoded).map_err(parse_error)
                } else {
                    Err(CheckInError::SeatMapParse(
                        "encoded seat map is not a list of tables".to_string(),
                    ))
                }
            }
            Value::Array(_) => Self::deserialize(raw).map_err(parse_error),
            other => Err(CheckInError::SeatMapParse(format!(
                "expected a list of tables, found {other}"
            ))),
        }
    }

    /// Find a table
    #[must_use]
    pub fn table(&self, table_id: &TableId) -> Option<&Table> {
        self.tables.iter().find(|t| &t.table_id == table_id)
    }

    /// Find a chair
    #[must_use]
    pub fn chair(&self, table_id: &TableId, chair_id: &ChairId) -> Option<&Chair> {
        self.table(table_id)?
            .chairs
            .iter()
            .find(|c| &c.chair_id == chair_id)
    }

    fn chair_mut(&mut self, table_id: &TableId, chair_id: &ChairId) -> Option<&mut Chair> {
        self.tables
            .iter_mut()
            .find(|t| &t.table_id == table_id)?
            .chairs
            .iter_mut()
            .find(|c| &c.chair_id == chair_id)
    }

    /// Description of a seat, or `"N/A"` when the table or chair is unknown
    #[must_use]
    pub fn seat_description(&self, table_id: &TableId, chair_id: &ChairId) -> String {
        self.chair(table_id, chair_id)
            .and_then(|c| c.description.clone())
            .unwrap_or_else(|| SEAT_NOT_AVAILABLE.to_string())
    }

    /// Every occupied chair with its table
    pub fn occupied_chairs(&self) -> impl Iterator<Item = (&Table, &Chair)> {
        self.tables
            .iter()
            .flat_map(|t| t.chairs.iter().map(move |c| (t, c)))
            .filter(|(_, c)| c.occupied)
    }
}

/// Seat description for a ticket, tolerating a missing or broken seat map
///
/// Any miss (no seat, no map, undecodable map, unknown table or chair) yields
/// `"N/A"` so the ticket detail view always renders.
#[must_use]
pub fn find_seat_description(seat_map: Option<&Value>, ticket: &Ticket) -> String {
    let Some((table_id, chair_id)) = ticket.seat() else {
        return SEAT_NOT_AVAILABLE.to_string();
    };
    seat_map
        .and_then(|raw| SeatMap::parse(raw).ok())
        .map_or_else(
            || SEAT_NOT_AVAILABLE.to_string(),
            |map| map.seat_description(table_id, chair_id),
        )
}

// ============================================================================
// Reducer
// ============================================================================

/// State the seating reducer works on
#[derive(Debug, Clone, PartialEq)]
pub struct SeatingState {
    /// The event's roster
    pub snapshot: EventSnapshot,
    /// Latest known seat map, when one could be obtained
    pub seat_map: Option<SeatMap>,
}

/// Seating credentials for one event
#[derive(Debug, Clone)]
pub struct SeatingEnvironment {
    /// Event being seated
    pub event_id: EventId,
    /// Pass code the seating endpoints require
    pub pass_code: String,
}

/// Seat assignment commands and their confirmed outcomes
#[derive(Debug, Clone, PartialEq)]
pub enum SeatingAction {
    // Commands
    /// Staff picked a chair in the seat picker for a group
    SelectChair {
        /// Group being seated
        group_id: GroupId,
        /// Table of the chair
        table_id: TableId,
        /// Chair picked
        chair_id: ChairId,
    },
    /// Seat a specific ticket
    AssignSeat {
        /// Ticket to seat
        ticket_id: TicketId,
        /// Target table
        table_id: TableId,
        /// Target chair
        chair_id: ChairId,
    },
    /// Free a chair
    ReleaseSeat {
        /// Table of the chair
        table_id: TableId,
        /// Chair to free
        chair_id: ChairId,
    },

    // Events
    /// The remote service accepted an assignment
    SeatAssigned {
        /// Seated ticket
        ticket_id: TicketId,
        /// Table
        table_id: TableId,
        /// Chair
        chair_id: ChairId,
    },
    /// The remote service confirmed a release
    ChairReleased {
        /// Table
        table_id: TableId,
        /// Chair
        chair_id: ChairId,
    },
}

/// Reducer for seat assignment and release
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatingReducer;

impl SeatingReducer {
    /// Whether the chair is taken
    ///
    /// A known seat map decides alone. The roster is consulted only when no map
    /// is available, since it may be stale until the next download.
    fn is_occupied(state: &SeatingState, table_id: &TableId, chair_id: &ChairId) -> bool {
        match &state.seat_map {
            Some(map) => map
                .chair(table_id, chair_id)
                .is_some_and(|c| c.occupied),
            None => state
                .snapshot
                .event_tickets
                .iter()
                .any(|t| t.is_seated_at(table_id, chair_id)),
        }
    }

    /// The chair must exist when a seat map is known
    fn validate_chair(
        state: &SeatingState,
        table_id: &TableId,
        chair_id: &ChairId,
    ) -> Result<(), CheckInError> {
        match &state.seat_map {
            Some(map) if map.chair(table_id, chair_id).is_none() => Err(CheckInError::NotFound(
                format!("chair {chair_id} at table {table_id}"),
            )),
            _ => Ok(()),
        }
    }

    fn validate_assign_seat(
        state: &SeatingState,
        ticket_id: &TicketId,
        table_id: &TableId,
        chair_id: &ChairId,
    ) -> Result<(), CheckInError> {
        if state.snapshot.ticket(ticket_id).is_none() {
            return Err(CheckInError::NotFound(format!("ticket {ticket_id}")));
        }
        Self::validate_chair(state, table_id, chair_id)?;
        if Self::is_occupied(state, table_id, chair_id) {
            return Err(ValidationError::ChairOccupied {
                table_id: table_id.to_string(),
                chair_id: chair_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn apply_event(state: &mut SeatingState, action: &SeatingAction) {
        match action {
            SeatingAction::SeatAssigned {
                ticket_id,
                table_id,
                chair_id,
            } => {
                if let Some(ticket) = state.snapshot.ticket_mut(ticket_id) {
                    ticket.assign_seat(table_id.clone(), chair_id.clone());
                }
                if let Some(chair) = state
                    .seat_map
                    .as_mut()
                    .and_then(|map| map.chair_mut(table_id, chair_id))
                {
                    chair.occupied = true;
                    chair.used_by_ticket_id = Some(ticket_id.clone());
                }
            }

            SeatingAction::ChairReleased { table_id, chair_id } => {
                for ticket in &mut state.snapshot.event_tickets {
                    if ticket.is_seated_at(table_id, chair_id) {
                        ticket.clear_seat();
                    }
                }
                if let Some(chair) = state
                    .seat_map
                    .as_mut()
                    .and_then(|map| map.chair_mut(table_id, chair_id))
                {
                    chair.occupied = false;
                    chair.used_by_ticket_id = None;
                }
            }

            // Commands are not events
            SeatingAction::SelectChair { .. }
            | SeatingAction::AssignSeat { .. }
            | SeatingAction::ReleaseSeat { .. } => {}
        }
    }
}

impl Reducer for SeatingReducer {
    type State = SeatingState;
    type Action = SeatingAction;
    type Environment = SeatingEnvironment;
    type Error = CheckInError;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects<Self::Action>, Self::Error> {
        match action {
            // ========== Commands ==========
            SeatingAction::SelectChair {
                group_id,
                table_id,
                chair_id,
            } => {
                Self::validate_chair(state, &table_id, &chair_id)?;

                // Occupied chairs route to the release flow
                if Self::is_occupied(state, &table_id, &chair_id) {
                    return self.reduce(
                        state,
                        SeatingAction::ReleaseSeat { table_id, chair_id },
                        env,
                    );
                }

                let ticket_id = state
                    .snapshot
                    .unassigned_in_group(&group_id)
                    .first()
                    .map(|t| t.id.clone())
                    .ok_or(ValidationError::NoRemainingTickets)?;

                self.reduce(
                    state,
                    SeatingAction::AssignSeat {
                        ticket_id,
                        table_id,
                        chair_id,
                    },
                    env,
                )
            }

            SeatingAction::AssignSeat {
                ticket_id,
                table_id,
                chair_id,
            } => {
                Self::validate_assign_seat(state, &ticket_id, &table_id, &chair_id)?;

                let call = RemoteCall::AssignChair(SeatingRequest::assign(
                    env.event_id.clone(),
                    env.pass_code.clone(),
                    table_id.clone(),
                    chair_id.clone(),
                    ticket_id.clone(),
                ));
                Ok(smallvec![Effect::remote(
                    call,
                    SeatingAction::SeatAssigned {
                        ticket_id,
                        table_id,
                        chair_id,
                    },
                )])
            }

            SeatingAction::ReleaseSeat { table_id, chair_id } => {
                Self::validate_chair(state, &table_id, &chair_id)?;

                let call = RemoteCall::ReleaseChair(SeatingRequest::release(
                    env.event_id.clone(),
                    env.pass_code.clone(),
                    table_id.clone(),
                    chair_id.clone(),
                ));
                Ok(smallvec![Effect::remote(
                    call,
                    SeatingAction::ChairReleased { table_id, chair_id },
                )])
            }

            // ========== Events ==========
            event @ (SeatingAction::SeatAssigned { .. } | SeatingAction::ChairReleased { .. }) => {
                tracing::debug!(event_id = %env.event_id, ?event, "Applying confirmed seating event");
                Self::apply_event(state, &event);
                Ok(Effects::new())
            }
        }
    }
}
