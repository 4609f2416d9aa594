//! Read models derived from a snapshot for the UI layer.
//!
//! Views are recomputed from the current snapshot on every read; nothing here
//! is persisted. Occupant names in particular are resolved from the roster at
//! read time and never stored.

use crate::seating::{SeatMap, find_seat_description};
use crate::types::{ChairId, EventSnapshot, GroupId, LifecycleStatus, TableId, Ticket, TicketId};
use serde::Serialize;

/// Everything the ticket detail screen shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetailView {
    /// The ticket as stored
    pub ticket: Ticket,
    /// Seat description, `"N/A"` when unknown
    pub seat_description: String,
    /// `None`, `Free`, `Standard` or `VIP`
    pub parking_label: &'static str,
    /// `Check-in: <timestamp>` or `No Check-in`
    pub check_in_display: String,
    /// `Check-out: <timestamp>` or `No Check-out`
    pub check_out_display: String,
    /// Whether parking and key slots can be edited
    pub parking_editable: bool,
    /// Whether the check-out action is offered
    pub check_out_offered: bool,
}

impl TicketDetailView {
    /// Build the view for one ticket of a snapshot
    #[must_use]
    pub fn build(snapshot: &EventSnapshot, ticket: &Ticket) -> Self {
        let method = ticket.parking_method;
        let checked_in_only = ticket.status() == LifecycleStatus::CheckedIn;

        Self {
            seat_description: find_seat_description(snapshot.tables_and_chairs.as_ref(), ticket),
            parking_label: method.label(),
            check_in_display: ticket
                .check_in
                .as_ref()
                .map_or_else(|| "No Check-in".to_string(), |at| format!("Check-in: {at}")),
            check_out_display: ticket
                .check_out
                .as_ref()
                .map_or_else(|| "No Check-out".to_string(), |at| format!("Check-out: {at}")),
            parking_editable: checked_in_only && method.allows_check_out(),
            check_out_offered: checked_in_only && method.allows_check_out(),
            ticket: ticket.clone(),
        }
    }
}

/// An occupied chair with its occupant resolved against the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedChair {
    /// Table
    pub table_id: TableId,
    /// Chair
    pub chair_id: ChairId,
    /// Occupying ticket, when known
    pub ticket_id: Option<TicketId>,
    /// `"first last"`, or the raw ticket id when the ticket is not in the roster
    pub occupant_name: Option<String>,
}

/// Everything the seat picker shows for a group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatPickerView {
    /// Latest seat map; `None` when it could not be obtained
    pub seat_map: Option<SeatMap>,
    /// Every ticket of the group
    pub group_tickets: Vec<Ticket>,
    /// Tickets still waiting for a seat, in assignment order
    pub remaining_tickets: Vec<Ticket>,
    /// Occupied chairs with occupant names
    pub occupants: Vec<OccupiedChair>,
}

impl SeatPickerView {
    /// Build the view for a group from the roster and the latest seat map
    #[must_use]
    pub fn build(snapshot: &EventSnapshot, group_id: &GroupId, seat_map: Option<SeatMap>) -> Self {
        let occupants = seat_map
            .as_ref()
            .map(|map| {
                map.occupied_chairs()
                    .map(|(table, chair)| {
                        let ticket_id = chair.used_by_ticket_id.clone().or_else(|| {
                            snapshot
                                .event_tickets
                                .iter()
                                .find(|t| t.is_seated_at(&table.table_id, &chair.chair_id))
                                .map(|t| t.id.clone())
                        });
                        let occupant_name = ticket_id.as_ref().map(|id| {
                            snapshot
                                .ticket(id)
                                .and_then(Ticket::display_name)
                                .unwrap_or_else(|| id.to_string())
                        });
                        OccupiedChair {
                            table_id: table.table_id.clone(),
                            chair_id: chair.chair_id.clone(),
                            ticket_id,
                            occupant_name,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            seat_map,
            group_tickets: snapshot.group_tickets(group_id).into_iter().cloned().collect(),
            remaining_tickets: snapshot
                .unassigned_in_group(group_id)
                .into_iter()
                .cloned()
                .collect(),
            occupants,
        }
    }

    /// Size of the group
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.group_tickets.len()
    }

    /// Tickets of the group still without a seat
    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.remaining_tickets.len()
    }

    /// Ticket the next free chair will be assigned to
    #[must_use]
    pub fn next_ticket(&self) -> Option<&Ticket> {
        self.remaining_tickets.first()
    }

    /// Occupant name shown on a chair
    #[must_use]
    pub fn occupant_name(&self, table_id: &TableId, chair_id: &ChairId) -> Option<&str> {
        self.occupants
            .iter()
            .find(|o| &o.table_id == table_id && &o.chair_id == chair_id)
            .and_then(|o| o.occupant_name.as_deref())
    }
}
