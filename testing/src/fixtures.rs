//! Builders and sample data
//!
//! The sample event `E1` has three tickets:
//!
//! | id | group | parking | seat |
//! |---|---|---|---|
//! | `t001` | `G1` (main) | standard | none |
//! | `t002` | `G1` | none | none |
//! | `t003` | none | valet | `T1`/`C2` |
//!
//! and a seat map with chairs `T1/C1` (free), `T1/C2` (held by `t003`) and
//! `T2/C3` (free).

#![allow(clippy::unwrap_used)] // Fixed sample data always parses

use checkin_core::types::{
    ChairId, EventId, EventSnapshot, GroupId, ParkingMethod, TableId, Ticket, TicketId,
};
use serde_json::{Value, json};

/// Event id of the sample event
pub const EVENT_ID: &str = "E1";

/// Pass code accepted for the sample event
pub const PASS_CODE: &str = "1234";

/// Staff member used in download scenarios
pub const STAFF_NAME: &str = "Grace";

/// The sample event's id
#[must_use]
pub fn event_id() -> EventId {
    EventId::parse(EVENT_ID).unwrap()
}

/// Fluent builder for tickets
#[derive(Debug, Clone)]
pub struct TicketBuilder {
    ticket: Ticket,
}

impl TicketBuilder {
    /// Start from an unassigned, not checked-in ticket
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            ticket: Ticket::new(TicketId::new(id)),
        }
    }

    /// Attendee name
    #[must_use]
    pub fn named(mut self, first: &str, last: &str) -> Self {
        self.ticket.first_name = Some(first.to_string());
        self.ticket.last_name = Some(last.to_string());
        self
    }

    /// Group membership
    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        self.ticket.group_id = Some(GroupId::new(group));
        self
    }

    /// Mark as the group's main ticket
    #[must_use]
    pub fn group_main(mut self) -> Self {
        self.ticket.group_main = true;
        self
    }

    /// Parking method
    #[must_use]
    pub fn parking(mut self, method: ParkingMethod) -> Self {
        self.ticket.parking_method = method;
        self
    }

    /// Parking and key slots
    #[must_use]
    pub fn slots(mut self, parking_slot: Option<&str>, key_slot: Option<&str>) -> Self {
        self.ticket.parking_slot = parking_slot.map(str::to_string);
        self.ticket.key_slot = key_slot.map(str::to_string);
        self
    }

    /// Seat at a table and chair
    #[must_use]
    pub fn seated(mut self, table: &str, chair: &str) -> Self {
        self.ticket
            .assign_seat(TableId::new(table), ChairId::new(chair));
        self
    }

    /// Recorded check-in
    #[must_use]
    pub fn checked_in(mut self, at: &str) -> Self {
        self.ticket.check_in = Some(at.to_string());
        self
    }

    /// Recorded check-out
    #[must_use]
    pub fn checked_out(mut self, at: &str) -> Self {
        self.ticket.check_out = Some(at.to_string());
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> Ticket {
        self.ticket
    }
}

/// Seat map of the sample event, as the server sends it
#[must_use]
pub fn seat_map_json() -> Value {
    json!([
        {
            "tableId": "T1",
            "name": "Table 1",
            "chairs": [
                { "chairId": "C1", "description": "Table 1 - Seat 1", "usedChair": false },
                {
                    "chairId": "C2",
                    "description": "Table 1 - Seat 2",
                    "usedChair": true,
                    "usedByTicketId": "t003"
                }
            ]
        },
        {
            "tableId": "T2",
            "name": "Table 2",
            "chairs": [
                { "chairId": "C3", "description": "Table 2 - Seat 1", "usedChair": false }
            ]
        }
    ])
}

/// Tickets of the sample event
#[must_use]
pub fn sample_tickets() -> Vec<Ticket> {
    vec![
        TicketBuilder::new("t001")
            .named("Ada", "Lovelace")
            .in_group("G1")
            .group_main()
            .parking(ParkingMethod::Standard)
            .build(),
        TicketBuilder::new("t002")
            .named("Charles", "Babbage")
            .in_group("G1")
            .build(),
        TicketBuilder::new("t003")
            .named("Grace", "Hopper")
            .parking(ParkingMethod::Valet)
            .seated("T1", "C2")
            .build(),
    ]
}

/// The sample event, seat map stored JSON-encoded the way the server sends it
#[must_use]
pub fn sample_snapshot() -> EventSnapshot {
    EventSnapshot {
        event_tickets: sample_tickets(),
        tables_and_chairs: Some(Value::String(seat_map_json().to_string())),
        name: Some("Spring Gala".to_string()),
        ..EventSnapshot::default()
    }
}

/// Reply body of a redeemed pass code for the sample event
#[must_use]
pub fn redeemed_roster() -> Value {
    serde_json::to_value(sample_snapshot()).unwrap()
}

/// The seat map with one chair marked as held by a ticket
#[must_use]
pub fn seat_map_with_occupant(table: &str, chair: &str, ticket: &str) -> Value {
    let mut seat_map = seat_map_json();
    if let Some(tables) = seat_map.as_array_mut() {
        for t in tables.iter_mut().filter(|t| t["tableId"] == table) {
            if let Some(chairs) = t["chairs"].as_array_mut() {
                for c in chairs.iter_mut().filter(|c| c["chairId"] == chair) {
                    c["usedChair"] = json!(true);
                    c["usedByTicketId"] = json!(ticket);
                }
            }
        }
    }
    seat_map
}

/// The seat map with one chair freed
#[must_use]
pub fn seat_map_without_occupant(table: &str, chair: &str) -> Value {
    let mut seat_map = seat_map_json();
    if let Some(tables) = seat_map.as_array_mut() {
        for t in tables.iter_mut().filter(|t| t["tableId"] == table) {
            if let Some(chairs) = t["chairs"].as_array_mut() {
                for c in chairs.iter_mut().filter(|c| c["chairId"] == chair) {
                    c["usedChair"] = json!(false);
                    if let Some(fields) = c.as_object_mut() {
                        fields.remove("usedByTicketId");
                    }
                }
            }
        }
    }
    seat_map
}
