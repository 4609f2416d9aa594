//! Semicolon-separated roster export for sharing off-device.

use crate::types::{EventSnapshot, ParkingMethod, Ticket};

/// Column order of the export; part of the contract with export consumers
pub const EXPORT_COLUMNS: [&str; 14] = [
    "id",
    "groupId",
    "groupMain",
    "title",
    "firstName",
    "lastName",
    "email",
    "tableId",
    "chairId",
    "checkIn",
    "checkOut",
    "parkingMethod",
    "parkingSlot",
    "keySlot",
];

const DELIMITER: char = ';';

/// Quote a field when it contains the delimiter, a quote or a line break
fn escape(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn row(ticket: &Ticket) -> [String; 14] {
    let text = |value: Option<&str>| value.unwrap_or_default().to_string();
    let parking_method = match ticket.parking_method {
        ParkingMethod::None => String::new(),
        method => method.as_str().to_string(),
    };
    [
        ticket.id.to_string(),
        text(ticket.group_id.as_ref().map(|g| g.as_str())),
        ticket.group_main.to_string(),
        text(ticket.title.as_deref()),
        text(ticket.first_name.as_deref()),
        text(ticket.last_name.as_deref()),
        text(ticket.email.as_deref()),
        text(ticket.table_id.as_ref().map(|t| t.as_str())),
        text(ticket.chair_id.as_ref().map(|c| c.as_str())),
        text(ticket.check_in.as_deref()),
        text(ticket.check_out.as_deref()),
        parking_method,
        text(ticket.parking_slot.as_deref()),
        text(ticket.key_slot.as_deref()),
    ]
}

fn push_line<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&escape(field.as_ref()));
    }
    out.push('\n');
}

/// Render every ticket of a snapshot, header first, in stored order
#[must_use]
pub fn export_tickets(snapshot: &EventSnapshot) -> String {
    let mut out = String::new();
    push_line(&mut out, EXPORT_COLUMNS);
    for ticket in &snapshot.event_tickets {
        push_line(&mut out, row(ticket));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupId, TicketId};

    #[test]
    fn header_then_one_row_per_ticket() {
        let mut ticket = Ticket::new(TicketId::new("t1"));
        ticket.group_id = Some(GroupId::new("g1"));
        ticket.group_main = true;
        ticket.first_name = Some("Ada".into());
        ticket.parking_method = ParkingMethod::Valet;
        let snapshot = EventSnapshot {
            event_tickets: vec![ticket, Ticket::new(TicketId::new("t2"))],
            ..EventSnapshot::default()
        };

        let text = export_tickets(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], EXPORT_COLUMNS.join(";"));
        assert_eq!(lines[1], "t1;g1;true;;Ada;;;;;;;valet;;");
        assert_eq!(lines[2], "t2;;false;;;;;;;;;;;");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn awkward_fields_are_quoted() {
        let mut ticket = Ticket::new(TicketId::new("t1"));
        ticket.last_name = Some("O\"Neil; Jr".into());
        ticket.title = Some("line\nbreak".into());
        let snapshot = EventSnapshot {
            event_tickets: vec![ticket],
            ..EventSnapshot::default()
        };

        let text = export_tickets(&snapshot);
        assert!(text.contains("\"O\"\"Neil; Jr\""));
        assert!(text.contains("\"line\nbreak\""));
    }
}
