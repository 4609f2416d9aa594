//! Resolve scanned QR payloads to tickets.
//!
//! A QR code encodes a URL whose last path segment is the ticket id. Ids are
//! compared with every hyphen removed from both sides; everything else,
//! including case, must match exactly.

use crate::error::CheckInError;
use crate::types::{EventSnapshot, Ticket};

/// Extract the ticket id from a scanned payload
///
/// # Errors
///
/// Returns [`CheckInError::MalformedPayload`] when nothing follows the last `/`.
pub fn extract_ticket_id(payload: &str) -> Result<&str, CheckInError> {
    let segment = payload
        .rsplit_once('/')
        .map_or(payload, |(_, last)| last)
        .trim();
    if segment.is_empty() {
        return Err(CheckInError::MalformedPayload(format!(
            "no ticket id in scanned payload '{payload}'"
        )));
    }
    Ok(segment)
}

/// Matching key of an identifier: hyphens stripped, case kept
#[must_use]
pub fn normalize(id: &str) -> String {
    id.chars().filter(|c| *c != '-').collect()
}

/// Find the ticket a scanned payload refers to
///
/// # Errors
///
/// Returns [`CheckInError::MalformedPayload`] for payloads without an id and
/// [`CheckInError::NotFound`] when no ticket matches.
pub fn find_by_scanned_id<'a>(
    snapshot: &'a EventSnapshot,
    payload: &str,
) -> Result<&'a Ticket, CheckInError> {
    let key = normalize(extract_ticket_id(payload)?);
    snapshot
        .event_tickets
        .iter()
        .find(|t| normalize(t.id.as_str()) == key)
        .ok_or_else(|| CheckInError::NotFound(format!("no ticket matches '{payload}'")))
}
