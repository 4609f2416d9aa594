//! # Check-in Testing
//!
//! Testing utilities and helpers for the check-in crates.
//!
//! This crate provides:
//! - A fixed clock for deterministic timestamps
//! - A scripted remote ticket service that records every call
//! - An in-memory ticket store with injectable write failures
//! - Builders for tickets, snapshots and seat maps
//! - Given-When-Then assertions for reducers
//!
//! ## Example
//!
//! ```ignore
//! use checkin_testing::{InMemoryTicketStore, ScriptedRemote, fixtures, test_clock};
//!
//! #[tokio::test]
//! async fn check_in_once() {
//!     let store = Arc::new(InMemoryTicketStore::with_event(&event, fixtures::sample_snapshot()));
//!     let remote = Arc::new(ScriptedRemote::new());
//!     remote.reply(200, json!({}));
//!
//!     let session = CheckInSession::new(store, remote.clone(), Arc::new(test_clock()), policy);
//!     session.check_in(&event, &TicketId::new("t001")).await.unwrap();
//!     assert_eq!(remote.call_count(), 1);
//! }
//! ```

use checkin_core::environment::FixedClock;

pub mod fixtures;
pub mod reducer_test;
pub mod remote_mocks;
pub mod store_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::FixedClock;
    use chrono::{DateTime, Utc};

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Timestamp produced by [`test_clock`]
    pub const TEST_TIMESTAMP: &str = "2025-01-01T00:00:00";
}

/// Property-based testing utilities using proptest
pub mod properties {
    use checkin_core::types::{ParkingMethod, Ticket, TicketId};
    use proptest::prelude::*;

    /// Ticket ids as printed on badges: alphanumeric runs joined by hyphens
    pub fn hyphenated_id() -> impl Strategy<Value = String> {
        "[A-Za-z0-9]{1,6}(-[A-Za-z0-9]{1,6}){0,3}"
    }

    /// Any parking method
    pub fn parking_method() -> impl Strategy<Value = ParkingMethod> {
        prop_oneof![
            Just(ParkingMethod::None),
            Just(ParkingMethod::Free),
            Just(ParkingMethod::Standard),
            Just(ParkingMethod::Valet),
        ]
    }

    /// Free text that may contain separators and quotes
    pub fn field_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z ;\"\n]{0,12}")
    }

    /// Tickets with arbitrary names, parking and lifecycle timestamps
    pub fn ticket() -> impl Strategy<Value = Ticket> {
        (
            hyphenated_id(),
            field_text(),
            field_text(),
            parking_method(),
            proptest::option::of("2025-0[1-9]-1[0-9]T1[0-9]:00:00"),
        )
            .prop_map(|(id, first_name, last_name, parking_method, check_in)| {
                let mut ticket = Ticket::new(TicketId::new(id));
                ticket.first_name = first_name;
                ticket.last_name = last_name;
                ticket.parking_method = parking_method;
                ticket.check_in = check_in;
                ticket
            })
    }
}

// Re-export commonly used items
pub use mocks::{TEST_TIMESTAMP, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use remote_mocks::ScriptedRemote;
pub use store_mocks::InMemoryTicketStore;
