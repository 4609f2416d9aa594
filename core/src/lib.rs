//! # Check-in Core
//!
//! Domain model and business rules for an offline-first event check-in client.
//!
//! Staff download the ticket roster of an event, scan QR codes to find tickets,
//! record check-in/check-out and parking data, and seat attendees at tables.
//! A single JSON document per event mirrors the server-side ticket and seating
//! state. This crate holds everything about that document that does not touch
//! I/O; the `checkin-runtime` crate executes the effects described here.
//!
//! ## Core Concepts
//!
//! - **Snapshot**: The locally persisted roster of one event ([`types::EventSnapshot`])
//! - **Seat Map**: Tables and chairs with per-chair occupancy ([`seating::SeatMap`])
//! - **Reducer**: `(State, Action, Environment) → Result<Effects>`, no I/O
//! - **Effect**: A remote call to perform, plus the action to feed back on acceptance
//! - **Environment**: Injected dependencies (clock, seating credentials)
//!
//! ## Remote-confirm, then commit
//!
//! Command actions validate and describe a remote call. Nothing changes locally
//! until the runtime reports the call was accepted and feeds the `on_success`
//! action back through the same reducer:
//!
//! ```text
//! CheckIn ──reduce──▶ Effect::Remote { UpdateTicket, on_success: CheckedIn { at } }
//!                                │
//!                         remote accepted
//!                                ▼
//! CheckedIn { at } ──reduce──▶ ticket.check_in = Some(at)
//! ```
//!
//! ## Example
//!
//! ```
//! use checkin_core::environment::{Clock, FixedClock};
//! use checkin_core::lifecycle::{LifecycleAction, LifecycleEnvironment, LifecycleReducer};
//! use checkin_core::reducer::Reducer;
//! use checkin_core::types::{Ticket, TicketId};
//! use std::sync::Arc;
//!
//! let env = LifecycleEnvironment::new(Arc::new(FixedClock::at_epoch()));
//! let mut ticket = Ticket::new(TicketId::new("t-001"));
//!
//! let effects = LifecycleReducer.reduce(&mut ticket, LifecycleAction::CheckIn, &env).unwrap();
//! assert_eq!(effects.len(), 1);
//! assert!(ticket.check_in.is_none()); // not committed until the remote accepts
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod lookup;
pub mod remote;
pub mod seating;
pub mod serde_helpers;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use error::{CheckInError, ValidationError};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → Result<Effects>`.
/// They validate commands, apply confirmed events, and never perform I/O.
pub mod reducer {
    use super::effect::Effects;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Error`: Why a command was refused before any effect was produced
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Refusal reported for commands that fail validation
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// Commands validate and return effect descriptions without touching
        /// state. Events (fed back after a remote call was accepted) update
        /// state in place and return no effects.
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when a command's preconditions are not met.
        /// A refused command leaves state untouched and produces no effects.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects<Self::Action>, Self::Error>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. The runtime performs them and feeds the
/// resulting action back into the reducer that produced them.
pub mod effect {
    use crate::remote::RemoteCall;
    use smallvec::SmallVec;

    /// Effect list returned by reducers
    pub type Effects<Action> = SmallVec<[Effect<Action>; 2]>;

    /// Effect type - describes a side effect to be executed
    #[derive(Debug, Clone, PartialEq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Call the remote ticket service
        ///
        /// When the remote accepts the call, `on_success` is reduced to commit
        /// the change locally. A rejection leaves local state as it was.
        Remote {
            /// The request to send
            call: RemoteCall,
            /// Action to dispatch once the remote accepted the call
            on_success: Box<Action>,
        },
    }

    impl<Action> Effect<Action> {
        /// Build a remote effect
        #[must_use]
        pub fn remote(call: RemoteCall, on_success: Action) -> Self {
            Self::Remote {
                call,
                on_success: Box::new(on_success),
            }
        }

        /// The remote call this effect performs, if any
        #[must_use]
        pub const fn remote_call(&self) -> Option<&RemoteCall> {
            match self {
                Self::None => None,
                Self::Remote { call, .. } => Some(call),
            }
        }
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, NaiveDate, Utc};

    /// Format used for check-in and check-out timestamps (second precision)
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// Current time rendered as a check-in/check-out timestamp
        fn timestamp(&self) -> String {
            self.now().format(TIMESTAMP_FORMAT).to_string()
        }
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Fixed clock for deterministic tests and replays
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Clock pinned to 1970-01-01T00:00:00
        #[must_use]
        pub fn at_epoch() -> Self {
            Self::new(DateTime::<Utc>::UNIX_EPOCH)
        }

        /// Clock pinned to midnight UTC of the given date, if it exists
        #[must_use]
        pub fn on(year: i32, month: u32, day: u32) -> Option<Self> {
            NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| Self::new(naive.and_utc()))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }
}
