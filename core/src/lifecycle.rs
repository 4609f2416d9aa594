//! Ticket lifecycle state machine.
//!
//! `NotCheckedIn -> CheckedIn -> CheckedOut`, one direction only. Commands are
//! validated against the ticket as stored locally; a refused command never
//! produces a remote call. Accepted commands produce a single
//! [`RemoteCall::UpdateTicket`] or [`RemoteCall::UpdateParking`] effect, and the
//! local ticket only changes when the runtime feeds back the confirmed event.

use crate::effect::{Effect, Effects};
use crate::environment::Clock;
use crate::error::{CheckInError, ValidationError};
use crate::reducer::Reducer;
use crate::remote::{
    DEFAULT_EMAIL, DEFAULT_FIRST_NAME, DEFAULT_LAST_NAME, DEFAULT_TITLE, ParkingUpdateRequest,
    RemoteCall, TicketUpdateRequest,
};
use crate::smallvec;
use crate::types::{ParkingMethod, Ticket};
use std::sync::Arc;

/// Injected dependencies for lifecycle transitions
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Source of check-in/check-out timestamps
    pub clock: Arc<dyn Clock>,
}

impl LifecycleEnvironment {
    /// Creates a new `LifecycleEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Lifecycle commands and their confirmed outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    // Commands
    /// Record the attendee's arrival
    CheckIn,
    /// Record the attendee's departure (parking tickets only)
    CheckOut,
    /// Record parking and key slots
    SaveParking {
        /// Parking slot entered by staff
        parking_slot: Option<String>,
        /// Key slot entered by staff; ignored unless the method is valet
        key_slot: Option<String>,
    },

    // Events
    /// The remote service accepted the check-in
    CheckedIn {
        /// Timestamp sent to the server
        at: String,
    },
    /// The remote service accepted the check-out
    CheckedOut {
        /// Timestamp sent to the server
        at: String,
    },
    /// The remote service accepted the parking data
    ParkingSaved {
        /// Parking slot sent to the server
        parking_slot: Option<String>,
        /// Key slot sent to the server
        key_slot: Option<String>,
    },
}

/// Reducer for a single ticket's lifecycle
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleReducer;

/// Treat blank input as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_filled(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl LifecycleReducer {
    fn validate_check_in(ticket: &Ticket) -> Result<(), ValidationError> {
        match &ticket.check_in {
            Some(at) => Err(ValidationError::AlreadyCheckedIn { at: at.clone() }),
            None => Ok(()),
        }
    }

    /// Gates run in a fixed order: parking method, slots, then lifecycle state
    fn validate_check_out(ticket: &Ticket) -> Result<(), ValidationError> {
        match ticket.parking_method {
            method @ (ParkingMethod::None | ParkingMethod::Free) => {
                return Err(ValidationError::CheckOutNotApplicable { method });
            }
            ParkingMethod::Valet => {
                if !is_filled(ticket.parking_slot.as_ref()) || !is_filled(ticket.key_slot.as_ref())
                {
                    return Err(ValidationError::KeySlotRequired);
                }
            }
            ParkingMethod::Standard => {
                if !is_filled(ticket.parking_slot.as_ref()) {
                    return Err(ValidationError::ParkingSlotRequired);
                }
            }
        }

        if ticket.check_in.is_none() {
            return Err(ValidationError::CheckInRequired);
        }
        if let Some(at) = &ticket.check_out {
            return Err(ValidationError::AlreadyCheckedOut { at: at.clone() });
        }
        Ok(())
    }

    /// Build the full update the server expects, with placeholders for gaps
    fn update_request(
        ticket: &Ticket,
        check_in: Option<String>,
        check_out: Option<String>,
    ) -> TicketUpdateRequest {
        let or_default = |value: &Option<String>, default: &str| {
            value.clone().unwrap_or_else(|| default.to_string())
        };
        TicketUpdateRequest {
            id: ticket.id.clone(),
            title: or_default(&ticket.title, DEFAULT_TITLE),
            first_name: or_default(&ticket.first_name, DEFAULT_FIRST_NAME),
            last_name: or_default(&ticket.last_name, DEFAULT_LAST_NAME),
            email: or_default(&ticket.email, DEFAULT_EMAIL),
            check_in,
            check_out,
        }
    }

    fn apply_event(ticket: &mut Ticket, action: &LifecycleAction) {
        match action {
            LifecycleAction::CheckedIn { at } => {
                ticket.check_in = Some(at.clone());
            }
            LifecycleAction::CheckedOut { at } => {
                ticket.check_out = Some(at.clone());
            }
            LifecycleAction::ParkingSaved {
                parking_slot,
                key_slot,
            } => {
                ticket.parking_slot.clone_from(parking_slot);
                ticket.key_slot.clone_from(key_slot);
            }
            // Commands are not events
            LifecycleAction::CheckIn
            | LifecycleAction::CheckOut
            | LifecycleAction::SaveParking { .. } => {}
        }
    }
}

impl Reducer for LifecycleReducer {
    type State = Ticket;
    type Action = LifecycleAction;
    type Environment = LifecycleEnvironment;
    type Error = CheckInError;

    fn reduce(
        &self,
        ticket: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects<Self::Action>, Self::Error> {
        match action {
            // ========== Commands ==========
            LifecycleAction::CheckIn => {
                Self::validate_check_in(ticket)?;

                let at = env.clock.timestamp();
                let request =
                    Self::update_request(ticket, Some(at.clone()), ticket.check_out.clone());
                Ok(smallvec![Effect::remote(
                    RemoteCall::UpdateTicket(request),
                    LifecycleAction::CheckedIn { at },
                )])
            }

            LifecycleAction::CheckOut => {
                Self::validate_check_out(ticket)?;

                let at = env.clock.timestamp();
                let request =
                    Self::update_request(ticket, ticket.check_in.clone(), Some(at.clone()));
                Ok(smallvec![Effect::remote(
                    RemoteCall::UpdateTicket(request),
                    LifecycleAction::CheckedOut { at },
                )])
            }

            LifecycleAction::SaveParking {
                parking_slot,
                key_slot,
            } => {
                let parking_slot = non_blank(parking_slot);
                let key_slot = if ticket.parking_method.tracks_key_slot() {
                    non_blank(key_slot)
                } else {
                    None
                };

                let request = ParkingUpdateRequest {
                    id: ticket.id.clone(),
                    parking_slot: parking_slot.clone(),
                    key_slot: key_slot.clone(),
                };
                Ok(smallvec![Effect::remote(
                    RemoteCall::UpdateParking(request),
                    LifecycleAction::ParkingSaved {
                        parking_slot,
                        key_slot,
                    },
                )])
            }

            // ========== Events ==========
            event @ (LifecycleAction::CheckedIn { .. }
            | LifecycleAction::CheckedOut { .. }
            | LifecycleAction::ParkingSaved { .. }) => {
                tracing::debug!(ticket_id = %ticket.id, ?event, "Applying confirmed lifecycle event");
                Self::apply_event(ticket, &event);
                Ok(Effects::new())
            }
        }
    }
}
