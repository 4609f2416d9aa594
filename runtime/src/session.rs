//! Reconciliation coordinator.
//!
//! [`CheckInSession`] is the explicit context every screen works through. It
//! loads the event's snapshot, runs a reducer, executes the remote effects the
//! reducer describes, feeds accepted outcomes back, persists, and re-fetches
//! the seat map after anything that may have changed seating.
//!
//! All read-modify-write sequences on one event hold that event's lock from
//! load to save, remote call included.

use crate::locks::EventLocks;
use crate::scanner::{ScanLatch, ScanOutcome};
use crate::store::{StoredEvent, TicketStore};
use checkin_core::catalog::EventFilter;
use checkin_core::effect::{Effect, Effects};
use checkin_core::environment::Clock;
use checkin_core::error::{CheckInError, ValidationError};
use checkin_core::export::export_tickets;
use checkin_core::lifecycle::{LifecycleAction, LifecycleEnvironment, LifecycleReducer};
use checkin_core::lookup::find_by_scanned_id;
use checkin_core::reducer::Reducer;
use checkin_core::remote::{
    EventSummary, PassCodeRequest, RemoteCall, RemotePolicy, RemoteTicketService,
    interpret_remote_result,
};
use checkin_core::seating::{
    SeatMap, SeatingAction, SeatingEnvironment, SeatingReducer, SeatingState,
};
use checkin_core::types::{ChairId, EventId, EventSnapshot, GroupId, TableId, Ticket, TicketId};
use checkin_core::views::{SeatPickerView, TicketDetailView};
use std::collections::VecDeque;
use std::sync::Arc;

/// Outcome of an accepted seat assignment or release
#[derive(Debug, Clone, PartialEq)]
pub struct SeatingOutcome {
    /// Message the server attached to its acceptance
    pub server_message: Option<String>,
    /// Authoritative seat map fetched afterwards; `None` when unavailable
    pub seat_map: Option<SeatMap>,
}

/// One staff session against the local store and the remote service
pub struct CheckInSession {
    store: Arc<dyn TicketStore>,
    remote: Arc<dyn RemoteTicketService>,
    clock: Arc<dyn Clock>,
    policy: RemotePolicy,
    locks: EventLocks,
    scanner: ScanLatch,
}

fn require(value: &str, missing: ValidationError) -> Result<String, CheckInError> {
    let value = value.trim();
    if value.is_empty() {
        Err(missing.into())
    } else {
        Ok(value.to_string())
    }
}

impl CheckInSession {
    /// Creates a new session
    #[must_use]
    pub fn new(
        store: Arc<dyn TicketStore>,
        remote: Arc<dyn RemoteTicketService>,
        clock: Arc<dyn Clock>,
        policy: RemotePolicy,
    ) -> Self {
        Self {
            store,
            remote,
            clock,
            policy,
            locks: EventLocks::new(),
            scanner: ScanLatch::new(),
        }
    }

    /// Send one call and decide whether it was accepted
    async fn perform(&self, call: &RemoteCall) -> Result<Option<String>, CheckInError> {
        let reply = self.remote.send(call).await?;
        match interpret_remote_result(call, &reply, &self.policy) {
            Ok(message) => {
                tracing::debug!(call = call.name(), status = reply.status, "Remote accepted");
                Ok(message)
            }
            Err(e) => {
                tracing::warn!(call = call.name(), status = reply.status, error = %e, "Remote rejected");
                Err(e)
            }
        }
    }

    /// Reduce an action and drive its effects to completion
    ///
    /// Accepted remote calls feed their `on_success` action back through the
    /// reducer. The first rejection stops the run; state only reflects what
    /// was confirmed before it.
    async fn run<R>(
        &self,
        reducer: &R,
        state: &mut R::State,
        action: R::Action,
        env: &R::Environment,
    ) -> Result<Option<String>, CheckInError>
    where
        R: Reducer<Error = CheckInError>,
    {
        let mut pending: VecDeque<Effect<R::Action>> =
            reducer.reduce(state, action, env)?.into_iter().collect();
        let mut message = None;

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::None => {}
                Effect::Remote { call, on_success } => {
                    if let Some(m) = self.perform(&call).await? {
                        message = Some(m);
                    }
                    let follow_up: Effects<R::Action> = reducer.reduce(state, *on_success, env)?;
                    pending.extend(follow_up);
                }
            }
        }
        Ok(message)
    }

    // ========================================================================
    // Downloads
    // ========================================================================

    /// Redeem a pass code and store the returned roster, replacing any previous copy
    ///
    /// # Errors
    ///
    /// Validation errors for a blank pass code or staff name, the server's
    /// rejection, [`CheckInError::MalformedPayload`] when the reply has no
    /// `eventTickets`, or [`CheckInError::Io`] when it cannot be stored.
    pub async fn download(
        &self,
        event_id: &EventId,
        pass_code: &str,
        staff_name: &str,
    ) -> Result<EventSnapshot, CheckInError> {
        let pass_code = require(pass_code, ValidationError::MissingPassCode)?;
        let staff_name = require(staff_name, ValidationError::MissingStaffName)?;
        let _guard = self.locks.lock(event_id).await;

        let call = RemoteCall::RedeemPassCode(PassCodeRequest {
            pass_code,
            event_id: event_id.clone(),
            name: staff_name.clone(),
        });
        let reply = self.remote.send(&call).await?;
        if let Err(e) = interpret_remote_result(&call, &reply, &self.policy) {
            tracing::warn!(event_id = %event_id, error = %e, "Pass code refused");
            return Err(e);
        }
        let snapshot = EventSnapshot::from_redeemed(reply.body)?;

        self.store.save(event_id, &snapshot).await?;
        self.store.save_staff_name(event_id, &staff_name).await?;
        tracing::info!(
            event_id = %event_id,
            tickets = snapshot.event_tickets.len(),
            "Downloaded tickets"
        );
        Ok(snapshot)
    }

    /// Events downloaded on this device
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] when the store cannot be enumerated.
    pub async fn list_downloaded(&self) -> Result<Vec<StoredEvent>, CheckInError> {
        self.store.list_all().await
    }

    /// Remove a downloaded event; succeeds when it was already gone
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] on removal failure.
    pub async fn delete_download(&self, event_id: &EventId) -> Result<(), CheckInError> {
        let _guard = self.locks.lock(event_id).await;
        self.store.delete(event_id).await
    }

    /// The event's local snapshot
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when the event was not downloaded.
    pub async fn snapshot(&self, event_id: &EventId) -> Result<EventSnapshot, CheckInError> {
        self.store.load(event_id).await
    }

    /// Staff member who downloaded the event
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when no name was stored.
    pub async fn staff_name(&self, event_id: &EventId) -> Result<String, CheckInError> {
        self.store.staff_name(event_id).await
    }

    /// Public events matching the filter; empty when the catalog is unreachable
    pub async fn list_events(&self, filter: &EventFilter) -> Vec<EventSummary> {
        match self.remote.list_events().await {
            Ok(events) => filter.apply(events),
            Err(e) => {
                tracing::warn!(error = %e, "Event catalog unavailable");
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    /// Resolve a scanned payload to a ticket without touching the scan latch
    ///
    /// # Errors
    ///
    /// [`CheckInError::MalformedPayload`] or [`CheckInError::NotFound`].
    pub async fn find_ticket(
        &self,
        event_id: &EventId,
        payload: &str,
    ) -> Result<Ticket, CheckInError> {
        let snapshot = self.store.load(event_id).await?;
        find_by_scanned_id(&snapshot, payload).cloned()
    }

    /// Feed a camera scan
    ///
    /// While a previous scan is latched this returns [`ScanOutcome::Ignored`].
    /// A failed lookup re-opens the latch; a successful one keeps it closed
    /// until [`CheckInSession::reset_scanner`].
    ///
    /// # Errors
    ///
    /// Same as [`CheckInSession::find_ticket`].
    pub async fn scan(&self, event_id: &EventId, payload: &str) -> Result<ScanOutcome, CheckInError> {
        if !self.scanner.try_latch() {
            tracing::trace!("Scan ignored while latched");
            return Ok(ScanOutcome::Ignored);
        }
        match self.find_ticket(event_id, payload).await {
            Ok(ticket) => {
                tracing::debug!(event_id = %event_id, ticket_id = %ticket.id, "Scan resolved");
                Ok(ScanOutcome::Found(ticket))
            }
            Err(e) => {
                self.scanner.reset();
                tracing::warn!(event_id = %event_id, error = %e, "Scan not resolved");
                Err(e)
            }
        }
    }

    /// Accept scans again
    pub fn reset_scanner(&self) {
        self.scanner.reset();
    }

    // ========================================================================
    // Ticket lifecycle
    // ========================================================================

    /// Detail view of one ticket
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] for an unknown event or ticket.
    pub async fn ticket_detail(
        &self,
        event_id: &EventId,
        ticket_id: &TicketId,
    ) -> Result<TicketDetailView, CheckInError> {
        let snapshot = self.store.load(event_id).await?;
        let ticket = snapshot
            .ticket(ticket_id)
            .ok_or_else(|| CheckInError::NotFound(format!("ticket {ticket_id}")))?;
        Ok(TicketDetailView::build(&snapshot, ticket))
    }

    async fn transition(
        &self,
        event_id: &EventId,
        ticket_id: &TicketId,
        action: LifecycleAction,
    ) -> Result<Ticket, CheckInError> {
        let _guard = self.locks.lock(event_id).await;
        let mut snapshot = self.store.load(event_id).await?;
        let mut ticket = snapshot
            .ticket(ticket_id)
            .cloned()
            .ok_or_else(|| CheckInError::NotFound(format!("ticket {ticket_id}")))?;

        let env = LifecycleEnvironment::new(Arc::clone(&self.clock));
        if let Err(e) = self.run(&LifecycleReducer, &mut ticket, action, &env).await {
            tracing::warn!(event_id = %event_id, ticket_id = %ticket_id, error = %e, "Ticket update refused");
            return Err(e);
        }

        snapshot.replace_ticket(ticket.clone())?;
        self.store.save(event_id, &snapshot).await?;
        Ok(ticket)
    }

    /// Record check-in
    ///
    /// # Errors
    ///
    /// [`ValidationError::AlreadyCheckedIn`] without any remote call, the
    /// server's rejection, or a storage failure after acceptance.
    pub async fn check_in(
        &self,
        event_id: &EventId,
        ticket_id: &TicketId,
    ) -> Result<Ticket, CheckInError> {
        let ticket = self
            .transition(event_id, ticket_id, LifecycleAction::CheckIn)
            .await?;
        tracing::info!(event_id = %event_id, ticket_id = %ticket_id, "Checked in");
        Ok(ticket)
    }

    /// Record check-out
    ///
    /// # Errors
    ///
    /// Parking and lifecycle validation errors without any remote call, the
    /// server's rejection, or a storage failure after acceptance.
    pub async fn check_out(
        &self,
        event_id: &EventId,
        ticket_id: &TicketId,
    ) -> Result<Ticket, CheckInError> {
        let ticket = self
            .transition(event_id, ticket_id, LifecycleAction::CheckOut)
            .await?;
        tracing::info!(event_id = %event_id, ticket_id = %ticket_id, "Checked out");
        Ok(ticket)
    }

    /// Record parking and key slots
    ///
    /// # Errors
    ///
    /// [`CheckInError::Conflict`] when the server already has parking data,
    /// another rejection for invalid data, or a storage failure.
    pub async fn save_parking(
        &self,
        event_id: &EventId,
        ticket_id: &TicketId,
        parking_slot: Option<String>,
        key_slot: Option<String>,
    ) -> Result<Ticket, CheckInError> {
        let ticket = self
            .transition(
                event_id,
                ticket_id,
                LifecycleAction::SaveParking {
                    parking_slot,
                    key_slot,
                },
            )
            .await?;
        tracing::info!(event_id = %event_id, ticket_id = %ticket_id, "Saved parking data");
        Ok(ticket)
    }

    // ========================================================================
    // Seating
    // ========================================================================

    /// Fetch the authoritative seat map and keep it in the snapshot
    async fn refresh_locked(
        &self,
        event_id: &EventId,
        snapshot: &mut EventSnapshot,
    ) -> Result<SeatMap, CheckInError> {
        let detail = self.remote.event_detail(event_id).await?;
        let raw = detail.tables_and_chairs.ok_or_else(|| {
            CheckInError::SeatMapParse("event has no tables and chairs".to_string())
        })?;
        let seat_map = SeatMap::parse(&raw)?;
        snapshot.tables_and_chairs = Some(raw);
        self.store.save(event_id, snapshot).await?;
        tracing::debug!(event_id = %event_id, tables = seat_map.tables.len(), "Refreshed seat map");
        Ok(seat_map)
    }

    /// Refresh, reporting failure as an unavailable seat map
    async fn refresh_or_none(
        &self,
        event_id: &EventId,
        snapshot: &mut EventSnapshot,
    ) -> Option<SeatMap> {
        match self.refresh_locked(event_id, snapshot).await {
            Ok(seat_map) => Some(seat_map),
            Err(e) => {
                tracing::warn!(event_id = %event_id, error = %e, "Seat map not available");
                None
            }
        }
    }

    /// Re-fetch the seat map from the server and store it locally
    ///
    /// # Errors
    ///
    /// Transport or rejection errors, [`CheckInError::SeatMapParse`] for an
    /// undecodable map, or a storage failure.
    pub async fn refresh_seat_map(&self, event_id: &EventId) -> Result<SeatMap, CheckInError> {
        let _guard = self.locks.lock(event_id).await;
        let mut snapshot = self.store.load(event_id).await?;
        self.refresh_locked(event_id, &mut snapshot).await
    }

    /// Run a seating command, persist, then refresh the seat map
    async fn seat_change(
        &self,
        event_id: &EventId,
        pass_code: &str,
        action: SeatingAction,
    ) -> Result<(EventSnapshot, SeatingOutcome), CheckInError> {
        let _guard = self.locks.lock(event_id).await;
        let snapshot = self.store.load(event_id).await?;
        let seat_map = snapshot.seat_map().ok();
        let mut state = SeatingState { snapshot, seat_map };
        let env = SeatingEnvironment {
            event_id: event_id.clone(),
            pass_code: pass_code.to_string(),
        };

        let server_message = match self.run(&SeatingReducer, &mut state, action, &env).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(event_id = %event_id, error = %e, "Seat change refused");
                return Err(e);
            }
        };

        let mut snapshot = state.snapshot;
        // stands in until the refresh below succeeds
        if let Some(seat_map) = &state.seat_map {
            snapshot.set_seat_map(seat_map)?;
        }
        self.store.save(event_id, &snapshot).await?;
        tracing::info!(event_id = %event_id, "Seat change committed");

        // local occupancy is never trusted after a change
        let seat_map = self.refresh_or_none(event_id, &mut snapshot).await;
        Ok((
            snapshot,
            SeatingOutcome {
                server_message,
                seat_map,
            },
        ))
    }

    /// Seat a specific ticket at a free chair
    ///
    /// # Errors
    ///
    /// [`ValidationError::ChairOccupied`] without any remote call, the
    /// server's rejection, or a storage failure after acceptance.
    pub async fn assign_seat(
        &self,
        event_id: &EventId,
        pass_code: &str,
        ticket_id: &TicketId,
        table_id: &TableId,
        chair_id: &ChairId,
    ) -> Result<SeatingOutcome, CheckInError> {
        let action = SeatingAction::AssignSeat {
            ticket_id: ticket_id.clone(),
            table_id: table_id.clone(),
            chair_id: chair_id.clone(),
        };
        let (_, outcome) = self.seat_change(event_id, pass_code, action).await?;
        Ok(outcome)
    }

    /// Free a chair
    ///
    /// # Errors
    ///
    /// The server's rejection (no success marker in its message) or a storage
    /// failure after acceptance.
    pub async fn release_seat(
        &self,
        event_id: &EventId,
        pass_code: &str,
        table_id: &TableId,
        chair_id: &ChairId,
    ) -> Result<SeatingOutcome, CheckInError> {
        let action = SeatingAction::ReleaseSeat {
            table_id: table_id.clone(),
            chair_id: chair_id.clone(),
        };
        let (_, outcome) = self.seat_change(event_id, pass_code, action).await?;
        Ok(outcome)
    }

    /// Seat picker for a group, with a freshly fetched seat map
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when the event was not downloaded.
    pub async fn seat_picker(
        &self,
        event_id: &EventId,
        group_id: &GroupId,
    ) -> Result<SeatPickerView, CheckInError> {
        let _guard = self.locks.lock(event_id).await;
        let mut snapshot = self.store.load(event_id).await?;
        let seat_map = self.refresh_or_none(event_id, &mut snapshot).await;
        Ok(SeatPickerView::build(&snapshot, group_id, seat_map))
    }

    /// Act on a chair picked in the seat picker
    ///
    /// A free chair goes to the first unassigned ticket of the group; an
    /// occupied chair is released.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NoRemainingTickets`] when the group is fully seated,
    /// the server's rejection, or a storage failure after acceptance.
    pub async fn select_chair(
        &self,
        event_id: &EventId,
        group_id: &GroupId,
        pass_code: &str,
        table_id: &TableId,
        chair_id: &ChairId,
    ) -> Result<SeatPickerView, CheckInError> {
        let action = SeatingAction::SelectChair {
            group_id: group_id.clone(),
            table_id: table_id.clone(),
            chair_id: chair_id.clone(),
        };
        let (snapshot, outcome) = self.seat_change(event_id, pass_code, action).await?;
        Ok(SeatPickerView::build(&snapshot, group_id, outcome.seat_map))
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Semicolon-separated dump of every ticket of the event
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when the event was not downloaded.
    pub async fn export(&self, event_id: &EventId) -> Result<String, CheckInError> {
        let snapshot = self.store.load(event_id).await?;
        Ok(export_tickets(&snapshot))
    }
}
