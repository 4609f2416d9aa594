//! Per-event serialization of read-modify-write sequences.

use checkin_core::types::EventId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per event id
///
/// Every operation that loads, mutates and saves an event's document holds the
/// event's guard for its whole duration, remote call included, so concurrent
/// UI actions on the same event cannot lose each other's updates. Different
/// events never block each other.
#[derive(Debug, Default)]
pub struct EventLocks {
    locks: Mutex<HashMap<EventId, Arc<Mutex<()>>>>,
}

impl EventLocks {
    /// Creates an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to an event
    pub async fn lock(&self, event_id: &EventId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(event_id.clone()).or_default())
        };
        tracing::trace!(event_id = %event_id, "Waiting for event lock");
        lock.lock_owned().await
    }
}
