//! In-memory ticket store
//!
//! Complements [`crate::ScriptedRemote`] so session tests run without a
//! filesystem. Snapshots are stored as JSON values and decoded on load, which
//! keeps the same serde round trip the file store goes through.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use checkin_core::error::CheckInError;
use checkin_core::types::{EventId, EventSnapshot};
use checkin_runtime::store::{StoreFuture, StoredEvent, TicketStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

/// HashMap-backed [`TicketStore`] with an injectable write failure
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    documents: RwLock<HashMap<EventId, Value>>,
    staff: RwLock<HashMap<EventId, String>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryTicketStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding one event
    #[must_use]
    pub fn with_event(event_id: &EventId, snapshot: &EventSnapshot) -> Self {
        let store = Self::new();
        store.insert(event_id, snapshot);
        store
    }

    /// Put a snapshot in place without counting it as a save
    pub fn insert(&self, event_id: &EventId, snapshot: &EventSnapshot) {
        let value = serde_json::to_value(snapshot).unwrap();
        self.documents
            .write()
            .unwrap()
            .insert(event_id.clone(), value);
    }

    /// Put a raw document in place, e.g. a corrupt or legacy one
    pub fn insert_raw(&self, event_id: &EventId, document: Value) {
        self.documents
            .write()
            .unwrap()
            .insert(event_id.clone(), document);
    }

    /// Make every following write fail with [`CheckInError::Io`]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful snapshot saves
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Decoded snapshot currently held for an event
    #[must_use]
    pub fn snapshot(&self, event_id: &EventId) -> Option<EventSnapshot> {
        self.documents
            .read()
            .unwrap()
            .get(event_id)
            .cloned()
            .map(|value| EventSnapshot::from_document(value).unwrap())
    }

    /// Whether a document exists for the event
    #[must_use]
    pub fn contains(&self, event_id: &EventId) -> bool {
        self.documents.read().unwrap().contains_key(event_id)
    }

    fn check_writable(&self) -> Result<(), CheckInError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(CheckInError::Io("disk full".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TicketStore for InMemoryTicketStore {
    fn load(&self, event_id: &EventId) -> StoreFuture<'_, EventSnapshot> {
        let document = self.documents.read().unwrap().get(event_id).cloned();
        let event_id = event_id.clone();
        Box::pin(async move {
            let document = document
                .ok_or_else(|| CheckInError::NotFound(format!("no tickets for event {event_id}")))?;
            EventSnapshot::from_document(document)
        })
    }

    fn save(&self, event_id: &EventId, snapshot: &EventSnapshot) -> StoreFuture<'_, ()> {
        let result = self.check_writable().and_then(|()| {
            let value =
                serde_json::to_value(snapshot).map_err(|e| CheckInError::Io(e.to_string()))?;
            self.documents
                .write()
                .unwrap()
                .insert(event_id.clone(), value);
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn delete(&self, event_id: &EventId) -> StoreFuture<'_, ()> {
        self.documents.write().unwrap().remove(event_id);
        self.staff.write().unwrap().remove(event_id);
        Box::pin(async { Ok(()) })
    }

    fn list_all(&self) -> StoreFuture<'_, Vec<StoredEvent>> {
        let mut events: Vec<StoredEvent> = self
            .documents
            .read()
            .unwrap()
            .iter()
            .filter_map(|(event_id, document)| {
                let snapshot = EventSnapshot::from_document(document.clone()).ok()?;
                snapshot.is_listable().then(|| StoredEvent {
                    event_id: event_id.clone(),
                    name: snapshot.display_name().to_string(),
                    handle: event_id.to_string(),
                })
            })
            .collect();
        events.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Box::pin(async move { Ok(events) })
    }

    fn save_staff_name(&self, event_id: &EventId, name: &str) -> StoreFuture<'_, ()> {
        let result = self.check_writable().map(|()| {
            self.staff
                .write()
                .unwrap()
                .insert(event_id.clone(), name.to_string());
        });
        Box::pin(async move { result })
    }

    fn staff_name(&self, event_id: &EventId) -> StoreFuture<'_, String> {
        let name = self.staff.read().unwrap().get(event_id).cloned();
        let event_id = event_id.clone();
        Box::pin(async move {
            name.ok_or_else(|| CheckInError::NotFound(format!("no staff name for event {event_id}")))
        })
    }
}
