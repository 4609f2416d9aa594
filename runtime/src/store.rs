//! Local ticket store.
//!
//! One JSON document per event, `tickets_{eventId}.json`, plus a companion
//! `nameInCharge_{eventId}.json` holding the staff member's name. Writes go to
//! a temporary file that is renamed over the document, so readers never see a
//! partial write.

use checkin_core::error::CheckInError;
use checkin_core::types::{EventId, EventSnapshot};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Boxed future returned by [`TicketStore`] methods
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, CheckInError>>;

/// A persisted event as shown in the downloaded-events listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Event identifier
    pub event_id: EventId,
    /// Event name, or a placeholder
    pub name: String,
    /// Where the document lives (file name for the filesystem store)
    pub handle: String,
}

/// Persistence of event snapshots
///
/// Note: Returns boxed futures to stay object-safe (held as `Arc<dyn TicketStore>`).
pub trait TicketStore: Send + Sync {
    /// Read an event's snapshot
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when absent, [`CheckInError::MalformedPayload`]
    /// when undecodable, [`CheckInError::Io`] on read failure.
    fn load(&self, event_id: &EventId) -> StoreFuture<'_, EventSnapshot>;

    /// Replace an event's snapshot
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] on write failure; the previous document is kept.
    fn save(&self, event_id: &EventId, snapshot: &EventSnapshot) -> StoreFuture<'_, ()>;

    /// Remove an event's snapshot and staff name; absent documents are ignored
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] on removal failure.
    fn delete(&self, event_id: &EventId) -> StoreFuture<'_, ()>;

    /// Enumerate persisted events, skipping unreadable or empty documents
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] when the store itself cannot be enumerated.
    fn list_all(&self) -> StoreFuture<'_, Vec<StoredEvent>>;

    /// Remember who is in charge of an event on this device
    ///
    /// # Errors
    ///
    /// [`CheckInError::Io`] on write failure.
    fn save_staff_name(&self, event_id: &EventId, name: &str) -> StoreFuture<'_, ()>;

    /// Read back the staff name
    ///
    /// # Errors
    ///
    /// [`CheckInError::NotFound`] when none was saved.
    fn staff_name(&self, event_id: &EventId) -> StoreFuture<'_, String>;
}

const TICKETS_PREFIX: &str = "tickets_";
const STAFF_PREFIX: &str = "nameInCharge_";
const DOCUMENT_SUFFIX: &str = ".json";

#[derive(Serialize, Deserialize)]
struct StaffDocument {
    name: String,
}

/// Filesystem-backed [`TicketStore`]
#[derive(Debug, Clone)]
pub struct FileTicketStore {
    root: PathBuf,
}

impl FileTicketStore {
    /// Store documents under `root`, created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the documents
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tickets_path(&self, event_id: &EventId) -> PathBuf {
        self.root
            .join(format!("{TICKETS_PREFIX}{event_id}{DOCUMENT_SUFFIX}"))
    }

    fn staff_path(&self, event_id: &EventId) -> PathBuf {
        self.root
            .join(format!("{STAFF_PREFIX}{event_id}{DOCUMENT_SUFFIX}"))
    }

    /// Write through a temporary sibling and rename over the target
    async fn write_atomically(&self, path: PathBuf, bytes: Vec<u8>) -> Result<(), CheckInError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        if let Err(e) = tokio::fs::write(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&temp, &path).await?;
        Ok(())
    }

    async fn remove_if_present(path: &Path) -> Result<(), CheckInError> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn read_snapshot(path: &Path, event_id: &EventId) -> Result<EventSnapshot, CheckInError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckInError::NotFound(format!(
                    "no downloaded tickets for event {event_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| CheckInError::MalformedPayload(e.to_string()))?;
        EventSnapshot::from_document(value)
    }

    /// Event id encoded in a ticket document's file name
    fn event_id_from_file_name(file_name: &str) -> Option<EventId> {
        let raw = file_name
            .strip_prefix(TICKETS_PREFIX)?
            .strip_suffix(DOCUMENT_SUFFIX)?;
        EventId::parse(raw).ok()
    }
}

impl TicketStore for FileTicketStore {
    fn load(&self, event_id: &EventId) -> StoreFuture<'_, EventSnapshot> {
        let path = self.tickets_path(event_id);
        let event_id = event_id.clone();
        Box::pin(async move {
            let snapshot = Self::read_snapshot(&path, &event_id).await?;
            tracing::debug!(
                event_id = %event_id,
                tickets = snapshot.event_tickets.len(),
                "Loaded snapshot"
            );
            Ok(snapshot)
        })
    }

    fn save(&self, event_id: &EventId, snapshot: &EventSnapshot) -> StoreFuture<'_, ()> {
        let path = self.tickets_path(event_id);
        let event_id = event_id.clone();
        let encoded = serde_json::to_vec_pretty(snapshot);
        Box::pin(async move {
            let bytes = encoded.map_err(|e| CheckInError::Io(e.to_string()))?;
            if let Err(e) = self.write_atomically(path, bytes).await {
                tracing::error!(event_id = %event_id, error = %e, "Failed to persist snapshot");
                return Err(e);
            }
            tracing::debug!(event_id = %event_id, "Persisted snapshot");
            Ok(())
        })
    }

    fn delete(&self, event_id: &EventId) -> StoreFuture<'_, ()> {
        let tickets = self.tickets_path(event_id);
        let staff = self.staff_path(event_id);
        let event_id = event_id.clone();
        Box::pin(async move {
            Self::remove_if_present(&tickets).await?;
            Self::remove_if_present(&staff).await?;
            tracing::info!(event_id = %event_id, "Deleted downloaded event");
            Ok(())
        })
    }

    fn list_all(&self) -> StoreFuture<'_, Vec<StoredEvent>> {
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut events = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let Some(event_id) = Self::event_id_from_file_name(&file_name) else {
                    continue;
                };
                match Self::read_snapshot(&entry.path(), &event_id).await {
                    Ok(snapshot) if snapshot.is_listable() => events.push(StoredEvent {
                        name: snapshot.display_name().to_string(),
                        event_id,
                        handle: file_name,
                    }),
                    Ok(_) => {
                        tracing::debug!(file = %file_name, "Skipping document without tickets");
                    }
                    Err(e) => {
                        tracing::warn!(file = %file_name, error = %e, "Skipping unreadable document");
                    }
                }
            }
            events.sort_by(|a, b| a.event_id.cmp(&b.event_id));
            Ok(events)
        })
    }

    fn save_staff_name(&self, event_id: &EventId, name: &str) -> StoreFuture<'_, ()> {
        let path = self.staff_path(event_id);
        let encoded = serde_json::to_vec_pretty(&StaffDocument {
            name: name.to_string(),
        });
        Box::pin(async move {
            let bytes = encoded.map_err(|e| CheckInError::Io(e.to_string()))?;
            self.write_atomically(path, bytes).await
        })
    }

    fn staff_name(&self, event_id: &EventId) -> StoreFuture<'_, String> {
        let path = self.staff_path(event_id);
        let event_id = event_id.clone();
        Box::pin(async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(CheckInError::NotFound(format!(
                        "no staff name for event {event_id}"
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            let document: StaffDocument = serde_json::from_slice(&bytes)
                .map_err(|e| CheckInError::MalformedPayload(e.to_string()))?;
            Ok(document.name)
        })
    }
}
