//! Scripted remote ticket service
//!
//! [`ScriptedRemote`] answers calls from a queue of prepared replies and keeps
//! every call it received, so tests can assert both the outcome and whether
//! the server was contacted at all.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use checkin_core::error::CheckInError;
use checkin_core::remote::{
    EventDetail, EventSummary, RemoteCall, RemoteFuture, RemoteReply, RemoteTicketService,
};
use checkin_core::types::EventId;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Remote ticket service answering from a script
///
/// `send` pops the next scripted reply; with an empty script it fails with a
/// transport error. The seat map returned by `event_detail` and the catalog
/// returned by `list_events` are configured separately.
#[derive(Debug)]
pub struct ScriptedRemote {
    replies: Mutex<VecDeque<Result<RemoteReply, CheckInError>>>,
    calls: Mutex<Vec<RemoteCall>>,
    detail: Mutex<Result<EventDetail, CheckInError>>,
    events: Mutex<Result<Vec<EventSummary>, CheckInError>>,
    detail_requests: Mutex<Vec<EventId>>,
}

impl ScriptedRemote {
    /// Create a remote with an empty script and no seat map
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            detail: Mutex::new(Ok(EventDetail::default())),
            events: Mutex::new(Ok(Vec::new())),
            detail_requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a JSON reply
    pub fn reply(&self, status: u16, body: Value) -> &Self {
        self.push(Ok(RemoteReply::json(status, body)))
    }

    /// Queue a raw text reply
    pub fn reply_text(&self, status: u16, text: &str) -> &Self {
        self.push(Ok(RemoteReply::new(status, text)))
    }

    /// Queue a failure to complete the request
    pub fn fail_next(&self, error: CheckInError) -> &Self {
        self.push(Err(error))
    }

    fn push(&self, reply: Result<RemoteReply, CheckInError>) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Serve this seat map from `event_detail`
    pub fn set_seat_map(&self, tables_and_chairs: Value) {
        *self.detail.lock().unwrap() = Ok(EventDetail {
            tables_and_chairs: Some(tables_and_chairs),
            ..EventDetail::default()
        });
    }

    /// Make `event_detail` fail
    pub fn fail_event_detail(&self, error: CheckInError) {
        *self.detail.lock().unwrap() = Err(error);
    }

    /// Serve this catalog from `list_events`
    pub fn set_events(&self, events: Vec<EventSummary>) {
        *self.events.lock().unwrap() = Ok(events);
    }

    /// Make `list_events` fail
    pub fn fail_list_events(&self, error: CheckInError) {
        *self.events.lock().unwrap() = Err(error);
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Names of the calls received so far
    #[must_use]
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(RemoteCall::name).collect()
    }

    /// Number of seat map fetches so far
    #[must_use]
    pub fn detail_requests(&self) -> usize {
        self.detail_requests.lock().unwrap().len()
    }

    /// Scripted replies not consumed yet
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl Default for ScriptedRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteTicketService for ScriptedRemote {
    fn list_events(&self) -> RemoteFuture<'_, Vec<EventSummary>> {
        let events = self.events.lock().unwrap().clone();
        Box::pin(async move { events })
    }

    fn event_detail(&self, event_id: &EventId) -> RemoteFuture<'_, EventDetail> {
        self.detail_requests.lock().unwrap().push(event_id.clone());
        let detail = self.detail.lock().unwrap().clone();
        Box::pin(async move { detail })
    }

    fn send(&self, call: &RemoteCall) -> RemoteFuture<'_, RemoteReply> {
        self.calls.lock().unwrap().push(call.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CheckInError::Transport(format!(
                    "no scripted reply for {}",
                    call.name()
                )))
            });
        Box::pin(async move { reply })
    }
}
