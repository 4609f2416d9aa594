//! End-to-end check-in scenarios against scripted remote replies.

#![allow(clippy::unwrap_used, clippy::panic)]

use checkin_core::catalog::EventFilter;
use checkin_core::error::{CheckInError, ValidationError};
use checkin_core::remote::{EventSummary, RemotePolicy};
use checkin_core::types::{ChairId, EventId, GroupId, TableId, TicketId};
use checkin_runtime::{CheckInSession, FileTicketStore, ScanOutcome, TicketStore};
use checkin_testing::fixtures::{self, PASS_CODE, STAFF_NAME};
use checkin_testing::{InMemoryTicketStore, ScriptedRemote, TEST_TIMESTAMP, test_clock};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    session: CheckInSession,
    store: Arc<InMemoryTicketStore>,
    remote: Arc<ScriptedRemote>,
    event: EventId,
}

fn harness() -> Harness {
    let event = fixtures::event_id();
    let store = Arc::new(InMemoryTicketStore::with_event(
        &event,
        &fixtures::sample_snapshot(),
    ));
    let remote = Arc::new(ScriptedRemote::new());
    let session = CheckInSession::new(
        store.clone(),
        remote.clone(),
        Arc::new(test_clock()),
        RemotePolicy::default(),
    );
    Harness {
        session,
        store,
        remote,
        event,
    }
}

fn file_session(root: &std::path::Path, remote: Arc<ScriptedRemote>) -> CheckInSession {
    CheckInSession::new(
        Arc::new(FileTicketStore::new(root)),
        remote,
        Arc::new(test_clock()),
        RemotePolicy::default(),
    )
}

fn t(id: &str) -> TicketId {
    TicketId::new(id)
}

// ============================================================================
// Download, scan, check-in
// ============================================================================

#[tokio::test]
async fn download_scan_check_in_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let event = fixtures::event_id();
    let remote = Arc::new(ScriptedRemote::new());
    remote
        .reply(200, fixtures::redeemed_roster())
        .reply(200, json!({}));

    let session = file_session(dir.path(), remote.clone());
    let snapshot = session.download(&event, PASS_CODE, STAFF_NAME).await.unwrap();
    assert_eq!(snapshot.event_tickets.len(), 3);

    let ScanOutcome::Found(ticket) = session
        .scan(&event, "https://tickets.example.com/t-001")
        .await
        .unwrap()
    else {
        panic!("scan was ignored");
    };
    assert_eq!(ticket.id, t("t001"));

    session.check_in(&event, &ticket.id).await.unwrap();
    assert_eq!(remote.call_names(), vec!["redeem_pass_code", "update_ticket"]);

    // a new process reads the same directory
    let restarted = file_session(dir.path(), Arc::new(ScriptedRemote::new()));
    let reloaded = restarted.snapshot(&event).await.unwrap();
    assert_eq!(
        reloaded.ticket(&t("t001")).unwrap().check_in.as_deref(),
        Some(TEST_TIMESTAMP)
    );
    assert_eq!(restarted.staff_name(&event).await.unwrap(), STAFF_NAME);

    let listed = restarted.list_downloaded().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Spring Gala");
}

#[tokio::test]
async fn blank_pass_code_never_reaches_the_server() {
    let h = harness();
    let err = h.session.download(&h.event, "  ", STAFF_NAME).await.unwrap_err();
    assert_eq!(err, CheckInError::from(ValidationError::MissingPassCode));

    let err = h.session.download(&h.event, PASS_CODE, "").await.unwrap_err();
    assert_eq!(err, CheckInError::from(ValidationError::MissingStaffName));
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn roster_without_event_tickets_is_not_stored() {
    let h = harness();
    let other = EventId::parse("E9").unwrap();
    h.remote.reply(200, json!({ "tickets": [] }));

    let err = h
        .session
        .download(&other, PASS_CODE, STAFF_NAME)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckInError::MalformedPayload(_)));
    assert!(!h.store.contains(&other));
}

#[tokio::test]
async fn refused_pass_code_keeps_the_previous_download() {
    let h = harness();
    h.remote.reply_text(401, "Invalid pass code");

    let err = h
        .session
        .download(&h.event, "9999", STAFF_NAME)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CheckInError::RemoteRejection {
            status: 401,
            reason: "Invalid pass code".into()
        }
    );
    assert_eq!(h.store.snapshot(&h.event), Some(fixtures::sample_snapshot()));
}

#[tokio::test]
async fn deleting_twice_is_fine() {
    let h = harness();
    h.session.delete_download(&h.event).await.unwrap();
    h.session.delete_download(&h.event).await.unwrap();

    let err = h.session.snapshot(&h.event).await.unwrap_err();
    assert!(matches!(err, CheckInError::NotFound(_)));
}

// ============================================================================
// Scanning
// ============================================================================

#[tokio::test]
async fn repeated_scans_are_ignored_until_reset() {
    let h = harness();
    let first = h.session.scan(&h.event, "QR/t-002").await.unwrap();
    assert!(matches!(first, ScanOutcome::Found(ref ticket) if ticket.id == t("t002")));

    let second = h.session.scan(&h.event, "QR/t-002").await.unwrap();
    assert_eq!(second, ScanOutcome::Ignored);

    h.session.reset_scanner();
    let third = h.session.scan(&h.event, "QR/t-002").await.unwrap();
    assert!(matches!(third, ScanOutcome::Found(_)));
}

#[tokio::test]
async fn unknown_scan_reopens_the_scanner() {
    let h = harness();
    let err = h.session.scan(&h.event, "QR/nobody").await.unwrap_err();
    assert!(matches!(err, CheckInError::NotFound(_)));

    let next = h.session.scan(&h.event, "QR/t003").await.unwrap();
    assert!(matches!(next, ScanOutcome::Found(_)));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn second_check_in_is_refused_locally() {
    let h = harness();
    h.remote.reply(200, json!({}));

    h.session.check_in(&h.event, &t("t001")).await.unwrap();
    let err = h.session.check_in(&h.event, &t("t001")).await.unwrap_err();

    assert_eq!(
        err,
        CheckInError::from(ValidationError::AlreadyCheckedIn {
            at: TEST_TIMESTAMP.to_string()
        })
    );
    assert_eq!(h.remote.call_count(), 1);
}

#[tokio::test]
async fn valet_check_out_without_key_slot_makes_no_call() {
    let h = harness();
    let err = h.session.check_out(&h.event, &t("t003")).await.unwrap_err();

    assert_eq!(err, CheckInError::from(ValidationError::KeySlotRequired));
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn parking_conflict_leaves_ticket_unchanged() {
    let h = harness();
    h.remote.reply_text(400, "duplicate");

    let err = h
        .session
        .save_parking(&h.event, &t("t001"), Some("P7".into()), None)
        .await
        .unwrap_err();

    assert_eq!(err, CheckInError::Conflict("Parking data already exists".into()));
    let stored = h.store.snapshot(&h.event).unwrap();
    assert_eq!(stored.ticket(&t("t001")).unwrap().parking_slot, None);
}

#[tokio::test]
async fn standard_parking_then_check_out() {
    let h = harness();
    h.remote
        .reply(200, json!({}))
        .reply(200, json!({}))
        .reply(200, json!({}));

    h.session
        .save_parking(&h.event, &t("t001"), Some(" P7 ".into()), Some("K1".into()))
        .await
        .unwrap();
    h.session.check_in(&h.event, &t("t001")).await.unwrap();
    let ticket = h.session.check_out(&h.event, &t("t001")).await.unwrap();

    assert_eq!(ticket.parking_slot.as_deref(), Some("P7"));
    assert_eq!(ticket.key_slot, None);
    assert_eq!(ticket.check_out.as_deref(), Some(TEST_TIMESTAMP));
    assert_eq!(
        h.remote.call_names(),
        vec!["update_parking", "update_ticket", "update_ticket"]
    );
}

#[tokio::test]
async fn accepted_update_is_lost_when_it_cannot_be_saved() {
    let h = harness();
    h.remote.reply(200, json!({}));
    h.store.fail_writes(true);

    let err = h.session.check_in(&h.event, &t("t001")).await.unwrap_err();

    assert!(matches!(err, CheckInError::Io(_)));
    assert_eq!(h.remote.call_count(), 1);
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(stored.ticket(&t("t001")).unwrap().check_in.is_none());
}

#[tokio::test]
async fn concurrent_check_ins_on_one_event_are_both_kept() {
    let h = harness();
    h.remote.reply(200, json!({})).reply(200, json!({}));

    let (a, b) = (t("t001"), t("t002"));
    let (first, second) = tokio::join!(
        h.session.check_in(&h.event, &a),
        h.session.check_in(&h.event, &b),
    );
    first.unwrap();
    second.unwrap();

    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(stored.ticket(&t("t001")).unwrap().check_in.is_some());
    assert!(stored.ticket(&t("t002")).unwrap().check_in.is_some());
}

#[tokio::test]
async fn detail_view_reads_the_stored_seat_map() {
    let h = harness();
    let view = h.session.ticket_detail(&h.event, &t("t003")).await.unwrap();

    assert_eq!(view.seat_description, "Table 1 - Seat 2");
    assert_eq!(view.parking_label, "VIP");
    assert_eq!(view.check_in_display, "No Check-in");
}

// ============================================================================
// Seating
// ============================================================================

#[tokio::test]
async fn release_reported_as_500_with_success_message_is_applied() {
    let h = harness();
    h.remote
        .reply(500, json!({ "message": "Chair released Successfully" }));
    h.remote
        .set_seat_map(fixtures::seat_map_without_occupant("T1", "C2"));

    let outcome = h
        .session
        .release_seat(&h.event, PASS_CODE, &TableId::new("T1"), &ChairId::new("C2"))
        .await
        .unwrap();

    assert_eq!(
        outcome.server_message.as_deref(),
        Some("Chair released Successfully")
    );
    assert_eq!(outcome.seat_map.unwrap().occupied_chairs().count(), 0);
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(!stored.ticket(&t("t003")).unwrap().has_seat());
    assert_eq!(h.remote.call_names(), vec!["release_chair"]);
}

#[tokio::test]
async fn release_without_success_marker_is_refused() {
    let h = harness();
    h.remote.reply(200, json!({ "message": "Chair not found" }));

    let err = h
        .session
        .release_seat(&h.event, PASS_CODE, &TableId::new("T1"), &ChairId::new("C2"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CheckInError::RemoteRejection {
            status: 200,
            reason: "Chair not found".into()
        }
    );
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(stored.ticket(&t("t003")).unwrap().has_seat());
    assert_eq!(h.remote.detail_requests(), 0);
}

#[tokio::test]
async fn assigning_an_occupied_chair_makes_no_call() {
    let h = harness();
    let err = h
        .session
        .assign_seat(
            &h.event,
            PASS_CODE,
            &t("t001"),
            &TableId::new("T1"),
            &ChairId::new("C2"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckInError::Validation(ValidationError::ChairOccupied { .. })
    ));
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn accepted_assignment_is_stored_and_map_refreshed() {
    let h = harness();
    h.remote.reply(200, json!({ "message": "Chair assigned" }));
    h.remote
        .set_seat_map(fixtures::seat_map_with_occupant("T2", "C3", "t001"));

    let outcome = h
        .session
        .assign_seat(
            &h.event,
            PASS_CODE,
            &t("t001"),
            &TableId::new("T2"),
            &ChairId::new("C3"),
        )
        .await
        .unwrap();

    let seat_map = outcome.seat_map.unwrap();
    assert!(seat_map
        .chair(&TableId::new("T2"), &ChairId::new("C3"))
        .unwrap()
        .occupied);
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(stored
        .ticket(&t("t001"))
        .unwrap()
        .is_seated_at(&TableId::new("T2"), &ChairId::new("C3")));
    assert_eq!(h.remote.detail_requests(), 1);
}

#[tokio::test]
async fn refresh_failure_does_not_undo_the_assignment() {
    let h = harness();
    h.remote.reply(200, json!({}));
    h.remote
        .fail_event_detail(CheckInError::Transport("offline".into()));

    let outcome = h
        .session
        .assign_seat(
            &h.event,
            PASS_CODE,
            &t("t002"),
            &TableId::new("T1"),
            &ChairId::new("C1"),
        )
        .await
        .unwrap();

    assert!(outcome.seat_map.is_none());
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(stored.ticket(&t("t002")).unwrap().has_seat());
    let chair = stored
        .seat_map()
        .unwrap()
        .chair(&TableId::new("T1"), &ChairId::new("C1"))
        .cloned()
        .unwrap();
    assert!(chair.occupied);
    assert_eq!(chair.used_by_ticket_id, Some(t("t002")));
}

#[tokio::test]
async fn release_without_refresh_stores_the_freed_chair() {
    let h = harness();
    h.remote
        .reply(200, json!({ "message": "Chair released Successfully" }));
    h.remote
        .fail_event_detail(CheckInError::Transport("offline".into()));

    let outcome = h
        .session
        .release_seat(&h.event, PASS_CODE, &TableId::new("T1"), &ChairId::new("C2"))
        .await
        .unwrap();

    assert!(outcome.seat_map.is_none());
    let stored = h.store.snapshot(&h.event).unwrap();
    assert!(matches!(stored.tables_and_chairs, Some(serde_json::Value::String(_))));
    assert_eq!(stored.seat_map().unwrap().occupied_chairs().count(), 0);
}

#[tokio::test]
async fn picking_chairs_walks_the_group_queue() {
    let h = harness();
    let group = GroupId::new("G1");
    h.remote.set_seat_map(fixtures::seat_map_json());

    let picker = h.session.seat_picker(&h.event, &group).await.unwrap();
    assert_eq!(picker.group_count(), 2);
    assert_eq!(picker.remaining_count(), 2);
    assert_eq!(
        picker.occupant_name(&TableId::new("T1"), &ChairId::new("C2")),
        Some("Grace Hopper")
    );

    h.remote.reply(200, json!({}));
    h.remote
        .set_seat_map(fixtures::seat_map_with_occupant("T1", "C1", "t001"));
    let picker = h
        .session
        .select_chair(
            &h.event,
            &group,
            PASS_CODE,
            &TableId::new("T1"),
            &ChairId::new("C1"),
        )
        .await
        .unwrap();

    assert_eq!(picker.remaining_count(), 1);
    assert_eq!(picker.next_ticket().unwrap().id, t("t002"));
    assert_eq!(h.remote.call_names(), vec!["assign_chair"]);
}

#[tokio::test]
async fn fully_seated_group_cannot_take_another_chair() {
    let h = harness();
    let mut snapshot = fixtures::sample_snapshot();
    for id in ["t001", "t002"] {
        snapshot
            .ticket_mut(&t(id))
            .unwrap()
            .assign_seat(TableId::new("T9"), ChairId::new(id));
    }
    h.store.insert(&h.event, &snapshot);

    let err = h
        .session
        .select_chair(
            &h.event,
            &GroupId::new("G1"),
            PASS_CODE,
            &TableId::new("T2"),
            &ChairId::new("C3"),
        )
        .await
        .unwrap_err();

    assert_eq!(err, CheckInError::from(ValidationError::NoRemainingTickets));
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn explicit_refresh_keeps_the_map_offline() {
    let h = harness();
    h.remote
        .set_seat_map(json!(fixtures::seat_map_without_occupant("T1", "C2").to_string()));

    let seat_map = h.session.refresh_seat_map(&h.event).await.unwrap();
    assert_eq!(seat_map.occupied_chairs().count(), 0);

    let stored = h.store.snapshot(&h.event).unwrap();
    assert_eq!(stored.seat_map().unwrap(), seat_map);
}

// ============================================================================
// Catalog and export
// ============================================================================

#[tokio::test]
async fn catalog_is_filtered_and_empty_when_unreachable() {
    let h = harness();
    let events: Vec<EventSummary> = serde_json::from_value(json!([
        { "id": 1, "name": "Spring Gala", "organizerEmail": "Ops@Example.com" },
        { "id": 2, "name": "Winter Ball", "organizerEmail": "other@example.com" }
    ]))
    .unwrap();
    h.remote.set_events(events);

    let mine = h
        .session
        .list_events(&EventFilter::organizer("ops@example.com"))
        .await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, "1");

    h.remote
        .fail_list_events(CheckInError::Transport("offline".into()));
    assert!(h.session.list_events(&EventFilter::default()).await.is_empty());
}

#[tokio::test]
async fn export_lists_every_ticket() {
    let h = harness();
    let dump = h.session.export(&h.event).await.unwrap();
    let lines: Vec<&str> = dump.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("t001;G1;true;"));
}

#[tokio::test]
async fn file_store_and_memory_store_agree_on_missing_events() {
    let dir = tempfile::tempdir().unwrap();
    let file_store = FileTicketStore::new(dir.path());
    let memory_store = InMemoryTicketStore::new();
    let event = fixtures::event_id();

    assert!(matches!(
        file_store.load(&event).await.unwrap_err(),
        CheckInError::NotFound(_)
    ));
    assert!(matches!(
        memory_store.load(&event).await.unwrap_err(),
        CheckInError::NotFound(_)
    ));
}
