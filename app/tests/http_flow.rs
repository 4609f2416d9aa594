//! The assembled app against a mock HTTP server and a temporary data directory.

#![allow(clippy::unwrap_used, clippy::panic)]

use checkin_app::CheckInApp;
use checkin_app::config::Config;
use checkin_core::error::CheckInError;
use checkin_core::types::{ChairId, TableId, TicketId};
use checkin_runtime::ScanOutcome;
use checkin_testing::fixtures::{self, PASS_CODE, STAFF_NAME};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app(server: &MockServer, data_dir: &std::path::Path) -> CheckInApp {
    let vars: HashMap<&str, String> = HashMap::from([
        ("CHECKIN_API_BASE_URL", server.uri()),
        ("CHECKIN_PUBLIC_API_BASE_URL", server.uri()),
        ("CHECKIN_API_TOKEN", "secret".to_string()),
        ("CHECKIN_DATA_DIR", data_dir.display().to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned());
    CheckInApp::new(config).await.unwrap()
}

#[tokio::test]
async fn download_then_check_in_over_http() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/PublicEvents/PassCode"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::redeemed_roster()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/Ticket"))
        .and(body_partial_json(json!({ "id": "t001" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server, dir.path()).await;
    let session = app.session();
    let event = fixtures::event_id();

    session.download(&event, PASS_CODE, STAFF_NAME).await.unwrap();
    let ScanOutcome::Found(ticket) = session.scan(&event, "badge/t-001").await.unwrap() else {
        panic!("first scan is never ignored");
    };
    let ticket = session.check_in(&event, &ticket.id).await.unwrap();
    assert!(ticket.check_in.is_some());

    assert!(dir.path().join("tickets_E1.json").is_file());
    assert!(dir.path().join("nameInCharge_E1.json").is_file());
}

#[tokio::test]
async fn seat_release_reads_the_marker_not_the_status() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/PublicEvents/PassCode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::redeemed_roster()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/PublicTicket/ReleaseChairFromTicket"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "message": "Chair released Successfully" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Event/E1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Spring Gala",
            "tablesAndChairs": fixtures::seat_map_without_occupant("T1", "C2").to_string()
        })))
        .mount(&server)
        .await;

    let app = app(&server, dir.path()).await;
    let session = app.session();
    let event = fixtures::event_id();
    session.download(&event, PASS_CODE, STAFF_NAME).await.unwrap();

    let outcome = session
        .release_seat(&event, PASS_CODE, &TableId::new("T1"), &ChairId::new("C2"))
        .await
        .unwrap();
    assert_eq!(outcome.seat_map.unwrap().occupied_chairs().count(), 0);

    let stored = session.snapshot(&event).await.unwrap();
    assert!(!stored.ticket(&TicketId::new("t003")).unwrap().has_seat());
}

#[tokio::test]
async fn unreachable_server_leaves_no_download() {
    let dir = tempfile::tempdir().unwrap();
    let vars: HashMap<&str, String> = HashMap::from([
        ("CHECKIN_API_BASE_URL", "http://127.0.0.1:9".to_string()),
        ("CHECKIN_REQUEST_TIMEOUT_SECS", "1".to_string()),
        ("CHECKIN_DATA_DIR", dir.path().display().to_string()),
    ]);
    let app = CheckInApp::new(Config::from_lookup(|key| vars.get(key).cloned()))
        .await
        .unwrap();
    let event = fixtures::event_id();

    let err = app
        .session()
        .download(&event, PASS_CODE, STAFF_NAME)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckInError::Transport(_)));
    assert!(app.session().list_downloaded().await.unwrap().is_empty());
}
