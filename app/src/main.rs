//! Check-in command line.
//!
//! ```text
//! checkin <event-id> <pass-code> <staff-name> [scan-payload]
//! checkin --list
//! ```
//!
//! Downloads the event's roster, then, when a scanned payload is given,
//! resolves it and records the check-in.

use anyhow::{Context, bail};
use checkin_app::config::Config;
use checkin_app::{CheckInApp, report};
use checkin_core::types::EventId;
use checkin_runtime::ScanOutcome;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: checkin <event-id> <pass-code> <staff-name> [scan-payload] | checkin --list";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let app = CheckInApp::new(config)
        .await
        .context("Failed to start check-in app")?;

    if args.first().map(String::as_str) == Some("--list") {
        for event in app.session().list_downloaded().await? {
            println!("{}\t{}", event.event_id, event.name);
        }
        return Ok(());
    }

    let [event_id, pass_code, staff_name, rest @ ..] = args.as_slice() else {
        bail!(USAGE);
    };
    let event_id = EventId::parse(event_id.as_str()).context("Invalid event id")?;
    let session = app.session();

    let snapshot = match session.download(&event_id, pass_code, staff_name).await {
        Ok(snapshot) => snapshot,
        Err(e) => bail!("{}", report("Download", &e)),
    };
    info!(
        event_id = %event_id,
        name = snapshot.display_name(),
        tickets = snapshot.event_tickets.len(),
        "Roster ready"
    );

    let Some(payload) = rest.first() else {
        return Ok(());
    };

    let ticket = match session.scan(&event_id, payload).await {
        Ok(ScanOutcome::Found(ticket)) => ticket,
        Ok(ScanOutcome::Ignored) => bail!("Scanner busy"),
        Err(e) => bail!("{}", report("Scan", &e)),
    };

    match session.check_in(&event_id, &ticket.id).await {
        Ok(ticket) => {
            let detail = session.ticket_detail(&event_id, &ticket.id).await?;
            println!(
                "{}\t{}\t{}\tseat {}",
                ticket.id,
                ticket.display_name().unwrap_or_default(),
                detail.check_in_display,
                detail.seat_description
            );
        }
        Err(e) => bail!("{}", report("Check-in", &e)),
    }
    session.reset_scanner();
    Ok(())
}
