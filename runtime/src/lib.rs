//! # Check-in Runtime
//!
//! Imperative shell around `checkin-core`.
//!
//! ## Core Components
//!
//! - **Ticket store**: One JSON document per downloaded event ([`store::FileTicketStore`])
//! - **HTTP client**: The remote ticket service over `reqwest` ([`http::HttpTicketService`])
//! - **Session**: Runs reducers, executes their remote effects and commits
//!   accepted outcomes ([`session::CheckInSession`])
//! - **Event locks**: One async mutex per event for read-modify-write sequences
//! - **Scan latch**: Drops repeated camera reports while a scan is handled
//!
//! ## Example
//!
//! ```ignore
//! use checkin_runtime::session::CheckInSession;
//!
//! let session = CheckInSession::new(store, remote, clock, policy);
//! session.download(&event_id, "1234", "Grace").await?;
//!
//! if let ScanOutcome::Found(ticket) = session.scan(&event_id, payload).await? {
//!     session.check_in(&event_id, &ticket.id).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod http;
pub mod locks;
pub mod notice;
pub mod scanner;
pub mod session;
pub mod store;

pub use http::{HttpSettings, HttpTicketService};
pub use notice::UserNotice;
pub use scanner::ScanOutcome;
pub use session::{CheckInSession, SeatingOutcome};
pub use store::{FileTicketStore, StoredEvent, TicketStore};
