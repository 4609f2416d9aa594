//! # Check-in App
//!
//! Wires configuration, the file store, the HTTP client and the system clock
//! into a [`CheckInSession`], and turns failures into staff-facing notices.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;

use checkin_core::environment::{Clock, SystemClock};
use checkin_core::error::CheckInError;
use checkin_core::remote::RemoteTicketService;
use checkin_runtime::{CheckInSession, FileTicketStore, HttpTicketService, TicketStore, UserNotice};
use config::Config;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the application
#[derive(Debug, Error)]
pub enum AppError {
    /// The HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    Http(#[source] CheckInError),

    /// The data directory could not be prepared
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        /// Directory that was requested
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// The assembled application
pub struct CheckInApp {
    config: Config,
    session: CheckInSession,
}

impl CheckInApp {
    /// Build the production wiring from configuration
    ///
    /// # Errors
    ///
    /// [`AppError::DataDir`] when the data directory cannot be created,
    /// [`AppError::Http`] when the HTTP client cannot be built.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.storage.data_dir)
            .await
            .map_err(|source| AppError::DataDir {
                path: config.storage.data_dir.display().to_string(),
                source,
            })?;

        let remote = HttpTicketService::new(config.http_settings()).map_err(AppError::Http)?;
        let store = FileTicketStore::new(config.storage.data_dir.clone());

        tracing::info!(
            data_dir = %config.storage.data_dir.display(),
            api = %config.api.base_url,
            "Check-in app ready"
        );
        Ok(Self::from_parts(
            config,
            Arc::new(store),
            Arc::new(remote),
            Arc::new(SystemClock),
        ))
    }

    /// Assemble from explicit parts
    #[must_use]
    pub fn from_parts(
        config: Config,
        store: Arc<dyn TicketStore>,
        remote: Arc<dyn RemoteTicketService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = CheckInSession::new(store, remote, clock, config.remote_policy());
        Self { config, session }
    }

    /// The configuration the app was built with
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The session every screen works through
    #[must_use]
    pub const fn session(&self) -> &CheckInSession {
        &self.session
    }
}

/// Log a failed action and produce the single notice shown for it
#[must_use]
pub fn report(action: &str, error: &CheckInError) -> UserNotice {
    let notice = UserNotice::from_error(action, error);
    if error.is_local() {
        tracing::info!(action, reason = %error.reason(), "Action not possible");
    } else {
        tracing::warn!(action, error = %error, "Action failed");
    }
    notice
}
