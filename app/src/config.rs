//! Configuration management for the check-in application.
//!
//! Loads configuration from environment variables with sensible defaults.

use checkin_core::remote::{DEFAULT_RELEASE_SUCCESS_MARKER, RemotePolicy};
use checkin_runtime::http::{DEFAULT_API_BASE_URL, DEFAULT_PUBLIC_API_BASE_URL, HttpSettings};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "checkin=info";

/// Default directory for downloaded events
pub const DEFAULT_DATA_DIR: &str = "./checkin-data";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Remote service configuration
    pub api: ApiConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
    /// Seating configuration
    pub seating: SeatingConfig,
    /// Tracing filter directive (`RUST_LOG`)
    pub log_filter: String,
}

/// Remote service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Authenticated API root
    pub base_url: String,
    /// Public event catalog root
    pub public_base_url: String,
    /// Bearer token (None when unset or empty)
    pub token: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Local storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one document per downloaded event
    pub data_dir: PathBuf,
}

/// Seating configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingConfig {
    /// Substring of the release reply that marks success
    pub release_success_marker: String,
}

impl Config {
    /// Load configuration from the process environment, after reading `.env` if present.
    #[must_use]
    pub fn from_env() -> Self {
        // A missing .env file is the normal case
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    ///
    /// Empty values count as unset. Unparseable numbers fall back to defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api: ApiConfig {
                base_url: var("CHECKIN_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                public_base_url: var("CHECKIN_PUBLIC_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_PUBLIC_API_BASE_URL.to_string()),
                token: var("CHECKIN_API_TOKEN"),
                request_timeout_secs: var("CHECKIN_REQUEST_TIMEOUT_SECS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            storage: StorageConfig {
                data_dir: var("CHECKIN_DATA_DIR")
                    .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            },
            seating: SeatingConfig {
                release_success_marker: var("CHECKIN_RELEASE_SUCCESS_MARKER")
                    .unwrap_or_else(|| DEFAULT_RELEASE_SUCCESS_MARKER.to_string()),
            },
            log_filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    /// Settings for the HTTP ticket service
    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            api_base_url: self.api.base_url.clone(),
            public_api_base_url: self.api.public_base_url.clone(),
            api_token: self.api.token.clone(),
            timeout: Duration::from_secs(self.api.request_timeout_secs),
        }
    }

    /// Reply interpretation policy
    #[must_use]
    pub fn remote_policy(&self) -> RemotePolicy {
        RemotePolicy {
            release_success_marker: self.seating.release_success_marker.clone(),
        }
    }
}
