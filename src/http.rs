//! Shared HTTP client construction policy.
//!
//! Centralizes networking defaults so the key client, the extraction-service
//! client, and the download resolver stay consistent on timeout, user-agent,
//! and compression. The original design specified no timeouts at all; the
//! conservative per-call timeouts here are a documented defensive addition.

use std::time::Duration;

use reqwest::Client;

use crate::odes::ServiceError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/odes-extracts";

/// Shared User-Agent for all remote-service traffic.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("odes-extracts/{version} (+{PROJECT_UA_URL})")
}

/// Builds an HTTP client using shared project policy.
///
/// Redirects are followed with reqwest's default limit, which the download
/// resolver relies on to finalize link URLs.
///
/// # Errors
///
/// Returns [`ServiceError::ClientConstruction`] when the builder fails.
pub(crate) fn build_service_http_client() -> Result<Client, ServiceError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .user_agent(default_user_agent())
        .gzip(true)
        .build()
        .map_err(ServiceError::ClientConstruction)
}
