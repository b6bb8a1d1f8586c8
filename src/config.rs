//! Service endpoint configuration.
//!
//! The two remote collaborators are configured through the environment, the
//! same way the original deployment was: `ODES_URL` for the extracts
//! endpoint and `KEYS_URL` for the key service. `BASE_URL` is the site base
//! used for absolute links in notification content and may be left unset.

use std::env;

use thiserror::Error;

/// Default site base URL when `BASE_URL` is unset.
const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Endpoints for the remote collaborators.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Extraction-service extracts endpoint (`ODES_URL`).
    pub odes_url: String,
    /// Key-service endpoint (`KEYS_URL`).
    pub keys_url: String,
    /// Site base URL for absolute links (`BASE_URL`).
    pub base_url: String,
}

impl ServiceConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `ODES_URL` or `KEYS_URL` is
    /// unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            odes_url: required("ODES_URL")?,
            keys_url: required("KEYS_URL")?,
            base_url: lookup("BASE_URL")
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}
