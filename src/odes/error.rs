//! Error types for remote-service calls.
//!
//! One taxonomy covers both the key service and the extraction service:
//! generic transport/shape failures, strict status-check failures on the
//! side-effecting paths, and errors the extraction service reports
//! explicitly in its response body.

use thiserror::Error;

/// Errors talking to the key service or the extraction service.
///
/// List and fetch paths never produce `Status`: they degrade to empty /
/// absent results on non-success codes instead. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure (DNS, connection refused, TLS, timeout).
    #[error("network error calling {url}: {source}")]
    Network {
        /// The endpoint that failed, without query parameters.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Strict status check failed on a side-effecting call.
    #[error("unexpected HTTP {status} from {url}")]
    Status {
        /// The endpoint that answered, without query parameters.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },

    /// The key service refused to create a new API key.
    #[error("could not create key: HTTP {status}")]
    KeyCreation {
        /// The HTTP status code of the create response.
        status: u16,
    },

    /// The response body did not match the expected JSON shape.
    #[error("unexpected response shape from {url}: {detail}")]
    Format {
        /// The endpoint that answered, without query parameters.
        url: String,
        /// What failed to parse.
        detail: String,
    },

    /// A structured error reported by the extraction service itself.
    ///
    /// Takes precedence over status-code checks; the message is safe to
    /// surface to the user verbatim.
    #[error("extraction service error: {message}")]
    Remote {
        /// The service's human-readable message.
        message: String,
    },

    /// The configured endpoint URL is not a valid URL.
    #[error("invalid service URL {url}: {source}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The shared HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    ClientConstruction(#[source] reqwest::Error),
}

impl ServiceError {
    /// Creates a network error for the given endpoint.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a strict status-check error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a response-shape error.
    pub fn format(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Format {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Creates a service-reported error from the remote message.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// True when the error was reported by the extraction service itself,
    /// so callers can surface the remote message instead of a generic one.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_displays_remote_message() {
        let error = ServiceError::remote("bad bbox");
        assert_eq!(error.to_string(), "extraction service error: bad bbox");
        assert!(error.is_remote());
    }

    #[test]
    fn test_status_error_mentions_code_and_endpoint() {
        let error = ServiceError::status("https://odes.example.com/extracts", 503);
        let message = error.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("odes.example.com"));
        assert!(!error.is_remote());
    }

    #[test]
    fn test_key_creation_error_keeps_spec_wording() {
        let error = ServiceError::KeyCreation { status: 403 };
        assert!(error.to_string().contains("could not create key"));
    }
}
