//! Parallel resolution of an extract's download links.
//!
//! Each link resolution is its own network round trip (a redirect-following
//! HEAD), so the links are resolved concurrently: total latency is bounded
//! by the slowest link instead of the sum. One task per link, then a
//! join-all barrier; each task owns its result, so no state is shared
//! between workers.

use std::collections::HashMap;

use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tracing::{debug, instrument, warn};

use crate::http::build_service_http_client;
use crate::model::Download;
use crate::odes::ServiceError;

/// Resolves download descriptors for an extract's format→URL links.
pub struct DownloadResolver {
    client: Client,
}

impl DownloadResolver {
    /// Creates a resolver with the shared HTTP client policy.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when HTTP client construction fails.
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_service_http_client()?,
        })
    }

    /// Resolves every link concurrently and returns one [`Download`] per
    /// input entry.
    ///
    /// A failed resolution never drops its entry and never aborts the
    /// batch: the descriptor passes the original URL through with no
    /// content length, and the failure is logged with its format/url
    /// context. The returned order is completion order, not input order;
    /// callers that need stability re-key by format.
    #[instrument(skip_all, fields(link_count = links.len()))]
    pub async fn resolve_downloads(&self, links: &HashMap<String, String>) -> Vec<Download> {
        let mut handles = Vec::with_capacity(links.len());
        for (format, url) in links {
            let client = self.client.clone();
            let format = format.clone();
            let url = url.clone();
            handles.push(tokio::spawn(resolve_one(client, format, url)));
        }

        // Join-all barrier: every resolution finishes before anything is
        // returned. A panicked task loses only its own entry.
        let mut downloads = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(download) => downloads.push(download),
                Err(error) => warn!(error = %error, "download resolution task panicked"),
            }
        }

        debug!(resolved = downloads.len(), "download links resolved");
        downloads
    }
}

impl std::fmt::Debug for DownloadResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResolver").finish_non_exhaustive()
    }
}

/// Resolves a single link with a redirect-following HEAD round trip.
///
/// Failure is isolated here: any transport error or non-success status
/// falls back to the original URL with no content length.
async fn resolve_one(client: Client, format: String, url: String) -> Download {
    match client.head(&url).send().await {
        Ok(response) if response.status().is_success() => {
            let final_url = response.url().to_string();
            let content_length = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            Download {
                format,
                url: final_url,
                content_length,
            }
        }
        Ok(response) => {
            warn!(
                format = %format,
                url = %url,
                status = response.status().as_u16(),
                "download link answered with non-success status"
            );
            Download {
                format,
                url,
                content_length: None,
            }
        }
        Err(error) => {
            warn!(format = %format, url = %url, error = %error, "download link unreachable");
            Download {
                format,
                url,
                content_length: None,
            }
        }
    }
}
