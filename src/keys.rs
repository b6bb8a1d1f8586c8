//! API key provider for the extraction service.
//!
//! Keys are long-lived capability tokens, one per user. The provider lists
//! the user's existing keys first and only creates a new one when the list
//! comes back empty, so repeated calls never mint duplicates.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::http::build_service_http_client;
use crate::odes::ServiceError;

/// A key entry as returned by the key service.
#[derive(Debug, Deserialize)]
struct ApiKey {
    key: String,
}

/// Client for the key service.
pub struct KeysClient {
    client: Client,
    keys_url: Url,
}

impl KeysClient {
    /// Creates a key-service client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the URL does not parse or HTTP client
    /// construction fails.
    pub fn new(keys_url: &str) -> Result<Self, ServiceError> {
        let keys_url = Url::parse(keys_url).map_err(|source| ServiceError::InvalidUrl {
            url: keys_url.to_string(),
            source,
        })?;
        let client = build_service_http_client()?;
        Ok(Self { client, keys_url })
    }

    /// Returns an API key for the user behind `access_token`.
    ///
    /// Lists existing keys and returns the first one in service order. When
    /// no key exists, creates one; any status other than 200 on the create
    /// call is a hard failure.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure, malformed JSON, or a
    /// refused create call.
    #[instrument(skip_all)]
    pub async fn get_api_key(&self, access_token: &str) -> Result<String, ServiceError> {
        let url = self.keys_url.as_str();

        let response = self
            .client
            .get(self.keys_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| ServiceError::network(url, source))?;

        let keys: Vec<ApiKey> = response
            .json()
            .await
            .map_err(|source| ServiceError::format(url, source.to_string()))?;

        if let Some(first) = keys.first() {
            debug!(key_count = keys.len(), "reusing existing API key");
            return Ok(first.key.clone());
        }

        // No existing keys, so create one.
        debug!("no existing API key; creating one");
        let response = self
            .client
            .post(self.keys_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| ServiceError::network(url, source))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ServiceError::KeyCreation {
                status: status.as_u16(),
            });
        }

        let created: ApiKey = response
            .json()
            .await
            .map_err(|source| ServiceError::format(url, source.to_string()))?;

        Ok(created.key)
    }
}

impl std::fmt::Debug for KeysClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysClient")
            .field("keys_url", &self.keys_url.as_str())
            .finish_non_exhaustive()
    }
}
