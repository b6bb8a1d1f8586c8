//! Client for the ODES extraction service.
//!
//! Three read/write paths against the templated extracts endpoint
//! `<ODES_URL>{/id}{?api_key}`:
//!
//! - [`OdesClient::list_extracts`] / [`OdesClient::get_extract`] - read
//!   paths with a fail-soft policy: non-success status answers degrade to
//!   empty / absent instead of raising, since reads are idempotent and the
//!   caller has a natural fallback (empty list, not-found page).
//! - [`OdesClient::submit_extract`] - the side-effecting creation path with
//!   a strict success-only status check, and precedence for errors the
//!   service reports in its body.
//!
//! Remote JSON is mapped into [`OdesExtract`] records at this boundary; no
//! dynamically-keyed maps leave this module.

mod error;

pub use error::ServiceError;

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::http::build_service_http_client;
use crate::model::{OdesExtract, PendingExtract};
use crate::notify::{self, ExtractLinks};

/// Extract ids arrive as either JSON strings or numbers; both coerce to
/// string in the domain record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteId {
    Text(String),
    Number(i64),
}

impl RemoteId {
    fn into_string(self) -> String {
        match self {
            Self::Text(id) => id,
            Self::Number(id) => id.to_string(),
        }
    }
}

/// An extract object as returned by the extraction service.
#[derive(Debug, Deserialize)]
struct RemoteExtract {
    id: RemoteId,
    status: String,
    bbox: Vec<f64>,
    #[serde(default)]
    download_links: HashMap<String, String>,
    processed_at: Option<String>,
    created_at: Option<String>,
}

impl RemoteExtract {
    /// Maps the remote shape into the domain record, parsing timestamps.
    fn into_domain(self, endpoint: &str) -> Result<OdesExtract, ServiceError> {
        let processed_at = self
            .processed_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, endpoint))
            .transpose()?;
        let created_at = self
            .created_at
            .as_deref()
            .map(|raw| parse_timestamp(raw, endpoint))
            .transpose()?;

        Ok(OdesExtract {
            id: self.id.into_string(),
            status: self.status,
            bbox: self.bbox,
            download_links: self.download_links,
            processed_at,
            created_at,
        })
    }
}

/// Parses an ISO-8601-ish timestamp from the service.
///
/// Accepts full RFC 3339 as well as the zone-less form the service has been
/// seen to emit, which is taken as UTC.
fn parse_timestamp(raw: &str, endpoint: &str) -> Result<DateTime<FixedOffset>, ServiceError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .map_err(|_| ServiceError::format(endpoint, format!("unparseable timestamp {raw:?}")))
}

/// Form-encoded creation payload.
///
/// Field order matters to nobody but the tests, but the bbox fields are
/// declared positionally (w, s, e, n) to match the envelope's bbox order.
/// Absent optionals are omitted from the body; the API key travels in the
/// URL, never here.
#[derive(Debug, Serialize)]
struct SubmissionPayload<'a> {
    bbox_w: f64,
    bbox_s: f64,
    bbox_e: f64,
    bbox_n: f64,
    email_subject: &'a str,
    email_body_text: &'a str,
    email_body_html: &'a str,
    ui_id: &'a str,
    envelope_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wof_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wof_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Client for the ODES extraction service.
pub struct OdesClient {
    client: Client,
    base_url: Url,
}

impl OdesClient {
    /// Creates an extraction-service client for the given extracts endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the URL does not parse or HTTP client
    /// construction fails.
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url).map_err(|source| ServiceError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        let client = build_service_http_client()?;
        Ok(Self { client, base_url })
    }

    /// Expands the endpoint template without the query, for requests and
    /// error messages alike (the API key never appears in either logs or
    /// error strings).
    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let (Some(id), Ok(mut segments)) = (id, url.path_segments_mut()) {
            segments.pop_if_empty().push(id);
        }
        url
    }

    /// Lists the extracts visible to `api_key`.
    ///
    /// Fail-soft: any non-2xx answer yields an empty list. A parse failure
    /// on any item fails the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure or malformed JSON.
    #[instrument(skip_all)]
    pub async fn list_extracts(&self, api_key: &str) -> Result<Vec<OdesExtract>, ServiceError> {
        let endpoint = self.endpoint(None);
        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("api_key", api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ServiceError::network(endpoint.as_str(), source))?;

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "extract list unavailable");
            return Ok(Vec::new());
        }

        let items: Vec<RemoteExtract> = response
            .json()
            .await
            .map_err(|source| ServiceError::format(endpoint.as_str(), source.to_string()))?;

        items
            .into_iter()
            .map(|item| item.into_domain(endpoint.as_str()))
            .collect()
    }

    /// Fetches one extract by id.
    ///
    /// Fail-soft: any non-2xx answer yields `None`, without distinguishing
    /// a missing extract from a failing service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] on transport failure or malformed JSON.
    #[instrument(skip(self, api_key))]
    pub async fn get_extract(
        &self,
        id: &str,
        api_key: &str,
    ) -> Result<Option<OdesExtract>, ServiceError> {
        let endpoint = self.endpoint(Some(id));
        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("api_key", api_key);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ServiceError::network(endpoint.as_str(), source))?;

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "extract not found");
            return Ok(None);
        }

        let item: RemoteExtract = response
            .json()
            .await
            .map_err(|source| ServiceError::format(endpoint.as_str(), source.to_string()))?;

        item.into_domain(endpoint.as_str()).map(Some)
    }

    /// Submits a pending extract for processing.
    ///
    /// Renders the notification content, builds the form payload from the
    /// envelope's bbox (positionally w, s, e, n) and identifying fields,
    /// posts it, and maps the response into an [`OdesExtract`].
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Remote`] when the response body carries an `error`
    ///   key, regardless of HTTP status (body errors take precedence).
    /// - [`ServiceError::Status`] for any status other than exactly 200
    ///   (creation is success-only; the 2xx family is not enough here).
    /// - [`ServiceError`] for transport failures and malformed JSON.
    #[instrument(skip_all, fields(extract_id = %extract.id))]
    pub async fn submit_extract(
        &self,
        extract: &PendingExtract,
        links: &dyn ExtractLinks,
        api_key: &str,
    ) -> Result<OdesExtract, ServiceError> {
        let content = notify::render_notification(extract, links, Utc::now());

        let payload = SubmissionPayload {
            bbox_w: extract.envelope.west(),
            bbox_s: extract.envelope.south(),
            bbox_e: extract.envelope.east(),
            bbox_n: extract.envelope.north(),
            email_subject: &content.subject,
            email_body_text: &content.body_text,
            email_body_html: &content.body_html,
            ui_id: &extract.id,
            envelope_id: &extract.envelope.id,
            wof_name: extract.wof.name.as_deref(),
            wof_id: extract.wof.id,
            name: extract.name.as_deref(),
        };

        let endpoint = self.endpoint(None);
        let mut url = endpoint.clone();
        url.query_pairs_mut().append_pair("api_key", api_key);

        let response = self
            .client
            .post(url)
            .form(&payload)
            .send()
            .await
            .map_err(|source| ServiceError::network(endpoint.as_str(), source))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|source| ServiceError::format(endpoint.as_str(), source.to_string()))?;

        // A service-reported error wins over the status-code check.
        if let Some(message) = body.get("error").filter(|value| !value.is_null()) {
            let message = message
                .as_str()
                .map_or_else(|| message.to_string(), str::to_string);
            return Err(ServiceError::remote(message));
        }

        if status.as_u16() != 200 {
            return Err(ServiceError::status(endpoint.as_str(), status.as_u16()));
        }

        let item: RemoteExtract = serde_json::from_value(body)
            .map_err(|source| ServiceError::format(endpoint.as_str(), source.to_string()))?;

        let record = item.into_domain(endpoint.as_str())?;
        debug!(odes_id = %record.id, status = %record.status, "extract submitted");
        Ok(record)
    }
}

impl std::fmt::Debug for OdesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdesClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Envelope, Wof};
    use crate::notify::BaseUrlLinks;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // ==================== Serde Deserialization Tests ====================

    #[test]
    fn test_remote_extract_deserialize_full() {
        let json = serde_json::json!({
            "id": "odes-77",
            "status": "complete",
            "bbox": [1.0, 2.0, 3.0, 4.0],
            "download_links": {"csv": "https://cdn.example.com/77.csv"},
            "processed_at": "2016-05-02T08:00:00Z",
            "created_at": "2016-05-01T12:30:00Z"
        });

        let remote: RemoteExtract = serde_json::from_value(json).unwrap();
        let record = remote.into_domain("https://odes.example.com/extracts").unwrap();
        assert_eq!(record.id, "odes-77");
        assert_eq!(record.status, "complete");
        assert_eq!(record.bbox, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            record.download_links.get("csv").unwrap(),
            "https://cdn.example.com/77.csv"
        );
        assert!(record.processed_at.is_some());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn test_remote_extract_numeric_id_coerces_to_string() {
        let json = serde_json::json!({
            "id": 12345,
            "status": "pending",
            "bbox": [1.0, 2.0, 3.0, 4.0],
            "processed_at": null,
            "created_at": null
        });

        let remote: RemoteExtract = serde_json::from_value(json).unwrap();
        let record = remote.into_domain("https://odes.example.com/extracts").unwrap();
        assert_eq!(record.id, "12345");
    }

    #[test]
    fn test_remote_extract_null_timestamps_map_to_absent() {
        let json = serde_json::json!({
            "id": "odes-1",
            "status": "pending",
            "bbox": [1.0, 2.0, 3.0, 4.0],
            "processed_at": null,
            "created_at": null
        });

        let remote: RemoteExtract = serde_json::from_value(json).unwrap();
        let record = remote.into_domain("https://odes.example.com/extracts").unwrap();
        assert!(record.processed_at.is_none());
        assert!(record.created_at.is_none());
        assert!(record.download_links.is_empty());
    }

    #[test]
    fn test_parse_timestamp_rfc3339_and_naive_forms() {
        let with_zone = parse_timestamp("2016-05-01T12:30:00+02:00", "test").unwrap();
        assert_eq!(with_zone.to_rfc3339(), "2016-05-01T12:30:00+02:00");

        let naive = parse_timestamp("2016-05-01T12:30:00.5", "test").unwrap();
        assert_eq!(naive.timezone().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_timestamp_garbage_is_format_error() {
        let error = parse_timestamp("yesterday-ish", "test").unwrap_err();
        assert!(matches!(error, ServiceError::Format { .. }));
    }

    // ==================== Read Path Tests ====================

    fn extract_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "status": "pending",
            "bbox": [1.0, 2.0, 3.0, 4.0],
            "download_links": {},
            "processed_at": null,
            "created_at": "2016-05-01T12:30:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_extracts_returns_items_with_api_key_param() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/extracts"))
            .and(query_param("api_key", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                extract_json("odes-1"),
                extract_json("odes-2")
            ])))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extracts = client.list_extracts("key-1").await.unwrap();
        assert_eq!(extracts.len(), 2);
        assert_eq!(extracts[0].id, "odes-1");
        assert_eq!(extracts[1].id, "odes-2");
    }

    #[tokio::test]
    async fn test_list_extracts_non_2xx_is_empty_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extracts = client.list_extracts("key-1").await.unwrap();
        assert!(extracts.is_empty());
    }

    #[tokio::test]
    async fn test_list_extracts_malformed_item_fails_whole_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                extract_json("odes-1"),
                {"id": "odes-2"}
            ])))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let error = client.list_extracts("key-1").await.unwrap_err();
        assert!(matches!(error, ServiceError::Format { .. }));
    }

    #[tokio::test]
    async fn test_get_extract_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/extracts/odes-7"))
            .and(query_param("api_key", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(extract_json("odes-7")))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extract = client.get_extract("odes-7", "key-1").await.unwrap();
        assert_eq!(extract.unwrap().id, "odes-7");
    }

    #[tokio::test]
    async fn test_get_extract_non_2xx_is_absent_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/extracts/odes-404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extract = client.get_extract("odes-404", "key-1").await.unwrap();
        assert!(extract.is_none());
    }

    // ==================== Submission Tests ====================

    fn pending_extract() -> PendingExtract {
        PendingExtract::new(
            Some("Downtown".to_string()),
            Envelope::with_id("env123456789", [1.0, 2.0, 3.0, 4.0]),
            "user-1",
            Wof::new(Some(85633793), Some("Springfield".to_string())),
        )
    }

    fn links() -> BaseUrlLinks {
        BaseUrlLinks::new("https://example.org").unwrap()
    }

    fn form_pairs(body: &[u8]) -> Vec<(String, String)> {
        url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_submit_extract_payload_bbox_fields_positional() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .and(query_param("api_key", "key-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(extract_json("odes-9")))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extract = pending_extract();
        client
            .submit_extract(&extract, &links(), "key-1")
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let pairs = form_pairs(&requests[0].body);

        // The four bbox fields come first, positionally w, s, e, n.
        assert_eq!(pairs[0].0, "bbox_w");
        assert_eq!(pairs[1].0, "bbox_s");
        assert_eq!(pairs[2].0, "bbox_e");
        assert_eq!(pairs[3].0, "bbox_n");
        assert_eq!(pairs[0].1.parse::<f64>().unwrap(), 1.0);
        assert_eq!(pairs[1].1.parse::<f64>().unwrap(), 2.0);
        assert_eq!(pairs[2].1.parse::<f64>().unwrap(), 3.0);
        assert_eq!(pairs[3].1.parse::<f64>().unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_submit_extract_payload_identifying_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(extract_json("odes-9")))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extract = pending_extract();
        client
            .submit_extract(&extract, &links(), "key-1")
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let pairs = form_pairs(&requests[0].body);
        let field = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };

        assert_eq!(field("ui_id"), extract.id);
        assert_eq!(field("envelope_id"), "env123456789");
        assert_eq!(field("wof_name"), "Springfield");
        assert_eq!(field("wof_id"), "85633793");
        assert_eq!(field("name"), "Downtown");
        assert!(field("email_subject").contains("Downtown"));
        assert!(!field("email_body_text").is_empty());
        assert!(field("email_body_html").contains("<p>"));

        // The API key travels in the URL, never the body.
        assert!(!pairs.iter().any(|(k, _)| k == "api_key"));
    }

    #[tokio::test]
    async fn test_submit_extract_omits_absent_optionals() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(extract_json("odes-9")))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let extract = PendingExtract::new(
            None,
            Envelope::with_id("env123456789", [1.0, 2.0, 3.0, 4.0]),
            "user-1",
            Wof::default(),
        );
        client
            .submit_extract(&extract, &links(), "key-1")
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let pairs = form_pairs(&requests[0].body);
        assert!(!pairs.iter().any(|(k, _)| k == "wof_name"));
        assert!(!pairs.iter().any(|(k, _)| k == "wof_id"));
        assert!(!pairs.iter().any(|(k, _)| k == "name"));
    }

    #[tokio::test]
    async fn test_submit_extract_body_error_wins_over_200_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "bad bbox"})),
            )
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let error = client
            .submit_extract(&pending_extract(), &links(), "key-1")
            .await
            .unwrap_err();

        match error {
            ServiceError::Remote { message } => assert_eq!(message, "bad bbox"),
            other => panic!("expected Remote, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_extract_201_without_error_is_status_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(extract_json("odes-9")))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let error = client
            .submit_extract(&pending_extract(), &links(), "key-1")
            .await
            .unwrap_err();

        match error {
            ServiceError::Status { status, .. } => assert_eq!(status, 201),
            other => panic!("expected Status, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_extract_maps_response_to_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/extracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9001,
                "status": "pending",
                "bbox": [1.0, 2.0, 3.0, 4.0],
                "processed_at": null,
                "created_at": "2016-05-01T12:30:00Z"
            })))
            .mount(&mock_server)
            .await;

        let client = OdesClient::new(&format!("{}/extracts", mock_server.uri())).unwrap();
        let record = client
            .submit_extract(&pending_extract(), &links(), "key-1")
            .await
            .unwrap();

        assert_eq!(record.id, "9001");
        assert_eq!(record.status, "pending");
        assert!(record.download_links.is_empty());
        assert!(record.processed_at.is_none());
        assert_eq!(
            record.created_at.unwrap().to_rfc3339(),
            "2016-05-01T12:30:00+00:00"
        );
    }
}
