//! Domain records for envelopes, pending extracts, and ODES results.
//!
//! The extraction service speaks loosely-typed JSON; everything that crosses
//! that boundary is mapped into the explicit records here with named optional
//! fields, so the rest of the crate never threads dynamically-keyed maps
//! around.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of hex characters kept from a UUIDv4 for envelope/extract ids.
const SHORT_ID_LEN: usize = 12;

/// Generates a short identifier: the last 12 hex characters of a UUIDv4.
#[must_use]
pub fn short_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[hex.len() - SHORT_ID_LEN..].to_string()
}

/// A named bounding-box resource representing a geographic region of interest.
///
/// The bbox is always exactly four ordered floats: west, south, east, north.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Short identifier assigned at creation.
    pub id: String,
    /// Bounding box as `[west, south, east, north]`.
    pub bbox: [f64; 4],
}

impl Envelope {
    /// Creates an envelope with a fresh short id.
    #[must_use]
    pub fn new(bbox: [f64; 4]) -> Self {
        Self {
            id: short_id(),
            bbox,
        }
    }

    /// Creates an envelope with a caller-supplied id (e.g. restored state).
    #[must_use]
    pub fn with_id(id: impl Into<String>, bbox: [f64; 4]) -> Self {
        Self {
            id: id.into(),
            bbox,
        }
    }

    /// West edge of the bounding box.
    #[must_use]
    pub fn west(&self) -> f64 {
        self.bbox[0]
    }

    /// South edge of the bounding box.
    #[must_use]
    pub fn south(&self) -> f64 {
        self.bbox[1]
    }

    /// East edge of the bounding box.
    #[must_use]
    pub fn east(&self) -> f64 {
        self.bbox[2]
    }

    /// North edge of the bounding box.
    #[must_use]
    pub fn north(&self) -> f64 {
        self.bbox[3]
    }
}

/// A Who's On First style place reference attached to an extract.
///
/// Both fields are optional; a fully empty reference is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wof {
    /// Numeric place id, when the lookup produced one.
    pub id: Option<i64>,
    /// Place name, when the lookup produced one.
    pub name: Option<String>,
}

impl Wof {
    /// Creates a place reference from optional id and name.
    #[must_use]
    pub fn new(id: Option<i64>, name: Option<String>) -> Self {
        Self { id, name }
    }

    /// True when neither id nor name is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}

/// A user-initiated extract request that has not yet (or just) been
/// submitted to the extraction service.
///
/// This is the explicit replacement for session-stored pending state:
/// constructed once at submission time, with exactly one owning user.
/// `odes_id` is set after a successful submission; callers must refuse to
/// submit the same pending extract twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingExtract {
    /// Short identifier assigned at creation (the `ui_id` of the payload).
    pub id: String,
    /// Optional display name chosen by the user.
    pub name: Option<String>,
    /// The region this extract covers.
    pub envelope: Envelope,
    /// The ODES record id, once the extract has been submitted.
    pub odes_id: Option<String>,
    /// The owning user.
    pub user_id: String,
    /// Optional named-place reference.
    pub wof: Wof,
}

impl PendingExtract {
    /// Creates a pending extract with a fresh short id and no ODES link.
    #[must_use]
    pub fn new(
        name: Option<String>,
        envelope: Envelope,
        user_id: impl Into<String>,
        wof: Wof,
    ) -> Self {
        Self {
            id: short_id(),
            name,
            envelope,
            odes_id: None,
            user_id: user_id.into(),
            wof,
        }
    }

    /// True once this extract has been posted to the extraction service.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.odes_id.is_some()
    }
}

/// The extraction service's representation of a submitted extract.
///
/// Immutable after creation; the client only re-fetches, never mutates.
/// `status` values are opaque pass-through from the service (pending,
/// running, complete, failed, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OdesExtract {
    /// Server-assigned identifier; never changes once assigned.
    pub id: String,
    /// Remote status string, passed through verbatim.
    pub status: String,
    /// Bounding box as reported by the service, taken verbatim.
    pub bbox: Vec<f64>,
    /// Mapping of format name to download URL; empty when absent.
    pub download_links: HashMap<String, String>,
    /// When processing finished, if the service reported it.
    pub processed_at: Option<DateTime<FixedOffset>>,
    /// When the extract was created, if the service reported it.
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// A resolved download produced for one of an extract's output links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    /// Format name, e.g. `csv` or `geojson`.
    pub format: String,
    /// Resolved URL (the original URL when resolution failed).
    pub url: String,
    /// Size reported by the server, when resolution succeeded and the
    /// server sent a Content-Length.
    pub content_length: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_length_and_charset() {
        let id = short_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_ids_are_unique() {
        assert_ne!(short_id(), short_id());
    }

    #[test]
    fn test_envelope_edge_accessors_follow_wsen_order() {
        let envelope = Envelope::with_id("abc123def456", [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(envelope.west(), 1.0);
        assert_eq!(envelope.south(), 2.0);
        assert_eq!(envelope.east(), 3.0);
        assert_eq!(envelope.north(), 4.0);
    }

    #[test]
    fn test_wof_is_empty() {
        assert!(Wof::default().is_empty());
        assert!(!Wof::new(Some(85633793), None).is_empty());
        assert!(!Wof::new(None, Some("Springfield".to_string())).is_empty());
    }

    #[test]
    fn test_pending_extract_new_is_not_submitted() {
        let extract = PendingExtract::new(
            None,
            Envelope::new([-1.0, -2.0, 1.0, 2.0]),
            "user-1",
            Wof::default(),
        );
        assert!(!extract.is_submitted());
        assert_eq!(extract.id.len(), 12);
        assert_eq!(extract.user_id, "user-1");
    }

    #[test]
    fn test_pending_extract_round_trips_through_json() {
        let extract = PendingExtract::new(
            Some("Springfield".to_string()),
            Envelope::new([1.0, 2.0, 3.0, 4.0]),
            "user-1",
            Wof::new(Some(42), Some("Springfield".to_string())),
        );
        let json = serde_json::to_string(&extract).unwrap();
        let restored: PendingExtract = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, extract);
    }
}
