//! Notification content for extract submissions.
//!
//! The extraction service emails the user when an extract finishes; the
//! subject and bodies are rendered here at submission time and travel in the
//! creation payload. Absolute links come through the [`ExtractLinks`] seam so
//! the library never needs to know how the caller builds its URLs.

use chrono::{DateTime, Utc};

use crate::model::PendingExtract;
use crate::odes::ServiceError;

/// Display name used when neither the extract nor its place reference has one.
const UNNAMED_PLACE: &str = "an unnamed place";

/// Resolves absolute links for notification content.
pub trait ExtractLinks {
    /// Absolute URL of a single extract's view.
    fn extract_link(&self, extract_id: &str) -> String;

    /// Absolute URL of the extract list.
    fn extracts_link(&self) -> String;
}

/// [`ExtractLinks`] backed by a site base URL, joining the extract paths the
/// web frontend serves.
#[derive(Debug, Clone)]
pub struct BaseUrlLinks {
    base_url: url::Url,
}

impl BaseUrlLinks {
    /// Creates a link resolver from the site base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidUrl`] when the base URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let base_url = url::Url::parse(base_url).map_err(|source| ServiceError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self { base_url })
    }
}

impl ExtractLinks for BaseUrlLinks {
    fn extract_link(&self, extract_id: &str) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["odes", "extracts", extract_id]);
        }
        url.to_string()
    }

    fn extracts_link(&self) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["odes", "extracts", ""]);
        }
        url.to_string()
    }
}

/// Rendered notification content for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    /// Email subject line.
    pub subject: String,
    /// Plain-text body.
    pub body_text: String,
    /// HTML body.
    pub body_html: String,
}

/// Resolves the display name for an extract.
///
/// Fallback chain: the extract's own name, then the place reference's name,
/// then a fixed placeholder.
#[must_use]
pub fn display_name(extract: &PendingExtract) -> &str {
    extract
        .name
        .as_deref()
        .or(extract.wof.name.as_deref())
        .unwrap_or(UNNAMED_PLACE)
}

/// Renders subject, text body, and HTML body for a submission.
///
/// `created` is the submission timestamp; callers pass the current time.
#[must_use]
pub fn render_notification(
    extract: &PendingExtract,
    links: &dyn ExtractLinks,
    created: DateTime<Utc>,
) -> NotificationContent {
    let name = display_name(extract);
    let link = links.extract_link(&extract.id);
    let extracts_link = links.extracts_link();
    let created = created.format("%Y-%m-%d %H:%M UTC");

    let subject = format!("Your extract of {name} has been requested");

    let body_text = format!(
        "Your extract of {name}, requested {created}, is being processed.\n\
         \n\
         Follow its progress here: {link}\n\
         All of your extracts: {extracts_link}\n\
         \n\
         You will receive another message when the files are ready.\n"
    );

    let body_html = format!(
        "<p>Your extract of <b>{name}</b>, requested {created}, is being processed.</p>\n\
         <p>Follow its progress at <a href=\"{link}\">{link}</a>.</p>\n\
         <p>All of your extracts: <a href=\"{extracts_link}\">{extracts_link}</a>.</p>\n\
         <p>You will receive another message when the files are ready.</p>\n"
    );

    NotificationContent {
        subject,
        body_text,
        body_html,
    }
}
