//! ODES Extracts Library
//!
//! This library lets an authenticated user define a geographic bounding box,
//! submit it to the ODES extraction service, poll for status, and resolve
//! the download links of finished extracts.
//!
//! # Architecture
//!
//! - [`model`] - domain records (envelopes, pending extracts, ODES records)
//! - [`keys`] - API key provider for the extraction service
//! - [`odes`] - extraction-service client: list, fetch, submit
//! - [`notify`] - notification content and absolute-link resolution
//! - [`downloads`] - parallel resolution of an extract's download links
//! - [`config`] - remote endpoint configuration from the environment

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod downloads;
mod http;
pub mod keys;
pub mod model;
pub mod notify;
pub mod odes;

// Re-export commonly used types
pub use config::{ConfigError, ServiceConfig};
pub use downloads::DownloadResolver;
pub use keys::KeysClient;
pub use model::{Download, Envelope, OdesExtract, PendingExtract, Wof};
pub use notify::{BaseUrlLinks, ExtractLinks, NotificationContent};
pub use odes::{OdesClient, ServiceError};
