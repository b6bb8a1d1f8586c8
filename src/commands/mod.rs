//! CLI command handlers.
//!
//! These play the role the original web routes played: compose the key
//! provider, the extraction-service client, and the download resolver with
//! caller-held state. The pending extract travels as JSON between the
//! `envelope` and `submit` commands instead of living in a web session.

mod envelope;
mod extracts;

pub use envelope::run_envelope_command;
pub use extracts::{run_list_command, run_show_command, run_submit_command};
