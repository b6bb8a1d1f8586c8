//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Request and track geographic data extracts from the ODES extraction
/// service.
///
/// Endpoints come from the `ODES_URL`, `KEYS_URL`, and `BASE_URL`
/// environment variables; the OAuth access token from `--access-token` or
/// `ACCESS_TOKEN`.
#[derive(Parser, Debug)]
#[command(name = "odes-extracts")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// OAuth access token for the key service (falls back to ACCESS_TOKEN)
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Owning user id for new extracts (falls back to USER_ID)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Define a bounding box and print the pending extract as JSON
    Envelope {
        /// Bounding box as four floats: west south east north
        #[arg(long, num_args = 4, value_names = ["W", "S", "E", "N"], allow_hyphen_values = true)]
        bbox: Vec<f64>,

        /// Display name for the extract
        #[arg(long)]
        name: Option<String>,

        /// Who's On First place id
        #[arg(long)]
        wof_id: Option<i64>,

        /// Who's On First place name
        #[arg(long)]
        wof_name: Option<String>,
    },

    /// Submit a pending extract (JSON on stdin) to the extraction service
    Submit,

    /// List extracts visible to the authenticated user
    List,

    /// Show one extract and resolve its download links
    Show {
        /// The ODES extract id
        extract_id: String,
    },
}
