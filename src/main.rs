//! CLI entry point for the ODES extracts tool.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use clap::Parser;
use odes_extracts::ServiceConfig;
use tracing::debug;

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(command = ?args.command, "CLI arguments parsed");

    match args.command {
        Command::Envelope {
            bbox,
            name,
            wof_id,
            wof_name,
        } => {
            let user_id = required(args.user_id, "USER_ID", "--user-id")?;
            commands::run_envelope_command(&bbox, name, wof_id, wof_name, &user_id)
        }
        Command::Submit => {
            let config = service_config()?;
            let access_token = required(args.access_token, "ACCESS_TOKEN", "--access-token")?;
            let input = read_stdin()?;
            commands::run_submit_command(&config, &access_token, &input).await
        }
        Command::List => {
            let config = service_config()?;
            let access_token = required(args.access_token, "ACCESS_TOKEN", "--access-token")?;
            commands::run_list_command(&config, &access_token).await
        }
        Command::Show { extract_id } => {
            let config = service_config()?;
            let access_token = required(args.access_token, "ACCESS_TOKEN", "--access-token")?;
            commands::run_show_command(&config, &access_token, &extract_id).await
        }
    }
}

/// Loads remote endpoints; only the commands that talk to the services
/// need it.
fn service_config() -> Result<ServiceConfig> {
    ServiceConfig::from_env()
        .context("set ODES_URL and KEYS_URL to the extraction/key service endpoints")
}

/// Resolves a required value from its flag or environment variable.
fn required(flag: Option<String>, env_name: &str, flag_name: &str) -> Result<String> {
    if let Some(value) = flag {
        return Ok(value);
    }
    if let Ok(value) = std::env::var(env_name)
        && !value.trim().is_empty()
    {
        return Ok(value);
    }
    bail!("missing {flag_name} (or {env_name} environment variable)");
}

/// Reads the piped pending extract from stdin.
fn read_stdin() -> Result<String> {
    if io::stdin().is_terminal() {
        bail!("pipe a pending extract (JSON from the envelope command) on stdin");
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
