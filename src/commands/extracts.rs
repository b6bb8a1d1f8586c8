//! `submit`, `list`, and `show` commands against the extraction service.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use odes_extracts::{
    BaseUrlLinks, Download, DownloadResolver, KeysClient, OdesClient, PendingExtract,
    ServiceConfig,
};

/// Fetches or creates the caller's API key.
async fn api_key(config: &ServiceConfig, access_token: &str) -> Result<String> {
    let keys = KeysClient::new(&config.keys_url)?;
    let key = keys
        .get_api_key(access_token)
        .await
        .context("cannot obtain an extraction-service API key")?;
    debug!("API key ready");
    Ok(key)
}

/// Submits a pending extract read from `input` (JSON, as printed by the
/// `envelope` command) and prints the resulting ODES record.
///
/// Refuses extracts that already carry an ODES id; re-posting would create
/// a duplicate remote extract.
///
/// # Errors
///
/// Fails on malformed input, an already-submitted extract, or any hard
/// service failure (key creation, extract creation).
pub async fn run_submit_command(
    config: &ServiceConfig,
    access_token: &str,
    input: &str,
) -> Result<()> {
    let pending: PendingExtract =
        serde_json::from_str(input).context("stdin is not a pending extract (JSON)")?;

    if let Some(odes_id) = &pending.odes_id {
        bail!("extract {} was already submitted as ODES {odes_id}", pending.id);
    }
    if pending.user_id.trim().is_empty() {
        bail!("pending extract has no owning user");
    }

    let key = api_key(config, access_token).await?;
    let odes = OdesClient::new(&config.odes_url)?;
    let links = BaseUrlLinks::new(&config.base_url)?;

    let record = odes.submit_extract(&pending, &links, &key).await?;
    info!(odes_id = %record.id, status = %record.status, "extract submitted");

    let submitted = PendingExtract {
        odes_id: Some(record.id.clone()),
        ..pending
    };
    println!("{}", serde_json::to_string_pretty(&submitted)?);
    Ok(())
}

/// Lists the caller's extracts and prints them as JSON.
pub async fn run_list_command(config: &ServiceConfig, access_token: &str) -> Result<()> {
    let key = api_key(config, access_token).await?;
    let odes = OdesClient::new(&config.odes_url)?;

    let extracts = odes.list_extracts(&key).await?;
    info!(count = extracts.len(), "extracts listed");

    println!("{}", serde_json::to_string_pretty(&extracts)?);
    Ok(())
}

/// Shows one extract; when it has download links, resolves them in parallel
/// and prints the downloads re-keyed by format for stable output.
///
/// # Errors
///
/// Fails when the extract does not exist (the read path's "absent" answer
/// becomes a hard error at this surface, as it did on the original
/// not-found page).
pub async fn run_show_command(
    config: &ServiceConfig,
    access_token: &str,
    extract_id: &str,
) -> Result<()> {
    let key = api_key(config, access_token).await?;
    let odes = OdesClient::new(&config.odes_url)?;

    let Some(extract) = odes.get_extract(extract_id, &key).await? else {
        bail!("no extract {extract_id}");
    };

    println!("{}", serde_json::to_string_pretty(&extract)?);

    if extract.download_links.is_empty() {
        info!(extract_id = %extract.id, status = %extract.status, "no downloads yet");
        return Ok(());
    }

    let resolver = DownloadResolver::new()?;
    let downloads = resolver.resolve_downloads(&extract.download_links).await;

    // Completion order is arbitrary; re-key by format before printing.
    let by_format: BTreeMap<&str, &Download> = downloads
        .iter()
        .map(|download| (download.format.as_str(), download))
        .collect();
    println!("{}", serde_json::to_string_pretty(&by_format)?);
    Ok(())
}
