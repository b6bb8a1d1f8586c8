//! `envelope` command: define a bounding box and print the pending extract.

use anyhow::{Result, bail};
use tracing::info;

use odes_extracts::{Envelope, PendingExtract, Wof};

/// Builds an envelope and its pending extract, printing the extract as JSON
/// for a later `submit`.
///
/// The edges are not order-checked: a west edge greater than the east edge
/// is a valid box crossing the antimeridian, and the extraction service owns
/// any further geometry validation.
///
/// # Errors
///
/// Fails when the bbox is not exactly four finite floats.
pub fn run_envelope_command(
    bbox: &[f64],
    name: Option<String>,
    wof_id: Option<i64>,
    wof_name: Option<String>,
    user_id: &str,
) -> Result<()> {
    let [west, south, east, north] = *bbox else {
        bail!("bounding box needs exactly four values: west south east north");
    };
    if !bbox.iter().all(|value| value.is_finite()) {
        bail!("bounding box values must be finite numbers");
    }

    let envelope = Envelope::new([west, south, east, north]);
    let extract = PendingExtract::new(name, envelope, user_id, Wof::new(wof_id, wof_name));

    info!(
        envelope_id = %extract.envelope.id,
        extract_id = %extract.id,
        "pending extract created"
    );

    println!("{}", serde_json::to_string_pretty(&extract)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_command_accepts_ordered_bbox() {
        let result = run_envelope_command(
            &[-1.0, -2.0, 1.0, 2.0],
            Some("Downtown".to_string()),
            None,
            None,
            "user-1",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_envelope_command_rejects_wrong_arity() {
        let result = run_envelope_command(&[1.0, 2.0, 3.0], None, None, None, "user-1");
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_command_accepts_antimeridian_crossing_bbox() {
        // Fiji-style box: west of the antimeridian to east of it.
        let result = run_envelope_command(&[177.0, -19.0, -178.0, -16.0], None, None, None, "user-1");
        assert!(result.is_ok());
    }

    #[test]
    fn test_envelope_command_accepts_zero_area_bbox() {
        let result = run_envelope_command(&[1.0, 2.0, 1.0, 2.0], None, None, None, "user-1");
        assert!(result.is_ok());
    }

    #[test]
    fn test_envelope_command_rejects_non_finite_values() {
        let result =
            run_envelope_command(&[f64::NAN, 2.0, 3.0, 4.0], None, None, None, "user-1");
        assert!(result.is_err());
    }
}
