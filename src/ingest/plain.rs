//! Ad-hoc payload ingestion
//!
//! Accepts either a single release object or a `{"versions": [...]}`
//! batch. Records are validated and normalized but otherwise taken as
//! given: artifact order and the record's own date are preserved.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::Release;

#[derive(Debug, Deserialize)]
struct Batch {
    versions: Vec<Release>,
}

/// Parses a plain JSON payload into normalized release records
pub fn releases_from_payload(payload: &str) -> Result<Vec<Release>> {
    let value: serde_json::Value =
        serde_json::from_str(payload).context("Malformed JSON payload")?;

    let mut releases = if value.get("versions").is_some() {
        let batch: Batch = serde_json::from_value(value).context("Invalid release record")?;
        batch.versions
    } else {
        let release: Release =
            serde_json::from_value(value).context("Invalid release record")?;
        vec![release]
    };

    for release in &mut releases {
        release.normalize()?;
    }

    Ok(releases)
}
