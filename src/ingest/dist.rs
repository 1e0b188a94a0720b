//! cargo-dist plan manifest ingestion
//!
//! Maps the JSON printed by `cargo dist plan --output-format=json`
//! onto a release record. The manifest lists artifact file names per
//! app; download URLs are reconstructed from the GitHub repository
//! and the announcement tag, and each artifact points at the sibling
//! `.sha256` file cargo-dist publishes next to it.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::Deserialize;

use crate::domain::{
    archive_format_for, platform_for, Artifact, Checksum, Product, Release, Version,
};
use crate::github::GithubRepo;

#[derive(Debug, Deserialize)]
struct DistManifest {
    announcement_tag: Option<String>,
    announcement_github_body: Option<String>,
    #[serde(default)]
    releases: Vec<DistRelease>,
}

#[derive(Debug, Deserialize)]
struct DistRelease {
    app_name: String,
    #[serde(default)]
    artifacts: Vec<String>,
}

/// A release extracted from a dist manifest, with the product and
/// repository it resolved to
#[derive(Debug)]
pub struct DistImport {
    pub product: Product,
    pub repo: GithubRepo,
    pub release: Release,
}

/// Extracts a release record from a dist plan manifest.
///
/// The app is selected by `product` when given, else the manifest's
/// first release. The repository comes from `repo` when given, else
/// from the first download URL in the announcement body, else from
/// `fallback_owner` with the app name as the repository.
pub fn import_manifest(
    manifest: &str,
    product: Option<&str>,
    repo: Option<GithubRepo>,
    fallback_owner: Option<&str>,
    date: DateTime<Utc>,
) -> Result<DistImport> {
    let manifest: DistManifest =
        serde_json::from_str(manifest).context("Malformed dist manifest")?;

    let dist_release = match product {
        Some(name) => manifest
            .releases
            .iter()
            .find(|r| r.app_name == name)
            .with_context(|| format!("No app named '{}' in the dist manifest", name))?,
        None => manifest
            .releases
            .first()
            .context("No releases found in manifest")?,
    };

    let product: Product = dist_release.app_name.parse()?;
    let version: Version = manifest
        .announcement_tag
        .as_deref()
        .context("Dist manifest has no announcement tag (pass --tag to cargo dist plan)")?
        .parse()?;

    let repo = repo
        .or_else(|| repo_from_body(manifest.announcement_github_body.as_deref()))
        .or_else(|| fallback_owner.map(|owner| GithubRepo::new(owner, product.as_str())))
        .context("Could not determine the GitHub repository; pass --github OWNER/REPO")?;

    let mut artifacts = Vec::new();
    for name in &dist_release.artifacts {
        if let Some(platform) = platform_for(name, &product) {
            let url = format!(
                "https://github.com/{}/{}/releases/download/{}/{}",
                repo.owner, repo.repo, version, name
            );
            artifacts.push(Artifact {
                platform,
                variant: None,
                sha256: Checksum::Url(format!("{}.sha256", url)),
                url,
                archive_format: archive_format_for(name).to_string(),
            });
        }
    }

    if artifacts.is_empty() {
        bail!("No release artifacts for app '{}' in the dist manifest", product);
    }

    let mut release = Release::new(version, date, artifacts);
    release.sort_artifacts();
    release.normalize()?;

    Ok(DistImport {
        product,
        repo,
        release,
    })
}

/// Pulls `owner/repo` out of the first release-download URL in the
/// announcement body
fn repo_from_body(body: Option<&str>) -> Option<GithubRepo> {
    let re = Regex::new(r"https://github\.com/([^/]+)/([^/]+)/releases/download/").unwrap();
    let caps = re.captures(body?)?;
    Some(GithubRepo::new(&caps[1], &caps[2]))
}
