//! Publish releases into a product feed

use std::io::{IsTerminal, Read};
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use super::output::Output;
use crate::domain::Product;
use crate::github::GithubRepo;
use crate::ingest;
use crate::storage::{Store, Upsert};

/// Input format accepted by `publish`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// `cargo dist plan --output-format=json` manifest
    #[default]
    Dist,
    /// Ad-hoc release JSON (one record or `{"versions": [...]}`)
    Plain,
}

pub fn run(
    output: &Output,
    store: Option<&Path>,
    file: Option<&Path>,
    input: InputFormat,
    product: Option<&str>,
    github: Option<&str>,
) -> Result<()> {
    let store = Store::open_at(store)?;
    let repo: Option<GithubRepo> = github.map(|s| s.parse()).transpose()?;
    let payload = read_payload(output, file, input)?;

    let (product, releases) = match input {
        InputFormat::Dist => {
            output.verbose_ctx("publish", "Extracting version information...");
            let import = ingest::import_manifest(
                &payload,
                product,
                repo,
                store.config().github.owner.as_deref(),
                Utc::now(),
            )?;
            output.verbose_ctx("publish", &format!("Found app: {}", import.product));
            output.verbose_ctx(
                "publish",
                &format!("Found version: {}", import.release.version),
            );
            output.verbose_ctx(
                "publish",
                &format!("Found {} artifacts", import.release.artifacts.len()),
            );
            (import.product, vec![import.release])
        }
        InputFormat::Plain => {
            let product: Product = product
                .context("--product is required with --input plain")?
                .parse()?;
            let releases = ingest::releases_from_payload(&payload)?;
            output.verbose_ctx(
                "publish",
                &format!("Found {} release records", releases.len()),
            );
            (product, releases)
        }
    };

    let feed_store = store.feed(&product);
    let mut feed = feed_store.load()?;

    let mut added = 0;
    let mut merged = 0;
    let mut unchanged = 0;
    for release in releases {
        let version = release.version.clone();
        match feed.upsert(release) {
            Upsert::Added => added += 1,
            Upsert::Merged => {
                output.verbose_ctx(
                    "publish",
                    &format!("Version {} already exists, merging artifacts", version),
                );
                merged += 1;
            }
            Upsert::Unchanged => unchanged += 1,
        }
    }

    if feed.is_dirty() {
        output.verbose_ctx(
            "publish",
            &format!("Updating {}...", feed_store.path().display()),
        );
        feed_store.save(&feed)?;
    } else {
        output.verbose_ctx("publish", "Feed already up to date, nothing to write");
    }

    let feed_path = store
        .relative_path(feed_store.path())
        .unwrap_or_else(|| feed_store.path().to_path_buf());

    if output.is_json() {
        output.data(&serde_json::json!({
            "product": product.as_str(),
            "feed": feed_path.display().to_string(),
            "added": added,
            "merged": merged,
            "unchanged": unchanged,
        }));
    } else {
        output.success(&format!(
            "Published {}: {} added, {} merged, {} unchanged",
            product, added, merged, unchanged
        ));
    }

    Ok(())
}

/// Reads the input from a file, from piped stdin, or by running
/// `cargo dist plan` when stdin is a terminal
fn read_payload(output: &Output, file: Option<&Path>, input: InputFormat) -> Result<String> {
    if let Some(path) = file {
        output.verbose_ctx("publish", &format!("Reading {}", path.display()));
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return match input {
            InputFormat::Dist => {
                output.verbose_ctx("publish", "Running cargo dist plan...");
                run_cargo_dist_plan()
            }
            InputFormat::Plain => bail!("No input: pass a file or pipe the payload to stdin"),
        };
    }

    output.verbose_ctx("publish", "Reading manifest from stdin...");
    let mut payload = String::new();
    stdin
        .read_to_string(&mut payload)
        .context("Failed to read stdin")?;
    Ok(payload)
}

fn run_cargo_dist_plan() -> Result<String> {
    let result = Command::new("cargo")
        .args(["dist", "plan", "--output-format=json"])
        .output()
        .context("Failed to run cargo dist plan")?;

    if !result.status.success() {
        bail!(
            "cargo dist plan failed: {}",
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    String::from_utf8(result.stdout).context("cargo dist plan printed invalid UTF-8")
}
