//! Backfill a product feed from published GitHub releases

use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::Product;
use crate::github::{self, GithubClient, GithubRepo};
use crate::storage::{Store, Upsert};

pub fn run(
    output: &Output,
    store: Option<&Path>,
    product: &str,
    github: Option<&str>,
    fetch_checksums: bool,
) -> Result<()> {
    let store = Store::open_at(store)?;
    let product: Product = product.parse()?;

    let repo: GithubRepo = match github {
        Some(arg) => arg.parse()?,
        None => {
            let owner = store.config().github.owner.as_deref().context(
                "No GitHub owner configured; pass --github OWNER/REPO or set github.owner in versions.toml",
            )?;
            GithubRepo::new(owner, product.as_str())
        }
    };

    let client = GithubClient::new(&store.config().github.api_url)?;
    if client.has_token() {
        output.verbose_ctx("backfill", "Using GITHUB_TOKEN for authentication");
    } else {
        output.verbose_ctx(
            "backfill",
            "No GITHUB_TOKEN found, using unauthenticated requests (may hit rate limits)",
        );
    }

    output.verbose_ctx(
        "backfill",
        &format!("Fetching releases from GitHub {}...", repo),
    );
    let gh_releases = client.list_releases(&repo)?;
    output.verbose_ctx("backfill", &format!("Found {} releases", gh_releases.len()));

    let mut releases = github::convert_releases(&gh_releases, &product);
    for release in &releases {
        output.verbose_ctx(
            "backfill",
            &format!("Processed version: {}", release.version),
        );
    }
    output.verbose_ctx(
        "backfill",
        &format!("Processed {} valid versions", releases.len()),
    );

    if fetch_checksums {
        for release in &mut releases {
            output.verbose_ctx(
                "backfill",
                &format!("Resolving checksums for {}", release.version),
            );
            github::resolve_checksums(&client, release)?;
        }
    }

    let feed_store = store.feed(&product);
    let mut feed = feed_store.load()?;

    let mut added = 0;
    let mut merged = 0;
    let mut unchanged = 0;
    for release in releases {
        match feed.upsert(release) {
            Upsert::Added => added += 1,
            Upsert::Merged => merged += 1,
            Upsert::Unchanged => unchanged += 1,
        }
    }

    if feed.is_dirty() {
        output.verbose_ctx(
            "backfill",
            &format!("Writing to {}...", feed_store.path().display()),
        );
        feed_store.save(&feed)?;
    } else {
        output.verbose_ctx("backfill", "Feed already up to date, nothing to write");
    }

    let feed_path = store
        .relative_path(feed_store.path())
        .unwrap_or_else(|| feed_store.path().to_path_buf());

    if output.is_json() {
        output.data(&serde_json::json!({
            "product": product.as_str(),
            "repo": repo.to_string(),
            "feed": feed_path.display().to_string(),
            "added": added,
            "merged": merged,
            "unchanged": unchanged,
        }));
    } else {
        output.success(&format!(
            "Backfilled {} from {}: {} added, {} merged, {} unchanged",
            product, repo, added, merged, unchanged
        ));
    }

    Ok(())
}
