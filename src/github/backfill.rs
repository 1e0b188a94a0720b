//! Backfill conversion from published GitHub releases
//!
//! Reconstructs feed records for versions released before the feed
//! existed. Drafts and prereleases are skipped, as are releases with
//! no tag, no publish date, or no qualifying assets. Assets must be
//! named `{product}-{platform}.tar.gz` or `.zip` to qualify.

use anyhow::Result;

use crate::domain::{archive_format_for, platform_for, Artifact, Checksum, Product, Release};

use super::client::{GhAsset, GhRelease, GithubClient};

/// Converts API releases into feed records, newest first
pub fn convert_releases(releases: &[GhRelease], product: &Product) -> Vec<Release> {
    let mut converted: Vec<Release> = releases
        .iter()
        .filter_map(|gh| convert_release(gh, product))
        .collect();

    converted.sort_by(|a, b| b.date.cmp(&a.date));
    converted
}

/// Replaces checksum URLs with inline digests, hashing the asset
/// itself when no checksum file is published
pub fn resolve_checksums(client: &GithubClient, release: &mut Release) -> Result<()> {
    for artifact in &mut release.artifacts {
        if let Checksum::Url(url) = &artifact.sha256 {
            let digest = match client.try_fetch_digest(url)? {
                Some(digest) => digest,
                None => client.digest_asset(&artifact.url)?,
            };
            artifact.sha256 = Checksum::Digest(digest);
        }
    }
    Ok(())
}

fn convert_release(gh: &GhRelease, product: &Product) -> Option<Release> {
    if gh.draft || gh.prerelease {
        return None;
    }

    let tag = gh.tag_name.as_deref()?;
    let version = tag.parse().ok()?;
    let date = gh.published_at?;

    let mut artifacts: Vec<Artifact> = Vec::new();
    for asset in &gh.assets {
        if let Some(artifact) = convert_asset(asset, &gh.assets, product) {
            // The first asset wins if a release somehow publishes two
            // archives for the same platform
            if !artifacts.iter().any(|a| a.key() == artifact.key()) {
                artifacts.push(artifact);
            }
        }
    }

    if artifacts.is_empty() {
        return None;
    }

    let mut release = Release::new(version, date, artifacts);
    release.sort_artifacts();
    Some(release)
}

fn convert_asset(asset: &GhAsset, siblings: &[GhAsset], product: &Product) -> Option<Artifact> {
    let platform = platform_for(&asset.name, product)?;

    Some(Artifact {
        platform,
        variant: None,
        url: asset.browser_download_url.clone(),
        archive_format: archive_format_for(&asset.name).to_string(),
        sha256: asset_checksum(asset, siblings),
    })
}

/// Checksum reference for an asset: an API-reported digest when
/// present, else the sibling checksum asset, else the conventional
/// `{url}.sha256`
fn asset_checksum(asset: &GhAsset, siblings: &[GhAsset]) -> Checksum {
    if let Some(digest) = asset.digest.as_deref().and_then(|d| d.strip_prefix("sha256:")) {
        if !digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Checksum::Digest(digest.to_ascii_lowercase());
        }
    }

    let checksum_name = format!("{}.sha256", asset.name);
    if let Some(sibling) = siblings.iter().find(|s| s.name == checksum_name) {
        return Checksum::Url(sibling.browser_download_url.clone());
    }

    Checksum::Url(format!("{}.sha256", asset.browser_download_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> GhAsset {
        GhAsset {
            name: name.to_string(),
            browser_download_url: format!("https://github.test/dl/{}", name),
            digest: None,
        }
    }

    fn gh_release(tag: &str, date: &str, assets: Vec<GhAsset>) -> GhRelease {
        GhRelease {
            tag_name: Some(tag.to_string()),
            draft: false,
            prerelease: false,
            published_at: Some(date.parse().unwrap()),
            assets,
        }
    }

    fn uv() -> Product {
        "uv".parse().unwrap()
    }

    #[test]
    fn converts_a_plain_release() {
        let gh = gh_release(
            "0.4.0",
            "2024-08-01T10:00:00Z",
            vec![
                asset("uv-x86_64-unknown-linux-gnu.tar.gz"),
                asset("uv-x86_64-pc-windows-msvc.zip"),
            ],
        );

        let releases = convert_releases(&[gh], &uv());
        assert_eq!(releases.len(), 1);

        let release = &releases[0];
        assert_eq!(release.version.as_str(), "0.4.0");
        assert_eq!(release.artifacts.len(), 2);
        // Sorted by platform
        assert_eq!(release.artifacts[0].platform, "x86_64-pc-windows-msvc");
        assert_eq!(release.artifacts[0].archive_format, "zip");
        assert_eq!(release.artifacts[1].platform, "x86_64-unknown-linux-gnu");
        assert_eq!(release.artifacts[1].archive_format, "tar.gz");
    }

    #[test]
    fn skips_drafts_and_prereleases() {
        let mut draft = gh_release("1.0.0", "2024-08-01T10:00:00Z", vec![asset("uv-x.tar.gz")]);
        draft.draft = true;
        let mut pre = gh_release("1.1.0", "2024-08-02T10:00:00Z", vec![asset("uv-x.tar.gz")]);
        pre.prerelease = true;

        assert!(convert_releases(&[draft, pre], &uv()).is_empty());
    }

    #[test]
    fn skips_untagged_and_undated_releases() {
        let mut untagged = gh_release("1.0.0", "2024-08-01T10:00:00Z", vec![asset("uv-x.tar.gz")]);
        untagged.tag_name = None;
        let mut undated = gh_release("1.1.0", "2024-08-02T10:00:00Z", vec![asset("uv-x.tar.gz")]);
        undated.published_at = None;

        assert!(convert_releases(&[untagged, undated], &uv()).is_empty());
    }

    #[test]
    fn skips_releases_with_no_qualifying_assets() {
        let gh = gh_release(
            "1.0.0",
            "2024-08-01T10:00:00Z",
            vec![
                asset("source.tar.gz"),
                asset("uv-installer.sh"),
                asset("uv-x86.tar.gz.sha256"),
                asset("other-tool-x86.tar.gz"),
            ],
        );

        assert!(convert_releases(&[gh], &uv()).is_empty());
    }

    #[test]
    fn checksum_defaults_to_url_convention() {
        let gh = gh_release("1.0.0", "2024-08-01T10:00:00Z", vec![asset("uv-x86.tar.gz")]);

        let releases = convert_releases(&[gh], &uv());
        let sha256 = &releases[0].artifacts[0].sha256;
        assert!(sha256.is_url());
        assert_eq!(sha256.as_str(), "https://github.test/dl/uv-x86.tar.gz.sha256");
    }

    #[test]
    fn checksum_prefers_sibling_asset_url() {
        let mut sibling = asset("uv-x86.tar.gz.sha256");
        sibling.browser_download_url = "https://cdn.test/uv-x86.tar.gz.sha256".to_string();
        let gh = gh_release(
            "1.0.0",
            "2024-08-01T10:00:00Z",
            vec![asset("uv-x86.tar.gz"), sibling],
        );

        let releases = convert_releases(&[gh], &uv());
        assert_eq!(
            releases[0].artifacts[0].sha256.as_str(),
            "https://cdn.test/uv-x86.tar.gz.sha256"
        );
    }

    #[test]
    fn checksum_prefers_api_digest_over_everything() {
        let mut archive = asset("uv-x86.tar.gz");
        archive.digest = Some("sha256:ABCDEF0123".to_string());
        let gh = gh_release(
            "1.0.0",
            "2024-08-01T10:00:00Z",
            vec![archive, asset("uv-x86.tar.gz.sha256")],
        );

        let releases = convert_releases(&[gh], &uv());
        assert_eq!(
            releases[0].artifacts[0].sha256,
            Checksum::Digest("abcdef0123".to_string())
        );
    }

    #[test]
    fn malformed_api_digest_falls_through() {
        let mut archive = asset("uv-x86.tar.gz");
        archive.digest = Some("md5:abc".to_string());
        let gh = gh_release("1.0.0", "2024-08-01T10:00:00Z", vec![archive]);

        let releases = convert_releases(&[gh], &uv());
        assert!(releases[0].artifacts[0].sha256.is_url());
    }

    #[test]
    fn duplicate_platform_assets_keep_the_first() {
        let gh = gh_release(
            "1.0.0",
            "2024-08-01T10:00:00Z",
            vec![asset("uv-x86.tar.gz"), asset("uv-x86.zip")],
        );

        let releases = convert_releases(&[gh], &uv());
        assert_eq!(releases[0].artifacts.len(), 1);
        assert_eq!(releases[0].artifacts[0].archive_format, "tar.gz");
    }

    #[test]
    fn orders_newest_first() {
        let old = gh_release("1.0.0", "2024-01-01T00:00:00Z", vec![asset("uv-x.tar.gz")]);
        let new = gh_release("1.1.0", "2024-06-01T00:00:00Z", vec![asset("uv-x.tar.gz")]);

        let releases = convert_releases(&[old, new], &uv());
        let versions: Vec<_> = releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["1.1.0", "1.0.0"]);
    }
}
