//! Blocking GitHub API client
//!
//! Paginates the releases endpoint and resolves checksums for assets.
//! Transient failures (connection errors, timeouts, 5xx, 429) are
//! retried a fixed number of times with a delay between attempts;
//! other HTTP errors abort immediately.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::GithubRepo;

const USER_AGENT: &str = concat!("versions-cli/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github.v3+json";
const PER_PAGE: u32 = 100;
const NUMBER_OF_FETCH_RETRIES: u32 = 3;
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("Invalid repository '{0}': expected 'owner/repo'")]
    InvalidRepo(String),

    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<GithubError>,
    },

    #[error("No sha256 digest found in checksum file {0}")]
    MalformedChecksum(String),
}

/// One release as returned by the GitHub API
#[derive(Debug, Clone, Deserialize)]
pub struct GhRelease {
    pub tag_name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<GhAsset>,
}

/// One downloadable asset attached to a release
#[derive(Debug, Clone, Deserialize)]
pub struct GhAsset {
    pub name: String,
    pub browser_download_url: String,
    /// `sha256:<hex>` on API versions that report asset digests
    pub digest: Option<String>,
}

/// Client over the GitHub REST API
pub struct GithubClient {
    http: reqwest::blocking::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Builds a client for an API base URL, picking up `GITHUB_TOKEN`
    /// from the environment when set
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }

    /// True when requests carry a `GITHUB_TOKEN` bearer header
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Lists all releases of a repository in API order (newest first),
    /// following pagination until an empty page
    pub fn list_releases(&self, repo: &GithubRepo) -> Result<Vec<GhRelease>> {
        let url = format!("{}/repos/{}/{}/releases", self.api_url, repo.owner, repo.repo);
        let mut releases = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self.get_with_retry(
                &url,
                &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
            )?;

            let batch: Vec<GhRelease> = response
                .json()
                .with_context(|| format!("Failed to decode releases page {} from {}", page, url))?;

            if batch.is_empty() {
                break;
            }

            releases.extend(batch);
            page += 1;
        }

        Ok(releases)
    }

    /// Fetches a checksum file and extracts its digest. Returns None
    /// when the file does not exist, so callers can fall back to
    /// hashing the asset itself.
    pub fn try_fetch_digest(&self, url: &str) -> Result<Option<String>> {
        let response = match self.get_with_retry(url, &[]) {
            Ok(response) => response,
            Err(GithubError::Status { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let body = response
            .text()
            .with_context(|| format!("Failed to read checksum file {}", url))?;

        let digest = parse_digest(&body)
            .ok_or_else(|| GithubError::MalformedChecksum(url.to_string()))?;
        Ok(Some(digest))
    }

    /// Downloads an asset and computes its sha256 digest
    pub fn digest_asset(&self, url: &str) -> Result<String> {
        let mut response = self.get_with_retry(url, &[])?;

        let mut hasher = Sha256::new();
        std::io::copy(&mut response, &mut hasher)
            .with_context(|| format!("Failed to download asset {}", url))?;

        Ok(hex::encode(hasher.finalize()))
    }

    fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, GithubError> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.get_once(url, query) {
                Ok(response) => return Ok(response),
                Err(e) if is_transient(&e) => {
                    if attempt >= NUMBER_OF_FETCH_RETRIES {
                        return Err(GithubError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    thread::sleep(FETCH_RETRY_DELAY);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn get_once(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, GithubError> {
        let mut request = self.http.get(url).header("Accept", ACCEPT).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

fn is_transient(error: &GithubError) -> bool {
    match error {
        GithubError::Request(e) => e.is_timeout() || e.is_connect(),
        GithubError::Status { status, .. } => *status >= 500 || *status == 429,
        _ => false,
    }
}

/// Extracts the digest from checksum file contents: either a bare hex
/// line or the `<hex>  <filename>` form sha256sum emits
fn parse_digest(body: &str) -> Option<String> {
    body.split_whitespace()
        .find(|token| token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|token| token.to_ascii_lowercase())
}
