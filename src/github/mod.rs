//! GitHub releases API integration
//!
//! A blocking client over the releases endpoint plus the conversion
//! from API releases to feed records. Everything here is read-only
//! against GitHub.

mod backfill;
mod client;

pub use backfill::{convert_releases, resolve_checksums};
pub use client::{GhAsset, GhRelease, GithubClient, GithubError};

use std::fmt;
use std::str::FromStr;

/// A GitHub repository reference in `owner/repo` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

impl GithubRepo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for GithubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for GithubRepo {
    type Err = GithubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(GithubError::InvalidRepo(s.to_string())),
        }
    }
}
