//! Release records and artifact merging
//!
//! A release is one line of a product feed: a version, its publication
//! date, and the downloadable artifacts. Artifacts are keyed by
//! platform + variant; republishing a version unions artifact lists
//! under that key, with the incoming side winning conflicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{Product, Version};

/// Variant label used when an artifact has no explicit variant
pub const DEFAULT_VARIANT: &str = "default";

#[derive(Debug, Error, PartialEq)]
pub enum ReleaseError {
    #[error("Release {0} has no artifacts")]
    NoArtifacts(Version),

    #[error("Release {version} lists {platform}/{variant} twice with different data")]
    ConflictingArtifacts {
        version: Version,
        platform: String,
        variant: String,
    },

    #[error("Artifact for {0} has an empty URL")]
    EmptyUrl(String),

    #[error("Invalid checksum '{0}': expected a hex digest or an http(s) URL")]
    InvalidChecksum(String),
}

/// A sha256 reference: either the digest itself or a URL publishing it
///
/// Digests are kept exactly as given; classification happens once at
/// parse time so the rest of the code can match on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Checksum {
    Digest(String),
    Url(String),
}

impl Checksum {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Digest(s) | Self::Url(s) => s,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Checksum {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Url(s.to_string()));
        }
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self::Digest(s.to_string()));
        }
        Err(ReleaseError::InvalidChecksum(s.to_string()))
    }
}

impl TryFrom<String> for Checksum {
    type Error = ReleaseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        match checksum {
            Checksum::Digest(s) | Checksum::Url(s) => s,
        }
    }
}

/// One downloadable build output of a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Target platform, usually a target triple
    pub platform: String,

    /// Build variant within the platform; absent means the default build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// Download URL of the archive
    pub url: String,

    /// Archive packaging (`tar.gz`, `zip`, `unknown`)
    pub archive_format: String,

    /// Checksum digest, or the URL of the published checksum file
    pub sha256: Checksum,
}

impl Artifact {
    /// The variant, or the default label when none is set
    pub fn variant_label(&self) -> &str {
        self.variant.as_deref().unwrap_or(DEFAULT_VARIANT)
    }

    /// Merge key: artifacts are unique per platform + variant
    pub fn key(&self) -> (&str, &str) {
        (self.platform.as_str(), self.variant_label())
    }
}

/// One released version of a product with its artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub version: Version,
    pub date: DateTime<Utc>,
    pub artifacts: Vec<Artifact>,
}

impl Release {
    pub fn new(version: Version, date: DateTime<Utc>, artifacts: Vec<Artifact>) -> Self {
        Self {
            version,
            date,
            artifacts,
        }
    }

    /// Validates the record and collapses exact duplicate artifacts.
    ///
    /// Two artifacts under the same platform + variant key with
    /// different data make the record ambiguous and are rejected.
    pub fn normalize(&mut self) -> Result<(), ReleaseError> {
        if self.artifacts.is_empty() {
            return Err(ReleaseError::NoArtifacts(self.version.clone()));
        }

        let artifacts = std::mem::take(&mut self.artifacts);
        let mut kept: Vec<Artifact> = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            if artifact.url.is_empty() {
                return Err(ReleaseError::EmptyUrl(artifact.platform));
            }
            match kept.iter().position(|k| k.key() == artifact.key()) {
                Some(i) if kept[i] == artifact => {}
                Some(_) => {
                    return Err(ReleaseError::ConflictingArtifacts {
                        version: self.version.clone(),
                        variant: artifact.variant_label().to_string(),
                        platform: artifact.platform,
                    });
                }
                None => kept.push(artifact),
            }
        }

        self.artifacts = kept;
        Ok(())
    }

    /// Unions `incoming`'s artifacts into this release.
    ///
    /// Keyed by platform + variant: new keys are appended in incoming
    /// order, existing keys are replaced when the incoming artifact
    /// differs. The original publication date is kept. Returns true
    /// when anything changed.
    pub fn merge_artifacts(&mut self, incoming: &Release) -> bool {
        let mut changed = false;
        for artifact in &incoming.artifacts {
            match self.artifacts.iter_mut().find(|a| a.key() == artifact.key()) {
                Some(existing) => {
                    if *existing != *artifact {
                        *existing = artifact.clone();
                        changed = true;
                    }
                }
                None => {
                    self.artifacts.push(artifact.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Sorts artifacts by platform then variant; used by adapters that
    /// generate records so output order is stable
    pub fn sort_artifacts(&mut self) {
        self.artifacts.sort_by(|a, b| a.key().cmp(&b.key()));
    }
}

/// Archive format inferred from an artifact file name
pub fn archive_format_for(name: &str) -> &'static str {
    if name.ends_with(".tar.gz") {
        "tar.gz"
    } else if name.ends_with(".zip") {
        "zip"
    } else {
        "unknown"
    }
}

/// Extracts the platform from a `{product}-{platform}.tar.gz|zip`
/// artifact name. Anything else (checksum files, installer scripts,
/// source tarballs, other products) yields None.
pub fn platform_for(name: &str, product: &Product) -> Option<String> {
    let rest = name.strip_prefix(product.as_str())?.strip_prefix('-')?;
    let platform = rest
        .strip_suffix(".tar.gz")
        .or_else(|| rest.strip_suffix(".zip"))?;
    if platform.is_empty() {
        return None;
    }
    Some(platform.to_string())
}
