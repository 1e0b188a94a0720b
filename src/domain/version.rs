//! Version and product identifiers
//!
//! Versions are stored exactly as published: `1.2.3` and `v1.2.3` are
//! both valid and distinct. Products name feed files on disk, so their
//! character set is restricted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Version is empty")]
    Empty,

    #[error("Version contains whitespace: '{0}'")]
    Whitespace(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    #[error("Product name is empty")]
    Empty,

    #[error("Invalid product name '{0}': use letters, digits, '.', '_' or '-'")]
    InvalidChars(String),

    #[error("Product name '{0}' must not start with '.' or '-'")]
    LeadingPunct(String),
}

/// A published version string (release tag), kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(VersionError::Whitespace(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A product name, used as the feed file stem (`{product}.ndjson`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Product(String);

impl Product {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of this product's feed
    pub fn feed_file_name(&self) -> String {
        format!("{}.ndjson", self.0)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Product {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProductError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(ProductError::InvalidChars(s.to_string()));
        }
        if s.starts_with('.') || s.starts_with('-') {
            return Err(ProductError::LeadingPunct(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}
