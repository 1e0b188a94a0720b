//! Store configuration
//!
//! A store is rooted by its `versions.toml`; feed files live in a
//! subdirectory named by `feed_dir`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker and config file at the store root
pub const CONFIG_FILE: &str = "versions.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// GitHub settings used by backfill and dist publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Default repository owner when `--github` is not given
    pub owner: Option<String>,

    /// API base URL
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: None,
            api_url: "https://api.github.com".to_string(),
        }
    }
}

/// Store-level configuration from `versions.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory under the store root holding the feed files
    pub feed_dir: String,

    /// GitHub settings
    pub github: GithubConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            feed_dir: "v1".to_string(),
            github: GithubConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads the configuration of a store root
    pub fn for_store(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse config")
    }

    /// Finds the store root by looking for `versions.toml` upward from
    /// the current directory
    pub fn find_store_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();

        assert_eq!(config.feed_dir, "v1");
        assert_eq!(config.github.owner, None);
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn parse_config_with_overrides() {
        let toml = r#"
feed_dir = "feeds"

[github]
owner = "acme"
api_url = "https://github.example/api/v3"
"#;

        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.feed_dir, "feeds");
        assert_eq!(config.github.owner, Some("acme".to_string()));
        assert_eq!(config.github.api_url, "https://github.example/api/v3");
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let toml = r#"
[github]
owner = "acme"
"#;

        let config: StoreConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.feed_dir, "v1");
        assert_eq!(config.github.api_url, "https://api.github.com");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::for_store(dir.path()).unwrap();

        assert_eq!(config.feed_dir, "v1");
    }

    #[test]
    fn find_store_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "feed_dir = \"v1\"\n").unwrap();

        // Change to a subdirectory
        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();
        std::env::set_current_dir(&sub_dir).unwrap();

        let root = StoreConfig::find_store_root();
        // Canonicalize both paths to handle macOS /var -> /private/var symlinks
        let expected = dir.path().canonicalize().ok();
        let actual = root.and_then(|p| p.canonicalize().ok());
        assert_eq!(actual, expected);

        // Reset current dir to avoid affecting other tests
        std::env::set_current_dir(dir.path()).unwrap();
    }
}
