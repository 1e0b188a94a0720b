//! Store management
//!
//! Handles store initialization and access to per-product feeds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::Product;

use super::config::{StoreConfig, CONFIG_FILE};
use super::ndjson::FeedStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not in a versions store. Run 'versions init' first.")]
    NotInStore,
}

/// A release-metadata store: versions.toml plus a feed directory
pub struct Store {
    root: PathBuf,
    config: StoreConfig,
}

impl Store {
    /// Opens an existing store at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(CONFIG_FILE).is_file() {
            return Err(StoreError::NotInStore.into());
        }

        let config = StoreConfig::for_store(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the store at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = StoreConfig::find_store_root().ok_or(StoreError::NotInStore)?;

        Self::open(root)
    }

    /// Opens `root` when given, otherwise discovers the store upward
    /// from the current directory
    pub fn open_at(root: Option<&Path>) -> Result<Self> {
        match root {
            Some(root) => Self::open(root),
            None => Self::open_current(),
        }
    }

    /// Initializes a new store at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store directory: {}", root.display()))?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            let default_config = r#"# versions store configuration

# Directory holding the per-product feed files
feed_dir = "v1"

[github]
# Default repository owner for backfill and publish
# owner = "acme"

# GitHub API base URL
api_url = "https://api.github.com"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let store = Self::open(&root)?;

        let feed_dir = store.feed_dir();
        fs::create_dir_all(&feed_dir)
            .with_context(|| format!("Failed to create feed directory: {}", feed_dir.display()))?;

        Ok(store)
    }

    /// Returns the store root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory holding the feed files
    pub fn feed_dir(&self) -> PathBuf {
        self.root.join(&self.config.feed_dir)
    }

    /// The feed store for one product
    pub fn feed(&self, product: &Product) -> FeedStore {
        FeedStore::new(self.feed_dir().join(product.feed_file_name()))
    }

    /// Returns a path relative to the store root when possible
    pub fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(|p| p.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path()).unwrap();

        assert!(store.root().join(CONFIG_FILE).is_file());
        assert!(store.feed_dir().is_dir());
        assert!(store.feed_dir().ends_with("v1"));
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();

        Store::init(dir.path()).unwrap();
        Store::init(dir.path()).unwrap(); // Should not fail

        assert!(dir.path().join(CONFIG_FILE).is_file());
    }

    #[test]
    fn init_keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "feed_dir = \"feeds\"\n",
        )
        .unwrap();

        let store = Store::init(dir.path()).unwrap();
        assert_eq!(store.config().feed_dir, "feeds");
        assert!(dir.path().join("feeds").is_dir());
    }

    #[test]
    fn open_existing_store() {
        let dir = TempDir::new().unwrap();
        Store::init(dir.path()).unwrap();

        let store = Store::open(dir.path()).unwrap();
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn open_non_store_fails() {
        let dir = TempDir::new().unwrap();
        let result = Store::open(dir.path());

        assert!(result.is_err());
    }

    #[test]
    fn feed_path_uses_product_name() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path()).unwrap();

        let product: Product = "uv".parse().unwrap();
        let feed = store.feed(&product);

        assert!(feed.path().ends_with("v1/uv.ndjson"));
    }

    #[test]
    fn relative_path() {
        let dir = TempDir::new().unwrap();
        let store = Store::init(dir.path()).unwrap();

        let abs_path = dir.path().join("v1").join("uv.ndjson");
        let rel_path = store.relative_path(&abs_path);

        assert_eq!(rel_path, Some(PathBuf::from("v1/uv.ndjson")));
    }
}
