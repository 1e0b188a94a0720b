//! # Storage Layer
//!
//! Persistence for release feeds with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Release feeds | ndjson (one JSON per line) | `<root>/v1/{product}.ndjson` |
//! | Config | TOML | `<root>/versions.toml` |
//!
//! ## Store Structure
//!
//! ```text
//! <root>/
//! ├── versions.toml         # Store marker + configuration
//! └── v1/                   # Feed directory (name configurable)
//!     ├── uv.ndjson
//!     └── ruff.ndjson
//! ```
//!
//! ## Write Discipline
//!
//! Feeds are single-writer. Saves go through a temp file and an atomic
//! rename, and only happen when an upsert actually changed a record;
//! untouched lines are carried over byte-for-byte.
//!
//! ## Key Types
//!
//! - [`Store`] - Entry point for accessing a versions store
//! - [`FeedStore`] - Read/merge/write one product's feed
//! - [`StoreConfig`] - Configuration from `versions.toml`

mod config;
mod ndjson;
mod store;

pub use config::{ConfigError, GithubConfig, StoreConfig, CONFIG_FILE};
pub use ndjson::{Feed, FeedStore, Upsert};
pub use store::{Store, StoreError};
