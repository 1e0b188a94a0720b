//! Versions CLI - append-only release-metadata feeds for product downloads
//!
//! Versions manages a store of per-product ndjson feeds, one release
//! record per line. Releases come from `cargo dist plan` manifests,
//! from ad-hoc JSON payloads, or from backfilling a product's
//! published GitHub releases.

pub mod domain;
pub mod storage;
pub mod ingest;
pub mod github;
pub mod cli;

pub use domain::{Artifact, Checksum, Product, Release, Version};
