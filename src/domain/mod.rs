//! Domain models for the versions CLI
//!
//! Contains the record types and merge logic without any I/O concerns.

mod release;
mod version;

pub use release::{
    archive_format_for, platform_for, Artifact, Checksum, Release, ReleaseError, DEFAULT_VARIANT,
};
pub use version::{Product, ProductError, Version, VersionError};
