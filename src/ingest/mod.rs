//! Input-format adapters
//!
//! Each adapter turns one input format into validated release
//! records: `dist` consumes a cargo-dist plan manifest, `plain`
//! consumes ad-hoc release JSON.

mod dist;
mod plain;

pub use dist::{import_manifest, DistImport};
pub use plain::releases_from_payload;
