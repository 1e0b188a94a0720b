//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose | Examples |
//! |---------|---------|----------|
//! | `init` | Store management | `init`, `init path/to/store` |
//! | `publish` | Append releases to a feed | `publish manifest.json`, `publish --input plain` |
//! | `backfill` | Recover historical releases | `backfill uv`, `backfill ruff --github astral-sh/ruff` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for progress narration on stderr:
//! ```bash
//! versions --verbose backfill uv
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod publish;
mod backfill;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
