//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::output::{Output, OutputFormat};
use super::{backfill, publish};
use crate::storage::Store;

#[derive(Parser)]
#[command(name = "versions")]
#[command(author, version, about = "Append-only release feeds for product download metadata")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Store directory (default: discovered from the current directory upward)
    #[arg(long, global = true, env = "VERSIONS_STORE")]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new versions store
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Publish a release into a product feed
    Publish {
        /// Manifest or payload file (defaults to stdin)
        file: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "dist")]
        input: publish::InputFormat,

        /// Product feed to write (defaults to the manifest's first app)
        #[arg(long, short)]
        product: Option<String>,

        /// GitHub repository as OWNER/REPO for download URLs
        #[arg(long)]
        github: Option<String>,
    },

    /// Backfill a product feed from its published GitHub releases
    Backfill {
        /// Product name (e.g. 'uv', 'ruff')
        product: String,

        /// GitHub repository as OWNER/REPO (default: configured owner + product)
        #[arg(long)]
        github: Option<String>,

        /// Replace checksum URLs with digests by fetching checksum files
        #[arg(long)]
        fetch_checksums: bool,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("Versions CLI starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing store at: {}", path));
            let store = Store::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created feed directory at: {}", store.feed_dir().display()),
            );
            output.success(&format!(
                "Initialized versions store at {}",
                store.root().display()
            ));
        }

        Commands::Publish {
            file,
            input,
            product,
            github,
        } => publish::run(
            &output,
            cli.store.as_deref(),
            file.as_deref(),
            input,
            product.as_deref(),
            github.as_deref(),
        )?,

        Commands::Backfill {
            product,
            github,
            fetch_checksums,
        } => backfill::run(
            &output,
            cli.store.as_deref(),
            &product,
            github.as_deref(),
            fetch_checksums,
        )?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
