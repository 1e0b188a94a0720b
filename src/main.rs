//! Versions CLI - append-only release feeds for product download metadata

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = versions_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
