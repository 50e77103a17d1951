//! # near-dup CLI
//!
//! Command-line interface for the near-duplicate finder.
//!
//! ## Usage
//! ```bash
//! near-dup scan ~/Photos --threshold 0.5
//! near-dup scan ~/Photos --parallel --output json
//! near-dup delete ~/Photos/IMG_0002.jpg ~/Photos/IMG_0003.jpg
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    near_dup_finder::init_tracing();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
