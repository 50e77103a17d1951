//! # CLI Module
//!
//! Command-line interface for the near-duplicate finder.
//!
//! ## Usage
//! ```bash
//! # Scan a folder for near-duplicates
//! near-dup scan ~/Pictures/trip
//!
//! # Stricter matching, parallel scoring
//! near-dup scan ~/Pictures/trip --threshold 0.8 --parallel
//!
//! # JSON output
//! near-dup scan ~/Pictures/trip --output json
//!
//! # Remove the duplicates you picked
//! near-dup delete ~/Pictures/trip/IMG_0002.jpg ~/Pictures/trip/IMG_0003.jpg
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use near_dup_finder::api::{self, ScanRequest};
use near_dup_finder::core::pipeline::ScanReport;
use near_dup_finder::error::{FileError, Result};
use near_dup_finder::events::{CompareEvent, Event, EventChannel, PipelineEvent};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;

/// Near-Duplicate Finder - spot re-saved, resized and edited copies
#[derive(Parser, Debug)]
#[command(name = "near-dup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan one folder for near-duplicate images
    Scan {
        /// Folder to scan (not recursed into)
        folder: PathBuf,

        /// Similarity needed to link two images (0.0-1.0)
        #[arg(short, long, default_value = "0.5")]
        threshold: f64,

        /// Largest group reported; bigger clusters are split
        #[arg(short, long, default_value = "5")]
        max_group_size: usize,

        /// Score pairs on all CPU cores
        #[arg(long)]
        parallel: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete files, continuing past any that fail
    Delete {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Write a file's raw bytes to stdout
    Read { path: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (duplicate paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            folder,
            threshold,
            max_group_size,
            parallel,
            output,
            verbose,
        } => {
            let request = ScanRequest::new(resolve(folder), threshold)?
                .with_max_group_size(max_group_size)?
                .with_parallel(parallel);
            run_scan(request, output, verbose)
        }
        Commands::Delete { paths } => run_delete(&paths),
        Commands::Read { path } => run_read(&resolve(path)),
    }
}

/// Anchor a relative path at the current directory
fn resolve(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn run_scan(request: ScanRequest, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Near-Duplicate Finder").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} (threshold {:.2})",
            style(request.folder().display()).dim(),
            request.threshold()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = request.into_pipeline();
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Compare(CompareEvent::Started { total_pairs, .. }) => {
                    pb.set_length(total_pairs as u64);
                }
                Event::Compare(CompareEvent::Progress(p)) => {
                    pb.set_position(p.comparisons_completed as u64);
                }
                Event::Compare(CompareEvent::PairFailed { image_a, image_b, message }) => {
                    if verbose {
                        pb.println(format!(
                            "  {} {} / {}: {}",
                            style("!").yellow(),
                            file_name(&image_a),
                            file_name(&image_b),
                            message
                        ));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let report = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &report, verbose),
        OutputFormat::Json => print_json_results(&report),
        OutputFormat::Minimal => print_minimal_results(&report),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, report: &ScanReport, verbose: bool) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} images compared ({} pairs) in {:.1}s",
        style(report.total_images).cyan(),
        report.comparisons,
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(report.groups.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate images",
        style(report.pairs.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    if report.groups.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("✓").green()))
            .ok();
        return;
    }

    term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
        .ok();
    term.write_line("").ok();

    let mut pairs = report.pairs.iter();
    for (i, group) in report.groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} ({} images)",
            style(format!("Group {}:", i + 1)).bold(),
            group.len()
        ))
        .ok();
        term.write_line(&format!("    {} {}", style("★").green(), group.original))
            .ok();

        for pair in pairs.by_ref().take(group.duplicate_count()) {
            term.write_line(&format!(
                "    {} {} {}",
                style("○").dim(),
                pair.duplicate,
                style(format!("{:.1}%", pair.similarity * 100.0)).yellow()
            ))
            .ok();
        }

        if verbose {
            term.write_line(&format!(
                "    {} {}",
                style("Recommended:").dim(),
                style("Keep the starred (★) image").dim()
            ))
            .ok();
        }

        term.write_line("").ok();
    }

    // Footer
    term.write_line(&format!(
        "{}",
        style("Remember: No files were deleted. Review carefully before taking action.").dim()
    ))
    .ok();
}

fn print_json_results(report: &ScanReport) {
    match serde_json::to_string_pretty(&report.pairs) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize results: {}", e),
    }
}

fn print_minimal_results(report: &ScanReport) {
    for pair in &report.pairs {
        println!("{}", pair.duplicate);
    }
}

fn run_delete(paths: &[PathBuf]) -> Result<()> {
    let paths: Vec<PathBuf> = paths.iter().cloned().map(resolve).collect();
    let report = api::delete_files(&paths);
    let term = Term::stderr();

    term.write_line(&format!(
        "{} Deleted {} of {} files",
        style("✓").green().bold(),
        style(report.deleted_count).cyan(),
        paths.len()
    ))
    .ok();

    for path in &report.failed_paths {
        term.write_line(&format!("  {} {}", style("✗").red(), path.display()))
            .ok();
    }

    Ok(())
}

fn run_read(path: &Path) -> Result<()> {
    let bytes = api::read_file(path)?;
    write_bytes(&mut std::io::stdout().lock(), path, &bytes)
}

/// Copy `bytes` read from `path` to `out`; a failed write fails the command
fn write_bytes(out: &mut impl Write, path: &Path, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)
        .and_then(|_| out.flush())
        .map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_dup_finder::error::DedupError;
    use std::io;

    /// Accepts nothing, like a closed pipe
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_bytes_copies_everything() {
        let mut out = Vec::new();

        write_bytes(&mut out, Path::new("/photos/a.png"), b"\x89PNG").unwrap();

        assert_eq!(out, b"\x89PNG");
    }

    #[test]
    fn failed_write_is_an_error() {
        let result = write_bytes(&mut ClosedPipe, Path::new("/photos/a.png"), b"pixels");

        match result {
            Err(DedupError::File(FileError::Read { path, source })) => {
                assert_eq!(path, PathBuf::from("/photos/a.png"));
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("Expected a read error, got {:?}", other),
        }
    }

    #[test]
    fn relative_paths_are_anchored_at_current_dir() {
        let resolved = resolve(PathBuf::from("photos"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("photos"));
        assert_eq!(resolve(PathBuf::from("/abs")), PathBuf::from("/abs"));
    }
}
