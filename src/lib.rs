//! dupestream - Streaming Duplicate File Finder
//!
//! Finds sets of byte-identical files under a directory tree and yields
//! each confirmed group progressively, while the scan is still running.
//! Detection runs in three stages: size bucketing, partial (leading 4 KiB)
//! BLAKE3 digests, and confirming full-content digests.

pub mod actions;
pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod scanner;
pub mod signal;

use anyhow::Context;
use bytesize::ByteSize;

use crate::actions::dispose_duplicates;
use crate::cli::Cli;
use crate::duplicates::{scan, DuplicateGroup, ScanOptions};
use crate::error::ExitCode;

/// Run the CLI: scan, print groups progressively, optionally trash copies.
///
/// # Errors
///
/// Returns an error for fatal conditions only (missing root, handler
/// installation failure); per-file problems are absorbed by the scan.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let handler = signal::install_handler().context("failed to install Ctrl+C handler")?;

    let options = ScanOptions::default()
        .with_min_size_bytes(cli.min_size)
        .with_io_threads(cli.threads)
        .with_shutdown_flag(handler.get_flag());

    let mut stream = scan(&cli.path, options)?;

    let mut group_count = 0usize;
    for group in &mut stream {
        group_count += 1;
        print_group(&group, group_count, cli.json)?;

        if cli.trash {
            let result = dispose_duplicates(&group);
            println!("  {}", result.summary());
            for (path, message) in &result.failures {
                log::warn!("Could not trash {}: {message}", path.display());
            }
        }
    }

    let Some(summary) = stream.summary() else {
        // Stream ended without a summary: the producer died unexpectedly.
        anyhow::bail!("scan ended unexpectedly");
    };

    if !cli.json {
        eprintln!(
            "Scanned {} files ({}), {} groups, {} reclaimable in {:.1?}",
            summary.total_files,
            summary.total_size_display(),
            summary.duplicate_groups,
            summary.reclaimable_display(),
            summary.scan_duration
        );
        if summary.skipped_entries > 0 || summary.unreadable_files > 0 {
            eprintln!(
                "Skipped {} inaccessible entries, dropped {} unreadable files",
                summary.skipped_entries, summary.unreadable_files
            );
        }
    }

    if summary.interrupted {
        Ok(ExitCode::Interrupted)
    } else if group_count == 0 {
        Ok(ExitCode::NoDuplicates)
    } else {
        Ok(ExitCode::Success)
    }
}

/// Print one confirmed group in the selected format.
fn print_group(group: &DuplicateGroup, index: usize, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(group)?);
    } else {
        println!(
            "Group {index}: {} files x {} ({} wasted) [{}]",
            group.len(),
            ByteSize::b(group.size),
            ByteSize::b(group.wasted_space()),
            group.hash_hex()
        );
        for file in &group.files {
            println!("  {}", file.path.display());
        }
    }
    Ok(())
}
