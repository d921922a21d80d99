//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::scanner::DEFAULT_MIN_SIZE_BYTES;

/// Streaming duplicate file finder.
///
/// Scans a directory tree, confirms sets of byte-identical files through
/// size bucketing, partial digests, and full-content digests, and prints
/// each confirmed group as soon as it is resolved.
#[derive(Debug, Parser)]
#[command(name = "dupestream", version, about)]
pub struct Cli {
    /// Root directory to scan
    pub path: PathBuf,

    /// Minimum file size in bytes to consider
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE_BYTES)]
    pub min_size: u64,

    /// Number of I/O threads for digest computation
    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    /// Print each group as a JSON object instead of human-readable text
    #[arg(long)]
    pub json: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Move all but the first member of each group to the system trash
    #[arg(long)]
    pub trash: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["dupestream", "/tmp"]);
        assert_eq!(cli.path, PathBuf::from("/tmp"));
        assert_eq!(cli.min_size, 1024);
        assert_eq!(cli.threads, 4);
        assert!(!cli.json);
        assert!(!cli.trash);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "dupestream",
            "/data",
            "--min-size",
            "1",
            "--threads",
            "2",
            "--json",
            "--trash",
            "-vv",
        ]);
        assert_eq!(cli.min_size, 1);
        assert_eq!(cli.threads, 2);
        assert!(cli.json);
        assert!(cli.trash);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dupestream", "/tmp", "-q", "-v"]).is_err());
    }
}
