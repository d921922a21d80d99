//! The scan operation and its lazy result stream.
//!
//! # Overview
//!
//! [`scan`] validates the root, then spawns a producer thread that walks
//! the tree, buckets candidates by size, and runs the classify/confirm
//! stages one bucket at a time. Confirmed groups flow to the caller through
//! a bounded channel as soon as each one is resolved, so the first group
//! can be acted on while later buckets are still being hashed.
//!
//! The returned [`ScanStream`] is a finite, forward-only iterator. It is
//! not restartable: a new scan re-walks the tree from scratch. Dropping the
//! stream disconnects the channel, which stops the producer at its next
//! send.
//!
//! # Example
//!
//! ```no_run
//! use dupestream::duplicates::{scan, ScanOptions};
//! use std::path::Path;
//!
//! let mut stream = scan(Path::new("/data"), ScanOptions::default()).unwrap();
//! for group in &mut stream {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! if let Some(summary) = stream.summary() {
//!     println!("{} groups, {} reclaimable", summary.duplicate_groups, summary.reclaimable_display());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use bytesize::ByteSize;

use super::finder::{classify_bucket, confirm_group, StageStats};
use super::{group_by_size, DuplicateGroup};
use crate::scanner::{Hasher, Walker, DEFAULT_MIN_SIZE_BYTES};

/// Bound on in-flight groups between producer and consumer.
const CHANNEL_CAPACITY: usize = 16;

/// Fatal errors returned by [`scan`] before any group is yielded.
///
/// Everything smaller in scope (one unreadable file, one inaccessible
/// subtree) is absorbed inside the scan and only visible as a missing
/// result plus a [`ScanSummary::skipped_entries`] count.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root path does not exist.
    #[error("root not found: {0}")]
    RootNotFound(PathBuf),

    /// The root path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Parameters for one scan invocation.
///
/// Options are transient: they have no lifecycle beyond the single call to
/// [`scan`] they are passed to, and concurrent scans of different roots
/// share no state.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Minimum candidate size in bytes (default 1024).
    pub min_size_bytes: u64,
    /// Number of I/O threads for parallel digest computation.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional cooperative cancellation flag.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_size_bytes: DEFAULT_MIN_SIZE_BYTES,
            io_threads: 4,
            shutdown_flag: None,
        }
    }
}

impl ScanOptions {
    /// Set the minimum candidate size in bytes.
    #[must_use]
    pub fn with_min_size_bytes(mut self, min_size_bytes: u64) -> Self {
        self.min_size_bytes = min_size_bytes;
        self
    }

    /// Set the I/O thread count for digest stages.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for cooperative cancellation.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics for a completed (or interrupted) scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Candidate files enumerated (after the size threshold)
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Files eliminated by size bucketing (unique sizes)
    pub eliminated_by_size: usize,
    /// Files eliminated by the partial-digest classifier
    pub eliminated_by_partial: usize,
    /// Traversal entries skipped due to access or I/O errors
    pub skipped_entries: usize,
    /// Files dropped during hashing (locked, vanished, unreadable)
    pub unreadable_files: usize,
    /// Confirmed duplicate groups emitted
    pub duplicate_groups: usize,
    /// Redundant copies across all groups (total members minus originals)
    pub duplicate_files: usize,
    /// Space reclaimable by removing all copies but one per group
    pub reclaimable_space: u64,
    /// Wall-clock duration of the scan
    pub scan_duration: std::time::Duration,
    /// Whether the scan stopped early on the shutdown flag
    pub interrupted: bool,
}

impl ScanSummary {
    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Total candidate size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// What the producer sends downstream.
enum Emit {
    Group(DuplicateGroup),
    Done(Box<ScanSummary>),
}

/// Lazy, forward-only stream of confirmed duplicate groups.
///
/// Yields each [`DuplicateGroup`] as soon as it is confirmed. After the
/// iterator is exhausted, [`summary`](Self::summary) returns the scan
/// statistics. Dropping the stream early cancels the underlying producer.
pub struct ScanStream {
    rx: Option<Receiver<Emit>>,
    handle: Option<JoinHandle<()>>,
    summary: Option<ScanSummary>,
}

impl ScanStream {
    /// Statistics for the scan, available once the stream is exhausted.
    ///
    /// Returns `None` while groups are still pending or if the stream was
    /// dropped before completion.
    #[must_use]
    pub fn summary(&self) -> Option<&ScanSummary> {
        self.summary.as_ref()
    }

    fn join_producer(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Scan producer thread panicked");
            }
        }
    }
}

impl Iterator for ScanStream {
    type Item = DuplicateGroup;

    fn next(&mut self) -> Option<DuplicateGroup> {
        let rx = self.rx.as_ref()?;
        match rx.recv() {
            Ok(Emit::Group(group)) => Some(group),
            Ok(Emit::Done(summary)) => {
                self.summary = Some(*summary);
                self.rx = None;
                self.join_producer();
                None
            }
            Err(_) => {
                // Producer gone without a summary (panic); end cleanly.
                self.rx = None;
                self.join_producer();
                None
            }
        }
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        // Disconnect first so a producer blocked on send wakes up, then
        // wait for it to release its file handles.
        self.rx = None;
        self.join_producer();
    }
}

/// Scan a directory tree for duplicate files, streaming confirmed groups.
///
/// Walks everything under `root`, buckets candidates by exact byte length,
/// classifies buckets by partial digest, confirms survivors by full digest,
/// and yields each confirmed group through the returned [`ScanStream`] as
/// soon as it is resolved.
///
/// Emission order across groups is unspecified, but deterministic within a
/// run for a fixed, unmodified filesystem state.
///
/// # Errors
///
/// Returns [`ScanError`] immediately, before any group is yielded, if
/// `root` does not exist or is not a directory. Per-entry failures during
/// the scan never surface as errors; see [`ScanSummary`].
pub fn scan(root: &Path, options: ScanOptions) -> Result<ScanStream, ScanError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(ScanError::NotADirectory(root.to_path_buf())),
        Err(_) => return Err(ScanError::RootNotFound(root.to_path_buf())),
    }

    let (tx, rx) = std::sync::mpsc::sync_channel(CHANNEL_CAPACITY);
    let root = root.to_path_buf();

    let handle = std::thread::Builder::new()
        .name("dupestream-scan".into())
        .spawn(move || produce(&root, &options, &tx))
        .expect("failed to spawn scan producer thread");

    Ok(ScanStream {
        rx: Some(rx),
        handle: Some(handle),
        summary: None,
    })
}

/// Producer body: walk, bucket, classify, confirm, emit.
fn produce(root: &Path, options: &ScanOptions, tx: &SyncSender<Emit>) {
    let start = Instant::now();
    let mut summary = ScanSummary::default();

    log::info!(
        "Starting duplicate scan of {} (min size {} bytes)",
        root.display(),
        options.min_size_bytes
    );

    // Stage 1: enumerate candidates and bucket by size.
    let mut walker = Walker::new(root, options.min_size_bytes);
    if let Some(ref flag) = options.shutdown_flag {
        walker = walker.with_shutdown_flag(flag.clone());
    }

    let mut files = Vec::new();
    for result in walker.walk() {
        match result {
            Ok(file) => files.push(file),
            Err(e) => {
                log::debug!("Skipping inaccessible entry: {e}");
                summary.skipped_entries += 1;
            }
        }
    }

    summary.total_files = files.len();
    summary.total_size = files.iter().map(|f| f.size).sum();

    log::info!(
        "Found {} candidates ({})",
        summary.total_files,
        summary.total_size_display()
    );

    if options.is_shutdown_requested() {
        finish(summary, true, start, tx);
        return;
    }

    let (buckets, bucket_stats) = group_by_size(files);
    summary.eliminated_by_size = bucket_stats.eliminated_unique;

    log::info!(
        "Size bucketing: {} -> {} files in {} buckets ({:.1}% eliminated)",
        bucket_stats.total_files,
        bucket_stats.potential_duplicates,
        bucket_stats.buckets,
        bucket_stats.elimination_rate()
    );

    // Stages 2 and 3 run per bucket so groups stream out early.
    let hasher = {
        let mut h = Hasher::new();
        if let Some(ref flag) = options.shutdown_flag {
            h = h.with_shutdown_flag(flag.clone());
        }
        Arc::new(h)
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.io_threads)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to create scoped I/O pool ({e}), using default pool");
            rayon::ThreadPoolBuilder::new().build().expect("default rayon pool")
        });

    let mut classify_stats = StageStats::default();
    let mut confirm_stats = StageStats::default();
    let mut interrupted = false;
    let flag = options.shutdown_flag.as_ref();

    'buckets: for (size, members) in buckets {
        if options.is_shutdown_requested() {
            interrupted = true;
            break;
        }

        let (partial_groups, cstats) = classify_bucket(members, &hasher, &pool, flag);
        classify_stats.absorb(&cstats);
        if cstats.interrupted {
            interrupted = true;
            break;
        }

        for group in partial_groups {
            let (confirmed, fstats) = confirm_group(size, group, &hasher, &pool, flag);
            confirm_stats.absorb(&fstats);
            if fstats.interrupted {
                interrupted = true;
                break 'buckets;
            }

            for group in confirmed {
                summary.duplicate_groups += 1;
                summary.duplicate_files += group.duplicate_count();
                summary.reclaimable_space += group.wasted_space();

                if tx.send(Emit::Group(group)).is_err() {
                    // Consumer dropped the stream; stop quietly.
                    log::debug!("Scan stream dropped by consumer, stopping producer");
                    return;
                }
            }
        }
    }

    summary.eliminated_by_partial = classify_stats.eliminated_unique;
    summary.unreadable_files = classify_stats.failed_files + confirm_stats.failed_files;

    log::info!(
        "Scan complete: {} groups, {} redundant copies, {} reclaimable{}",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        if interrupted { " (interrupted)" } else { "" }
    );

    finish(summary, interrupted, start, tx);
}

fn finish(mut summary: ScanSummary, interrupted: bool, start: Instant, tx: &SyncSender<Emit>) {
    summary.interrupted = interrupted;
    summary.scan_duration = start.elapsed();
    let _ = tx.send(Emit::Done(Box::new(summary)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_builders() {
        let flag = Arc::new(AtomicBool::new(false));
        let options = ScanOptions::default()
            .with_min_size_bytes(10)
            .with_io_threads(0)
            .with_shutdown_flag(flag);

        assert_eq!(options.min_size_bytes, 10);
        assert_eq!(options.io_threads, 1, "thread count is clamped to 1+");
        assert!(options.shutdown_flag.is_some());
    }

    #[test]
    fn test_default_min_size() {
        assert_eq!(ScanOptions::default().min_size_bytes, 1024);
    }

    #[test]
    fn test_scan_missing_root_fails_fast() {
        let err = scan(Path::new("/definitely/not/a/real/root"), ScanOptions::default())
            .err()
            .expect("missing root must fail");
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn test_scan_file_root_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"data").unwrap();

        let err = scan(&file, ScanOptions::default()).err().unwrap();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_summary_display_helpers() {
        let summary = ScanSummary {
            reclaimable_space: 2048,
            total_size: 4096,
            ..Default::default()
        };
        assert!(!summary.reclaimable_display().is_empty());
        assert!(!summary.total_size_display().is_empty());
    }
}
