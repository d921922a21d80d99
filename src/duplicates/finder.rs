//! Partial-digest classification and full-digest confirmation stages.
//!
//! # Overview
//!
//! These are stages two and three of the detection pipeline, operating on
//! one size bucket at a time so confirmed groups can be emitted while the
//! rest of the tree is still being processed:
//!
//! 1. **Classify**: digest the first 4 KiB of every bucket member and
//!    regroup by that digest. Reading 4 KiB per candidate is far cheaper
//!    than a full read and separates most same-size-but-different files
//!    before any full hashing is paid for.
//! 2. **Confirm**: digest the entire content of every member of a partial
//!    group and regroup by the full digest. Groups that still have two or
//!    more members are confirmed duplicates.
//!
//! Files that fail to open or read are dropped from their group
//! individually; one locked file never degrades the rest of the stage.
//! Output group order follows the first-seen order of the input candidates,
//! which keeps a run deterministic for a fixed filesystem state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::DuplicateGroup;
use crate::scanner::{FileEntry, Hash, HashError, Hasher};

/// Files above this size get a debug log line before full hashing.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Statistics from one classifier or confirmer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Files that entered the stage
    pub input_files: usize,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Files dropped due to open/read failures
    pub failed_files: usize,
    /// Files eliminated because their digest was unique in the stage
    pub eliminated_unique: usize,
    /// Whether the stage was cut short by the shutdown flag
    pub interrupted: bool,
}

impl StageStats {
    /// Fold another invocation's counts into this one.
    pub fn absorb(&mut self, other: &StageStats) {
        self.input_files += other.input_files;
        self.hashed_files += other.hashed_files;
        self.failed_files += other.failed_files;
        self.eliminated_unique += other.eliminated_unique;
        self.interrupted |= other.interrupted;
    }
}

fn is_shutdown_requested(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Group bucket members by their partial (leading 4 KiB) digest.
///
/// # Arguments
///
/// * `files` - Members of one size bucket (2+ entries)
/// * `hasher` - Shared hasher
/// * `pool` - Bounded I/O thread pool for parallel digests
/// * `shutdown_flag` - Cooperative cancellation flag, checked before each file
///
/// # Returns
///
/// Partial-digest groups that still have 2+ members, in first-seen member
/// order, plus stage statistics. If the stage was interrupted, no groups
/// are returned: partially classified buckets are discarded rather than
/// exposed.
#[must_use]
pub fn classify_bucket(
    files: Vec<FileEntry>,
    hasher: &Arc<Hasher>,
    pool: &rayon::ThreadPool,
    shutdown_flag: Option<&Arc<AtomicBool>>,
) -> (Vec<Vec<FileEntry>>, StageStats) {
    let mut stats = StageStats {
        input_files: files.len(),
        ..Default::default()
    };

    let digests = digest_files(files, pool, shutdown_flag, |file| {
        hasher.partial_digest(&file.path)
    });

    let (groups, interrupted) = regroup_by_digest(digests, &mut stats);
    if interrupted {
        stats.interrupted = true;
        log::debug!("Classifier: interrupted, discarding partial bucket state");
        return (Vec::new(), stats);
    }

    (groups.into_iter().map(|(_, members)| members).collect(), stats)
}

/// Confirm one partial-digest group by full-content digest.
///
/// # Arguments
///
/// * `size` - Byte length shared by every member
/// * `files` - Members of one partial-digest group (2+ entries)
/// * `hasher` - Shared hasher
/// * `pool` - Bounded I/O thread pool for parallel digests
/// * `shutdown_flag` - Cooperative cancellation flag, checked before each file
///
/// # Returns
///
/// Confirmed [`DuplicateGroup`]s (2+ members each) plus stage statistics.
/// A group that degrades to a single member through read failures is
/// suppressed, and an interrupted stage returns no groups at all.
#[must_use]
pub fn confirm_group(
    size: u64,
    files: Vec<FileEntry>,
    hasher: &Arc<Hasher>,
    pool: &rayon::ThreadPool,
    shutdown_flag: Option<&Arc<AtomicBool>>,
) -> (Vec<DuplicateGroup>, StageStats) {
    let mut stats = StageStats {
        input_files: files.len(),
        ..Default::default()
    };

    let digests = digest_files(files, pool, shutdown_flag, |file| {
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({} MB): {}",
                file.size / (1024 * 1024),
                file.path.display()
            );
        }
        hasher.full_digest(&file.path)
    });

    let (groups, interrupted) = regroup_by_digest(digests, &mut stats);
    if interrupted {
        stats.interrupted = true;
        log::debug!("Confirmer: interrupted, discarding unconfirmed group state");
        return (Vec::new(), stats);
    }

    let confirmed: Vec<DuplicateGroup> = groups
        .into_iter()
        .map(|(digest, members)| {
            log::debug!(
                "Confirmed duplicate group {}: {} files, {} bytes each",
                crate::scanner::hash_to_hex(&digest),
                members.len(),
                size
            );
            DuplicateGroup::new(digest, size, members)
        })
        .collect();

    (confirmed, stats)
}

/// Compute a digest per file on the I/O pool, preserving input order.
///
/// The shutdown flag is checked before each file; files reached after the
/// flag fires carry an [`HashError::Interrupted`] marker instead of a
/// digest.
fn digest_files<F>(
    files: Vec<FileEntry>,
    pool: &rayon::ThreadPool,
    shutdown_flag: Option<&Arc<AtomicBool>>,
    digest_fn: F,
) -> Vec<(FileEntry, Result<Hash, HashError>)>
where
    F: Fn(&FileEntry) -> Result<Hash, HashError> + Send + Sync,
{
    pool.install(|| {
        files
            .into_par_iter()
            .map(|file| {
                if is_shutdown_requested(shutdown_flag) {
                    let path = file.path.clone();
                    return (file, Err(HashError::Interrupted(path)));
                }
                let digest = digest_fn(&file);
                (file, digest)
            })
            .collect()
    })
}

/// Group hashed files by digest, preserving first-seen order.
///
/// Returns the surviving groups (2+ members, keyed by their shared digest)
/// and whether an interruption marker was observed. Per-file failures are
/// counted and logged, never propagated.
fn regroup_by_digest(
    digests: Vec<(FileEntry, Result<Hash, HashError>)>,
    stats: &mut StageStats,
) -> (Vec<(Hash, Vec<FileEntry>)>, bool) {
    let mut order: Vec<(Hash, Vec<FileEntry>)> = Vec::new();
    let mut index: HashMap<Hash, usize> = HashMap::new();
    let mut interrupted = false;

    for (file, result) in digests {
        match result {
            Ok(digest) => {
                stats.hashed_files += 1;
                match index.get(&digest) {
                    Some(&i) => order[i].1.push(file),
                    None => {
                        index.insert(digest, order.len());
                        order.push((digest, vec![file]));
                    }
                }
            }
            Err(HashError::Interrupted(_)) => {
                interrupted = true;
            }
            Err(e) => {
                stats.failed_files += 1;
                log::debug!("Dropping unreadable file from stage: {e}");
            }
        }
    }

    let groups: Vec<(Hash, Vec<FileEntry>)> = order
        .into_iter()
        .filter(|(digest, members)| {
            if members.len() > 1 {
                log::trace!(
                    "Digest group {}: {} members",
                    crate::scanner::hash_to_hex(digest),
                    members.len()
                );
                true
            } else {
                stats.eliminated_unique += 1;
                false
            }
        })
        .collect();

    (groups, interrupted)
}
