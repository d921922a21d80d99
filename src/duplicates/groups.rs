//! Size bucketing and confirmed duplicate groups.
//!
//! # Overview
//!
//! Size bucketing is the first stage of duplicate detection: files are
//! grouped by exact byte length, and buckets with fewer than two members
//! are dropped immediately since no duplicate is possible. This typically
//! eliminates the large majority of candidates before any content is read.
//!
//! # Example
//!
//! ```
//! use dupestream::scanner::FileEntry;
//! use dupestream::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.eliminated_unique, 1);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// A confirmed set of byte-identical files.
///
/// Invariant: all members share identical byte length and identical full
/// digest, and there are always at least two of them. Groups are immutable
/// once emitted; the caller owns them from that point on.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 digest of the file content, rendered as hex in JSON output
    #[serde(serialize_with = "serialize_hash_hex")]
    pub hash: Hash,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Member files, in enumeration order
    pub files: Vec<FileEntry>,
}

fn serialize_hash_hex<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(hash))
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if fewer than two members are supplied or if
    /// any member's size disagrees with `size`.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<FileEntry>) -> Self {
        debug_assert!(files.len() >= 2, "duplicate group needs at least 2 members");
        debug_assert!(files.iter().all(|f| f.size == size));
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// A group can never be empty; provided for iterator-style callers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant copies (total minus one original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space reclaimable by removing all copies but one.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Total size of all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Digest as a hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Just the member paths.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Statistics from the size bucketing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Files with a unique size, eliminated without reading content
    pub eliminated_unique: usize,
    /// Files that share a size with at least one other file
    pub potential_duplicates: usize,
    /// Number of buckets with 2+ members
    pub buckets: usize,
}

impl BucketStats {
    /// Percentage of files eliminated by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group candidate files by exact byte length.
///
/// Buckets with fewer than two members are dropped. The returned map is
/// ordered by size so downstream stages process buckets in a deterministic
/// order.
///
/// # Returns
///
/// A tuple of:
/// - `BTreeMap<u64, Vec<FileEntry>>` - buckets with 2+ members, keyed by size
/// - [`BucketStats`] - counts for the stage
#[must_use]
pub fn group_by_size(files: Vec<FileEntry>) -> (BTreeMap<u64, Vec<FileEntry>>, BucketStats) {
    let mut stats = BucketStats {
        total_files: files.len(),
        ..Default::default()
    };

    let mut buckets: BTreeMap<u64, Vec<FileEntry>> = BTreeMap::new();
    for file in files {
        buckets.entry(file.size).or_default().push(file);
    }

    buckets.retain(|size, members| {
        if members.len() > 1 {
            stats.potential_duplicates += members.len();
            stats.buckets += 1;
            true
        } else {
            log::trace!("Eliminated unique size {size}: {}", members[0].path.display());
            stats.eliminated_unique += 1;
            false
        }
    });

    (buckets, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn entry(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_group_by_size_drops_singletons() {
        let files = vec![
            entry("/a", 100),
            entry("/b", 100),
            entry("/c", 200),
            entry("/d", 300),
            entry("/e", 300),
            entry("/f", 300),
        ];

        let (buckets, stats) = group_by_size(files);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&100].len(), 2);
        assert_eq!(buckets[&300].len(), 3);
        assert!(!buckets.contains_key(&200));

        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.potential_duplicates, 5);
        assert_eq!(stats.buckets, 2);
    }

    #[test]
    fn test_group_by_size_empty_input() {
        let (buckets, stats) = group_by_size(Vec::new());
        assert!(buckets.is_empty());
        assert_eq!(stats, BucketStats::default());
    }

    #[test]
    fn test_buckets_ordered_by_size() {
        let files = vec![
            entry("/a", 500),
            entry("/b", 500),
            entry("/c", 100),
            entry("/d", 100),
        ];
        let (buckets, _) = group_by_size(files);
        let sizes: Vec<u64> = buckets.keys().copied().collect();
        assert_eq!(sizes, vec![100, 500]);
    }

    #[test]
    fn test_duplicate_group_accessors() {
        let group = DuplicateGroup::new([0xab; 32], 100, vec![entry("/a", 100), entry("/b", 100)]);

        assert_eq!(group.len(), 2);
        assert!(!group.is_empty());
        assert_eq!(group.duplicate_count(), 1);
        assert_eq!(group.wasted_space(), 100);
        assert_eq!(group.total_size(), 200);
        assert_eq!(group.hash_hex().len(), 64);
        assert_eq!(group.paths(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn test_duplicate_group_serializes_hash_as_hex() {
        let group = DuplicateGroup::new([0u8; 32], 100, vec![entry("/a", 100), entry("/b", 100)]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["hash"], "0".repeat(64));
        assert_eq!(json["size"], 100);
    }
}
