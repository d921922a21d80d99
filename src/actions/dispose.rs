//! Recoverable disposal via the system trash.
//!
//! # Overview
//!
//! The disposal adapter wraps the platform's recoverable-deletion facility
//! (recycle bin on Windows, trash elsewhere) with an existence check and
//! explicit error reporting. Disposal is destructive-adjacent and always
//! caller-initiated, so unlike scan-stage errors its failures are surfaced
//! per call, never absorbed.
//!
//! Nothing here deletes permanently; a disposed file is recoverable
//! through the platform trash UI.
//!
//! # Example
//!
//! ```no_run
//! use dupestream::actions::dispose_to_trash;
//! use std::path::Path;
//!
//! match dispose_to_trash(Path::new("/path/to/duplicate.txt")) {
//!     Ok(result) => println!("Trashed {} ({} bytes)", result.path.display(), result.size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Error type for disposal operations.
#[derive(Debug, Error)]
pub enum DisposeError {
    /// The path no longer exists (removed between scan and disposal).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The platform trash operation did not succeed.
    #[error("trash operation failed for {path}: {message}")]
    Failed {
        /// Path the operation was attempted on
        path: PathBuf,
        /// Platform error description
        message: String,
    },
}

/// Result of a successful disposal.
#[derive(Debug, Clone)]
pub struct DisposeResult {
    /// Path that was moved to trash.
    pub path: PathBuf,
    /// Size of the disposed file in bytes.
    pub size: u64,
}

/// Move a single file to the system trash.
///
/// Stateless with respect to any scan: the caller controls batching and
/// can skip entries interactively. Operates on exactly one path.
///
/// # Errors
///
/// - [`DisposeError::NotFound`] if the path no longer exists. No
///   filesystem mutation is performed in this case.
/// - [`DisposeError::Failed`] if the platform call fails (including
///   permission problems).
pub fn dispose_to_trash(path: &Path) -> Result<DisposeResult, DisposeError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DisposeError::NotFound(path.to_path_buf())
        } else {
            DisposeError::Failed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        }
    })?;

    let size = metadata.len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DisposeError::Failed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DisposeResult {
        path: path.to_path_buf(),
        size,
    })
}

/// Outcome of disposing the redundant members of one group.
#[derive(Debug, Clone, Default)]
pub struct BatchDisposeResult {
    /// Successfully disposed files.
    pub successes: Vec<DisposeResult>,
    /// Failed disposals with their error text.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes moved to trash.
    pub bytes_freed: u64,
}

impl BatchDisposeResult {
    /// Number of successful disposals.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed disposals.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every disposal succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Trashed {} file(s), freed {} bytes",
                self.success_count(),
                self.bytes_freed
            )
        } else {
            format!(
                "Trashed {} file(s), {} failed, freed {} bytes",
                self.success_count(),
                self.failure_count(),
                self.bytes_freed
            )
        }
    }
}

/// Dispose every member of a confirmed group except the first.
///
/// The first member (in enumeration order) is always preserved, so a group
/// can never lose all of its copies through this call. Failures on
/// individual files are recorded and the remaining members are still
/// attempted.
#[must_use]
pub fn dispose_duplicates(group: &DuplicateGroup) -> BatchDisposeResult {
    let mut result = BatchDisposeResult::default();

    for file in group.files.iter().skip(1) {
        match dispose_to_trash(&file.path) {
            Ok(disposed) => {
                result.bytes_freed += disposed.size;
                result.successes.push(disposed);
            }
            Err(e) => {
                log::warn!("Failed to dispose {}: {}", file.path.display(), e);
                result.failures.push((file.path.clone(), e.to_string()));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileEntry;
    use std::time::SystemTime;

    #[test]
    fn test_dispose_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("never-existed.txt");

        let err = dispose_to_trash(&gone).unwrap_err();
        assert!(matches!(err, DisposeError::NotFound(_)));
        // No mutation: the directory is still empty.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_dispose_duplicates_preserves_first_member() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.txt");
        fs::write(&keep, b"payload").unwrap();

        // Second member is already gone, so the batch records a failure
        // without touching the preserved copy.
        let group = DuplicateGroup::new(
            [0u8; 32],
            7,
            vec![
                FileEntry::new(keep.clone(), 7, SystemTime::UNIX_EPOCH),
                FileEntry::new(dir.path().join("gone.txt"), 7, SystemTime::UNIX_EPOCH),
            ],
        );

        let result = dispose_duplicates(&group);

        assert!(keep.exists());
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 1);
        assert!(!result.all_succeeded());
        assert!(result.summary().contains("1 failed"));
    }

    #[test]
    fn test_batch_result_summary_for_success() {
        let result = BatchDisposeResult {
            successes: vec![DisposeResult {
                path: PathBuf::from("/a"),
                size: 10,
            }],
            failures: Vec::new(),
            bytes_freed: 10,
        };
        assert!(result.all_succeeded());
        assert_eq!(result.summary(), "Trashed 1 file(s), freed 10 bytes");
    }
}
