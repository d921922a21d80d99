//! Directory walker for candidate file discovery.
//!
//! # Overview
//!
//! The [`Walker`] performs one full recursive traversal of a root
//! directory, yielding a [`FileEntry`] per regular file at or above the
//! minimum candidate size. It uses [`walkdir`] with sorted entries so that,
//! for a fixed filesystem state, enumeration order is deterministic within
//! a run.
//!
//! Per-entry failures (permission denied, vanished entries) are yielded as
//! [`WalkError`] values rather than aborting the walk: an inaccessible
//! directory simply leaves its subtree out of the results.
//!
//! # Example
//!
//! ```no_run
//! use dupestream::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), 1024);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} candidates", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::WalkDir;

use super::{FileEntry, WalkError};

/// Recursive file discovery with size filtering and cooperative shutdown.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Minimum candidate size in bytes; smaller files are skipped
    min_size: u64,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    ///
    /// # Arguments
    ///
    /// * `root` - Root directory to scan
    /// * `min_size` - Minimum file size in bytes to include
    #[must_use]
    pub fn new(root: &Path, min_size: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            min_size,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The flag is checked before each directory entry; once it is set the
    /// walk stops yielding and the underlying traversal is abandoned.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding candidate file entries.
    ///
    /// Returns an iterator over [`FileEntry`] results. Errors are yielded
    /// as [`WalkError`] values scoped to the single entry that failed; the
    /// caller decides whether to count or log them, and iteration
    /// continues either way.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, WalkError>> + '_ {
        let mut entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        std::iter::from_fn(move || {
            loop {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: shutdown requested, stopping traversal");
                    return None;
                }

                let result = entries.next()?;
                if let Some(item) = self.process_entry(result) {
                    return Some(item);
                }
            }
        })
    }

    /// Turn one traversal result into a candidate, an error, or nothing.
    fn process_entry(
        &self,
        result: walkdir::Result<walkdir::DirEntry>,
    ) -> Option<Result<FileEntry, WalkError>> {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| self.root.clone(), Path::to_path_buf);
                return Some(Err(convert_walkdir_error(path, e)));
            }
        };

        let file_type = entry.file_type();

        // Only regular files are candidates; symlinks are never followed.
        if file_type.is_dir() || file_type.is_symlink() {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let path = entry.path().to_path_buf();
                return Some(Err(convert_walkdir_error(path, e)));
            }
        };

        let size = metadata.len();

        // Empty files all hash identically and reclaim nothing.
        if size == 0 {
            log::debug!("Skipping empty file: {}", entry.path().display());
            return None;
        }

        if size < self.min_size {
            log::trace!(
                "Skipping file below size threshold ({} < {}): {}",
                size,
                self.min_size,
                entry.path().display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Some(Ok(FileEntry::new(entry.path().to_path_buf(), size, modified)))
    }
}

/// Convert a walkdir error to a [`WalkError`] scoped to one entry.
fn convert_walkdir_error(path: PathBuf, e: walkdir::Error) -> WalkError {
    match e.io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            WalkError::PermissionDenied(path)
        }
        _ => WalkError::Io {
            path,
            source: e.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        File::create(dir.join(name))
            .unwrap()
            .write_all(content)
            .unwrap();
    }

    #[test]
    fn test_walk_finds_nested_files() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("a").join("b");
        fs::create_dir_all(&sub).unwrap();

        write_file(dir.path(), "top.bin", &[1u8; 10]);
        write_file(&sub, "deep.bin", &[2u8; 20]);

        let walker = Walker::new(dir.path(), 1);
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|f| f.path.ends_with("deep.bin")));
    }

    #[test]
    fn test_walk_skips_small_and_empty_files() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "empty.bin", &[]);
        write_file(dir.path(), "small.bin", &[0u8; 100]);
        write_file(dir.path(), "big.bin", &[0u8; 2048]);

        let walker = Walker::new(dir.path(), 1024);
        let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("big.bin"));
        assert_eq!(files[0].size, 2048);
    }

    #[test]
    fn test_walk_is_deterministic() {
        let dir = tempdir().unwrap();
        for name in ["c.bin", "a.bin", "b.bin"] {
            write_file(dir.path(), name, &[9u8; 64]);
        }

        let first: Vec<_> = Walker::new(dir.path(), 1)
            .walk()
            .filter_map(Result::ok)
            .map(|f| f.path)
            .collect();
        let second: Vec<_> = Walker::new(dir.path(), 1)
            .walk()
            .filter_map(Result::ok)
            .map(|f| f.path)
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_walk_stops_on_shutdown() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a.bin", &[1u8; 64]);
        write_file(dir.path(), "b.bin", &[1u8; 64]);

        let flag = Arc::new(AtomicBool::new(true));
        let walker = Walker::new(dir.path(), 1).with_shutdown_flag(flag);

        assert_eq!(walker.walk().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_inaccessible_subtree_is_skipped_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        write_file(&locked, "hidden.bin", &[1u8; 64]);
        write_file(dir.path(), "visible.bin", &[1u8; 64]);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to test in that case.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            eprintln!("running with elevated privileges, skipping");
            return;
        }

        let walker = Walker::new(dir.path(), 1);
        let (files, errors): (Vec<_>, Vec<_>) = walker.walk().partition(Result::is_ok);

        // Restore so tempdir cleanup succeeds.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let files: Vec<_> = files.into_iter().map(Result::unwrap).collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("visible.bin"));
        assert!(!errors.is_empty());
    }
}
