//! Scanner module for directory traversal and file hashing.
//!
//! This module provides the two collaborators the duplicate pipeline is
//! built on:
//! - [`walker`]: recursive file discovery with per-entry error containment
//! - [`hasher`]: BLAKE3 partial and full digests (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupestream::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), 1024);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::Serialize;

// Re-export main types
pub use hasher::{hash_to_hex, Hash, Hasher, PARTIAL_DIGEST_SIZE};
pub use walker::Walker;

/// Default minimum candidate size in bytes.
///
/// Files below this threshold produce too many low-value collisions
/// relative to the space they could reclaim.
pub const DEFAULT_MIN_SIZE_BYTES: u64 = 1024;

/// Metadata for a discovered candidate file.
///
/// Created once at enumeration time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a new `FileEntry`.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Per-entry errors raised during directory traversal.
///
/// These are recovered locally: the affected file or subtree is simply
/// absent from the results, and the walk continues.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    /// Permission was denied when accessing a file or directory.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while accessing an entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while hashing a single file.
///
/// Like [`WalkError`], these are absorbed at single-file scope: the file is
/// dropped from its bucket and the rest of the stage continues.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was not found (deleted between enumeration and hashing).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing was stopped by the cooperative cancellation flag.
    #[error("hashing interrupted: {0}")]
    Interrupted(PathBuf),
}
