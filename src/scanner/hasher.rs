//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! The [`Hasher`] computes two kinds of digests over file content:
//!
//! - **Partial digest**: the first [`PARTIAL_DIGEST_SIZE`] bytes only. A
//!   cheap filter for same-size files; collisions are expected and
//!   tolerated because a confirming full digest always follows.
//! - **Full digest**: the entire file content, read incrementally through a
//!   fixed buffer so large files are never loaded into memory at once.
//!
//! Equal full digest plus equal byte length is treated as byte identity.
//! This is the standard assumption for a 256-bit cryptographic digest; no
//! verifying byte-for-byte comparison is performed.
//!
//! Every file handle is scoped to a single call and released on all exit
//! paths, including errors.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A 256-bit BLAKE3 digest.
pub type Hash = [u8; 32];

/// Number of leading bytes covered by the partial digest.
pub const PARTIAL_DIGEST_SIZE: usize = 4096;

/// Read buffer size for full-content hashing.
const FULL_HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 hasher for duplicate detection.
///
/// The hasher holds no per-file state; a single instance can be shared
/// across threads behind an [`Arc`].
///
/// # Example
///
/// ```no_run
/// use dupestream::scanner::Hasher;
/// use std::path::Path;
///
/// let hasher = Hasher::new();
/// let partial = hasher.partial_digest(Path::new("a.bin")).unwrap();
/// let full = hasher.full_digest(Path::new("a.bin")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct Hasher {
    /// Optional shutdown flag checked between read chunks of a full hash.
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown flag for cooperative cancellation.
    ///
    /// When set, long-running full-content hashes stop between read chunks
    /// and return [`HashError::Interrupted`].
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

    /// Compute the digest of the first [`PARTIAL_DIGEST_SIZE`] bytes.
    ///
    /// For files shorter than the partial window, the whole content is
    /// hashed.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. The
    /// caller is expected to drop the file from its bucket and continue.
    pub fn partial_digest(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;

        let mut buffer = [0u8; PARTIAL_DIGEST_SIZE];
        let mut filled = 0;

        // Short reads are legal; loop until the window is full or EOF.
        while filled < PARTIAL_DIGEST_SIZE {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            }
        }

        Ok(*blake3::hash(&buffer[..filled]).as_bytes())
    }

    /// Compute the digest of the entire file content.
    ///
    /// Reads through a fixed 64 KiB buffer; memory use is independent of
    /// file size.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or
    /// [`HashError::Interrupted`] if the shutdown flag fired mid-file.
    pub fn full_digest(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;

        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; FULL_HASH_BUFFER_SIZE];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            }
        }

        Ok(*hasher.finalize().as_bytes())
    }
}

/// Map an I/O error to the matching [`HashError`] variant.
fn map_io_error(path: &Path, e: io::Error) -> HashError {
    match e.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Format a hash as a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut out = String::with_capacity(64);
    for byte in hash {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}
