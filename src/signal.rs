//! Signal handling for graceful shutdown.
//!
//! Centralized Ctrl+C handling built on an `AtomicBool` flag shared across
//! threads. The scan pipeline checks the flag at file boundaries and stops
//! cooperatively; no work is forcibly terminated.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupestream::signal::install_handler;
//!
//! let handler = install_handler().expect("failed to install signal handler");
//!
//! // Pass the flag to ScanOptions, Walker, Hasher, ...
//! let shutdown_flag = handler.get_flag();
//!
//! if handler.is_shutdown_requested() {
//!     // Clean up and exit with code 130
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit code for SIGINT (Ctrl+C) interruption, Unix convention 128 + 2.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag for cooperative cancellation.
///
/// `ShutdownHandler` is `Send` and `Sync`; the underlying flag uses atomic
/// operations for thread-safe access.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a new handler with the flag initially unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown.
    ///
    /// Observed by every component holding a clone of the flag.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get a clone of the flag for passing to worker threads.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Reset the flag to `false`. Primarily useful in tests.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Install a Ctrl+C handler that sets the shared shutdown flag.
///
/// # Errors
///
/// Returns [`ctrlc::Error`] if a handler is already installed or the
/// platform call fails.
pub fn install_handler() -> Result<ShutdownHandler, ctrlc::Error> {
    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        eprintln!("Interrupted. Cleaning up...");
        flag.store(true, Ordering::SeqCst);
    })?;

    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_starts_unset() {
        let handler = ShutdownHandler::new();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_request_and_reset() {
        let handler = ShutdownHandler::new();
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
        handler.reset();
        assert!(!handler.is_shutdown_requested());
    }

    #[test]
    fn test_flag_is_shared() {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        flag.store(true, Ordering::SeqCst);
        assert!(handler.is_shutdown_requested());
    }
}
