//! Duplicate detection pipeline: bucketing, classification, confirmation,
//! and the streaming scan operation.

pub mod finder;
pub mod groups;
pub mod stream;

pub use finder::{classify_bucket, confirm_group, StageStats};
pub use groups::{group_by_size, BucketStats, DuplicateGroup};
pub use stream::{scan, ScanError, ScanOptions, ScanStream, ScanSummary};
