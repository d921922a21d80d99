//! Caller-initiated actions on confirmed duplicate groups.

pub mod dispose;

pub use dispose::{
    dispose_duplicates, dispose_to_trash, BatchDisposeResult, DisposeError, DisposeResult,
};
