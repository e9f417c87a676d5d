//! Error types for the position tree.

use thiserror::Error;

/// Errors raised by positional tree operations.
///
/// Both variants indicate a caller bug: an index computed against a stale
/// or different coordinate space.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Index out of range: {index} (size: {size})")]
    OutOfRange { index: usize, size: usize },

    #[error("Range of {length} units at position {start} exceeds tree size {size}")]
    RangeOverflow {
        start: usize,
        length: usize,
        size: usize,
    },
}

pub type Result<T> = std::result::Result<T, TreeError>;
