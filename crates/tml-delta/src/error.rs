//! Error types for delta tracking.

use thiserror::Error;
use tml_tree::TreeError;

/// Errors that can occur while recording changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeltaError {
    /// An index or range outside the tracked coordinate space.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A delete undoing an insert made earlier in the same batch.
    #[error("Delete at index {index} undoes an insert from the same batch (contradicting events are disabled)")]
    ContradictingEvent { index: usize },

    #[error("Invalid range: {start}..{end}")]
    InvalidRange { start: usize, end: usize },
}

pub type Result<T> = std::result::Result<T, DeltaError>;
