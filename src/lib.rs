//! # Tourmaline
//!
//! Incremental change-delta tracking for ordered collections.
//!
//! - [`tree`]: the four-color order-statistics tree everything is built on
//! - [`delta`]: append-only logs, the tree-backed tracker and the recorder
//!   that switches between them
//! - [`stress_test`]: a concurrent harness exercising the locking discipline
//!   callers are expected to follow

pub use tml_delta as delta;
pub use tml_tree as tree;

pub use tml_delta::{
    AppendOnlyDeltaLog, ChangeBlock, ChangeRecorder, ChangeType, DeltaCursor, DeltaError,
    DeltaTracker, TrackerConfig,
};
pub use tml_tree::{Color, ColorSet, PositionTree, TreeError};
