//! # tml-delta
//!
//! Change-delta recording for ordered collections.
//!
//! A transformation stage that edits a list in response to upstream changes
//! must tell its own observers what happened. This crate records those edits
//! and replays them as ordered [`ChangeBlock`]s:
//!
//! - [`AppendOnlyDeltaLog`]: the fast path when changes arrive in increasing
//!   index order.
//! - [`DeltaTracker`]: accepts changes in any order, folds overlapping edits
//!   into their net effect and converts indices between the collection before
//!   the batch (source) and after it (target).
//! - [`ChangeRecorder`]: starts on a log and escalates to a tracker the first
//!   time the log rejects a change.
//!
//! ```rust
//! use tml_delta::{ChangeType, DeltaTracker};
//!
//! let mut tracker = DeltaTracker::new();
//! tracker.reset(5);
//! tracker.target_delete(1, 3, None).unwrap();
//! tracker.target_insert(1, 2, Some("N")).unwrap();
//!
//! let kinds: Vec<_> = tracker.blocks().map(|block| block.change_type).collect();
//! assert_eq!(kinds, vec![ChangeType::Delete, ChangeType::Insert]);
//! assert_eq!(tracker.target_to_source(3).unwrap(), 4);
//! ```
//!
//! Nothing here is synchronized. A tracker belongs to one batch and is
//! driven by whoever holds the collection's write lock.

pub mod change;
pub mod config;
pub mod error;
pub mod log;
pub mod recorder;
pub mod tracker;

pub use change::{ChangeBlock, ChangeType, Slot};
pub use config::TrackerConfig;
pub use error::{DeltaError, Result};
pub use log::{AppendOnlyDeltaLog, LogCursor};
pub use recorder::ChangeRecorder;
pub use tracker::{Blocks, DeltaCursor, DeltaTracker};
pub use tml_tree::{Color, ColorSet};
