//! # tml-tree
//!
//! Four-color order-statistics tree for the Tourmaline change-delta engine.
//!
//! A [`PositionTree`] stores a sequence of *units*. Each unit has one of four
//! [`Color`]s and a value; neighbouring units with the same color and value
//! are kept as a single run, so memory grows with the number of distinct
//! regions rather than the number of units.
//!
//! Every positional operation takes an index together with the [`ColorSet`]
//! it is counted in, which is what lets one tree answer questions about two
//! coordinate spaces at once:
//!
//! ```rust
//! use tml_tree::{Color, ColorSet, PositionTree};
//!
//! let mut tree: PositionTree<()> = PositionTree::new();
//! tree.add(0, ColorSet::ALL, Color::NoChange, (), 5).unwrap();
//! tree.set(1, ColorSet::TARGET, Color::Delete, (), 2).unwrap();
//!
//! assert_eq!(tree.size(ColorSet::TARGET), 3);
//! assert_eq!(tree.size(ColorSet::SOURCE), 5);
//! assert_eq!(tree.convert_index_color(1, ColorSet::TARGET, ColorSet::SOURCE).unwrap(), 3);
//! ```
//!
//! All operations are O(log n) in the number of runs; cursors step over a
//! whole run in O(1) amortized.
//!
//! Node handles stay inside the crate; callers address units by index only:
//!
//! ```compile_fail
//! use tml_tree::tree::NodeId;
//! ```

pub mod color;
pub mod cursor;
pub mod error;
pub mod tree;

pub use color::{Color, ColorSet, COLOR_COUNT};
pub use cursor::TreeCursor;
pub use error::{Result, TreeError};
pub use tree::{Element, PositionTree};
