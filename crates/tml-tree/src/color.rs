//! Unit colors and color subsets.
//!
//! Every unit in a [`PositionTree`](crate::PositionTree) carries exactly one
//! of four colors. A coordinate space is a named subset of colors: an index
//! "in" a space counts only the units whose color belongs to it.
//!
//! ```text
//!   absolute:  _  X  X  +  _  _
//!   target:    0        1  2  3     {Insert, Update, NoChange}
//!   source:    0  1  2     3  4     {Update, Delete, NoChange}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct colors.
pub const COLOR_COUNT: usize = 4;

/// The color of a run of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// Present in the target only.
    Insert,
    /// Present in both, with a replaced value.
    Update,
    /// Present in the source only.
    Delete,
    /// Present in both, untouched.
    NoChange,
}

impl Color {
    pub const ALL: [Color; COLOR_COUNT] =
        [Color::Insert, Color::Update, Color::Delete, Color::NoChange];

    /// Slot of this color in per-color aggregate arrays.
    pub const fn index(self) -> usize {
        match self {
            Color::Insert => 0,
            Color::Update => 1,
            Color::Delete => 2,
            Color::NoChange => 3,
        }
    }

    const fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Single-character rendering used by `Display` impls and test fixtures.
    pub const fn symbol(self) -> char {
        match self {
            Color::Insert => '+',
            Color::Update => 'U',
            Color::Delete => 'X',
            Color::NoChange => '_',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Insert => "insert",
            Color::Update => "update",
            Color::Delete => "delete",
            Color::NoChange => "no-change",
        };
        f.write_str(name)
    }
}

/// A set of colors, i.e. a coordinate space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorSet(u8);

impl ColorSet {
    pub const EMPTY: ColorSet = ColorSet(0);

    /// Absolute tree coordinates.
    pub const ALL: ColorSet = ColorSet::of(&Color::ALL);

    /// The collection after all pending mutations.
    pub const TARGET: ColorSet = ColorSet::of(&[Color::Insert, Color::Update, Color::NoChange]);

    /// The collection before the pending mutations.
    pub const SOURCE: ColorSet = ColorSet::of(&[Color::Update, Color::Delete, Color::NoChange]);

    /// What an observer replays.
    pub const CHANGES: ColorSet = ColorSet::of(&[Color::Insert, Color::Update, Color::Delete]);

    /// Build a set from a slice of colors.
    pub const fn of(colors: &[Color]) -> ColorSet {
        let mut bits = 0;
        let mut i = 0;
        while i < colors.len() {
            bits |= colors[i].bit();
            i += 1;
        }
        ColorSet(bits)
    }

    pub const fn single(color: Color) -> ColorSet {
        ColorSet(color.bit())
    }

    pub const fn union(self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 | other.0)
    }

    pub const fn contains(self, color: Color) -> bool {
        self.0 & color.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Colors in this set, in `Color::ALL` order.
    pub fn iter(self) -> impl Iterator<Item = Color> {
        Color::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Sum the entries of a per-color count array that belong to this set.
    pub fn total(self, counts: &[usize; COLOR_COUNT]) -> usize {
        self.iter().map(|c| counts[c.index()]).sum()
    }
}

impl From<Color> for ColorSet {
    fn from(color: Color) -> Self {
        ColorSet::single(color)
    }
}

impl fmt::Debug for ColorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
