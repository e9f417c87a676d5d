//! Change vocabulary shared by logs, trackers and their consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use tml_tree::Color;

/// Kind of change an observer replays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

impl ChangeType {
    /// The change a unit color stands for; `NoChange` has none.
    pub fn from_color(color: Color) -> Option<Self> {
        match color {
            Color::Insert => Some(ChangeType::Insert),
            Color::Update => Some(ChangeType::Update),
            Color::Delete => Some(ChangeType::Delete),
            Color::NoChange => None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            ChangeType::Insert => Color::Insert,
            ChangeType::Update => Color::Update,
            ChangeType::Delete => Color::Delete,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.color(), f)
    }
}

/// A contiguous run of one kind of change, as replayed by an observer.
///
/// `start..end` is expressed in the coordinates the observer sees while
/// replaying in order: an insert or update covers target indices
/// `start..end`; a delete removes `end - start` elements that all sit at
/// `start` one after another.
///
/// `None` values are unknown and must be read from the live collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBlock<T> {
    pub change_type: ChangeType,
    pub start: usize,
    pub end: usize,
    pub old_value: Option<T>,
    pub new_value: Option<T>,
}

impl<T> ChangeBlock<T> {
    pub fn new(change_type: ChangeType, start: usize, end: usize) -> Self {
        Self {
            change_type,
            start,
            end,
            old_value: None,
            new_value: None,
        }
    }

    pub fn with_values(mut self, old_value: Option<T>, new_value: Option<T>) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Index of the next element this block could be extended with.
    ///
    /// Deletes do not advance: after removing an element the next one slides
    /// into the same index.
    pub fn changed_index(&self) -> usize {
        match self.change_type {
            ChangeType::Delete => self.start,
            ChangeType::Insert | ChangeType::Update => self.end,
        }
    }
}

/// Values held by a tracked run.
///
/// Inserts buffer `new`, deletes buffer `old`, updates buffer both and
/// unchanged runs buffer neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot<T> {
    pub old: Option<T>,
    pub new: Option<T>,
}

impl<T> Slot<T> {
    pub fn unknown() -> Self {
        Self { old: None, new: None }
    }

    pub fn inserted(new: Option<T>) -> Self {
        Self { old: None, new }
    }

    pub fn updated(old: Option<T>, new: Option<T>) -> Self {
        Self { old, new }
    }

    pub fn deleted(old: Option<T>) -> Self {
        Self { old, new: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_index() {
        assert_eq!(ChangeBlock::<()>::new(ChangeType::Insert, 2, 5).changed_index(), 5);
        assert_eq!(ChangeBlock::<()>::new(ChangeType::Update, 2, 5).changed_index(), 5);
        assert_eq!(ChangeBlock::<()>::new(ChangeType::Delete, 2, 5).changed_index(), 2);
    }

    #[test]
    fn test_color_mapping() {
        for change_type in [ChangeType::Insert, ChangeType::Update, ChangeType::Delete] {
            assert_eq!(ChangeType::from_color(change_type.color()), Some(change_type));
        }
        assert_eq!(ChangeType::from_color(Color::NoChange), None);
    }

    #[test]
    fn test_block_serialization() {
        let block = ChangeBlock::new(ChangeType::Update, 1, 3).with_values(Some("a"), Some("b"));
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"change_type\":\"update\""));

        let back: ChangeBlock<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.old_value.as_deref(), Some("a"));
        assert_eq!(back.len(), 2);

        let sparse: ChangeBlock<String> =
            serde_json::from_str(r#"{"change_type":"delete","start":4,"end":6}"#).unwrap();
        assert_eq!(sparse.old_value, None);
        assert_eq!(sparse.changed_index(), 4);
    }
}
