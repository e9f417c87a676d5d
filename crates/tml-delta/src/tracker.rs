//! Tree-backed delta tracker.
//!
//! A [`DeltaTracker`] keeps one [`PositionTree`] whose units span the union
//! of the collection before the pending changes (source) and after them
//! (target):
//!
//! ```text
//!   reset(5)                  _ _ _ _ _
//!   target_delete(1, 3)       _ X X _ _       target 3, source 5
//!   target_insert(1, 2, N)    _ X X + _ _     target 4, source 5
//!
//!   replay:  delete 1..3, insert N 1..2
//! ```
//!
//! Target mutations are resolved against the current state rather than call
//! order, so overlapping edits inside one batch fold into their net effect:
//! an update of an insert stays an insert, repeated updates keep the
//! pre-batch value, and a delete of an update reports that same value.

use crate::change::{ChangeBlock, ChangeType, Slot};
use crate::config::TrackerConfig;
use crate::error::{DeltaError, Result};
use crate::log::AppendOnlyDeltaLog;
use std::fmt;
use tml_tree::{Color, ColorSet, PositionTree, TreeCursor, TreeError};
use tracing::{debug, trace};

/// Records the net change between a source and a target sequence.
#[derive(Clone)]
pub struct DeltaTracker<T> {
    tree: PositionTree<Slot<T>>,
    config: TrackerConfig,
    /// Until `reset` is called the base length is unknown and the tree grows
    /// on demand to fit whatever index is touched.
    initial_capacity_known: bool,
}

impl<T: Clone + PartialEq> Default for DeltaTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> DeltaTracker<T> {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            tree: PositionTree::new(),
            config,
            initial_capacity_known: false,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn set_allow_contradicting_events(&mut self, allow: bool) {
        self.config.allow_contradicting_events = allow;
    }

    pub fn set_prefer_most_recent_value(&mut self, prefer: bool) {
        self.config.prefer_most_recent_value = prefer;
    }

    /// Start a new batch over a base collection of `size` elements.
    pub fn reset(&mut self, size: usize) {
        debug!(size, "resetting delta tracker");
        self.tree.clear();
        self.initial_capacity_known = true;
        self.ensure_capacity(size);
    }

    /// Append unchanged units until the target holds at least `size` elements.
    pub fn ensure_capacity(&mut self, size: usize) {
        let missing = size.saturating_sub(self.tree.size(ColorSet::TARGET));
        if missing == 0 {
            return;
        }
        self.tree.append(Color::NoChange, Slot::unknown(), missing);
    }

    pub fn target_size(&self) -> usize {
        self.tree.size(ColorSet::TARGET)
    }

    pub fn source_size(&self) -> usize {
        self.tree.size(ColorSet::SOURCE)
    }

    /// Whether the batch has no net change.
    pub fn is_empty(&self) -> bool {
        self.tree.size(ColorSet::CHANGES) == 0
    }

    /// Number of changed elements (inserted, updated and deleted).
    pub fn change_count(&self) -> usize {
        self.tree.size(ColorSet::CHANGES)
    }

    /// Record `start..end` as inserted into the target.
    pub fn target_insert(&mut self, start: usize, end: usize, new_value: Option<T>) -> Result<()> {
        check_range(start, end)?;
        if !self.initial_capacity_known {
            self.ensure_capacity(start);
        }
        trace!(start, end, "target insert");
        self.tree.add(
            start,
            ColorSet::TARGET,
            Color::Insert,
            Slot::inserted(new_value),
            end - start,
        )?;
        Ok(())
    }

    /// Record target elements `start..end` as updated.
    pub fn target_update(
        &mut self,
        start: usize,
        end: usize,
        old_value: Option<T>,
        new_value: Option<T>,
    ) -> Result<()> {
        self.prepare_target_range(start, end)?;
        trace!(start, end, "target update");

        let prefer_recent = self.config.prefer_most_recent_value;
        let mut index = start;
        while index < end {
            let element = self.tree.get(index, ColorSet::TARGET)?;
            let span = element.run_remaining().min(end - index);
            let replacement = match element.color() {
                Color::Insert if prefer_recent => {
                    Some((Color::Insert, Slot::inserted(new_value.clone())))
                }
                // an insert followed by an update is still an insert
                Color::Insert => None,
                Color::Update if !prefer_recent => Some((
                    Color::Update,
                    Slot::updated(element.value().old.clone(), new_value.clone()),
                )),
                _ => Some((
                    Color::Update,
                    Slot::updated(old_value.clone(), new_value.clone()),
                )),
            };
            if let Some((color, slot)) = replacement {
                self.tree.set(index, ColorSet::TARGET, color, slot, span)?;
            }
            index += span;
        }
        Ok(())
    }

    /// Record target elements `start..end` as deleted.
    ///
    /// Fails without changing anything if the range holds an element inserted
    /// in this batch and contradicting events are not allowed.
    pub fn target_delete(&mut self, start: usize, end: usize, value: Option<T>) -> Result<()> {
        self.prepare_target_range(start, end)?;
        trace!(start, end, "target delete");

        if !self.config.allow_contradicting_events {
            let mut index = start;
            while index < end {
                let element = self.tree.get(index, ColorSet::TARGET)?;
                if element.color() == Color::Insert {
                    return Err(DeltaError::ContradictingEvent { index });
                }
                index += element.run_remaining().min(end - index);
            }
        }

        // each deletion slides the following elements down onto `start`
        let mut remaining = end - start;
        while remaining > 0 {
            let element = self.tree.get(start, ColorSet::TARGET)?;
            let span = element.run_remaining().min(remaining);
            match element.color() {
                Color::Insert => {
                    self.tree.remove(start, ColorSet::TARGET, span)?;
                }
                Color::Update => {
                    let original = Slot::deleted(element.value().old.clone());
                    self.tree
                        .set(start, ColorSet::TARGET, Color::Delete, original, span)?;
                }
                _ => {
                    self.tree.set(
                        start,
                        ColorSet::TARGET,
                        Color::Delete,
                        Slot::deleted(value.clone()),
                        span,
                    )?;
                }
            }
            remaining -= span;
        }
        Ok(())
    }

    /// The base collection gained an element at `index` that the target
    /// does not reflect.
    pub fn source_insert(&mut self, index: usize) -> Result<()> {
        trace!(index, "source insert");
        self.tree
            .add(index, ColorSet::SOURCE, Color::Delete, Slot::unknown(), 1)?;
        Ok(())
    }

    /// The base collection lost the element at `index`.
    pub fn source_delete(&mut self, index: usize) -> Result<()> {
        trace!(index, "source delete");
        self.tree.remove(index, ColorSet::SOURCE, 1)?;
        Ok(())
    }

    /// Forget any pending change for the source element at `index`.
    pub fn source_revert(&mut self, index: usize) -> Result<()> {
        trace!(index, "source revert");
        self.tree
            .set(index, ColorSet::SOURCE, Color::NoChange, Slot::unknown(), 1)?;
        Ok(())
    }

    /// Source index of the target element at `index`, or of the next source
    /// element when the target element was inserted.
    pub fn target_to_source(&mut self, index: usize) -> Result<usize> {
        self.fit_index(index)?;
        Ok(self
            .tree
            .convert_index_color(index, ColorSet::TARGET, ColorSet::SOURCE)?)
    }

    /// Target index of the source element at `index`, or of the next target
    /// element when the source element was deleted.
    pub fn source_to_target(&mut self, index: usize) -> Result<usize> {
        self.fit_index(index)?;
        Ok(self
            .tree
            .convert_index_color(index, ColorSet::SOURCE, ColorSet::TARGET)?)
    }

    /// Replay every block of `log` as target changes, in order.
    pub fn merge_log(&mut self, log: &AppendOnlyDeltaLog<T>) -> Result<()> {
        debug!(blocks = log.len(), "merging delta log into tracker");
        for block in log.blocks() {
            self.apply_block(block.clone())?;
        }
        Ok(())
    }

    /// Apply one change block as the matching `target_*` call.
    pub fn apply_block(&mut self, block: ChangeBlock<T>) -> Result<()> {
        let ChangeBlock {
            change_type,
            start,
            end,
            old_value,
            new_value,
        } = block;
        match change_type {
            ChangeType::Insert => self.target_insert(start, end, new_value),
            ChangeType::Update => self.target_update(start, end, old_value, new_value),
            ChangeType::Delete => self.target_delete(start, end, old_value),
        }
    }

    /// Grow an unreset tracker so `index` addresses an element.
    fn fit_index(&mut self, index: usize) -> Result<()> {
        if self.initial_capacity_known {
            return Ok(());
        }
        let size = index.checked_add(1).ok_or(TreeError::OutOfRange {
            index,
            size: self.target_size(),
        })?;
        self.ensure_capacity(size);
        Ok(())
    }

    fn prepare_target_range(&mut self, start: usize, end: usize) -> Result<()> {
        check_range(start, end)?;
        if !self.initial_capacity_known {
            self.ensure_capacity(end);
        }
        let size = self.target_size();
        if end > size {
            return Err(TreeError::OutOfRange { index: end - 1, size }.into());
        }
        Ok(())
    }
}

impl<T> DeltaTracker<T> {
    /// Cursor over the pending changes in replay order.
    pub fn cursor(&self) -> DeltaCursor<'_, T> {
        DeltaCursor {
            inner: self.tree.cursor(ColorSet::CHANGES),
        }
    }

    /// The pending changes as blocks, one per run.
    pub fn blocks(&self) -> Blocks<'_, T> {
        Blocks {
            cursor: self.cursor(),
        }
    }
}

fn check_range(start: usize, end: usize) -> Result<()> {
    if end < start {
        return Err(DeltaError::InvalidRange { start, end });
    }
    Ok(())
}

impl<T> fmt::Display for DeltaTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cursor = self.tree.cursor(ColorSet::ALL);
        while cursor.next_node() {
            if let Some(color) = cursor.color() {
                for _ in 0..cursor.run_remaining() {
                    write!(f, "{}", color.symbol())?;
                }
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for DeltaTracker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaTracker")
            .field("units", &self.to_string())
            .field("config", &self.config)
            .field("initial_capacity_known", &self.initial_capacity_known)
            .finish()
    }
}

/// Replay cursor over a tracker's changes.
///
/// [`index`](Self::index) is the target index the current element has when
/// the changes are replayed in order; it does not move across the elements
/// of a delete run. Cloning (or [`copy`](Self::copy)) gives an independent
/// look-ahead cursor.
pub struct DeltaCursor<'a, T> {
    inner: TreeCursor<'a, Slot<T>>,
}

impl<'a, T> Clone for DeltaCursor<'a, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> DeltaCursor<'a, T> {
    pub fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    pub fn has_next_node(&self) -> bool {
        self.inner.has_next_node()
    }

    /// Step to the next changed element. Returns `false` once exhausted.
    pub fn next(&mut self) -> bool {
        self.inner.next()
    }

    /// Step to the first element of the next change run. Returns `false` once exhausted.
    pub fn next_node(&mut self) -> bool {
        self.inner.next_node()
    }

    pub fn index(&self) -> usize {
        self.inner.index(ColorSet::TARGET)
    }

    /// Exclusive end of the current run, counted from `index()`.
    pub fn end_index(&self) -> usize {
        self.index() + self.inner.run_remaining()
    }

    /// Index of the current element in the source sequence.
    pub fn source_index(&self) -> usize {
        self.inner.index(ColorSet::SOURCE)
    }

    pub fn change_type(&self) -> Option<ChangeType> {
        self.inner.color().and_then(ChangeType::from_color)
    }

    /// Value replaced or removed by an update or delete.
    pub fn old_value(&self) -> Option<&'a T> {
        self.inner.value().and_then(|slot| slot.old.as_ref())
    }

    /// Value written by an insert or update.
    pub fn new_value(&self) -> Option<&'a T> {
        self.inner.value().and_then(|slot| slot.new.as_ref())
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl<'a, T: Clone> DeltaCursor<'a, T> {
    /// The current element and the rest of its run as a block.
    pub fn block(&self) -> Option<ChangeBlock<T>> {
        let change_type = self.change_type()?;
        Some(
            ChangeBlock::new(change_type, self.index(), self.end_index())
                .with_values(self.old_value().cloned(), self.new_value().cloned()),
        )
    }
}

/// Iterator over a tracker's changes, one block per run.
pub struct Blocks<'a, T> {
    cursor: DeltaCursor<'a, T>,
}

impl<'a, T: Clone> Iterator for Blocks<'a, T> {
    type Item = ChangeBlock<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.next_node() {
            return None;
        }
        self.cursor.block()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(change_type: ChangeType, start: usize, end: usize) -> ChangeBlock<&'static str> {
        ChangeBlock::new(change_type, start, end)
    }

    #[test]
    fn test_reset_fills_unchanged() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        tracker.reset(4);
        assert_eq!(tracker.target_size(), 4);
        assert_eq!(tracker.source_size(), 4);
        assert!(tracker.is_empty());
        assert_eq!(tracker.to_string(), "____");
        assert_eq!(tracker.blocks().count(), 0);
    }

    #[test]
    fn test_delete_then_insert_at_same_index() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(5);
        tracker.target_delete(1, 3, None).unwrap();
        tracker.target_insert(1, 2, Some("N")).unwrap();

        assert_eq!(tracker.to_string(), "_XX+__");
        assert_eq!(tracker.target_size(), 4);
        assert_eq!(tracker.source_size(), 5);
        assert_eq!(tracker.target_to_source(3).unwrap(), 4);

        let blocks: Vec<_> = tracker.blocks().collect();
        assert_eq!(
            blocks,
            vec![
                block(ChangeType::Delete, 1, 3),
                block(ChangeType::Insert, 1, 2).with_values(None, Some("N")),
            ]
        );
    }

    #[test]
    fn test_update_keeps_first_old_value() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(1);
        tracker.target_update(0, 1, Some("a"), Some("b")).unwrap();
        tracker.target_update(0, 1, Some("b"), Some("c")).unwrap();

        let blocks: Vec<_> = tracker.blocks().collect();
        assert_eq!(
            blocks,
            vec![block(ChangeType::Update, 0, 1).with_values(Some("a"), Some("c"))]
        );
    }

    #[test]
    fn test_update_of_insert_stays_insert() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(2);
        tracker.target_insert(1, 2, Some("x")).unwrap();
        tracker.target_update(0, 2, Some("old"), Some("y")).unwrap();

        assert_eq!(tracker.to_string(), "U+_");
        let blocks: Vec<_> = tracker.blocks().collect();
        assert_eq!(
            blocks,
            vec![
                block(ChangeType::Update, 0, 1).with_values(Some("old"), Some("y")),
                block(ChangeType::Insert, 1, 2).with_values(None, Some("x")),
            ]
        );
    }

    #[test]
    fn test_most_recent_value_mode() {
        let mut tracker = DeltaTracker::with_config(TrackerConfig::most_recent_value());
        tracker.reset(2);
        tracker.target_insert(0, 1, Some("x")).unwrap();
        tracker.target_update(0, 1, Some("x"), Some("y")).unwrap();
        tracker.target_update(1, 2, Some("a"), Some("b")).unwrap();
        tracker.target_update(1, 2, Some("b"), Some("c")).unwrap();

        let blocks: Vec<_> = tracker.blocks().collect();
        assert_eq!(
            blocks,
            vec![
                block(ChangeType::Insert, 0, 1).with_values(None, Some("y")),
                block(ChangeType::Update, 1, 2).with_values(Some("b"), Some("c")),
            ]
        );
    }

    #[test]
    fn test_delete_of_update_reports_original() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(3);
        tracker.target_update(1, 2, Some("a"), Some("b")).unwrap();
        tracker.target_delete(0, 3, Some("?")).unwrap();

        let blocks: Vec<_> = tracker.blocks().collect();
        assert_eq!(
            blocks,
            vec![
                block(ChangeType::Delete, 0, 1).with_values(Some("?"), None),
                block(ChangeType::Delete, 0, 1).with_values(Some("a"), None),
                block(ChangeType::Delete, 0, 1).with_values(Some("?"), None),
            ]
        );
        assert_eq!(tracker.target_size(), 0);
        assert_eq!(tracker.source_size(), 3);
    }

    #[test]
    fn test_contradicting_delete_rejected_atomically() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(3);
        tracker.target_insert(1, 2, Some("x")).unwrap();

        let err = tracker.target_delete(0, 2, Some("x")).unwrap_err();
        assert_eq!(err, DeltaError::ContradictingEvent { index: 1 });
        assert_eq!(tracker.to_string(), "_+__");
    }

    #[test]
    fn test_contradicting_delete_allowed() {
        let mut tracker = DeltaTracker::with_config(TrackerConfig::contradiction_tolerant());
        tracker.reset(3);
        tracker.target_insert(1, 2, Some("x")).unwrap();
        tracker.target_delete(1, 2, Some("x")).unwrap();

        assert_eq!(tracker.target_size(), 3);
        assert!(tracker.is_empty());
        assert_eq!(tracker.to_string(), "___");
    }

    #[test]
    fn test_source_operations() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        tracker.reset(3);

        tracker.source_insert(1).unwrap();
        assert_eq!(tracker.to_string(), "_X__");
        assert_eq!(tracker.source_size(), 4);
        assert_eq!(tracker.target_size(), 3);

        tracker.source_revert(1).unwrap();
        assert_eq!(tracker.target_size(), 4);
        assert!(tracker.is_empty());

        tracker.source_delete(0).unwrap();
        assert_eq!(tracker.source_size(), 3);
        assert_eq!(tracker.target_size(), 3);
        assert!(tracker.source_delete(3).is_err());
    }

    #[test]
    fn test_lazy_capacity() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        tracker.target_update(3, 5, None, None).unwrap();
        assert_eq!(tracker.to_string(), "___UU");

        assert_eq!(tracker.target_to_source(7).unwrap(), 7);
        assert_eq!(tracker.target_size(), 8);
    }

    #[test]
    fn test_conversion_of_largest_index_fails_cleanly() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        assert_eq!(
            tracker.target_to_source(usize::MAX).unwrap_err(),
            DeltaError::Tree(TreeError::OutOfRange { index: usize::MAX, size: 0 })
        );
        assert_eq!(
            tracker.source_to_target(usize::MAX).unwrap_err(),
            DeltaError::Tree(TreeError::OutOfRange { index: usize::MAX, size: 0 })
        );
        assert_eq!(tracker.target_size(), 0);
    }

    #[test]
    fn test_ensure_capacity_appends_after_deleted_tail() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        tracker.target_delete(1, 2, Some("d")).unwrap();
        assert_eq!(tracker.to_string(), "_X");

        tracker.ensure_capacity(3);
        assert_eq!(tracker.to_string(), "_X__");
        tracker.ensure_capacity(2);
        assert_eq!(tracker.target_size(), 3);
    }

    #[test]
    fn test_range_errors() {
        let mut tracker: DeltaTracker<&str> = DeltaTracker::new();
        tracker.reset(2);
        assert_eq!(
            tracker.target_update(1, 3, None, None).unwrap_err(),
            DeltaError::Tree(TreeError::OutOfRange { index: 2, size: 2 })
        );
        assert_eq!(
            tracker.target_delete(2, 1, None).unwrap_err(),
            DeltaError::InvalidRange { start: 2, end: 1 }
        );
        assert!(tracker.target_insert(3, 4, None).is_err());
        assert!(tracker.target_to_source(3).is_err());
    }

    #[test]
    fn test_cursor_steps_and_copy() {
        let mut tracker = DeltaTracker::new();
        tracker.reset(6);
        tracker.target_update(0, 2, Some("a"), Some("b")).unwrap();
        tracker.target_delete(3, 5, Some("d")).unwrap();

        let mut cursor = tracker.cursor();
        assert!(cursor.next());
        assert_eq!(cursor.change_type(), Some(ChangeType::Update));
        assert_eq!((cursor.index(), cursor.end_index()), (0, 2));

        let mut ahead = cursor.copy();
        assert!(ahead.next_node());
        assert_eq!(ahead.change_type(), Some(ChangeType::Delete));
        assert_eq!((ahead.index(), ahead.end_index()), (3, 5));
        assert_eq!(ahead.source_index(), 3);
        assert!(ahead.next());
        assert_eq!((ahead.index(), ahead.end_index()), (3, 4));
        assert_eq!(ahead.source_index(), 4);
        assert_eq!(ahead.old_value(), Some(&"d"));
        assert!(!ahead.has_next());

        assert!(cursor.next());
        assert_eq!((cursor.index(), cursor.end_index()), (1, 2));
        assert_eq!(cursor.new_value(), Some(&"b"));
    }

    #[test]
    fn test_merge_log() {
        let mut log = AppendOnlyDeltaLog::new();
        log.add_change(ChangeType::Update, 0, 1, Some("a"), Some("b"));
        log.add_change(ChangeType::Delete, 2, 4, Some("z"), None);
        log.add_change(ChangeType::Insert, 2, 3, None, Some("n"));

        let mut tracker = DeltaTracker::new();
        tracker.reset(5);
        tracker.merge_log(&log).unwrap();

        assert_eq!(tracker.to_string(), "U_XX+_");
        assert_eq!(tracker.target_size(), 4);
        assert_eq!(tracker.change_count(), 4);
    }
}
