//! Append-only delta log.
//!
//! The cheap path for the common case where a stage reports its changes in
//! increasing index order. Each change is appended as a block; a change that
//! continues the previous block (same type and values, starting exactly where
//! the previous one left off) extends it instead.
//!
//! ```text
//!   update(2,5) + update(5,8)  →  [update 2..8]
//!   delete(3,4) + delete(3,4)  →  [delete 3..5]      deletes do not advance
//!   insert(4,6) + update(1,2)  →  rejected           1 < 6, needs a tracker
//! ```
//!
//! A rejected append is not an error: the caller escalates to a
//! [`DeltaTracker`](crate::DeltaTracker) and replays the log into it with
//! [`merge_log`](crate::DeltaTracker::merge_log).

use crate::change::{ChangeBlock, ChangeType};
use serde::{Deserialize, Serialize};

/// Strictly increasing log of coalesced change blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppendOnlyDeltaLog<T> {
    blocks: Vec<ChangeBlock<T>>,
}

impl<T> Default for AppendOnlyDeltaLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AppendOnlyDeltaLog<T> {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Number of blocks (not elements).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ChangeBlock<T>> {
        self.blocks.iter()
    }

    pub fn cursor(&self) -> LogCursor<'_, T> {
        LogCursor::new(&self.blocks)
    }

    /// The index the next change must start at or after.
    pub fn changed_index(&self) -> usize {
        self.blocks.last().map_or(0, ChangeBlock::changed_index)
    }
}

impl<T: PartialEq> AppendOnlyDeltaLog<T> {
    pub fn insert(&mut self, start: usize, end: usize) -> bool {
        self.add_change(ChangeType::Insert, start, end, None, None)
    }

    pub fn update(&mut self, start: usize, end: usize) -> bool {
        self.add_change(ChangeType::Update, start, end, None, None)
    }

    pub fn delete(&mut self, start: usize, end: usize) -> bool {
        self.add_change(ChangeType::Delete, start, end, None, None)
    }

    /// Append a change, coalescing it with the last block when possible.
    ///
    /// Returns `false`, leaving the log untouched, when the change starts
    /// before the last block's changed index or its range is inverted.
    /// Empty ranges are accepted and record nothing.
    pub fn add_change(
        &mut self,
        change_type: ChangeType,
        start: usize,
        end: usize,
        old_value: Option<T>,
        new_value: Option<T>,
    ) -> bool {
        if end < start || start < self.changed_index() {
            return false;
        }
        if start == end {
            return true;
        }

        if let Some(last) = self.blocks.last_mut() {
            if last.changed_index() == start
                && last.change_type == change_type
                && last.old_value == old_value
                && last.new_value == new_value
            {
                last.end += end - start;
                return true;
            }
        }

        self.blocks.push(ChangeBlock {
            change_type,
            start,
            end,
            old_value,
            new_value,
        });
        true
    }
}

/// Cursor over a log, by element or by block.
///
/// Mirrors [`DeltaCursor`](crate::DeltaCursor): [`index`](Self::index) is
/// where the current element sits when the log is replayed in order, so it
/// stays put across the elements of a delete block.
pub struct LogCursor<'a, T> {
    blocks: &'a [ChangeBlock<T>],
    block: Option<usize>,
    offset: usize,
}

impl<'a, T> Clone for LogCursor<'a, T> {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks,
            block: self.block,
            offset: self.offset,
        }
    }
}

impl<'a, T> LogCursor<'a, T> {
    fn new(blocks: &'a [ChangeBlock<T>]) -> Self {
        Self {
            blocks,
            block: None,
            offset: 0,
        }
    }

    fn current(&self) -> Option<&'a ChangeBlock<T>> {
        let blocks = self.blocks;
        self.block.and_then(|i| blocks.get(i))
    }

    fn next_block_index(&self) -> usize {
        self.block.map_or(0, |i| i + 1)
    }

    pub fn has_next(&self) -> bool {
        let within = self
            .current()
            .is_some_and(|block| self.offset + 1 < block.len());
        within || self.has_next_block()
    }

    pub fn has_next_block(&self) -> bool {
        self.next_block_index() < self.blocks.len()
    }

    /// Step to the next element. Returns `false` once exhausted.
    pub fn next(&mut self) -> bool {
        if let Some(block) = self.current() {
            if self.offset + 1 < block.len() {
                self.offset += 1;
                return true;
            }
        }
        self.next_block()
    }

    /// Step to the first element of the next block. Returns `false` once exhausted.
    pub fn next_block(&mut self) -> bool {
        let next = self.next_block_index();
        if next >= self.blocks.len() {
            self.block = Some(self.blocks.len());
            return false;
        }
        self.block = Some(next);
        self.offset = 0;
        true
    }

    /// Replay index of the current element.
    pub fn index(&self) -> usize {
        match self.current() {
            Some(block) if block.change_type == ChangeType::Delete => block.start,
            Some(block) => block.start + self.offset,
            None => 0,
        }
    }

    /// End of the current run, as `index()` plus the elements left in the block.
    pub fn end_index(&self) -> usize {
        self.current()
            .map_or(0, |block| self.index() + block.len() - self.offset)
    }

    pub fn block_start(&self) -> usize {
        self.current().map_or(0, |block| block.start)
    }

    pub fn block_end(&self) -> usize {
        self.current().map_or(0, |block| block.end)
    }

    pub fn change_type(&self) -> Option<ChangeType> {
        self.current().map(|block| block.change_type)
    }

    pub fn old_value(&self) -> Option<&'a T> {
        self.current().and_then(|block| block.old_value.as_ref())
    }

    pub fn new_value(&self) -> Option<&'a T> {
        self.current().and_then(|block| block.new_value.as_ref())
    }

    /// Independent copy of this cursor's position.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
