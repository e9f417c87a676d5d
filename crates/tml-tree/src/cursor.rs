//! Ordered traversal restricted to a color subset.

use crate::color::{Color, ColorSet, COLOR_COUNT};
use crate::tree::{NodeId, PositionTree};

/// A cursor over the units of a [`PositionTree`] whose color is in a given set.
///
/// The cursor starts *before* the first unit. [`next`](Self::next) steps one
/// unit at a time; [`next_node`](Self::next_node) jumps to the start of the
/// next run, skipping whatever is left of the current one in O(1) amortized.
/// Units of other colors are passed over but still counted, so
/// [`index`](Self::index) can answer for any coordinate space.
///
/// Cloning a cursor is the cheap way to look ahead without moving it.
pub struct TreeCursor<'a, V> {
    tree: &'a PositionTree<V>,
    colors: ColorSet,
    /// In-order traversal stack; the top is the next node to visit.
    pending: Vec<NodeId>,
    current: Option<NodeId>,
    offset: usize,
    /// Units of each color strictly before the current unit.
    before: [usize; COLOR_COUNT],
}

impl<'a, V> Clone for TreeCursor<'a, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            colors: self.colors,
            pending: self.pending.clone(),
            current: self.current,
            offset: self.offset,
            before: self.before,
        }
    }
}

impl<'a, V> TreeCursor<'a, V> {
    pub(crate) fn new(tree: &'a PositionTree<V>, colors: ColorSet) -> Self {
        let mut cursor = Self {
            tree,
            colors,
            pending: Vec::new(),
            current: None,
            offset: 0,
            before: [0; COLOR_COUNT],
        };
        cursor.descend_left(tree.root());
        cursor
    }

    fn descend_left(&mut self, mut tree: Option<NodeId>) {
        while let Some(id) = tree {
            self.pending.push(id);
            tree = self.tree.node(id).left;
        }
    }

    fn pop_pending(&mut self) -> Option<NodeId> {
        let id = self.pending.pop()?;
        self.descend_left(self.tree.node(id).right);
        Some(id)
    }

    /// Units of the cursor's colors visited so far, the current one included.
    fn consumed(&self) -> usize {
        self.colors.total(&self.before) + usize::from(self.current.is_some())
    }

    pub fn has_next(&self) -> bool {
        self.consumed() < self.tree.size(self.colors)
    }

    pub fn has_next_node(&self) -> bool {
        let through_run = self.colors.total(&self.before) + self.run_remaining();
        through_run < self.tree.size(self.colors)
    }

    /// Step to the next unit. Returns `false` once exhausted.
    pub fn next(&mut self) -> bool {
        if let Some(id) = self.current {
            let node = self.tree.node(id);
            self.before[node.color.index()] += 1;
            if self.offset + 1 < node.len {
                self.offset += 1;
                return true;
            }
            self.current = None;
        }
        self.seek()
    }

    /// Step to the first unit of the next run. Returns `false` once exhausted.
    pub fn next_node(&mut self) -> bool {
        if let Some(id) = self.current.take() {
            let node = self.tree.node(id);
            self.before[node.color.index()] += node.len - self.offset;
        }
        self.seek()
    }

    /// Advance to the first unit of the next run in `colors`, counting skipped runs.
    fn seek(&mut self) -> bool {
        while let Some(id) = self.pop_pending() {
            let node = self.tree.node(id);
            if self.colors.contains(node.color) {
                self.current = Some(id);
                self.offset = 0;
                return true;
            }
            self.before[node.color.index()] += node.len;
        }
        false
    }

    /// Index of the current unit counted under `colors`.
    ///
    /// For a unit outside `colors` this is the index the next unit of
    /// `colors` has.
    pub fn index(&self, colors: ColorSet) -> usize {
        colors.total(&self.before)
    }

    pub fn color(&self) -> Option<Color> {
        self.current.map(|id| self.tree.node(id).color)
    }

    pub fn value(&self) -> Option<&'a V> {
        let tree = self.tree;
        self.current.map(|id| &tree.node(id).value)
    }

    /// Offset of the current unit within its run.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Units from the current one to the end of its run; zero before the first step.
    pub fn run_remaining(&self) -> usize {
        self.current
            .map_or(0, |id| self.tree.node(id).len - self.offset)
    }
}
