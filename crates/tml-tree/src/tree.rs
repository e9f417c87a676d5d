//! Run-length compressed, four-color order-statistics tree.
//!
//! The tree is an AVL tree keyed implicitly by absolute position. Each node
//! holds a *run*: `len` consecutive units sharing one color and one value.
//! Every node also stores, per color, the number of units in its subtree,
//! which makes rank and select under any [`ColorSet`] an O(log n) walk.
//!
//! ```text
//!                 [U x1 | counts + 1 U 1 X 2 _ 3]
//!                /                                \
//!     [_ x1 | _ 1]                      [+ x1 | + 1 X 2 _ 2]
//!                                       /                  \
//!                             [X x2 | X 2]             [_ x2 | _ 2]
//! ```
//!
//! Mutations are expressed through `split` and `join3` (join-based AVL):
//! a range operation splits the tree at both ends of the range, replaces
//! the middle, and stitches the pieces back together. Stitching merges runs
//! that end up adjacent with equal color and value, so the tree never holds
//! two neighbouring runs that could be one.
//!
//! Nodes live in an arena and are addressed by `NodeId` handles. Nothing
//! outside the tree holds a handle across a mutation: cursors borrow the tree.

use crate::color::{Color, ColorSet, COLOR_COUNT};
use crate::cursor::TreeCursor;
use crate::error::{Result, TreeError};
use std::fmt;

/// Handle of a node inside the tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) color: Color,
    pub(crate) value: V,
    pub(crate) len: usize,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    height: u32,
    /// Units of each color in this subtree, this node included.
    counts: [usize; COLOR_COUNT],
}

impl<V> Node<V> {
    fn new(color: Color, value: V, len: usize) -> Self {
        let mut counts = [0; COLOR_COUNT];
        counts[color.index()] = len;
        Self {
            color,
            value,
            len,
            left: None,
            right: None,
            height: 1,
            counts,
        }
    }
}

/// Where a unit lives: its run, the offset inside the run and its absolute position.
#[derive(Clone, Copy, Debug)]
struct Location {
    node: NodeId,
    offset: usize,
    position: usize,
}

/// Read-only view of the unit found by [`PositionTree::get`].
#[derive(Debug)]
pub struct Element<'a, V> {
    color: Color,
    value: &'a V,
    offset: usize,
    run_length: usize,
    position: usize,
}

impl<'a, V> Element<'a, V> {
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn value(&self) -> &'a V {
        self.value
    }

    /// Offset of this unit inside its run.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the whole run containing this unit.
    pub fn run_length(&self) -> usize {
        self.run_length
    }

    /// Units from this one to the end of its run, this one included.
    pub fn run_remaining(&self) -> usize {
        self.run_length - self.offset
    }

    /// Absolute position of this unit.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// An order-statistics multiset over colored, valued, run-length-compressed units.
#[derive(Clone)]
pub struct PositionTree<V> {
    nodes: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl<V> Default for PositionTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PositionTree<V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    /// Number of units whose color is in `colors`.
    pub fn size(&self, colors: ColorSet) -> usize {
        colors.total(&self.counts(self.root))
    }

    /// Total number of units, all colors.
    pub fn len(&self) -> usize {
        self.weight(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of runs currently stored.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Drop every unit.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
    }

    /// Translate an index counted under `from` into the index counted under
    /// `to` at the same absolute position.
    ///
    /// `index == size(from)` maps to `size(to)`. When the unit at `index` is
    /// not itself in `to`, the result is the index the next `to` unit has.
    pub fn convert_index_color(&self, index: usize, from: ColorSet, to: ColorSet) -> Result<usize> {
        let size = self.size(from);
        if index == size {
            return Ok(self.size(to));
        }
        let location = self
            .locate(index, from)
            .ok_or(TreeError::OutOfRange { index, size })?;
        Ok(self.count_before(location.position, to))
    }

    /// The unit at `index` counted under `colors`.
    pub fn get(&self, index: usize, colors: ColorSet) -> Result<Element<'_, V>> {
        let location = self.locate(index, colors).ok_or(TreeError::OutOfRange {
            index,
            size: self.size(colors),
        })?;
        let node = self.node(location.node);
        Ok(Element {
            color: node.color,
            value: &node.value,
            offset: location.offset,
            run_length: node.len,
            position: location.position,
        })
    }

    /// Cursor visiting only the units whose color is in `colors`.
    pub fn cursor(&self, colors: ColorSet) -> TreeCursor<'_, V> {
        TreeCursor::new(self, colors)
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<V> {
        match &self.nodes[id.index()] {
            Some(node) => node,
            None => unreachable!("dangling node handle {:?}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match &mut self.nodes[id.index()] {
            Some(node) => node,
            None => unreachable!("dangling node handle {:?}", id),
        }
    }

    fn height(&self, tree: Option<NodeId>) -> u32 {
        tree.map_or(0, |id| self.node(id).height)
    }

    fn counts(&self, tree: Option<NodeId>) -> [usize; COLOR_COUNT] {
        tree.map_or([0; COLOR_COUNT], |id| self.node(id).counts)
    }

    fn weight(&self, tree: Option<NodeId>) -> usize {
        self.counts(tree).iter().sum()
    }

    fn count_in(&self, tree: Option<NodeId>, colors: ColorSet) -> usize {
        colors.total(&self.counts(tree))
    }

    /// Find the `index`-th unit among those colored in `colors`.
    fn locate(&self, mut index: usize, colors: ColorSet) -> Option<Location> {
        let mut tree = self.root;
        let mut base = 0;
        while let Some(id) = tree {
            let node = self.node(id);
            let left_count = self.count_in(node.left, colors);
            if index < left_count {
                tree = node.left;
                continue;
            }
            index -= left_count;
            base += self.weight(node.left);
            let own = if colors.contains(node.color) { node.len } else { 0 };
            if index < own {
                return Some(Location {
                    node: id,
                    offset: index,
                    position: base + index,
                });
            }
            index -= own;
            base += node.len;
            tree = node.right;
        }
        None
    }

    /// Units colored in `colors` strictly before absolute `position`.
    fn count_before(&self, mut position: usize, colors: ColorSet) -> usize {
        let mut tree = self.root;
        let mut count = 0;
        while let Some(id) = tree {
            let node = self.node(id);
            let left_weight = self.weight(node.left);
            if position < left_weight {
                tree = node.left;
                continue;
            }
            count += self.count_in(node.left, colors);
            let rest = position - left_weight;
            let own = colors.contains(node.color);
            if rest <= node.len {
                return count + if own { rest } else { 0 };
            }
            if own {
                count += node.len;
            }
            position = rest - node.len;
            tree = node.right;
        }
        count
    }

    /// Right-most absolute position with exactly `index` units of `colors` before it.
    fn insertion_point(&self, index: usize, colors: ColorSet) -> Result<usize> {
        let size = self.size(colors);
        if index == size {
            return Ok(self.len());
        }
        self.locate(index, colors)
            .map(|location| location.position)
            .ok_or(TreeError::OutOfRange { index, size })
    }

    /// Absolute start of a `length`-unit range beginning at the `index`-th unit of `colors`.
    fn range_start(&self, index: usize, colors: ColorSet, length: usize) -> Result<usize> {
        let location = self.locate(index, colors).ok_or(TreeError::OutOfRange {
            index,
            size: self.size(colors),
        })?;
        let size = self.len();
        if location.position + length > size {
            return Err(TreeError::RangeOverflow {
                start: location.position,
                length,
                size,
            });
        }
        Ok(location.position)
    }

    fn alloc(&mut self, color: Color, value: V, len: usize) -> NodeId {
        let node = Node::new(color, value, len);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Some(node));
                id
            }
        }
    }

    fn release_node(&mut self, id: NodeId) {
        self.nodes[id.index()] = None;
        self.free.push(id);
    }

    fn release(&mut self, tree: Option<NodeId>) {
        let mut stack: Vec<NodeId> = tree.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            stack.extend(node.left);
            stack.extend(node.right);
            self.release_node(id);
        }
    }

    /// Recompute height and aggregates of `id` from its children.
    fn update(&mut self, id: NodeId) {
        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };
        let height = 1 + self.height(left).max(self.height(right));
        let mut counts = self.counts(left);
        for (total, count) in counts.iter_mut().zip(self.counts(right)) {
            *total += count;
        }
        let node = self.node_mut(id);
        counts[node.color.index()] += node.len;
        node.height = height;
        node.counts = counts;
    }

    fn attach(&mut self, id: NodeId, left: Option<NodeId>, right: Option<NodeId>) {
        let node = self.node_mut(id);
        node.left = left;
        node.right = right;
        self.update(id);
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.node(id).right else {
            return id;
        };
        let left = self.node(id).left;
        let inner = self.node(pivot).left;
        self.attach(id, left, inner);
        let outer = self.node(pivot).right;
        self.attach(pivot, Some(id), outer);
        pivot
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.node(id).left else {
            return id;
        };
        let right = self.node(id).right;
        let inner = self.node(pivot).right;
        self.attach(id, inner, right);
        let outer = self.node(pivot).left;
        self.attach(pivot, outer, Some(id));
        pivot
    }

    /// Concatenate `left`, the detached node `mid`, and `right`, rebalancing.
    fn join3(&mut self, left: Option<NodeId>, mid: NodeId, right: Option<NodeId>) -> NodeId {
        let left_height = self.height(left);
        let right_height = self.height(right);
        match (left, right) {
            (Some(l), _) if left_height > right_height + 1 => self.join_right(l, mid, right),
            (_, Some(r)) if right_height > left_height + 1 => self.join_left(left, mid, r),
            _ => {
                self.attach(mid, left, right);
                mid
            }
        }
    }

    /// `join3` when `left` is the taller side: descend its right spine.
    fn join_right(&mut self, left: NodeId, mid: NodeId, right: Option<NodeId>) -> NodeId {
        let (outer, spine) = {
            let node = self.node(left);
            (node.left, node.right)
        };
        match spine {
            Some(child) if self.height(spine) > self.height(right) + 1 => {
                let joined = self.join_right(child, mid, right);
                self.attach(left, outer, Some(joined));
                if self.height(Some(joined)) <= self.height(outer) + 1 {
                    left
                } else {
                    self.rotate_left(left)
                }
            }
            _ => {
                self.attach(mid, spine, right);
                if self.height(Some(mid)) <= self.height(outer) + 1 {
                    self.attach(left, outer, Some(mid));
                    left
                } else {
                    let rotated = self.rotate_right(mid);
                    self.attach(left, outer, Some(rotated));
                    self.rotate_left(left)
                }
            }
        }
    }

    /// Mirror image of `join_right`.
    fn join_left(&mut self, left: Option<NodeId>, mid: NodeId, right: NodeId) -> NodeId {
        let (spine, outer) = {
            let node = self.node(right);
            (node.left, node.right)
        };
        match spine {
            Some(child) if self.height(spine) > self.height(left) + 1 => {
                let joined = self.join_left(left, mid, child);
                self.attach(right, Some(joined), outer);
                if self.height(Some(joined)) <= self.height(outer) + 1 {
                    right
                } else {
                    self.rotate_right(right)
                }
            }
            _ => {
                self.attach(mid, left, spine);
                if self.height(Some(mid)) <= self.height(outer) + 1 {
                    self.attach(right, Some(mid), outer);
                    right
                } else {
                    let rotated = self.rotate_left(mid);
                    self.attach(right, Some(rotated), outer);
                    self.rotate_right(right)
                }
            }
        }
    }

    /// Detach the right-most node. Returns the remaining tree and that node.
    fn pop_last(&mut self, id: NodeId) -> (Option<NodeId>, NodeId) {
        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };
        match right {
            None => {
                self.attach(id, None, None);
                (left, id)
            }
            Some(right) => {
                let (rest, last) = self.pop_last(right);
                (Some(self.join3(left, id, rest)), last)
            }
        }
    }

    /// Detach the left-most node. Returns that node and the remaining tree.
    fn pop_first(&mut self, id: NodeId) -> (NodeId, Option<NodeId>) {
        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };
        match left {
            None => {
                self.attach(id, None, None);
                (id, right)
            }
            Some(left) => {
                let (first, rest) = self.pop_first(left);
                (first, Some(self.join3(rest, id, right)))
            }
        }
    }

    fn last_of(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.node(id).right {
            id = right;
        }
        id
    }

    fn first_of(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }
}

impl<V: Clone + PartialEq> PositionTree<V> {
    /// Insert `length` units of `color`/`value` so that exactly `index` units
    /// of `colors` precede them. Units of other colors sitting at that
    /// boundary stay in front of the new run.
    pub fn add(&mut self, index: usize, colors: ColorSet, color: Color, value: V, length: usize) -> Result<()> {
        let position = self.insertion_point(index, colors)?;
        if length == 0 {
            return Ok(());
        }
        let (left, right) = self.split(self.root, position);
        let node = self.alloc(color, value, length);
        self.root = self.stitch(left, Some(node), right);
        Ok(())
    }

    /// Append `length` units of `color`/`value` after every existing unit.
    pub fn append(&mut self, color: Color, value: V, length: usize) {
        if length == 0 {
            return;
        }
        let node = self.alloc(color, value, length);
        self.root = self.stitch(self.root, Some(node), None);
    }

    /// Remove `length` consecutive units starting at the `index`-th unit of `colors`.
    pub fn remove(&mut self, index: usize, colors: ColorSet, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let start = self.range_start(index, colors, length)?;
        let (left, rest) = self.split(self.root, start);
        let (middle, right) = self.split(rest, length);
        self.release(middle);
        self.root = self.stitch(left, None, right);
        Ok(())
    }

    /// Recolor and revalue `length` consecutive units starting at the
    /// `index`-th unit of `colors`. The total unit count is unchanged.
    pub fn set(&mut self, index: usize, colors: ColorSet, color: Color, value: V, length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let start = self.range_start(index, colors, length)?;
        let (left, rest) = self.split(self.root, start);
        let (middle, right) = self.split(rest, length);
        self.release(middle);
        let node = self.alloc(color, value, length);
        self.root = self.stitch(left, Some(node), right);
        Ok(())
    }

    /// Split into the first `position` units and the rest, cutting a run in two if needed.
    fn split(&mut self, tree: Option<NodeId>, position: usize) -> (Option<NodeId>, Option<NodeId>) {
        let Some(id) = tree else {
            return (None, None);
        };
        let (left, right, len) = {
            let node = self.node(id);
            (node.left, node.right, node.len)
        };
        let left_weight = self.weight(left);
        if position <= left_weight {
            let (outer, inner) = self.split(left, position);
            (outer, Some(self.join3(inner, id, right)))
        } else if position >= left_weight + len {
            let (inner, outer) = self.split(right, position - left_weight - len);
            (Some(self.join3(left, id, inner)), outer)
        } else {
            let head = position - left_weight;
            let (color, value) = {
                let node = self.node(id);
                (node.color, node.value.clone())
            };
            let tail = self.alloc(color, value, len - head);
            self.node_mut(id).len = head;
            let front = self.join3(left, id, None);
            let back = self.join3(None, tail, right);
            (Some(front), Some(back))
        }
    }

    fn mergeable(&self, a: NodeId, b: NodeId) -> bool {
        let (a, b) = (self.node(a), self.node(b));
        a.color == b.color && a.value == b.value
    }

    /// Concatenate `left`, an optional detached `middle` node and `right`,
    /// fusing runs that meet at either seam.
    fn stitch(&mut self, left: Option<NodeId>, middle: Option<NodeId>, right: Option<NodeId>) -> Option<NodeId> {
        match middle {
            Some(mid) => {
                let left = self.absorb_last(left, mid);
                let right = self.absorb_first(right, mid);
                Some(self.join3(left, mid, right))
            }
            None => {
                let (Some(left), Some(right)) = (left, right) else {
                    return left.or(right);
                };
                let (first, rest) = self.pop_first(right);
                let left = self.absorb_last(Some(left), first);
                Some(self.join3(left, first, rest))
            }
        }
    }

    /// Fold the last run of `tree` into the detached node `into` when they match.
    fn absorb_last(&mut self, tree: Option<NodeId>, into: NodeId) -> Option<NodeId> {
        let root = tree?;
        if !self.mergeable(self.last_of(root), into) {
            return tree;
        }
        let (rest, last) = self.pop_last(root);
        let len = self.node(last).len;
        self.node_mut(into).len += len;
        self.release_node(last);
        rest
    }

    /// Fold the first run of `tree` into the detached node `into` when they match.
    fn absorb_first(&mut self, tree: Option<NodeId>, into: NodeId) -> Option<NodeId> {
        let root = tree?;
        if !self.mergeable(self.first_of(root), into) {
            return tree;
        }
        let (first, rest) = self.pop_first(root);
        let len = self.node(first).len;
        self.node_mut(into).len += len;
        self.release_node(first);
        rest
    }
}

impl<V: fmt::Debug> fmt::Debug for PositionTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs = f.debug_list();
        let mut cursor = self.cursor(ColorSet::ALL);
        while cursor.next_node() {
            if let (Some(color), Some(value)) = (cursor.color(), cursor.value()) {
                runs.entry(&(color.symbol(), cursor.run_remaining(), value));
            }
        }
        runs.finish()
    }
}
