//! Compact k-ary trees: a shape bitset plus one label per set bit.
//!
//! The source tree is rewritten on the fly into its left-child/right-sibling
//! binary form and laid out in breadth-first heap order. A set bit marks a
//! real node at that heap position; a clear bit marks an external slot.
//! From position `p`, the first child's slot is `2p + 1` and the next
//! sibling's slot is `2p + 2`; both are positions in the bitset, never
//! label indexes.

use std::collections::VecDeque;
use std::fmt;
use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::bitset::{IndexedBitSet, IndexedBitSetBuilder};
use crate::column::Column;
use crate::error::{Error, Result};
use crate::layout::{ColumnBuilder, Layout, Value};

const TREE_MAGIC: u64 = 0x0066_7978_8365_7301;

/// Read access to a user-supplied k-ary tree.
pub trait TreeSource {
    type Node;
    type Label;

    fn root(&self) -> Option<Self::Node>;
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    fn label(&self, node: &Self::Node) -> Self::Label;
}

/// A k-ary tree stored as a shape bitset and a label column.
pub struct Tree<A> {
    shape: IndexedBitSet,
    labels: Column<A>,
}

impl<A: 'static> Tree<A> {
    /// Encodes `source` with the canonical layout for its label type.
    pub fn from_source<S>(source: S) -> Self
    where
        S: TreeSource<Label = A>,
        A: Value,
    {
        Self::build(source, &A::layout())
    }

    /// Encodes `source`, building labels through `layout`.
    pub fn build<S, L>(source: S, layout: &L) -> Self
    where
        S: TreeSource<Label = A>,
        L: Layout<A>,
    {
        let mut shape = IndexedBitSetBuilder::new();
        let mut labels = layout.new_builder();
        // Queued entries are real nodes at their heap positions, each with
        // the siblings that follow it. Positions only grow along the queue,
        // so the gaps in between are exactly the external slots and can be
        // emitted as zeros on the way.
        let mut queue: VecDeque<(usize, S::Node, std::vec::IntoIter<S::Node>)> = VecDeque::new();
        if let Some(root) = source.root() {
            queue.push_back((0, root, Vec::new().into_iter()));
        }
        let mut next = 0;
        while let Some((position, node, mut siblings)) = queue.pop_front() {
            while next < position {
                shape.push(false);
                next += 1;
            }
            shape.push(true);
            next += 1;
            labels.push(source.label(&node));
            let mut children = source.children(&node).into_iter();
            if let Some(first) = children.next() {
                queue.push_back((2 * position + 1, first, children));
            }
            if let Some(sibling) = siblings.next() {
                queue.push_back((2 * position + 2, sibling, siblings));
            }
        }
        Tree { shape: shape.finish(), labels: labels.finish() }
    }

    /// The root node, unless the tree is empty.
    pub fn root(&self) -> Option<NodeRef<'_, A>> {
        self.node_at(0)
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// The number of real nodes.
    pub fn node_count(&self) -> usize {
        self.shape.count_ones()
    }

    fn node_at(&self, position: usize) -> Option<NodeRef<'_, A>> {
        if self.shape.contains(position) {
            Some(NodeRef { tree: self, position })
        } else {
            None
        }
    }

    /// Heap footprint as `(used, capacity)` bytes.
    pub fn heap_size(&self) -> (usize, usize) {
        let (su, sc) = self.shape.heap_size();
        let (lu, lc) = self.labels.heap_size();
        (su + lu, sc + lc)
    }

    /// Writes the tree: magic, labels, bitset length, bitset bytes.
    pub fn write<L, W>(&self, layout: &L, sink: &mut W) -> Result<()>
    where
        L: Layout<A>,
        W: io::Write,
    {
        sink.write_u64::<BigEndian>(TREE_MAGIC)?;
        layout.write(&self.labels, sink)?;
        sink.write_u32::<BigEndian>(self.shape.len() as u32)?;
        self.shape.write_to(sink)
    }

    /// Reads a tree written by [`Tree::write`].
    pub fn read<L, R>(layout: &L, source: &mut R) -> Result<Self>
    where
        L: Layout<A>,
        R: io::Read,
    {
        let magic = source.read_u64::<BigEndian>()?;
        if magic != TREE_MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let labels = layout.read(source)?;
        let len = source.read_u32::<BigEndian>()? as usize;
        let shape = IndexedBitSet::read_from(source, len)?;
        Ok(Tree { shape, labels })
    }
}

impl<A: PartialEq> PartialEq for Tree<A> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.labels == other.labels
    }
}

impl<A> fmt::Debug for Tree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.shape.count_ones())
            .field("slots", &self.shape.len())
            .finish()
    }
}

/// A node handle: the tree plus a bitset position.
pub struct NodeRef<'t, A> {
    tree: &'t Tree<A>,
    position: usize,
}

impl<A> Clone for NodeRef<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for NodeRef<'_, A> {}

impl<'t, A: 'static> NodeRef<'t, A> {
    /// This node's label.
    pub fn label(&self) -> A {
        self.tree.labels.get(self.tree.shape.rank(self.position) - 1)
    }

    pub fn first_child(&self) -> Option<NodeRef<'t, A>> {
        self.tree.node_at(2 * self.position + 1)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'t, A>> {
        self.tree.node_at(2 * self.position + 2)
    }

    /// This node's children, eldest first.
    pub fn children(&self) -> Children<'t, A> {
        Children { next: self.first_child() }
    }
}

/// Iterator over a node's children along the sibling chain.
pub struct Children<'t, A> {
    next: Option<NodeRef<'t, A>>,
}

impl<'t, A: 'static> Iterator for Children<'t, A> {
    type Item = NodeRef<'t, A>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next_sibling();
        Some(current)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::primitive::DenseLayout;

    #[derive(Debug, PartialEq)]
    struct Plain {
        data: i32,
        kids: Vec<Plain>,
    }

    impl Plain {
        fn leaf(data: i32) -> Plain {
            Plain { data, kids: Vec::new() }
        }
    }

    impl<'a> TreeSource for &'a Plain {
        type Node = &'a Plain;
        type Label = i32;

        fn root(&self) -> Option<&'a Plain> {
            Some(*self)
        }

        fn children(&self, node: &&'a Plain) -> Vec<&'a Plain> {
            node.kids.iter().collect()
        }

        fn label(&self, node: &&'a Plain) -> i32 {
            node.data
        }
    }

    struct Barren;

    impl TreeSource for Barren {
        type Node = ();
        type Label = i32;

        fn root(&self) -> Option<()> {
            None
        }

        fn children(&self, _node: &()) -> Vec<()> {
            Vec::new()
        }

        fn label(&self, _node: &()) -> i32 {
            unreachable!()
        }
    }

    fn reconstruct(node: NodeRef<'_, i32>) -> Plain {
        Plain {
            data: node.label(),
            kids: node.children().map(reconstruct).collect(),
        }
    }

    fn sample() -> Plain {
        Plain {
            data: 1,
            kids: vec![
                Plain { data: 2, kids: vec![Plain::leaf(5), Plain::leaf(6)] },
                Plain::leaf(3),
                Plain { data: 4, kids: vec![Plain::leaf(7)] },
            ],
        }
    }

    #[test]
    fn round_trip_structure() {
        let source = sample();
        let tree = Tree::from_source(&source);
        assert_eq!(tree.node_count(), 7);
        let root = tree.root().unwrap();
        assert_eq!(root.label(), 1);
        assert_eq!(reconstruct(root), source);
    }

    #[test]
    fn sibling_chain_navigation() {
        let source = sample();
        let tree = Tree::from_source(&source);
        let root = tree.root().unwrap();
        let labels: Vec<i32> = root.children().map(|child| child.label()).collect();
        assert_eq!(labels, vec![2, 3, 4]);
        let first = root.first_child().unwrap();
        assert_eq!(first.next_sibling().unwrap().label(), 3);
        assert!(first.first_child().unwrap().first_child().is_none());
    }

    #[test]
    fn single_node() {
        let source = Plain::leaf(42);
        let tree = Tree::from_source(&source);
        assert_eq!(tree.node_count(), 1);
        let root = tree.root().unwrap();
        assert_eq!(root.label(), 42);
        assert!(root.first_child().is_none());
        assert!(root.next_sibling().is_none());
        assert_eq!(root.children().count(), 0);
    }

    #[test]
    fn empty_tree() {
        let tree = Tree::<i32>::from_source(Barren);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn serialization_round_trips() {
        let layout = DenseLayout::<i32>::new();
        let source = sample();
        let tree = Tree::build(&source, &layout);

        let mut buffer = Vec::new();
        tree.write(&layout, &mut buffer).unwrap();
        let read = Tree::read(&layout, &mut buffer.as_slice()).unwrap();
        assert_eq!(read, tree);
        assert_eq!(reconstruct(read.root().unwrap()), source);
    }

    #[test]
    fn empty_tree_serializes() {
        let layout = DenseLayout::<i32>::new();
        let tree = Tree::build(Barren, &layout);
        let mut buffer = Vec::new();
        tree.write(&layout, &mut buffer).unwrap();
        let read = Tree::read(&layout, &mut buffer.as_slice()).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut buffer = Vec::new();
        Tree::from_source(&sample())
            .write(&DenseLayout::<i32>::new(), &mut buffer)
            .unwrap();
        buffer[7] = 0xFF;
        let result = Tree::<i32>::read(&DenseLayout::<i32>::new(), &mut buffer.as_slice());
        assert!(matches!(result, Err(Error::BadMagic(_))));
    }
}
