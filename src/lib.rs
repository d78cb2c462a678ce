//! Compact immutable labeled trees and the columnar machinery they stand on.
//!
//! Three pieces fit together:
//!
//! * [`IndexedBitSet`]: an immutable bit sequence with constant-time `rank`
//!   and indexed `select`, a small fixed overhead past the raw bits.
//! * [`Column`] and [`Layout`]: immutable columnar sequences whose physical
//!   shape is described by a composable layout algebra (dense primitives,
//!   products, disjunctions, options, transforms, nested rows), each with a
//!   compact big-endian wire form.
//! * [`Tree`] and [`FullBinaryTree`]: succinct tree encodings that keep the
//!   shape in bitsets and the labels in columns, navigated by rank.
//!
//! Everything is built once through a builder and immutable afterwards;
//! queries are pure, and node handles are cheap `(tree, index)` pairs.

pub mod binary_tree;
pub mod bits;
pub mod bitset;
mod bytes;
pub mod column;
pub mod error;
pub mod layout;
pub mod primitive;
pub mod sums;
pub mod transform;
pub mod tree;
pub mod tuple;
pub mod vector;

pub use binary_tree::{BinaryNode, BinaryNodeRef, BinaryTreeSource, FullBinaryTree, SourceNode};
pub use bitset::{IndexedBitSet, IndexedBitSetBuilder};
pub use column::{Column, HeapSize};
pub use error::{Error, Result};
pub use layout::{ColumnBuilder, Layout, UnitLayout, Value};
pub use primitive::{DenseLayout, Primitive};
pub use sums::either::EitherLayout;
pub use sums::option::OptionalLayout;
pub use transform::TransformedLayout;
pub use tree::{NodeRef, Tree, TreeSource};
pub use tuple::{Zip3Layout, ZipLayout};
pub use vector::RowsLayout;
