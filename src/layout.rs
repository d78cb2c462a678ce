//! Layouts: how to build, serialize, and structurally identify columns.

use std::any::Any;
use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::column::{Column, Repr};
use crate::error::Result;
use crate::sums::either::EitherLayout;
use crate::sums::option::OptionalLayout;
use crate::transform::TransformedLayout;
use crate::tuple::ZipLayout;

/// A constructive description of how to build, read, write, and identify a
/// `Column<T>`.
///
/// Layouts are pure values with no hidden state; the combinators compose
/// them into products, disjunctions, options, and transforms.
pub trait Layout<T: 'static>: Clone + Send + Sync + 'static {
    type Builder: ColumnBuilder<T>;

    /// A fresh builder accepting values in sequence.
    fn new_builder(&self) -> Self::Builder;

    /// An empty column in this layout's natural representation.
    fn empty(&self) -> Column<T> {
        self.new_builder().finish()
    }

    /// Whether `column`'s physical shape already matches this layout, all
    /// the way down.
    fn is_safe_to_cast(&self, column: &Column<T>) -> bool;

    /// Writes `column` in this layout's wire form.
    ///
    /// A column whose representation does not match is rebuilt through the
    /// builder first; a matching one is written as-is.
    fn write<W: io::Write>(&self, column: &Column<T>, sink: &mut W) -> Result<()>;

    /// Reads back a column written by [`Layout::write`].
    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<T>>;

    /// Re-streams `column` through a fresh builder into the natural shape.
    fn rebuild(&self, column: &Column<T>) -> Column<T> {
        let mut builder = self.new_builder();
        builder.extend_from_column(column);
        builder.finish()
    }

    /// Pairs this layout with `right` into a product of the two.
    fn zip<U, V, L>(
        self,
        right: L,
        pack: fn(T, U) -> V,
        unpack: fn(V) -> (T, U),
    ) -> ZipLayout<T, U, V, Self, L>
    where
        U: 'static,
        V: 'static,
        L: Layout<U>,
    {
        ZipLayout::new(self, right, pack, unpack)
    }

    /// Views this layout's values through a pure function pair.
    fn transform<U: 'static>(
        self,
        there: fn(T) -> U,
        back: fn(U) -> T,
    ) -> TransformedLayout<T, U, Self> {
        TransformedLayout::new(self, there, back)
    }

    /// Lifts this layout over missing values with a presence bitset.
    fn optional(self) -> OptionalLayout<Self> {
        OptionalLayout::new(self)
    }

    /// Forms a disjunction with `right`; `Ok` values route left.
    fn either<U, V, L>(
        self,
        right: L,
        left_into: fn(T) -> V,
        right_into: fn(U) -> V,
        split: fn(V) -> std::result::Result<T, U>,
    ) -> EitherLayout<T, U, V, Self, L>
    where
        U: 'static,
        V: 'static,
        L: Layout<U>,
    {
        EitherLayout::new(self, right, left_into, right_into, split)
    }
}

/// A linear builder: values in, one immutable column out.
///
/// `finish` moves the accumulated arrays into the column; the only
/// meaningful call afterwards is `clear`.
pub trait ColumnBuilder<T> {
    fn push(&mut self, value: T);

    /// Bulk-pushes every value of `column`.
    ///
    /// Structural builders adopt a matching representation wholesale;
    /// the default streams value by value.
    fn extend_from_column(&mut self, column: &Column<T>) {
        for index in 0..column.len() {
            self.push(column.get(index));
        }
    }

    fn clear(&mut self);

    fn finish(&mut self) -> Column<T>;
}

/// Associates a canonical layout with a value type.
pub trait Value: Sized + Send + Sync + 'static {
    type Layout: Layout<Self>;
    fn layout() -> Self::Layout;
}

/// Stores only a length; every element is the unit value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitLayout;

pub struct UnitBuilder {
    len: usize,
}

pub(crate) struct Units {
    len: usize,
}

impl Repr<()> for Units {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, _index: usize) {}

    fn heap_size(&self) -> (usize, usize) {
        (0, 0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ColumnBuilder<()> for UnitBuilder {
    fn push(&mut self, _value: ()) {
        self.len += 1;
    }

    fn extend_from_column(&mut self, column: &Column<()>) {
        self.len += column.len();
    }

    fn clear(&mut self) {
        self.len = 0;
    }

    fn finish(&mut self) -> Column<()> {
        let len = std::mem::take(&mut self.len);
        Column::new(Units { len })
    }
}

impl Layout<()> for UnitLayout {
    type Builder = UnitBuilder;

    fn new_builder(&self) -> UnitBuilder {
        UnitBuilder { len: 0 }
    }

    fn is_safe_to_cast(&self, column: &Column<()>) -> bool {
        column.downcast_ref::<Units>().is_some()
    }

    fn write<W: io::Write>(&self, column: &Column<()>, sink: &mut W) -> Result<()> {
        sink.write_u32::<BigEndian>(column.len() as u32)?;
        Ok(())
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<()>> {
        let len = source.read_u32::<BigEndian>()? as usize;
        Ok(Column::new(Units { len }))
    }
}

impl Value for () {
    type Layout = UnitLayout;
    fn layout() -> UnitLayout {
        UnitLayout
    }
}
