//! Lazily mapped columns: a pure function pair over an underlying layout.
//!
//! The builder applies `back` before storing; reads apply `there` on the
//! way out. On the wire a transformed column is byte-identical to its
//! underlying column.

use std::any::Any;
use std::io;

use crate::column::{Column, Repr};
use crate::error::Result;
use crate::layout::{ColumnBuilder, Layout};

pub(crate) struct Mapped<A, B> {
    pub(crate) inner: Column<A>,
    there: fn(A) -> B,
}

impl<A: 'static, B: 'static> Repr<B> for Mapped<A, B> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    fn get(&self, index: usize) -> B {
        (self.there)(self.inner.get(index))
    }

    fn heap_size(&self) -> (usize, usize) {
        self.inner.heap_size()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Views an underlying layout's values through a pure function pair.
pub struct TransformedLayout<A, B, L> {
    inner: L,
    there: fn(A) -> B,
    back: fn(B) -> A,
}

impl<A, B, L> TransformedLayout<A, B, L> {
    pub fn new(inner: L, there: fn(A) -> B, back: fn(B) -> A) -> Self {
        TransformedLayout { inner, there, back }
    }
}

impl<A, B, L: Clone> Clone for TransformedLayout<A, B, L> {
    fn clone(&self) -> Self {
        TransformedLayout {
            inner: self.inner.clone(),
            there: self.there,
            back: self.back,
        }
    }
}

pub struct TransformedBuilder<A, B, BA> {
    inner: BA,
    there: fn(A) -> B,
    back: fn(B) -> A,
}

impl<A, B, BA> ColumnBuilder<B> for TransformedBuilder<A, B, BA>
where
    A: 'static,
    B: 'static,
    BA: ColumnBuilder<A>,
{
    #[inline]
    fn push(&mut self, value: B) {
        self.inner.push((self.back)(value));
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn finish(&mut self) -> Column<B> {
        Column::new(Mapped { inner: self.inner.finish(), there: self.there })
    }
}

impl<A, B, L> Layout<B> for TransformedLayout<A, B, L>
where
    A: 'static,
    B: 'static,
    L: Layout<A>,
{
    type Builder = TransformedBuilder<A, B, L::Builder>;

    fn new_builder(&self) -> Self::Builder {
        TransformedBuilder {
            inner: self.inner.new_builder(),
            there: self.there,
            back: self.back,
        }
    }

    fn is_safe_to_cast(&self, column: &Column<B>) -> bool {
        match column.downcast_ref::<Mapped<A, B>>() {
            Some(mapped) => self.inner.is_safe_to_cast(&mapped.inner),
            None => false,
        }
    }

    fn write<W: io::Write>(&self, column: &Column<B>, sink: &mut W) -> Result<()> {
        let rebuilt;
        let column = if self.is_safe_to_cast(column) {
            column
        } else {
            rebuilt = self.rebuild(column);
            &rebuilt
        };
        let mapped = column
            .downcast_ref::<Mapped<A, B>>()
            .expect("transformed column after rebuild");
        self.inner.write(&mapped.inner, sink)
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<B>> {
        Ok(Column::new(Mapped { inner: self.inner.read(source)?, there: self.there }))
    }
}
