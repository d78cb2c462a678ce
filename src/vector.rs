//! Nested sequences: a flat value column plus per-row start offsets.

use std::any::Any;
use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::column::{Column, Repr};
use crate::error::{Error, Result};
use crate::layout::{ColumnBuilder, Layout, Value};
use crate::primitive;

const ROWS_TAG: u8 = 1;

pub(crate) struct Rows<A> {
    /// Start of each row in `values`; the last row ends at `values.len()`.
    pub(crate) offsets: Vec<i32>,
    pub(crate) values: Column<A>,
}

impl<A: 'static> Repr<Vec<A>> for Rows<A> {
    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn get(&self, index: usize) -> Vec<A> {
        let lower = self.offsets[index] as usize;
        let upper = if index + 1 < self.offsets.len() {
            self.offsets[index + 1] as usize
        } else {
            self.values.len()
        };
        (lower..upper).map(|at| self.values.get(at)).collect()
    }

    fn heap_size(&self) -> (usize, usize) {
        let offsets = std::mem::size_of::<i32>();
        let (vu, vc) = self.values.heap_size();
        (offsets * self.offsets.len() + vu, offsets * self.offsets.capacity() + vc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Sequences of rows flattened into one value column.
#[derive(Clone)]
pub struct RowsLayout<L> {
    values: L,
}

impl<L> RowsLayout<L> {
    pub fn new(values: L) -> Self {
        RowsLayout { values }
    }
}

pub struct RowsBuilder<BA> {
    offsets: Vec<i32>,
    values: BA,
    written: usize,
}

impl<A: 'static, BA: ColumnBuilder<A>> ColumnBuilder<Vec<A>> for RowsBuilder<BA> {
    fn push(&mut self, row: Vec<A>) {
        self.offsets.push(self.written as i32);
        self.written += row.len();
        for value in row {
            self.values.push(value);
        }
    }

    fn extend_from_column(&mut self, column: &Column<Vec<A>>) {
        match column.downcast_ref::<Rows<A>>() {
            Some(rows) => {
                let base = self.written as i32;
                for &offset in &rows.offsets {
                    self.offsets.push(base + offset);
                }
                self.written += rows.values.len();
                self.values.extend_from_column(&rows.values);
            }
            None => {
                for index in 0..column.len() {
                    self.push(column.get(index));
                }
            }
        }
    }

    fn clear(&mut self) {
        self.offsets.clear();
        self.values.clear();
        self.written = 0;
    }

    fn finish(&mut self) -> Column<Vec<A>> {
        let offsets = std::mem::take(&mut self.offsets);
        self.written = 0;
        Column::new(Rows { offsets, values: self.values.finish() })
    }
}

impl<A: 'static, L: Layout<A>> Layout<Vec<A>> for RowsLayout<L> {
    type Builder = RowsBuilder<L::Builder>;

    fn new_builder(&self) -> Self::Builder {
        RowsBuilder { offsets: Vec::new(), values: self.values.new_builder(), written: 0 }
    }

    fn is_safe_to_cast(&self, column: &Column<Vec<A>>) -> bool {
        match column.downcast_ref::<Rows<A>>() {
            Some(rows) => self.values.is_safe_to_cast(&rows.values),
            None => false,
        }
    }

    fn write<W: io::Write>(&self, column: &Column<Vec<A>>, sink: &mut W) -> Result<()> {
        let rebuilt;
        let column = if self.is_safe_to_cast(column) {
            column
        } else {
            rebuilt = self.rebuild(column);
            &rebuilt
        };
        let rows = column.downcast_ref::<Rows<A>>().expect("row column after rebuild");
        sink.write_u8(ROWS_TAG)?;
        primitive::write_values(&rows.offsets, sink)?;
        self.values.write(&rows.values, sink)
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<Vec<A>>> {
        match source.read_u8()? {
            ROWS_TAG => {
                let offsets = primitive::read_values::<i32, R>(source)?;
                let values = self.values.read(source)?;
                Ok(Column::new(Rows { offsets, values }))
            }
            tag => Err(Error::UnknownTag(tag)),
        }
    }
}

impl<A: Value> Value for Vec<A> {
    type Layout = RowsLayout<A::Layout>;

    fn layout() -> Self::Layout {
        RowsLayout::new(A::layout())
    }
}
