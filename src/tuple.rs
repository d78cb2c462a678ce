//! Products stored as parallel columns, one per component.

use std::any::Any;
use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::column::{Column, Repr};
use crate::error::{Error, Result};
use crate::layout::{ColumnBuilder, Layout, Value};

const PRODUCT_TAG: u8 = 1;

pub(crate) struct Pairs<A, B, T> {
    pub(crate) left: Column<A>,
    pub(crate) right: Column<B>,
    pack: fn(A, B) -> T,
}

impl<A: 'static, B: 'static, T: 'static> Repr<T> for Pairs<A, B, T> {
    fn len(&self) -> usize {
        self.left.len()
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        (self.pack)(self.left.get(index), self.right.get(index))
    }

    fn heap_size(&self) -> (usize, usize) {
        let (lu, lc) = self.left.heap_size();
        let (ru, rc) = self.right.heap_size();
        (lu + ru, lc + rc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A product of two layouts, packed and unpacked by a pure function pair.
pub struct ZipLayout<A, B, T, LA, LB> {
    left: LA,
    right: LB,
    pack: fn(A, B) -> T,
    unpack: fn(T) -> (A, B),
}

impl<A, B, T, LA, LB> ZipLayout<A, B, T, LA, LB> {
    pub fn new(left: LA, right: LB, pack: fn(A, B) -> T, unpack: fn(T) -> (A, B)) -> Self {
        ZipLayout { left, right, pack, unpack }
    }
}

impl<A, B, T, LA: Clone, LB: Clone> Clone for ZipLayout<A, B, T, LA, LB> {
    fn clone(&self) -> Self {
        ZipLayout {
            left: self.left.clone(),
            right: self.right.clone(),
            pack: self.pack,
            unpack: self.unpack,
        }
    }
}

pub struct ZipBuilder<A, B, T, BA, BB> {
    left: BA,
    right: BB,
    pack: fn(A, B) -> T,
    unpack: fn(T) -> (A, B),
}

impl<A, B, T, BA, BB> ColumnBuilder<T> for ZipBuilder<A, B, T, BA, BB>
where
    A: 'static,
    B: 'static,
    T: 'static,
    BA: ColumnBuilder<A>,
    BB: ColumnBuilder<B>,
{
    #[inline]
    fn push(&mut self, value: T) {
        let (left, right) = (self.unpack)(value);
        self.left.push(left);
        self.right.push(right);
    }

    fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    fn finish(&mut self) -> Column<T> {
        Column::new(Pairs {
            left: self.left.finish(),
            right: self.right.finish(),
            pack: self.pack,
        })
    }
}

impl<A, B, T, LA, LB> Layout<T> for ZipLayout<A, B, T, LA, LB>
where
    A: 'static,
    B: 'static,
    T: 'static,
    LA: Layout<A>,
    LB: Layout<B>,
{
    type Builder = ZipBuilder<A, B, T, LA::Builder, LB::Builder>;

    fn new_builder(&self) -> Self::Builder {
        ZipBuilder {
            left: self.left.new_builder(),
            right: self.right.new_builder(),
            pack: self.pack,
            unpack: self.unpack,
        }
    }

    fn is_safe_to_cast(&self, column: &Column<T>) -> bool {
        match column.downcast_ref::<Pairs<A, B, T>>() {
            Some(pairs) => {
                self.left.is_safe_to_cast(&pairs.left) && self.right.is_safe_to_cast(&pairs.right)
            }
            None => false,
        }
    }

    fn write<W: io::Write>(&self, column: &Column<T>, sink: &mut W) -> Result<()> {
        let rebuilt;
        let column = if self.is_safe_to_cast(column) {
            column
        } else {
            rebuilt = self.rebuild(column);
            &rebuilt
        };
        let pairs = column.downcast_ref::<Pairs<A, B, T>>().expect("product column after rebuild");
        sink.write_u8(PRODUCT_TAG)?;
        self.left.write(&pairs.left, sink)?;
        self.right.write(&pairs.right, sink)
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<T>> {
        match source.read_u8()? {
            PRODUCT_TAG => {
                let left = self.left.read(source)?;
                let right = self.right.read(source)?;
                Ok(Column::new(Pairs { left, right, pack: self.pack }))
            }
            tag => Err(Error::UnknownTag(tag)),
        }
    }
}

pub(crate) struct Triples<A, B, C, T> {
    pub(crate) first: Column<A>,
    pub(crate) second: Column<B>,
    pub(crate) third: Column<C>,
    pack: fn(A, B, C) -> T,
}

impl<A: 'static, B: 'static, C: 'static, T: 'static> Repr<T> for Triples<A, B, C, T> {
    fn len(&self) -> usize {
        self.first.len()
    }

    #[inline]
    fn get(&self, index: usize) -> T {
        (self.pack)(self.first.get(index), self.second.get(index), self.third.get(index))
    }

    fn heap_size(&self) -> (usize, usize) {
        let (au, ac) = self.first.heap_size();
        let (bu, bc) = self.second.heap_size();
        let (cu, cc) = self.third.heap_size();
        (au + bu + cu, ac + bc + cc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A ternary product; the same scheme as [`ZipLayout`] with three legs.
pub struct Zip3Layout<A, B, C, T, LA, LB, LC> {
    first: LA,
    second: LB,
    third: LC,
    pack: fn(A, B, C) -> T,
    unpack: fn(T) -> (A, B, C),
}

impl<A, B, C, T, LA, LB, LC> Zip3Layout<A, B, C, T, LA, LB, LC> {
    pub fn new(
        first: LA,
        second: LB,
        third: LC,
        pack: fn(A, B, C) -> T,
        unpack: fn(T) -> (A, B, C),
    ) -> Self {
        Zip3Layout { first, second, third, pack, unpack }
    }
}

impl<A, B, C, T, LA: Clone, LB: Clone, LC: Clone> Clone for Zip3Layout<A, B, C, T, LA, LB, LC> {
    fn clone(&self) -> Self {
        Zip3Layout {
            first: self.first.clone(),
            second: self.second.clone(),
            third: self.third.clone(),
            pack: self.pack,
            unpack: self.unpack,
        }
    }
}

pub struct Zip3Builder<A, B, C, T, BA, BB, BC> {
    first: BA,
    second: BB,
    third: BC,
    pack: fn(A, B, C) -> T,
    unpack: fn(T) -> (A, B, C),
}

impl<A, B, C, T, BA, BB, BC> ColumnBuilder<T> for Zip3Builder<A, B, C, T, BA, BB, BC>
where
    A: 'static,
    B: 'static,
    C: 'static,
    T: 'static,
    BA: ColumnBuilder<A>,
    BB: ColumnBuilder<B>,
    BC: ColumnBuilder<C>,
{
    #[inline]
    fn push(&mut self, value: T) {
        let (first, second, third) = (self.unpack)(value);
        self.first.push(first);
        self.second.push(second);
        self.third.push(third);
    }

    fn clear(&mut self) {
        self.first.clear();
        self.second.clear();
        self.third.clear();
    }

    fn finish(&mut self) -> Column<T> {
        Column::new(Triples {
            first: self.first.finish(),
            second: self.second.finish(),
            third: self.third.finish(),
            pack: self.pack,
        })
    }
}

impl<A, B, C, T, LA, LB, LC> Layout<T> for Zip3Layout<A, B, C, T, LA, LB, LC>
where
    A: 'static,
    B: 'static,
    C: 'static,
    T: 'static,
    LA: Layout<A>,
    LB: Layout<B>,
    LC: Layout<C>,
{
    type Builder = Zip3Builder<A, B, C, T, LA::Builder, LB::Builder, LC::Builder>;

    fn new_builder(&self) -> Self::Builder {
        Zip3Builder {
            first: self.first.new_builder(),
            second: self.second.new_builder(),
            third: self.third.new_builder(),
            pack: self.pack,
            unpack: self.unpack,
        }
    }

    fn is_safe_to_cast(&self, column: &Column<T>) -> bool {
        match column.downcast_ref::<Triples<A, B, C, T>>() {
            Some(triples) => {
                self.first.is_safe_to_cast(&triples.first)
                    && self.second.is_safe_to_cast(&triples.second)
                    && self.third.is_safe_to_cast(&triples.third)
            }
            None => false,
        }
    }

    fn write<W: io::Write>(&self, column: &Column<T>, sink: &mut W) -> Result<()> {
        let rebuilt;
        let column = if self.is_safe_to_cast(column) {
            column
        } else {
            rebuilt = self.rebuild(column);
            &rebuilt
        };
        let triples = column
            .downcast_ref::<Triples<A, B, C, T>>()
            .expect("product column after rebuild");
        sink.write_u8(PRODUCT_TAG)?;
        self.first.write(&triples.first, sink)?;
        self.second.write(&triples.second, sink)?;
        self.third.write(&triples.third, sink)
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<T>> {
        match source.read_u8()? {
            PRODUCT_TAG => {
                let first = self.first.read(source)?;
                let second = self.second.read(source)?;
                let third = self.third.read(source)?;
                Ok(Column::new(Triples { first, second, third, pack: self.pack }))
            }
            tag => Err(Error::UnknownTag(tag)),
        }
    }
}

impl<A: Value, B: Value> Value for (A, B) {
    type Layout = ZipLayout<A, B, (A, B), A::Layout, B::Layout>;

    fn layout() -> Self::Layout {
        A::layout().zip(B::layout(), |left, right| (left, right), |pair| pair)
    }
}

impl<A: Value, B: Value, C: Value> Value for (A, B, C) {
    type Layout = Zip3Layout<A, B, C, (A, B, C), A::Layout, B::Layout, C::Layout>;

    fn layout() -> Self::Layout {
        Zip3Layout::new(
            A::layout(),
            B::layout(),
            C::layout(),
            |first, second, third| (first, second, third),
            |triple| triple,
        )
    }
}
