//! Dense columns of fixed-width primitives and strings.
//!
//! Each write picks one of two wire forms: plain elements, or a byte
//! dictionary of at most 255 distinct values with one index byte per
//! element. One-byte element types always write plain, since an index byte
//! cannot undercut the element itself.

use std::io;
use std::marker::PhantomData;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::bytes;
use crate::column::{Column, HeapSize};
use crate::error::{Error, Result};
use crate::layout::{ColumnBuilder, Layout, Value};

const PLAIN_TAG: u8 = 0;
const DICTIONARY_TAG: u8 = 1;
/// Most dictionary entries a reader accepts; writers bail one short of it.
const DICTIONARY_LIMIT: usize = 256;

/// A fixed-width element (or string) with a big-endian wire codec.
pub trait Primitive: Clone + PartialEq + HeapSize + Send + Sync + 'static {
    /// Whether writes may choose the byte-dictionary form.
    const DICTIONARY: bool;

    fn write_value<W: io::Write>(&self, sink: &mut W) -> Result<()>;
    fn read_value<R: io::Read>(source: &mut R) -> Result<Self>;
}

macro_rules! implement_primitive {
    ($($ty:ty, $write:ident, $read:ident;)*) => { $(
        impl Primitive for $ty {
            const DICTIONARY: bool = true;

            #[inline]
            fn write_value<W: io::Write>(&self, sink: &mut W) -> Result<()> {
                sink.$write::<BigEndian>(*self)?;
                Ok(())
            }

            #[inline]
            fn read_value<R: io::Read>(source: &mut R) -> Result<Self> {
                Ok(source.$read::<BigEndian>()?)
            }
        }
    )* }
}

implement_primitive! {
    i16, write_i16, read_i16;
    i32, write_i32, read_i32;
    i64, write_i64, read_i64;
    f32, write_f32, read_f32;
    f64, write_f64, read_f64;
    u16, write_u16, read_u16;
}

impl Primitive for bool {
    const DICTIONARY: bool = false;

    #[inline]
    fn write_value<W: io::Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_u8(*self as u8)?;
        Ok(())
    }

    #[inline]
    fn read_value<R: io::Read>(source: &mut R) -> Result<Self> {
        Ok(source.read_u8()? != 0)
    }
}

impl Primitive for i8 {
    const DICTIONARY: bool = false;

    #[inline]
    fn write_value<W: io::Write>(&self, sink: &mut W) -> Result<()> {
        sink.write_i8(*self)?;
        Ok(())
    }

    #[inline]
    fn read_value<R: io::Read>(source: &mut R) -> Result<Self> {
        Ok(source.read_i8()?)
    }
}

impl Primitive for String {
    const DICTIONARY: bool = true;

    fn write_value<W: io::Write>(&self, sink: &mut W) -> Result<()> {
        bytes::write_string(self, sink)
    }

    fn read_value<R: io::Read>(source: &mut R) -> Result<Self> {
        bytes::read_string(source)
    }
}

/// The dense layout for primitive element type `T`.
pub struct DenseLayout<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> DenseLayout<T> {
    pub fn new() -> Self {
        DenseLayout { marker: PhantomData }
    }
}

impl<T> Default for DenseLayout<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DenseLayout<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DenseLayout<T> {}

pub struct DenseBuilder<T> {
    values: Vec<T>,
}

impl<T: Primitive> ColumnBuilder<T> for DenseBuilder<T> {
    #[inline]
    fn push(&mut self, value: T) {
        self.values.push(value);
    }

    fn extend_from_column(&mut self, column: &Column<T>) {
        match column.downcast_ref::<Vec<T>>() {
            Some(values) => self.values.extend_from_slice(values),
            None => {
                for index in 0..column.len() {
                    self.values.push(column.get(index));
                }
            }
        }
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn finish(&mut self) -> Column<T> {
        Column::new(std::mem::take(&mut self.values))
    }
}

impl<T: Primitive> Layout<T> for DenseLayout<T> {
    type Builder = DenseBuilder<T>;

    fn new_builder(&self) -> DenseBuilder<T> {
        DenseBuilder { values: Vec::new() }
    }

    fn is_safe_to_cast(&self, column: &Column<T>) -> bool {
        column.downcast_ref::<Vec<T>>().is_some()
    }

    fn write<W: io::Write>(&self, column: &Column<T>, sink: &mut W) -> Result<()> {
        let rebuilt;
        let column = if self.is_safe_to_cast(column) {
            column
        } else {
            rebuilt = self.rebuild(column);
            &rebuilt
        };
        let values = column.downcast_ref::<Vec<T>>().expect("dense column after rebuild");
        write_values(values, sink)
    }

    fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<T>> {
        Ok(Column::new(read_values::<T, R>(source)?))
    }
}

pub(crate) fn write_values<T: Primitive, W: io::Write>(values: &[T], sink: &mut W) -> Result<()> {
    if T::DICTIONARY {
        if let Some((dictionary, indexes)) = build_dictionary(values) {
            sink.write_u8(DICTIONARY_TAG)?;
            sink.write_u32::<BigEndian>(dictionary.len() as u32)?;
            for value in &dictionary {
                value.write_value(sink)?;
            }
            sink.write_u32::<BigEndian>(indexes.len() as u32)?;
            sink.write_all(&indexes)?;
            return Ok(());
        }
    }
    sink.write_u8(PLAIN_TAG)?;
    sink.write_u32::<BigEndian>(values.len() as u32)?;
    for value in values {
        value.write_value(sink)?;
    }
    Ok(())
}

/// Greedy dictionary build; bails once a 256th distinct value appears.
fn build_dictionary<T: Clone + PartialEq>(values: &[T]) -> Option<(Vec<T>, Vec<u8>)> {
    let mut dictionary: Vec<T> = Vec::new();
    let mut indexes = Vec::with_capacity(values.len());
    for value in values {
        let at = match dictionary.iter().position(|seen| seen == value) {
            Some(at) => at,
            None => {
                dictionary.push(value.clone());
                if dictionary.len() == DICTIONARY_LIMIT {
                    return None;
                }
                dictionary.len() - 1
            }
        };
        indexes.push(at as u8);
    }
    Some((dictionary, indexes))
}

pub(crate) fn read_values<T: Primitive, R: io::Read>(source: &mut R) -> Result<Vec<T>> {
    match source.read_u8()? {
        PLAIN_TAG => {
            let len = source.read_u32::<BigEndian>()? as usize;
            let mut values = Vec::with_capacity(len);
            for _ in 0..len {
                values.push(T::read_value(source)?);
            }
            Ok(values)
        }
        DICTIONARY_TAG => {
            let entries = source.read_u32::<BigEndian>()? as usize;
            if entries > DICTIONARY_LIMIT {
                return Err(Error::DictionaryTooLarge(entries));
            }
            let mut dictionary = Vec::with_capacity(entries);
            for _ in 0..entries {
                dictionary.push(T::read_value(source)?);
            }
            let len = source.read_u32::<BigEndian>()? as usize;
            let mut indexes = vec![0u8; len];
            source.read_exact(&mut indexes)?;
            indexes
                .into_iter()
                .map(|index| {
                    dictionary
                        .get(index as usize)
                        .cloned()
                        .ok_or(Error::BadDictionaryIndex(index))
                })
                .collect()
        }
        tag => Err(Error::UnknownTag(tag)),
    }
}

macro_rules! implement_value {
    ($($ty:ty),*) => { $(
        impl Value for $ty {
            type Layout = DenseLayout<$ty>;
            fn layout() -> DenseLayout<$ty> {
                DenseLayout::new()
            }
        }
    )* }
}

implement_value!(bool, i8, i16, i32, i64, f32, f64, u16, String);
