//! Columns for sum types: variants stored separately, addressed through a
//! rank bitset over the discriminants.

pub mod option {
    //! `Option` columns: present values stored densely behind a presence
    //! bitset.

    use std::any::Any;
    use std::io;

    use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

    use crate::bitset::{IndexedBitSet, IndexedBitSetBuilder};
    use crate::column::{Column, Repr};
    use crate::error::{Error, Result};
    use crate::layout::{ColumnBuilder, Layout, Value};

    const OPTIONAL_TAG: u8 = 1;

    pub(crate) struct Options<A> {
        pub(crate) presence: IndexedBitSet,
        pub(crate) somes: Column<A>,
    }

    impl<A: 'static> Repr<Option<A>> for Options<A> {
        fn len(&self) -> usize {
            self.presence.len()
        }

        #[inline]
        fn get(&self, index: usize) -> Option<A> {
            if self.presence.contains(index) {
                Some(self.somes.get(self.presence.rank(index) - 1))
            } else {
                None
            }
        }

        fn heap_size(&self) -> (usize, usize) {
            let (pu, pc) = self.presence.heap_size();
            let (su, sc) = self.somes.heap_size();
            (pu + su, pc + sc)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// Lifts an inner layout over `Option`.
    #[derive(Clone)]
    pub struct OptionalLayout<L> {
        somes: L,
    }

    impl<L> OptionalLayout<L> {
        pub fn new(somes: L) -> Self {
            OptionalLayout { somes }
        }
    }

    pub struct OptionalBuilder<BA> {
        presence: IndexedBitSetBuilder,
        somes: BA,
    }

    impl<A: 'static, BA: ColumnBuilder<A>> ColumnBuilder<Option<A>> for OptionalBuilder<BA> {
        #[inline]
        fn push(&mut self, value: Option<A>) {
            match value {
                Some(value) => {
                    self.presence.push(true);
                    self.somes.push(value);
                }
                None => self.presence.push(false),
            }
        }

        fn extend_from_column(&mut self, column: &Column<Option<A>>) {
            match column.downcast_ref::<Options<A>>() {
                Some(options) => {
                    for bit in options.presence.iter() {
                        self.presence.push(bit);
                    }
                    self.somes.extend_from_column(&options.somes);
                }
                None => {
                    for index in 0..column.len() {
                        self.push(column.get(index));
                    }
                }
            }
        }

        fn clear(&mut self) {
            self.presence.clear();
            self.somes.clear();
        }

        fn finish(&mut self) -> Column<Option<A>> {
            Column::new(Options {
                presence: self.presence.finish(),
                somes: self.somes.finish(),
            })
        }
    }

    impl<A: 'static, L: Layout<A>> Layout<Option<A>> for OptionalLayout<L> {
        type Builder = OptionalBuilder<L::Builder>;

        fn new_builder(&self) -> Self::Builder {
            OptionalBuilder {
                presence: IndexedBitSetBuilder::new(),
                somes: self.somes.new_builder(),
            }
        }

        fn is_safe_to_cast(&self, column: &Column<Option<A>>) -> bool {
            match column.downcast_ref::<Options<A>>() {
                Some(options) => self.somes.is_safe_to_cast(&options.somes),
                None => false,
            }
        }

        fn write<W: io::Write>(&self, column: &Column<Option<A>>, sink: &mut W) -> Result<()> {
            let rebuilt;
            let column = if self.is_safe_to_cast(column) {
                column
            } else {
                rebuilt = self.rebuild(column);
                &rebuilt
            };
            let options = column
                .downcast_ref::<Options<A>>()
                .expect("optional column after rebuild");
            sink.write_u8(OPTIONAL_TAG)?;
            self.somes.write(&options.somes, sink)?;
            sink.write_u32::<BigEndian>(options.presence.len() as u32)?;
            options.presence.write_to(sink)
        }

        fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<Option<A>>> {
            match source.read_u8()? {
                OPTIONAL_TAG => {
                    let somes = self.somes.read(source)?;
                    let len = source.read_u32::<BigEndian>()? as usize;
                    let presence = IndexedBitSet::read_from(source, len)?;
                    Ok(Column::new(Options { presence, somes }))
                }
                tag => Err(Error::UnknownTag(tag)),
            }
        }
    }

    impl<A: Value> Value for Option<A> {
        type Layout = OptionalLayout<A::Layout>;

        fn layout() -> Self::Layout {
            A::layout().optional()
        }
    }

}

pub mod either {
    //! Disjunction columns: left and right variants stored separately, with
    //! a discriminator bitset set for left.

    use std::any::Any;
    use std::io;

    use crate::bitset::{IndexedBitSet, IndexedBitSetBuilder};
    use crate::column::{Column, Repr};
    use crate::error::Result;
    use crate::layout::{ColumnBuilder, Layout, Value};

    pub(crate) struct Eithers<A, B, T> {
        pub(crate) tags: IndexedBitSet,
        pub(crate) lefts: Column<A>,
        pub(crate) rights: Column<B>,
        left_into: fn(A) -> T,
        right_into: fn(B) -> T,
    }

    impl<A: 'static, B: 'static, T: 'static> Repr<T> for Eithers<A, B, T> {
        fn len(&self) -> usize {
            self.tags.len()
        }

        #[inline]
        fn get(&self, index: usize) -> T {
            let rank = self.tags.rank(index);
            if self.tags.contains(index) {
                (self.left_into)(self.lefts.get(rank - 1))
            } else {
                (self.right_into)(self.rights.get(index - rank))
            }
        }

        fn heap_size(&self) -> (usize, usize) {
            let (tu, tc) = self.tags.heap_size();
            let (lu, lc) = self.lefts.heap_size();
            let (ru, rc) = self.rights.heap_size();
            (tu + lu + ru, tc + lc + rc)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A disjunction of two layouts; values split by a pure function.
    pub struct EitherLayout<A, B, T, LA, LB> {
        lefts: LA,
        rights: LB,
        left_into: fn(A) -> T,
        right_into: fn(B) -> T,
        split: fn(T) -> std::result::Result<A, B>,
    }

    impl<A, B, T, LA, LB> EitherLayout<A, B, T, LA, LB> {
        pub fn new(
            lefts: LA,
            rights: LB,
            left_into: fn(A) -> T,
            right_into: fn(B) -> T,
            split: fn(T) -> std::result::Result<A, B>,
        ) -> Self {
            EitherLayout { lefts, rights, left_into, right_into, split }
        }
    }

    impl<A, B, T, LA: Clone, LB: Clone> Clone for EitherLayout<A, B, T, LA, LB> {
        fn clone(&self) -> Self {
            EitherLayout {
                lefts: self.lefts.clone(),
                rights: self.rights.clone(),
                left_into: self.left_into,
                right_into: self.right_into,
                split: self.split,
            }
        }
    }

    pub struct EitherBuilder<A, B, T, BA, BB> {
        tags: IndexedBitSetBuilder,
        lefts: BA,
        rights: BB,
        left_into: fn(A) -> T,
        right_into: fn(B) -> T,
        split: fn(T) -> std::result::Result<A, B>,
    }

    impl<A, B, T, BA, BB> ColumnBuilder<T> for EitherBuilder<A, B, T, BA, BB>
    where
        A: 'static,
        B: 'static,
        T: 'static,
        BA: ColumnBuilder<A>,
        BB: ColumnBuilder<B>,
    {
        #[inline]
        fn push(&mut self, value: T) {
            match (self.split)(value) {
                Ok(left) => {
                    self.tags.push(true);
                    self.lefts.push(left);
                }
                Err(right) => {
                    self.tags.push(false);
                    self.rights.push(right);
                }
            }
        }

        fn clear(&mut self) {
            self.tags.clear();
            self.lefts.clear();
            self.rights.clear();
        }

        fn finish(&mut self) -> Column<T> {
            Column::new(Eithers {
                tags: self.tags.finish(),
                lefts: self.lefts.finish(),
                rights: self.rights.finish(),
                left_into: self.left_into,
                right_into: self.right_into,
            })
        }
    }

    impl<A, B, T, LA, LB> Layout<T> for EitherLayout<A, B, T, LA, LB>
    where
        A: 'static,
        B: 'static,
        T: 'static,
        LA: Layout<A>,
        LB: Layout<B>,
    {
        type Builder = EitherBuilder<A, B, T, LA::Builder, LB::Builder>;

        fn new_builder(&self) -> Self::Builder {
            EitherBuilder {
                tags: IndexedBitSetBuilder::new(),
                lefts: self.lefts.new_builder(),
                rights: self.rights.new_builder(),
                left_into: self.left_into,
                right_into: self.right_into,
                split: self.split,
            }
        }

        fn is_safe_to_cast(&self, column: &Column<T>) -> bool {
            match column.downcast_ref::<Eithers<A, B, T>>() {
                Some(eithers) => {
                    self.lefts.is_safe_to_cast(&eithers.lefts)
                        && self.rights.is_safe_to_cast(&eithers.rights)
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
            let eithers = column
                .downcast_ref::<Eithers<A, B, T>>()
                .expect("disjunction column after rebuild");
            self.lefts.write(&eithers.lefts, sink)?;
            self.rights.write(&eithers.rights, sink)?;
            eithers.tags.write_to(sink)
        }

        fn read<R: io::Read>(&self, source: &mut R) -> Result<Column<T>> {
            let lefts = self.lefts.read(source)?;
            let rights = self.rights.read(source)?;
            let tags = IndexedBitSet::read_from(source, lefts.len() + rights.len())?;
            Ok(Column::new(Eithers {
                tags,
                lefts,
                rights,
                left_into: self.left_into,
                right_into: self.right_into,
            }))
        }
    }

    impl<A: Value, B: Value> Value for std::result::Result<A, B> {
        type Layout = EitherLayout<A, B, Self, A::Layout, B::Layout>;

        fn layout() -> Self::Layout {
            A::layout().either(B::layout(), Ok, Err, |value| value)
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn variants_split_by_discriminator() {
            let layout = std::result::Result::<i32, String>::layout();
            let values: Vec<std::result::Result<i32, String>> =
                vec![Ok(1), Err("a".to_string()), Ok(2), Err("b".to_string())];
            let mut builder = layout.new_builder();
            for value in values.iter().cloned() {
                builder.push(value);
            }
            let column = builder.finish();

            let eithers = column.downcast_ref::<Eithers<i32, String, std::result::Result<i32, String>>>().unwrap();
            assert_eq!(eithers.tags.iter().collect::<Vec<_>>(), vec![true, false, true, false]);
            assert_eq!(eithers.lefts.iter().collect::<Vec<_>>(), vec![1, 2]);
            assert_eq!(
                eithers.rights.iter().collect::<Vec<_>>(),
                vec!["a".to_string(), "b".to_string()]
            );
            assert_eq!(column.iter().collect::<Vec<_>>(), values);
        }

        #[test]
        fn round_trip() {
            let layout = std::result::Result::<i32, String>::layout();
            let values: Vec<std::result::Result<i32, String>> =
                (0..100).map(|i| if i % 3 == 0 { Ok(i) } else { Err(format!("e{i}")) }).collect();
            let mut builder = layout.new_builder();
            for value in values.iter().cloned() {
                builder.push(value);
            }
            let column = builder.finish();
            assert!(layout.is_safe_to_cast(&column));

            let mut buffer = Vec::new();
            layout.write(&column, &mut buffer).unwrap();
            let read = layout.read(&mut buffer.as_slice()).unwrap();
            assert_eq!(read, column);
        }

        #[test]
        fn one_sided_round_trips() {
            let layout = std::result::Result::<i64, bool>::layout();
            let mut builder = layout.new_builder();
            for i in 0..20 {
                builder.push(Ok(i));
            }
            let column = builder.finish();
            let mut buffer = Vec::new();
            layout.write(&column, &mut buffer).unwrap();
            let read = layout.read(&mut buffer.as_slice()).unwrap();
            assert_eq!(read, column);
        }
    }
}
