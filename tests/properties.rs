use proptest::prelude::*;

use bonsai::{Column, ColumnBuilder, IndexedBitSet, Layout, Value};

fn built<T: Value>(values: &[T]) -> Column<T>
where
    T: Clone,
{
    let mut builder = T::layout().new_builder();
    for value in values.iter().cloned() {
        builder.push(value);
    }
    builder.finish()
}

fn round_tripped<T: Value>(column: &Column<T>) -> Column<T> {
    let layout = T::layout();
    let mut buffer = Vec::new();
    layout.write(column, &mut buffer).unwrap();
    layout.read(&mut buffer.as_slice()).unwrap()
}

proptest! {
    #[test]
    fn bitset_agrees_with_linear_model(bits in prop::collection::vec(any::<bool>(), 0..3000)) {
        let set = IndexedBitSet::from_bits(bits.iter().copied());
        prop_assert_eq!(set.len(), bits.len());

        let mut ones = 0;
        for (index, &bit) in bits.iter().enumerate() {
            prop_assert_eq!(set.contains(index), bit);
            if bit {
                ones += 1;
                prop_assert_eq!(set.select(ones), index);
            }
            prop_assert_eq!(set.rank(index), ones);
        }
        prop_assert_eq!(set.count_ones(), ones);
    }

    #[test]
    fn bitset_bytes_round_trip(bits in prop::collection::vec(any::<bool>(), 0..2200)) {
        let set = IndexedBitSet::from_bits(bits.iter().copied());
        let mut buffer = Vec::new();
        set.write_to(&mut buffer).unwrap();
        let read = IndexedBitSet::read_from(&mut buffer.as_slice(), bits.len()).unwrap();
        prop_assert_eq!(&read, &set);
        prop_assert_eq!(read.iter().collect::<Vec<_>>(), bits);
    }

    #[test]
    fn dense_columns_round_trip(values in prop::collection::vec(any::<i32>(), 0..500)) {
        let column = built(&values);
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn string_columns_round_trip(
        values in prop::collection::vec("[a-d]{0,3}", 0..300),
    ) {
        // A small alphabet keeps some inputs under the dictionary limit and
        // pushes others over it.
        let column = built(&values);
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn optional_columns_round_trip(
        values in prop::collection::vec(prop::option::of(any::<i32>()), 0..500),
    ) {
        let column = built(&values);
        let present = values.iter().filter(|value| value.is_some()).count();
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(column.iter().filter(|value| value.is_some()).count(), present);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn disjunction_columns_round_trip(
        values in prop::collection::vec(
            prop_oneof![
                any::<i32>().prop_map(Ok::<i32, String>),
                "[a-z]{0,4}".prop_map(Err::<i32, String>),
            ],
            0..300,
        ),
    ) {
        let column: Column<Result<i32, String>> = built(&values);
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn product_columns_round_trip(
        values in prop::collection::vec((any::<i32>(), any::<bool>(), -1e9..1e9f64), 0..300),
    ) {
        let column = built(&values);
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn row_columns_round_trip(
        values in prop::collection::vec(prop::collection::vec(any::<i16>(), 0..6), 0..120),
    ) {
        let column = built(&values);
        prop_assert_eq!(column.iter().collect::<Vec<_>>(), values);
        prop_assert_eq!(round_tripped(&column), column);
    }

    #[test]
    fn equal_builds_hash_equal(values in prop::collection::vec(any::<i64>(), 0..200)) {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let first = built(&values);
        let second = built(&values);
        prop_assert_eq!(&first, &second);

        let hash = |column: &Column<i64>| {
            let mut hasher = DefaultHasher::new();
            column.hash(&mut hasher);
            hasher.finish()
        };
        prop_assert_eq!(hash(&first), hash(&second));
    }

    #[test]
    fn aligned_writes_are_stable(
        values in prop::collection::vec(prop::option::of(any::<i16>()), 0..300),
    ) {
        // A column read back from the wire is already in the natural shape,
        // so writing it again must not disturb a single byte.
        let layout = Option::<i16>::layout();
        let column = built(&values);
        let mut first = Vec::new();
        layout.write(&column, &mut first).unwrap();
        let read = layout.read(&mut first.as_slice()).unwrap();
        prop_assert!(layout.is_safe_to_cast(&read));
        let mut second = Vec::new();
        layout.write(&read, &mut second).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn mixed_representation_writes_rebuild() {
    // Built through a transform, the column's physical shape is the mapped
    // wrapper, not the optional layout's natural shape.
    let identity = Option::<i32>::layout().transform(|value| value, |value| value);
    let mut builder = identity.new_builder();
    for value in [Some(1), None, Some(3), None] {
        builder.push(value);
    }
    let mapped = builder.finish();

    let natural = Option::<i32>::layout();
    assert!(!natural.is_safe_to_cast(&mapped));
    let mut buffer = Vec::new();
    natural.write(&mapped, &mut buffer).unwrap();
    let read = natural.read(&mut buffer.as_slice()).unwrap();
    assert!(natural.is_safe_to_cast(&read));
    assert_eq!(read, mapped);
}

#[test]
fn builders_clear_for_reuse() {
    let layout = <(i32, String)>::layout();
    let mut builder = layout.new_builder();
    builder.push((1, "one".to_string()));
    let first = builder.finish();
    assert_eq!(first.len(), 1);

    builder.clear();
    builder.push((2, "two".to_string()));
    builder.push((3, "three".to_string()));
    let second = builder.finish();
    assert_eq!(second.len(), 2);
    assert_eq!(second.get(0), (2, "two".to_string()));
}

#[test]
fn columns_are_shareable_across_threads() {
    let column = built(&(0..1000).collect::<Vec<i64>>());
    let clone = column.clone();
    let handle = std::thread::spawn(move || clone.iter().sum::<i64>());
    let there = handle.join().unwrap();
    assert_eq!(there, column.iter().sum::<i64>());
}
