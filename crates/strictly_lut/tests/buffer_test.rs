//! Sorted buffer behaviour under random inserts, for every width.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strictly_lut::{AnyValueBuffer, U8Buffer, U16Buffer, U32Buffer, U64Buffer, ValueBuffer, ValueType};

const INSERTS: usize = 10_000;

/// Appends random values one at a time, sorting each into place, then checks
/// binary search agrees with a linear scan.
fn check_sorted_inserts(value_type: ValueType, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buffer = AnyValueBuffer::new(value_type, INSERTS);
    let max = value_type.max_value();
    let mut inserted = Vec::with_capacity(INSERTS);

    for len in 0..INSERTS {
        let value = rng.random_range(1..=max);
        buffer.set_u64(len, value).expect("value fits");
        // The slots past `len` still hold zeros, so sort within the prefix.
        let placed = buffer
            .move_into_sorted_place_within(len, 0, len + 1)
            .expect("index in range");
        assert_eq!(buffer.get_u64(placed).expect("in range"), value);
        inserted.push(value);
    }

    inserted.sort_unstable();
    for (index, expected) in inserted.iter().enumerate() {
        assert_eq!(buffer.get_u64(index).expect("in range"), *expected, "{} at {}", value_type, index);
    }

    for _ in 0..1_000 {
        let probe = rng.random_range(0..=max);
        let linear = buffer.index_of(probe, 0, INSERTS);
        match buffer.index_of_binary_search(probe, 0, INSERTS) {
            Ok(index) => {
                assert_eq!(buffer.get_u64(index).expect("in range"), probe);
                assert!(linear.is_some(), "{} found by binary search only", probe);
            }
            Err(insertion) => {
                assert!(linear.is_none(), "{} found by linear scan only", probe);
                if insertion > 0 {
                    assert!(buffer.get_u64(insertion - 1).expect("in range") < probe);
                }
                if insertion < INSERTS {
                    assert!(buffer.get_u64(insertion).expect("in range") > probe);
                }
            }
        }
    }

    for value in inserted.iter().step_by(97) {
        let index = buffer
            .index_of_binary_search(*value, 0, INSERTS)
            .expect("inserted value is present");
        assert_eq!(buffer.get_u64(index).expect("in range"), *value);
    }
}

#[test]
fn test_sorted_inserts_u8() {
    check_sorted_inserts(ValueType::U8, 1);
}

#[test]
fn test_sorted_inserts_u16() {
    check_sorted_inserts(ValueType::U16, 2);
}

#[test]
fn test_sorted_inserts_u32() {
    check_sorted_inserts(ValueType::U32, 3);
}

#[test]
fn test_sorted_inserts_u64() {
    check_sorted_inserts(ValueType::U64, 4);
}

/// Keeps a full sorted buffer sorted while random slots are overwritten.
fn check_overwrites_stay_sorted(value_type: ValueType, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let max = value_type.max_value();
    let mut reference: Vec<u64> = (0..INSERTS).map(|_| rng.random_range(0..=max)).collect();
    reference.sort_unstable();

    let mut buffer = AnyValueBuffer::new(value_type, INSERTS);
    for (index, value) in reference.iter().enumerate() {
        buffer.set_u64(index, *value).expect("value fits");
    }

    for round in 0..INSERTS {
        let index = rng.random_range(0..INSERTS);
        let value = rng.random_range(0..=max);
        let old = buffer.set_u64(index, value).expect("value fits");
        let placed = buffer.move_into_sorted_place(index).expect("index in range");
        assert_eq!(buffer.get_u64(placed).expect("in range"), value);

        let stale = reference.binary_search(&old).expect("old value is tracked");
        reference.remove(stale);
        let slot = reference.partition_point(|v| *v < value);
        reference.insert(slot, value);

        if round % 1_000 == 0 {
            for (position, expected) in reference.iter().enumerate() {
                assert_eq!(buffer.get_u64(position).expect("in range"), *expected);
            }
        }
    }

    for (position, expected) in reference.iter().enumerate() {
        assert_eq!(buffer.get_u64(position).expect("in range"), *expected, "{} at {}", value_type, position);
    }

    for _ in 0..1_000 {
        let probe = rng.random_range(0..=max);
        let linear = buffer.index_of(probe, 0, INSERTS);
        match buffer.index_of_binary_search(probe, 0, INSERTS) {
            Ok(index) => {
                assert_eq!(buffer.get_u64(index).expect("in range"), probe);
                assert!(linear.is_some());
            }
            Err(_) => assert!(linear.is_none()),
        }
    }
    for value in reference.iter().step_by(89) {
        let linear = buffer.index_of(*value, 0, INSERTS).expect("present");
        let found = buffer
            .index_of_binary_search(*value, 0, INSERTS)
            .expect("present");
        assert_eq!(buffer.get_u64(found).expect("in range"), buffer.get_u64(linear).expect("in range"));
    }
}

#[test]
fn test_overwrites_stay_sorted_u8() {
    check_overwrites_stay_sorted(ValueType::U8, 11);
}

#[test]
fn test_overwrites_stay_sorted_u16() {
    check_overwrites_stay_sorted(ValueType::U16, 12);
}

#[test]
fn test_overwrites_stay_sorted_u32() {
    check_overwrites_stay_sorted(ValueType::U32, 13);
}

#[test]
fn test_overwrites_stay_sorted_u64() {
    check_overwrites_stay_sorted(ValueType::U64, 14);
}

fn write_then_read<B: ValueBuffer + PartialEq + std::fmt::Debug>(buffer: &B, empty: B) {
    let mut bytes = Vec::new();
    buffer.write_contents(&mut bytes).expect("write to vec");
    assert_eq!(bytes.len(), buffer.capacity() * B::VALUE_TYPE.byte_width());

    let mut read = empty;
    read.read_contents(&mut bytes.as_slice()).expect("read from slice");
    assert_eq!(&read, buffer);
}

#[test]
fn test_contents_survive_a_write_and_read() {
    write_then_read(&U8Buffer::from_values(vec![0, 1, 200, 255]), U8Buffer::new(4));
    write_then_read(&U16Buffer::from_values(vec![0, 258, u16::MAX]), U16Buffer::new(3));
    write_then_read(
        &U32Buffer::from_values((0..70_000).map(|v| v * 61_000).collect()),
        U32Buffer::new(70_000),
    );
    write_then_read(&U64Buffer::from_values(vec![u64::MAX, 1 << 40, 7]), U64Buffer::new(3));
}
