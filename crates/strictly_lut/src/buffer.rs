//! Fixed-width value buffers.
//!
//! Each width has its own concrete buffer so that a table of billions of
//! entries costs exactly `width` bytes per entry. [`AnyValueBuffer`] tags
//! the four widths for code that picks a width at runtime.
//!
//! Searching and sorting treat values as unsigned integers.

use crate::error::BufferError;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Values written or read per chunk when streaming a buffer.
const IO_CHUNK: usize = 1 << 16;

// ─────────────────────────────────────────────────────────────
//  Value types
// ─────────────────────────────────────────────────────────────

/// Width of the values held by a buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// 8-bit values.
    U8,
    /// 16-bit values.
    U16,
    /// 32-bit values.
    U32,
    /// 64-bit values.
    U64,
}

impl ValueType {
    /// Stable numeric id used in file headers.
    pub fn id(self) -> u8 {
        match self {
            ValueType::U8 => 1,
            ValueType::U16 => 2,
            ValueType::U32 => 3,
            ValueType::U64 => 4,
        }
    }

    /// Looks up a value type by its id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(ValueType::U8),
            2 => Some(ValueType::U16),
            3 => Some(ValueType::U32),
            4 => Some(ValueType::U64),
            _ => None,
        }
    }

    /// Bytes per value.
    pub fn byte_width(self) -> usize {
        match self {
            ValueType::U8 => 1,
            ValueType::U16 => 2,
            ValueType::U32 => 4,
            ValueType::U64 => 8,
        }
    }

    /// Largest value the type can hold.
    pub fn max_value(self) -> u64 {
        match self {
            ValueType::U8 => u64::from(u8::MAX),
            ValueType::U16 => u64::from(u16::MAX),
            ValueType::U32 => u64::from(u32::MAX),
            ValueType::U64 => u64::MAX,
        }
    }

    /// Narrowest type that can hold `max`.
    pub fn smallest_for(max: u64) -> Self {
        [ValueType::U8, ValueType::U16, ValueType::U32]
            .into_iter()
            .find(|value_type| max <= value_type.max_value())
            .unwrap_or(ValueType::U64)
    }
}

// ─────────────────────────────────────────────────────────────
//  Buffer contract
// ─────────────────────────────────────────────────────────────

fn out_of_range(index: usize, capacity: usize) -> BufferError {
    BufferError::new(format!(
        "Index {} is out of range for a buffer of {} values",
        index, capacity
    ))
}

fn clamp_range(start: usize, end: usize, capacity: usize) -> (usize, usize) {
    let end = end.min(capacity);
    (start.min(end), end)
}

/// A fixed-capacity array of unsigned values of one width.
pub trait ValueBuffer {
    /// The unsigned integer type stored.
    type Value: Copy + Ord + Into<u64> + TryFrom<u64>;

    /// Width of the stored values.
    const VALUE_TYPE: ValueType;

    /// Number of values the buffer holds.
    fn capacity(&self) -> usize;

    /// The values.
    fn as_slice(&self) -> &[Self::Value];

    /// The values, mutably.
    fn as_mut_slice(&mut self) -> &mut [Self::Value];

    /// Writes the first `len` values to `output`, little-endian.
    fn write_prefix<W: Write>(&self, len: usize, output: &mut W) -> io::Result<()>;

    /// Fills the whole buffer from `input`, little-endian.
    fn read_contents<R: Read>(&mut self, input: &mut R) -> io::Result<()>;

    /// Width of the stored values.
    fn value_type(&self) -> ValueType {
        Self::VALUE_TYPE
    }

    /// The value at `index`.
    fn get(&self, index: usize) -> Result<Self::Value, BufferError> {
        self.as_slice()
            .get(index)
            .copied()
            .ok_or_else(|| out_of_range(index, self.capacity()))
    }

    /// Replaces the value at `index`, returning the old value.
    fn set(&mut self, index: usize, value: Self::Value) -> Result<Self::Value, BufferError> {
        let capacity = self.capacity();
        let slot = self
            .as_mut_slice()
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, capacity))?;
        Ok(std::mem::replace(slot, value))
    }

    /// The value at `index`, widened.
    fn get_u64(&self, index: usize) -> Result<u64, BufferError> {
        self.get(index).map(Into::into)
    }

    /// Replaces the value at `index`. Fails if `value` is too wide for the buffer.
    fn set_u64(&mut self, index: usize, value: u64) -> Result<u64, BufferError> {
        let typed = Self::Value::try_from(value).map_err(|_| {
            BufferError::new(format!(
                "{} does not fit in a {} buffer",
                value,
                Self::VALUE_TYPE
            ))
        })?;
        self.set(index, typed).map(Into::into)
    }

    /// Linear search for `value` in `start..end`.
    fn index_of(&self, value: Self::Value, start: usize, end: usize) -> Option<usize> {
        let (start, end) = clamp_range(start, end, self.capacity());
        self.as_slice()[start..end]
            .iter()
            .position(|v| *v == value)
            .map(|offset| start + offset)
    }

    /// Binary search for `value` in the sorted range `start..end`.
    ///
    /// Returns `Ok(index)` if found, or `Err(index)` where `value` would have
    /// to be inserted to keep the range sorted.
    fn index_of_binary_search(
        &self,
        value: Self::Value,
        start: usize,
        end: usize,
    ) -> Result<usize, usize> {
        let (start, end) = clamp_range(start, end, self.capacity());
        self.as_slice()[start..end]
            .binary_search(&value)
            .map(|offset| start + offset)
            .map_err(|offset| start + offset)
    }

    /// Moves the value at `index` to restore ascending order across the
    /// whole buffer, returning its final index.
    fn move_into_sorted_place(&mut self, index: usize) -> Result<usize, BufferError> {
        let end = self.capacity();
        self.move_into_sorted_place_within(index, 0, end)
    }

    /// Like [`move_into_sorted_place`](Self::move_into_sorted_place) but only
    /// over `start..end`, which must be sorted apart from `index`.
    fn move_into_sorted_place_within(
        &mut self,
        index: usize,
        start: usize,
        end: usize,
    ) -> Result<usize, BufferError> {
        let (start, end) = clamp_range(start, end, self.capacity());
        if index < start || index >= end {
            return Err(out_of_range(index, self.capacity()));
        }
        let values = &mut self.as_mut_slice()[start..end];
        let local = index - start;
        let value = values[local];

        let target = if local > 0 && values[local - 1] > value {
            values[..local].partition_point(|v| *v <= value)
        } else if local + 1 < values.len() && values[local + 1] < value {
            local + values[local + 1..].partition_point(|v| *v < value)
        } else {
            local
        };

        if target < local {
            values[target..=local].rotate_right(1);
        } else if target > local {
            values[local..=target].rotate_left(1);
        }
        Ok(start + target)
    }

    /// Moves the value at `index` to `target`, shifting the values in between
    /// by one slot.
    fn move_into_place(&mut self, index: usize, target: usize) -> Result<(), BufferError> {
        let capacity = self.capacity();
        if index >= capacity || target >= capacity {
            return Err(out_of_range(index.max(target), capacity));
        }
        let values = self.as_mut_slice();
        if target < index {
            values[target..=index].rotate_right(1);
        } else if target > index {
            values[index..=target].rotate_left(1);
        }
        Ok(())
    }

    /// Writes every value to `output`, little-endian.
    fn write_contents<W: Write>(&self, output: &mut W) -> io::Result<()> {
        self.write_prefix(self.capacity(), output)
    }
}

// ─────────────────────────────────────────────────────────────
//  Concrete widths
// ─────────────────────────────────────────────────────────────

macro_rules! value_buffer {
    ($(#[$meta:meta])* $name:ident, $value:ty, $value_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            values: Box<[$value]>,
        }

        impl $name {
            /// Creates a zero-filled buffer.
            pub fn new(capacity: usize) -> Self {
                Self {
                    values: vec![0; capacity].into_boxed_slice(),
                }
            }

            /// Creates a buffer holding `values`.
            pub fn from_values(values: Vec<$value>) -> Self {
                Self {
                    values: values.into_boxed_slice(),
                }
            }
        }

        impl ValueBuffer for $name {
            type Value = $value;
            const VALUE_TYPE: ValueType = $value_type;

            fn capacity(&self) -> usize {
                self.values.len()
            }

            fn as_slice(&self) -> &[$value] {
                &self.values
            }

            fn as_mut_slice(&mut self) -> &mut [$value] {
                &mut self.values
            }

            fn write_prefix<W: Write>(&self, len: usize, output: &mut W) -> io::Result<()> {
                let len = len.min(self.values.len());
                let mut bytes = Vec::with_capacity(IO_CHUNK.min(len) * size_of::<$value>());
                for chunk in self.values[..len].chunks(IO_CHUNK) {
                    bytes.clear();
                    for value in chunk {
                        bytes.extend_from_slice(&value.to_le_bytes());
                    }
                    output.write_all(&bytes)?;
                }
                Ok(())
            }

            fn read_contents<R: Read>(&mut self, input: &mut R) -> io::Result<()> {
                const WIDTH: usize = size_of::<$value>();
                let mut bytes = vec![0u8; IO_CHUNK.min(self.values.len()) * WIDTH];
                for chunk in self.values.chunks_mut(IO_CHUNK) {
                    let bytes = &mut bytes[..chunk.len() * WIDTH];
                    input.read_exact(bytes)?;
                    for (slot, raw) in chunk.iter_mut().zip(bytes.chunks_exact(WIDTH)) {
                        let mut le = [0u8; WIDTH];
                        le.copy_from_slice(raw);
                        *slot = <$value>::from_le_bytes(le);
                    }
                }
                Ok(())
            }
        }
    };
}

value_buffer!(
    /// Buffer of 8-bit values.
    U8Buffer,
    u8,
    ValueType::U8
);
value_buffer!(
    /// Buffer of 16-bit values.
    U16Buffer,
    u16,
    ValueType::U16
);
value_buffer!(
    /// Buffer of 32-bit values.
    U32Buffer,
    u32,
    ValueType::U32
);
value_buffer!(
    /// Buffer of 64-bit values.
    U64Buffer,
    u64,
    ValueType::U64
);

// ─────────────────────────────────────────────────────────────
//  Runtime-selected width
// ─────────────────────────────────────────────────────────────

/// A buffer whose width is chosen at runtime.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
pub enum AnyValueBuffer {
    /// 8-bit values.
    U8(U8Buffer),
    /// 16-bit values.
    U16(U16Buffer),
    /// 32-bit values.
    U32(U32Buffer),
    /// 64-bit values.
    U64(U64Buffer),
}

macro_rules! dispatch {
    ($self:expr, $buffer:ident => $body:expr) => {
        match $self {
            AnyValueBuffer::U8($buffer) => $body,
            AnyValueBuffer::U16($buffer) => $body,
            AnyValueBuffer::U32($buffer) => $body,
            AnyValueBuffer::U64($buffer) => $body,
        }
    };
}

fn typed_index_of<B: ValueBuffer>(buffer: &B, value: u64, start: usize, end: usize) -> Option<usize> {
    let value = B::Value::try_from(value).ok()?;
    buffer.index_of(value, start, end)
}

fn typed_binary_search<B: ValueBuffer>(
    buffer: &B,
    value: u64,
    start: usize,
    end: usize,
) -> Result<usize, usize> {
    match B::Value::try_from(value) {
        Ok(value) => buffer.index_of_binary_search(value, start, end),
        // Wider than anything stored, so it sorts after the whole range.
        Err(_) => Err(clamp_range(start, end, buffer.capacity()).1),
    }
}

impl AnyValueBuffer {
    /// Creates a zero-filled buffer of the given width.
    pub fn new(value_type: ValueType, capacity: usize) -> Self {
        match value_type {
            ValueType::U8 => U8Buffer::new(capacity).into(),
            ValueType::U16 => U16Buffer::new(capacity).into(),
            ValueType::U32 => U32Buffer::new(capacity).into(),
            ValueType::U64 => U64Buffer::new(capacity).into(),
        }
    }

    /// Width of the stored values.
    pub fn value_type(&self) -> ValueType {
        dispatch!(self, buffer => buffer.value_type())
    }

    /// Number of values the buffer holds.
    pub fn capacity(&self) -> usize {
        dispatch!(self, buffer => buffer.capacity())
    }

    /// The value at `index`, widened.
    pub fn get_u64(&self, index: usize) -> Result<u64, BufferError> {
        dispatch!(self, buffer => buffer.get_u64(index))
    }

    /// Replaces the value at `index`. Fails if `value` is too wide for the buffer.
    pub fn set_u64(&mut self, index: usize, value: u64) -> Result<u64, BufferError> {
        dispatch!(self, buffer => buffer.set_u64(index, value))
    }

    /// Linear search for `value` in `start..end`.
    pub fn index_of(&self, value: u64, start: usize, end: usize) -> Option<usize> {
        dispatch!(self, buffer => typed_index_of(buffer, value, start, end))
    }

    /// Binary search for `value` in the sorted range `start..end`.
    pub fn index_of_binary_search(&self, value: u64, start: usize, end: usize) -> Result<usize, usize> {
        dispatch!(self, buffer => typed_binary_search(buffer, value, start, end))
    }

    /// See [`ValueBuffer::move_into_sorted_place`].
    pub fn move_into_sorted_place(&mut self, index: usize) -> Result<usize, BufferError> {
        dispatch!(self, buffer => buffer.move_into_sorted_place(index))
    }

    /// See [`ValueBuffer::move_into_sorted_place_within`].
    pub fn move_into_sorted_place_within(
        &mut self,
        index: usize,
        start: usize,
        end: usize,
    ) -> Result<usize, BufferError> {
        dispatch!(self, buffer => buffer.move_into_sorted_place_within(index, start, end))
    }

    /// See [`ValueBuffer::move_into_place`].
    pub fn move_into_place(&mut self, index: usize, target: usize) -> Result<(), BufferError> {
        dispatch!(self, buffer => buffer.move_into_place(index, target))
    }

    /// Writes the first `len` values to `output`.
    pub fn write_prefix<W: Write>(&self, len: usize, output: &mut W) -> io::Result<()> {
        dispatch!(self, buffer => buffer.write_prefix(len, output))
    }

    /// Writes every value to `output`.
    pub fn write_contents<W: Write>(&self, output: &mut W) -> io::Result<()> {
        dispatch!(self, buffer => buffer.write_contents(output))
    }

    /// Fills the whole buffer from `input`.
    pub fn read_contents<R: Read>(&mut self, input: &mut R) -> io::Result<()> {
        dispatch!(self, buffer => buffer.read_contents(input))
    }
}
