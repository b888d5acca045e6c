//! Sharded sorted key/value store and its file format.
//!
//! A [`BigEntryStore`] is one logical table split across shards, each a pair
//! of buffers (keys and values) sorted by key. Shards are ordered: every key
//! in a shard is smaller than every key in the next.
//!
//! File layout, all integers little-endian:
//!
//! ```text
//! magic           4 bytes  "URLT"
//! version         u16
//! key type id     u8
//! value type id   u8
//! fingerprint     u64
//! shard count     u32
//! entry counts    u64 per shard
//! shards          per shard: keys, then values
//! ```

use crate::buffer::{AnyValueBuffer, ValueType};
use crate::error::{BufferError, FormatError};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Identifies a store file.
pub const STORE_MAGIC: [u8; 4] = *b"URLT";

/// Version of the file layout written by this crate.
pub const STORE_VERSION: u16 = 1;

/// Entries per shard when none is given.
pub const DEFAULT_SHARD_CAPACITY: usize = 1 << 20;

/// Header bytes before the entry counts.
const FIXED_HEADER_LEN: u64 = 4 + 2 + 1 + 1 + 8 + 4;

// ─────────────────────────────────────────────────────────────
//  Header
// ─────────────────────────────────────────────────────────────

/// The header of a store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHeader {
    /// File layout version.
    pub version: u16,
    /// Width of the keys.
    pub key_type: ValueType,
    /// Width of the values.
    pub value_type: ValueType,
    /// Fingerprint of the variant the table was built for.
    pub fingerprint: u64,
    /// Entries in each shard, in key order.
    pub entry_counts: Vec<u64>,
}

fn read_array<const N: usize, R: Read>(input: &mut R, what: &str) -> Result<[u8; N], FormatError> {
    let mut bytes = [0u8; N];
    input
        .read_exact(&mut bytes)
        .map_err(|e| FormatError::new(format!("Truncated header while reading {}: {}", what, e)))?;
    Ok(bytes)
}

impl StoreHeader {
    /// Total number of entries.
    pub fn entries(&self) -> u64 {
        self.entry_counts.iter().sum()
    }

    /// Bytes taken by the header itself.
    pub fn byte_len(&self) -> u64 {
        FIXED_HEADER_LEN + 8 * self.entry_counts.len() as u64
    }

    /// Bytes the whole file must have, or `None` if that overflows.
    pub fn expected_file_len(&self) -> Option<u64> {
        let entry_width = (self.key_type.byte_width() + self.value_type.byte_width()) as u64;
        self.entry_counts
            .iter()
            .try_fold(self.byte_len(), |total, count| {
                count.checked_mul(entry_width).and_then(|bytes| total.checked_add(bytes))
            })
    }

    /// Writes the header.
    pub fn write_to<W: Write>(&self, output: &mut W) -> Result<(), FormatError> {
        output.write_all(&STORE_MAGIC)?;
        output.write_all(&self.version.to_le_bytes())?;
        output.write_all(&[self.key_type.id(), self.value_type.id()])?;
        output.write_all(&self.fingerprint.to_le_bytes())?;
        let shards = u32::try_from(self.entry_counts.len())
            .map_err(|_| FormatError::new("Too many shards for the file format"))?;
        output.write_all(&shards.to_le_bytes())?;
        for count in &self.entry_counts {
            output.write_all(&count.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads and validates a header.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self, FormatError> {
        let magic: [u8; 4] = read_array(input, "magic")?;
        if magic != STORE_MAGIC {
            return Err(FormatError::new(format!(
                "Not a lookup table file (magic {:02x?})",
                magic
            )));
        }
        let version = u16::from_le_bytes(read_array(input, "version")?);
        if version != STORE_VERSION {
            return Err(FormatError::new(format!(
                "Unsupported format version {} (expected {})",
                version, STORE_VERSION
            )));
        }
        let [key_id, value_id]: [u8; 2] = read_array(input, "value types")?;
        let key_type = ValueType::from_id(key_id)
            .ok_or_else(|| FormatError::new(format!("Unknown key type id {}", key_id)))?;
        let value_type = ValueType::from_id(value_id)
            .ok_or_else(|| FormatError::new(format!("Unknown value type id {}", value_id)))?;
        let fingerprint = u64::from_le_bytes(read_array(input, "fingerprint")?);
        let shards = u32::from_le_bytes(read_array(input, "shard count")?);

        let mut entry_counts = Vec::new();
        for _ in 0..shards {
            let count = u64::from_le_bytes(read_array(input, "entry counts")?);
            if count == 0 {
                return Err(FormatError::new("Shards must not be empty"));
            }
            entry_counts.push(count);
        }

        Ok(Self {
            version,
            key_type,
            value_type,
            fingerprint,
            entry_counts,
        })
    }

    /// Reads the header of a store file, checking the file is long enough
    /// for the shards it announces.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let (mut input, file_len) = open_store(path.as_ref())?;
        let header = Self::read_from(&mut input)?;
        header.check_file_len(file_len)?;
        Ok(header)
    }

    fn check_file_len(&self, file_len: u64) -> Result<(), FormatError> {
        let expected = self
            .expected_file_len()
            .ok_or_else(|| FormatError::new("Entry counts overflow the file size"))?;
        if expected != file_len {
            return Err(FormatError::new(format!(
                "File size mismatch: expected {} bytes, found {}",
                expected, file_len
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Shards
// ─────────────────────────────────────────────────────────────

/// One sorted segment of a store.
#[derive(Debug, Clone)]
struct Shard {
    keys: AnyValueBuffer,
    values: AnyValueBuffer,
    len: usize,
}

impl Shard {
    fn new(key_type: ValueType, value_type: ValueType, capacity: usize) -> Self {
        Self {
            keys: AnyValueBuffer::new(key_type, capacity),
            values: AnyValueBuffer::new(value_type, capacity),
            len: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.keys.capacity()
    }

    fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    fn first_key(&self) -> Result<u64, BufferError> {
        self.keys.get_u64(0)
    }

    fn last_key(&self) -> Result<u64, BufferError> {
        self.keys.get_u64(self.len.saturating_sub(1))
    }

    fn lookup(&self, key: u64) -> Option<u64> {
        let index = self.keys.index_of_binary_search(key, 0, self.len).ok()?;
        self.values.get_u64(index).ok()
    }

    /// Inserts into a shard with room for one more entry.
    fn insert(&mut self, key: u64, value: u64) -> Result<(), BufferError> {
        match self.keys.index_of_binary_search(key, 0, self.len) {
            Ok(index) => {
                self.values.set_u64(index, value)?;
            }
            Err(index) => {
                let end = self.len;
                self.keys.set_u64(end, key)?;
                self.values.set_u64(end, value)?;
                if index < end {
                    let target = self.keys.move_into_sorted_place_within(end, 0, end + 1)?;
                    self.values.move_into_place(end, target)?;
                }
                self.len += 1;
            }
        }
        Ok(())
    }

    /// Moves the upper half of a full shard into a new one.
    fn split_off(&mut self, capacity: usize) -> Result<Shard, BufferError> {
        let half = self.len / 2;
        let mut upper = Shard::new(self.keys.value_type(), self.values.value_type(), capacity);
        for index in half..self.len {
            upper.keys.set_u64(index - half, self.keys.get_u64(index)?)?;
            upper.values.set_u64(index - half, self.values.get_u64(index)?)?;
        }
        upper.len = self.len - half;
        self.len = half;
        Ok(upper)
    }
}

// ─────────────────────────────────────────────────────────────
//  Store
// ─────────────────────────────────────────────────────────────

/// A sorted key/value table spread over shards.
///
/// Read-only use is safe from any number of threads.
#[derive(Debug, Clone)]
pub struct BigEntryStore {
    key_type: ValueType,
    value_type: ValueType,
    fingerprint: u64,
    shard_capacity: usize,
    shards: Vec<Shard>,
}

impl BigEntryStore {
    /// Creates an empty store. Shards hold at least two entries.
    #[instrument]
    pub fn new(key_type: ValueType, value_type: ValueType, fingerprint: u64, shard_capacity: usize) -> Self {
        Self {
            key_type,
            value_type,
            fingerprint,
            shard_capacity: shard_capacity.max(2),
            shards: Vec::new(),
        }
    }

    /// Width of the keys.
    pub fn key_type(&self) -> ValueType {
        self.key_type
    }

    /// Width of the values.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Fingerprint of the variant the table was built for.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len).sum()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// The header describing this store.
    pub fn header(&self) -> StoreHeader {
        StoreHeader {
            version: STORE_VERSION,
            key_type: self.key_type,
            value_type: self.value_type,
            fingerprint: self.fingerprint,
            entry_counts: self.shards.iter().map(|shard| shard.len as u64).collect(),
        }
    }

    /// Index of the shard that holds `key`, if any could.
    fn shard_for(&self, key: u64) -> usize {
        self.shards
            .partition_point(|shard| shard.last_key().is_ok_and(|last| last < key))
    }

    /// Looks up the value stored for `key`.
    pub fn lookup(&self, key: u64) -> Option<u64> {
        self.shards.get(self.shard_for(key))?.lookup(key)
    }

    /// Inserts or replaces an entry, keeping every shard sorted.
    ///
    /// Keys inserted in ascending order take the append path.
    pub fn insert(&mut self, key: u64, value: u64) -> Result<(), BufferError> {
        if key > self.key_type.max_value() {
            return Err(BufferError::new(format!("Key {} does not fit in {}", key, self.key_type)));
        }
        if value > self.value_type.max_value() {
            return Err(BufferError::new(format!(
                "Value {} does not fit in {}",
                value, self.value_type
            )));
        }
        if self.shards.is_empty() {
            self.shards
                .push(Shard::new(self.key_type, self.value_type, self.shard_capacity));
        }

        // Keys past the last shard go to the last shard.
        let mut index = self.shard_for(key).min(self.shards.len() - 1);
        let last = self.shards.len() - 1;
        if self.shards[index].is_full() && self.shards[index].lookup(key).is_none() {
            if index == last && self.shards[last].last_key()? < key {
                self.shards
                    .push(Shard::new(self.key_type, self.value_type, self.shard_capacity));
                return self.shards[last + 1].insert(key, value);
            }
            let upper = self.shards[index].split_off(self.shard_capacity)?;
            debug!(shard = index, shards = self.shards.len() + 1, "Shard split");
            let goes_up = upper.first_key()? <= key;
            self.shards.insert(index + 1, upper);
            if goes_up {
                index += 1;
            }
        }
        self.shards[index].insert(key, value)
    }

    /// Writes the store to `output`.
    pub fn write_to<W: Write>(&self, output: &mut W) -> Result<(), FormatError> {
        self.header().write_to(output)?;
        for shard in &self.shards {
            shard.keys.write_prefix(shard.len, output)?;
            shard.values.write_prefix(shard.len, output)?;
        }
        Ok(())
    }

    /// Writes the store to `path` atomically: a sibling temporary file is
    /// written, synced and renamed over `path`.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display(), entries = self.len()))]
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), FormatError> {
        let path = path.as_ref();
        let temp = temp_sibling(path);
        let result = (|| -> Result<(), FormatError> {
            let mut writer = BufWriter::new(File::create(&temp)?);
            self.write_to(&mut writer)?;
            let file = writer
                .into_inner()
                .map_err(|e| FormatError::new(format!("Failed to flush store: {}", e)))?;
            file.sync_all()?;
            fs::rename(&temp, path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result?;
        info!(shards = self.shard_count(), "Store written");
        Ok(())
    }

    /// Reads a whole store from `input`.
    ///
    /// Shard keys must ascend strictly within and across shards.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self, FormatError> {
        let header = StoreHeader::read_from(input)?;
        Self::read_shards(header, input)
    }

    fn read_shards<R: Read>(header: StoreHeader, input: &mut R) -> Result<Self, FormatError> {
        let mut shards = Vec::with_capacity(header.entry_counts.len());
        let mut previous: Option<u64> = None;
        for (shard_index, count) in header.entry_counts.iter().enumerate() {
            let len = usize::try_from(*count)
                .map_err(|_| FormatError::new(format!("Shard {} is too large", shard_index)))?;
            // Buffers are only sized once the shard's bytes have arrived.
            let raw = read_shard_bytes(&header, shard_index, *count, input)?;
            let mut raw = raw.as_slice();
            let mut shard = Shard::new(header.key_type, header.value_type, len.max(2));
            shard.len = len;
            read_prefix(&mut shard.keys, len, &mut raw)?;
            read_prefix(&mut shard.values, len, &mut raw)?;

            for index in 0..len {
                let key = shard
                    .keys
                    .get_u64(index)
                    .map_err(|e| FormatError::new(e.message))?;
                if previous.is_some_and(|previous| previous >= key) {
                    return Err(FormatError::new(format!(
                        "Keys are not strictly ascending at shard {}, entry {}",
                        shard_index, index
                    )));
                }
                previous = Some(key);
            }
            shards.push(shard);
        }

        let shard_capacity = shards
            .iter()
            .map(Shard::capacity)
            .max()
            .unwrap_or(DEFAULT_SHARD_CAPACITY);
        Ok(Self {
            key_type: header.key_type,
            value_type: header.value_type,
            fingerprint: header.fingerprint,
            shard_capacity,
            shards,
        })
    }

    /// Loads a store file. Any defect fails the whole load.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let (mut input, file_len) = open_store(path.as_ref())?;
        let header = StoreHeader::read_from(&mut input)?;
        header.check_file_len(file_len)?;
        let store = Self::read_shards(header, &mut input)?;
        info!(
            shards = store.shard_count(),
            entries = store.len(),
            key_type = %store.key_type,
            "Store loaded"
        );
        Ok(store)
    }
}

fn open_store(path: &Path) -> Result<(BufReader<File>, u64), FormatError> {
    let file = File::open(path)
        .map_err(|e| FormatError::new(format!("Cannot open {}: {}", path.display(), e)))?;
    let file_len = file.metadata()?.len();
    Ok((BufReader::new(file), file_len))
}

/// Reads the raw bytes of one shard, failing if the input ends first.
fn read_shard_bytes<R: Read>(
    header: &StoreHeader,
    shard_index: usize,
    count: u64,
    input: &mut R,
) -> Result<Vec<u8>, FormatError> {
    let entry_width = (header.key_type.byte_width() + header.value_type.byte_width()) as u64;
    let expected = count
        .checked_mul(entry_width)
        .filter(|bytes| usize::try_from(*bytes).is_ok_and(|bytes| bytes <= isize::MAX as usize))
        .ok_or_else(|| FormatError::new(format!("Shard {} is too large", shard_index)))?;
    let mut raw = Vec::new();
    input.take(expected).read_to_end(&mut raw)?;
    if raw.len() as u64 != expected {
        return Err(FormatError::new(format!(
            "Shard {} is truncated: expected {} bytes, found {}",
            shard_index,
            expected,
            raw.len()
        )));
    }
    Ok(raw)
}

/// Reads `len` values into the front of a buffer with at least `len` capacity.
fn read_prefix<R: Read>(buffer: &mut AnyValueBuffer, len: usize, input: &mut R) -> Result<(), FormatError> {
    if buffer.capacity() == len {
        buffer.read_contents(input)?;
        return Ok(());
    }
    let mut exact = AnyValueBuffer::new(buffer.value_type(), len);
    exact.read_contents(input)?;
    for index in 0..len {
        let value = exact.get_u64(index).map_err(|e| FormatError::new(e.message))?;
        buffer.set_u64(index, value).map_err(|e| FormatError::new(e.message))?;
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(keys: &[u64], shard_capacity: usize) -> BigEntryStore {
        let mut store = BigEntryStore::new(ValueType::U32, ValueType::U16, 7, shard_capacity);
        for key in keys {
            store.insert(*key, key % 1000).expect("fits");
        }
        store
    }

    #[test]
    fn test_lookup_after_unordered_inserts() {
        let keys = [50, 10, 40, 20, 30, 60, 5, 55, 45];
        let store = store_with(&keys, 4);
        assert!(store.shard_count() > 1);
        assert_eq!(store.len(), keys.len());
        for key in keys {
            assert_eq!(store.lookup(key), Some(key % 1000));
        }
        assert_eq!(store.lookup(0), None);
        assert_eq!(store.lookup(35), None);
        assert_eq!(store.lookup(100), None);
    }

    #[test]
    fn test_duplicate_key_replaces_value() {
        let mut store = store_with(&[1, 2, 3], 2);
        store.insert(2, 99).expect("fits");
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup(2), Some(99));
    }

    #[test]
    fn test_insert_rejects_wide_values() {
        let mut store = BigEntryStore::new(ValueType::U8, ValueType::U8, 0, 8);
        assert!(store.insert(256, 1).is_err());
        assert!(store.insert(1, 256).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_round_trip_in_memory() {
        let store = store_with(&[9, 3, 7, 1, 5, 11, 13], 3);
        let mut bytes = Vec::new();
        store.write_to(&mut bytes).expect("write");
        assert_eq!(bytes.len() as u64, store.header().expected_file_len().expect("fits"));

        let read = BigEntryStore::read_from(&mut bytes.as_slice()).expect("read");
        assert_eq!(read.header(), store.header());
        for key in [1, 3, 5, 7, 9, 11, 13] {
            assert_eq!(read.lookup(key), store.lookup(key));
        }
    }

    #[test]
    fn test_empty_store_round_trip() {
        let store = BigEntryStore::new(ValueType::U64, ValueType::U8, 1, 16);
        let mut bytes = Vec::new();
        store.write_to(&mut bytes).expect("write");
        let read = BigEntryStore::read_from(&mut bytes.as_slice()).expect("read");
        assert!(read.is_empty());
        assert_eq!(read.lookup(0), None);
    }

    fn header_claiming(key_type: ValueType, value_type: ValueType, count: u64) -> Vec<u8> {
        let header = StoreHeader {
            version: STORE_VERSION,
            key_type,
            value_type,
            fingerprint: 0,
            entry_counts: vec![count],
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).expect("write");
        bytes.extend_from_slice(&[0; 16]);
        bytes
    }

    #[test]
    fn test_oversized_entry_count_rejected() {
        let bytes = header_claiming(ValueType::U64, ValueType::U64, 1 << 61);
        let error = BigEntryStore::read_from(&mut bytes.as_slice()).expect_err("overflowing shard");
        assert!(error.message.contains("too large"), "{}", error);
    }

    #[test]
    fn test_entry_count_without_data_rejected() {
        let bytes = header_claiming(ValueType::U8, ValueType::U8, 1 << 40);
        let error = BigEntryStore::read_from(&mut bytes.as_slice()).expect_err("missing shard data");
        assert!(error.message.contains("truncated"), "{}", error);
    }

    #[test]
    fn test_unsorted_keys_rejected() {
        let header = StoreHeader {
            version: STORE_VERSION,
            key_type: ValueType::U8,
            value_type: ValueType::U8,
            fingerprint: 0,
            entry_counts: vec![3],
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).expect("write");
        bytes.extend_from_slice(&[1, 3, 2]);
        bytes.extend_from_slice(&[0, 0, 0]);
        assert!(BigEntryStore::read_from(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn test_temp_sibling() {
        assert_eq!(
            temp_sibling(Path::new("/data/finkel.lut")),
            PathBuf::from("/data/.finkel.lut.tmp")
        );
    }
}
