//! Store files on disk: round trips and every way a file can be rejected.

use std::fs;
use std::io::Write;
use strictly_lut::{BigEntryStore, STORE_VERSION, StateLUT, StoreHeader, ValueType};
use strictly_ur::GameSettings;
use tempfile::TempDir;

fn sample_store(fingerprint: u64) -> BigEntryStore {
    let mut store = BigEntryStore::new(ValueType::U32, ValueType::U16, fingerprint, 64);
    // Descending inserts exercise the split path, not only appends.
    for key in (0..1_000u64).rev() {
        store.insert(key * 3 + 1, key % 65_536).expect("entry fits");
    }
    store
}

#[test]
fn test_store_survives_a_file_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("sample.urlt");
    let store = sample_store(42);
    assert!(store.shard_count() > 1);

    store.write_to_path(&path).expect("store writes");
    let read = BigEntryStore::read(&path).expect("store reads");

    assert_eq!(read.len(), store.len());
    assert_eq!(read.header(), store.header());
    for key in 0..1_000u64 {
        assert_eq!(read.lookup(key * 3 + 1), Some(key % 65_536));
        assert_eq!(read.lookup(key * 3), None);
    }

    let header = StoreHeader::read_from_path(&path).expect("header reads");
    assert_eq!(header.version, STORE_VERSION);
    assert_eq!(header.entries(), 1_000);
    assert_eq!(
        header.expected_file_len(),
        Some(fs::metadata(&path).expect("metadata").len())
    );
}

#[test]
fn test_write_leaves_no_temporary_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("sample.urlt");
    sample_store(1).write_to_path(&path).expect("store writes");
    let names: Vec<_> = fs::read_dir(dir.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("sample.urlt")]);
}

#[test]
fn test_rewrite_replaces_the_previous_store() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("sample.urlt");
    sample_store(1).write_to_path(&path).expect("first write");

    let mut small = BigEntryStore::new(ValueType::U8, ValueType::U8, 2, 16);
    small.insert(9, 200).expect("entry fits");
    small.write_to_path(&path).expect("second write");

    let read = BigEntryStore::read(&path).expect("store reads");
    assert_eq!(read.len(), 1);
    assert_eq!(read.fingerprint(), 2);
    assert_eq!(read.lookup(9), Some(200));
}

#[test]
fn test_missing_file_is_a_format_error() {
    let dir = TempDir::new().expect("temp dir");
    let result = BigEntryStore::read(dir.path().join("absent.urlt"));
    assert!(result.is_err());
}

fn written_bytes(store: &BigEntryStore) -> Vec<u8> {
    let mut bytes = Vec::new();
    store.write_to(&mut bytes).expect("write to vec");
    bytes
}

fn write_raw(dir: &TempDir, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join("raw.urlt");
    let mut file = fs::File::create(&path).expect("create");
    file.write_all(bytes).expect("write");
    path
}

#[test]
fn test_truncated_file_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let bytes = written_bytes(&sample_store(3));
    let path = write_raw(&dir, &bytes[..bytes.len() - 5]);

    let error = BigEntryStore::read(&path).expect_err("truncated store");
    assert!(error.message.contains("size"), "{}", error);
    assert!(StoreHeader::read_from_path(&path).is_err());
}

#[test]
fn test_trailing_bytes_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let mut bytes = written_bytes(&sample_store(3));
    bytes.extend_from_slice(&[0, 0]);
    let path = write_raw(&dir, &bytes);
    assert!(BigEntryStore::read(&path).is_err());
}

#[test]
fn test_bad_magic_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let mut bytes = written_bytes(&sample_store(3));
    bytes[0] = b'X';
    let path = write_raw(&dir, &bytes);

    let error = BigEntryStore::read(&path).expect_err("bad magic");
    assert!(error.message.contains("magic"), "{}", error);
}

#[test]
fn test_unknown_version_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let mut bytes = written_bytes(&sample_store(3));
    bytes[4..6].copy_from_slice(&(STORE_VERSION + 1).to_le_bytes());
    let path = write_raw(&dir, &bytes);

    let error = BigEntryStore::read(&path).expect_err("bad version");
    assert!(error.message.contains("version"), "{}", error);
}

#[test]
fn test_unknown_value_type_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let mut bytes = written_bytes(&sample_store(3));
    bytes[7] = 9;
    let path = write_raw(&dir, &bytes);
    assert!(BigEntryStore::read(&path).is_err());
}

#[test]
fn test_store_for_another_variant_is_a_config_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("masters.urlt");

    let masters = StateLUT::new(GameSettings::masters()).expect("valid preset");
    let mut store = masters.create_store(64);
    store.insert(1, 2).expect("entry fits");
    store.write_to_path(&path).expect("store writes");

    let finkel = StateLUT::new(GameSettings::finkel()).expect("valid preset");
    let error = finkel.read_state_store(&path).expect_err("wrong variant");
    assert!(error.is_config(), "{}", error);

    let reloaded = masters.read_state_store(&path).expect("right variant");
    assert_eq!(reloaded.lookup(1), Some(2));
}

#[test]
fn test_corrupt_store_is_a_format_error_through_the_lut() {
    let dir = TempDir::new().expect("temp dir");
    let lut = StateLUT::new(GameSettings::finkel()).expect("valid preset");
    let mut store = lut.create_store(64);
    store.insert(4, 5).expect("entry fits");
    let bytes = written_bytes(&store);
    let path = write_raw(&dir, &bytes[..bytes.len() - 1]);

    let error = lut.read_state_store(&path).expect_err("truncated");
    assert!(error.is_format(), "{}", error);
}

#[test]
fn test_concurrent_lookups_agree() {
    let store = sample_store(5);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|offset| {
                let store = &store;
                scope.spawn(move || {
                    (0..1_000u64)
                        .filter(|key| key % 4 == offset)
                        .all(|key| store.lookup(key * 3 + 1) == Some(key % 65_536))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("thread finished"));
        }
    });
}
