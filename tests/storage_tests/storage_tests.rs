//! Tests for the storage backends
//!
//! These tests verify:
//! - Backend selection from the target path
//! - FileBackend put/get/delete and short reads
//! - DeviceBackend slot allocation, reuse and exhaustion
//! - DeviceBackend checksum and header validation
//! - A full benchmark run against a real directory

use std::fs;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kvbench::storage::{
    open_backend, slot_size, BackendKind, DeviceBackend, FileBackend, SlotHeader, StorageBackend,
    HEADER_SIZE, SLOT_ALIGN,
};
use kvbench::workload::{make_value, Key, KeyGenerator};
use kvbench::{BenchConfig, BenchError, BenchmarkDriver};
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

fn key(text: &str) -> Key {
    Key::new(text).unwrap()
}

fn device_image(slots: u64, value_size: usize) -> NamedTempFile {
    let image = NamedTempFile::new().unwrap();
    image
        .as_file()
        .set_len(slots * slot_size(value_size))
        .unwrap();
    image
}

fn open_device(image: &NamedTempFile, value_size: usize) -> DeviceBackend {
    DeviceBackend::open(image.path(), value_size, false).unwrap()
}

// =============================================================================
// Backend Selection Tests
// =============================================================================

#[test]
fn test_dev_paths_select_device_backend() {
    assert_eq!(BackendKind::from_target(Path::new("/dev/nvme0n1")), BackendKind::Device);
    assert_eq!(BackendKind::from_target(Path::new("/dev/sdb")), BackendKind::Device);
}

#[test]
fn test_other_paths_select_file_backend() {
    assert_eq!(BackendKind::from_target(Path::new("/tmp/bench")), BackendKind::File);
    assert_eq!(BackendKind::from_target(Path::new("relative/dir")), BackendKind::File);
    // Prefix match is by path component, not by string
    assert_eq!(BackendKind::from_target(Path::new("/devices/x")), BackendKind::File);
}

#[test]
fn test_open_backend_for_directory() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("bench");
    let config = BenchConfig::builder().target(&target).sync_writes(false).build();

    let backend = open_backend(&config).unwrap();
    backend.put(&key("0123456789abcdef"), b"bbbb").unwrap();

    assert!(target.join("0123456789abcdef").exists());
}

#[test]
fn test_open_backend_missing_device_fails() {
    let config = BenchConfig::builder()
        .target("/dev/kvbench-no-such-device")
        .value_size(128)
        .build();

    assert!(matches!(open_backend(&config), Err(BenchError::Io(_))));
}

// =============================================================================
// FileBackend Tests
// =============================================================================

#[test]
fn test_file_open_creates_directory() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("a").join("b");

    let backend = FileBackend::open(&dir, false).unwrap();

    assert!(dir.is_dir());
    assert_eq!(backend.dir(), dir.as_path());
}

#[test]
fn test_file_put_get_delete() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path(), true).unwrap();
    let k = key("0123456789abcdef");
    let value = make_value(1024);

    backend.put(&k, &value).unwrap();
    assert_eq!(fs::read(temp.path().join(k.as_str())).unwrap(), value.to_vec());

    let mut buf = vec![0u8; 1024];
    backend.get(&k, &mut buf).unwrap();
    assert_eq!(buf, value.to_vec());

    backend.delete(&k).unwrap();
    assert!(!temp.path().join(k.as_str()).exists());
}

#[test]
fn test_file_get_short_value() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path(), false).unwrap();
    let k = key("0123456789abcdef");
    backend.put(&k, &make_value(100)).unwrap();

    let mut buf = vec![0u8; 256];
    let err = backend.get(&k, &mut buf).unwrap_err();

    assert!(matches!(err, BenchError::ShortRead { expected: 256, actual: 100 }));
}

#[test]
fn test_file_get_missing_key() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path(), false).unwrap();

    let mut buf = vec![0u8; 8];
    match backend.get(&key("0123456789abcdef"), &mut buf) {
        Err(BenchError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_file_delete_missing_key() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path(), false).unwrap();

    assert!(matches!(
        backend.delete(&key("0123456789abcdef")),
        Err(BenchError::Io(_))
    ));
}

#[test]
fn test_full_run_against_directory() {
    let temp = TempDir::new().unwrap();
    let backend = FileBackend::open(temp.path(), false).unwrap();
    let config = BenchConfig::builder()
        .target(temp.path())
        .duration(Duration::from_millis(100))
        .value_size(256)
        .workers(2)
        .sync_writes(false)
        .build();
    let driver = BenchmarkDriver::new(&backend, config).unwrap();

    let report = driver.run().unwrap();

    assert!(report.total_keys >= 2);
    assert_eq!(report.read.operations, report.total_keys);
    assert_eq!(report.delete.operations, report.total_keys);
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

// =============================================================================
// Slot Layout Tests
// =============================================================================

#[test]
fn test_slot_size_is_aligned() {
    assert_eq!(slot_size(1), SLOT_ALIGN);
    assert_eq!(slot_size(SLOT_ALIGN as usize - HEADER_SIZE), SLOT_ALIGN);
    assert_eq!(slot_size(SLOT_ALIGN as usize - HEADER_SIZE + 1), 2 * SLOT_ALIGN);
    assert_eq!(slot_size(2 * 1024 * 1024) % SLOT_ALIGN, 0);
}

#[test]
fn test_slot_header_encode_decode() {
    let k = key("0123456789abcdef");
    let header = SlotHeader::new(&k, b"bbbbbbbb");

    let block = header.encode().unwrap();
    let decoded = SlotHeader::decode(&block).unwrap();

    assert_eq!(decoded, header);
    assert!(decoded.holds(&k));
    assert!(!decoded.holds(&key("fedcba9876543210")));
    assert_eq!(decoded.len, 8);
}

#[test]
fn test_zeroed_header_is_rejected() {
    assert!(matches!(
        SlotHeader::decode(&[0u8; HEADER_SIZE]),
        Err(BenchError::Corruption(_))
    ));
}

// =============================================================================
// DeviceBackend Tests
// =============================================================================

#[test]
fn test_device_capacity_from_size() {
    let image = device_image(4, 100);

    let device = open_device(&image, 100);

    assert_eq!(device.capacity(), 4);
    assert_eq!(device.slot_size(), SLOT_ALIGN);
    assert!(device.is_empty());
}

#[test]
fn test_device_too_small() {
    let image = NamedTempFile::new().unwrap();
    image.as_file().set_len(1024).unwrap();

    let result = DeviceBackend::open(image.path(), 4096, false);

    assert!(matches!(result, Err(BenchError::Config(_))));
}

#[test]
fn test_device_put_get_delete() {
    let image = device_image(4, 512);
    let device = open_device(&image, 512);
    let k = key("0123456789abcdef");
    let value = make_value(512);

    device.put(&k, &value).unwrap();
    assert_eq!(device.len(), 1);

    let mut buf = vec![0u8; 512];
    device.get(&k, &mut buf).unwrap();
    assert_eq!(buf, value.to_vec());

    device.delete(&k).unwrap();
    assert!(device.is_empty());
    assert!(matches!(device.get(&k, &mut buf), Err(BenchError::KeyNotFound(_))));
}

#[test]
fn test_device_full() {
    let image = device_image(2, 64);
    let device = open_device(&image, 64);
    let value = make_value(64);

    device.put(&key("aaaaaaaaaaaaaaaa"), &value).unwrap();
    device.put(&key("bbbbbbbbbbbbbbbb"), &value).unwrap();
    let err = device.put(&key("cccccccccccccccc"), &value).unwrap_err();

    assert!(matches!(err, BenchError::DeviceFull { capacity: 2 }));
}

#[test]
fn test_device_reuses_freed_slots() {
    let image = device_image(1, 64);
    let device = open_device(&image, 64);
    let value = make_value(64);

    for text in ["aaaaaaaaaaaaaaaa", "bbbbbbbbbbbbbbbb", "cccccccccccccccc"] {
        let k = key(text);
        device.put(&k, &value).unwrap();
        device.delete(&k).unwrap();
    }

    assert!(device.is_empty());
}

#[test]
fn test_device_overwrite_frees_old_slot() {
    let image = device_image(2, 64);
    let device = open_device(&image, 64);
    let k = key("aaaaaaaaaaaaaaaa");

    for _ in 0..5 {
        device.put(&k, &make_value(64)).unwrap();
    }

    assert_eq!(device.len(), 1);
    device.put(&key("bbbbbbbbbbbbbbbb"), &make_value(64)).unwrap();
}

#[test]
fn test_device_short_value() {
    let image = device_image(2, 128);
    let device = open_device(&image, 128);
    let k = key("0123456789abcdef");
    device.put(&k, &make_value(50)).unwrap();

    let mut buf = vec![0u8; 128];
    let err = device.get(&k, &mut buf).unwrap_err();

    assert!(matches!(err, BenchError::ShortRead { expected: 128, actual: 50 }));
}

#[test]
fn test_device_rejects_oversized_value() {
    let image = device_image(2, 64);
    let device = open_device(&image, 64);

    let err = device.put(&key("0123456789abcdef"), &make_value(65)).unwrap_err();

    assert!(matches!(err, BenchError::Config(_)));
    assert!(device.is_empty());
}

#[test]
fn test_device_detects_corrupted_value() {
    let image = device_image(1, 256);
    let device = open_device(&image, 256);
    let k = key("0123456789abcdef");
    device.put(&k, &make_value(256)).unwrap();

    // Flip one value byte behind the backend's back (slot 0)
    image
        .as_file()
        .write_all_at(b"x", HEADER_SIZE as u64 + 17)
        .unwrap();

    let mut buf = vec![0u8; 256];
    assert!(matches!(device.get(&k, &mut buf), Err(BenchError::Corruption(_))));
}

#[test]
fn test_device_delete_missing_key() {
    let image = device_image(1, 64);
    let device = open_device(&image, 64);

    assert!(matches!(
        device.delete(&key("0123456789abcdef")),
        Err(BenchError::KeyNotFound(_))
    ));
}

#[test]
fn test_device_concurrent_disjoint_keys() {
    let image = device_image(64, 128);
    let device = Arc::new(open_device(&image, 128));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                let mut generator = KeyGenerator::new();
                let keys: Vec<Key> = (0..16).map(|_| generator.next_key().unwrap()).collect();
                let value = make_value(128);
                let mut buf = vec![0u8; 128];

                for k in &keys {
                    device.put(k, &value).unwrap();
                }
                for k in &keys {
                    device.get(k, &mut buf).unwrap();
                    assert_eq!(buf, value.to_vec());
                }
                for k in &keys {
                    device.delete(k).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(device.is_empty());
}
