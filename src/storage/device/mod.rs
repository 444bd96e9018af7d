//! Device Backend
//!
//! Stores values in fixed-size slots on a raw block device (or any
//! pre-sized file). The key → slot index lives only in memory, so a device
//! holds no data a later run can read back.

mod slot;

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::os::unix::fs::FileExt;
use std::path::Path;

use parking_lot::{Mutex, RwLock};

use crate::error::{BenchError, Result};
use crate::workload::Key;

use super::StorageBackend;

pub use slot::{slot_size, SlotHeader, HEADER_SIZE, SLOT_ALIGN};

/// Raw-device store with one slot per key
///
/// ## Concurrency:
/// - `index`: RwLock (gets share it, puts and deletes take it briefly)
/// - `allocator`: Mutex, held only to pop or push a slot number
/// - Device I/O is positional and happens outside both locks
pub struct DeviceBackend {
    file: File,

    /// Bytes per slot (header + value, 4 KiB aligned)
    slot_size: u64,

    /// Largest value a slot can hold
    value_size: usize,

    /// Number of slots on the device
    capacity: u64,

    index: RwLock<HashMap<Key, u64>>,

    allocator: Mutex<SlotAllocator>,
}

/// Hands out slot numbers, reusing freed ones first
#[derive(Debug)]
struct SlotAllocator {
    next: u64,
    capacity: u64,
    free: Vec<u64>,
}

impl SlotAllocator {
    fn new(capacity: u64) -> Self {
        Self {
            next: 0,
            capacity,
            free: Vec::new(),
        }
    }

    fn allocate(&mut self) -> Option<u64> {
        if let Some(slot) = self.free.pop() {
            return Some(slot);
        }
        if self.next < self.capacity {
            self.next += 1;
            return Some(self.next - 1);
        }
        None
    }

    fn release(&mut self, slot: u64) {
        self.free.push(slot);
    }
}

impl DeviceBackend {
    /// Open a device sized for values of `value_size` bytes
    pub fn open(path: impl AsRef<Path>, value_size: usize, sync_writes: bool) -> Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;

        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if sync_writes {
            options.custom_flags(libc::O_SYNC);
        }
        let mut file = options.open(path)?;

        // Block devices report a zero length in their metadata; seeking works for both
        let device_size = file.seek(SeekFrom::End(0))?;
        let slot_size = slot_size(value_size);
        let capacity = device_size / slot_size;
        if capacity == 0 {
            return Err(BenchError::Config(format!(
                "{} holds {} bytes, too small for one {}-byte slot",
                path.display(),
                device_size,
                slot_size
            )));
        }

        tracing::debug!(
            "Device {}: {} bytes, {} slots of {} bytes",
            path.display(),
            device_size,
            capacity,
            slot_size
        );

        Ok(Self {
            file,
            slot_size,
            value_size,
            capacity,
            index: RwLock::new(HashMap::new()),
            allocator: Mutex::new(SlotAllocator::new(capacity)),
        })
    }

    /// Number of slots on the device
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes per slot
    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    fn offset(&self, slot: u64) -> u64 {
        slot * self.slot_size
    }

    fn write_slot(&self, slot: u64, key: &Key, value: &[u8]) -> Result<()> {
        let header = SlotHeader::new(key, value).encode()?;
        let offset = self.offset(slot);
        self.file.write_all_at(&header, offset)?;
        self.file.write_all_at(value, offset + HEADER_SIZE as u64)?;
        Ok(())
    }
}

impl StorageBackend for DeviceBackend {
    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        if value.len() > self.value_size {
            return Err(BenchError::Config(format!(
                "value of {} bytes exceeds the {}-byte slot payload",
                value.len(),
                self.value_size
            )));
        }

        let slot = self.allocator.lock().allocate().ok_or(BenchError::DeviceFull {
            capacity: self.capacity,
        })?;

        if let Err(e) = self.write_slot(slot, key, value) {
            self.allocator.lock().release(slot);
            return Err(e);
        }

        // Overwriting a key frees the slot it used before
        let previous = self.index.write().insert(key.clone(), slot);
        if let Some(old) = previous {
            self.allocator.lock().release(old);
        }
        Ok(())
    }

    fn get(&self, key: &Key, buf: &mut [u8]) -> Result<()> {
        let slot = self
            .index
            .read()
            .get(key)
            .copied()
            .ok_or_else(|| BenchError::KeyNotFound(key.to_string()))?;
        let offset = self.offset(slot);

        let mut block = [0u8; HEADER_SIZE];
        self.file.read_exact_at(&mut block, offset)?;
        let header = SlotHeader::decode(&block)?;
        if !header.holds(key) {
            return Err(BenchError::Corruption(format!(
                "slot {} does not hold key {}",
                slot, key
            )));
        }

        let stored = header.len as usize;
        if stored < buf.len() {
            return Err(BenchError::ShortRead {
                expected: buf.len(),
                actual: stored,
            });
        }

        self.file.read_exact_at(buf, offset + HEADER_SIZE as u64)?;

        // The checksum covers the whole value, so only a full read can be verified
        if stored == buf.len() && crc32fast::hash(buf) != header.crc {
            return Err(BenchError::Corruption(format!(
                "checksum mismatch for key {} in slot {}",
                key, slot
            )));
        }
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        let slot = self
            .index
            .write()
            .remove(key)
            .ok_or_else(|| BenchError::KeyNotFound(key.to_string()))?;

        let cleared = self
            .file
            .write_all_at(&[0u8; HEADER_SIZE], self.offset(slot));
        self.allocator.lock().release(slot);
        cleared?;
        Ok(())
    }
}
