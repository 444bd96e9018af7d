//! Storage Module
//!
//! The put/get/delete contract the driver measures, and the two backends
//! shipped with kvbench.
//!
//! ## Backends
//! - `FileBackend`: one file per key inside a directory
//! - `DeviceBackend`: fixed-size slots on a raw block device
//!
//! ## Device Slot Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (64 bytes, bincode)             │
//! │ ┌───────┬──────────┬───────┬────────┐  │
//! │ │Magic 4│ Key (16) │Len (8)│CRC32 4 │  │
//! │ └───────┴──────────┴───────┴────────┘  │
//! ├────────────────────────────────────────┤
//! │ Value (value_size bytes)               │
//! ├────────────────────────────────────────┤
//! │ Padding to the next 4 KiB boundary     │
//! └────────────────────────────────────────┘
//! ```

mod file;
#[cfg(unix)]
mod device;

use std::path::Path;

use crate::config::BenchConfig;
use crate::error::Result;
use crate::workload::Key;

pub use file::FileBackend;
#[cfg(unix)]
pub use device::{slot_size, DeviceBackend, SlotHeader, HEADER_SIZE, SLOT_ALIGN};

/// A key-value store the benchmark can drive
///
/// One instance is shared by every worker of every phase without external
/// locking, so implementations must tolerate concurrent calls on disjoint keys.
pub trait StorageBackend: Send + Sync {
    /// Store `value` under `key`
    fn put(&self, key: &Key, value: &[u8]) -> Result<()>;

    /// Fill `buf` with exactly `buf.len()` bytes of the value stored under `key`
    ///
    /// Returns `BenchError::ShortRead` if the stored value is shorter.
    fn get(&self, key: &Key, buf: &mut [u8]) -> Result<()>;

    /// Remove `key`
    fn delete(&self, key: &Key) -> Result<()>;
}

/// Paths under this prefix are treated as raw block devices
pub const DEVICE_NAMESPACE: &str = "/dev";

/// Which backend a target path selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Device,
}

impl BackendKind {
    /// `/dev/...` selects the device backend, anything else a directory
    pub fn from_target(target: &Path) -> Self {
        if target.starts_with(DEVICE_NAMESPACE) {
            BackendKind::Device
        } else {
            BackendKind::File
        }
    }
}

/// Open the backend selected by `config.target`
pub fn open_backend(config: &BenchConfig) -> Result<Box<dyn StorageBackend>> {
    match BackendKind::from_target(&config.target) {
        BackendKind::File => {
            tracing::info!("Using file backend at {}", config.target.display());
            Ok(Box::new(FileBackend::open(&config.target, config.sync_writes)?))
        }
        #[cfg(unix)]
        BackendKind::Device => {
            tracing::info!("Using device backend at {}", config.target.display());
            Ok(Box::new(DeviceBackend::open(
                &config.target,
                config.value_size,
                config.sync_writes,
            )?))
        }
        #[cfg(not(unix))]
        BackendKind::Device => Err(crate::BenchError::Config(
            "raw device targets require a unix host".to_string(),
        )),
    }
}
