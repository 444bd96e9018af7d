//! Device slot header
//!
//! Every slot begins with a fixed-size header identifying the key it holds
//! and checksumming its value.

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::workload::{Key, KEY_LEN};

/// Bytes reserved at the start of every slot for the header
pub const HEADER_SIZE: usize = 64;

/// Slots are rounded up to this many bytes
pub const SLOT_ALIGN: u64 = 4096;

/// "KVBN"
const SLOT_MAGIC: u32 = 0x4B56_424E;

/// Header written in front of each stored value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotHeader {
    magic: u32,

    /// Key bytes of the stored value
    pub key: [u8; KEY_LEN],

    /// Length of the stored value
    pub len: u64,

    /// CRC32 of the stored value
    pub crc: u32,
}

impl SlotHeader {
    /// Build the header for `value` stored under `key`
    pub fn new(key: &Key, value: &[u8]) -> Self {
        let mut key_bytes = [0u8; KEY_LEN];
        key_bytes.copy_from_slice(key.as_bytes());
        Self {
            magic: SLOT_MAGIC,
            key: key_bytes,
            len: value.len() as u64,
            crc: crc32fast::hash(value),
        }
    }

    /// Encode into a zero-padded header block
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        let bytes = bincode::serialize(self).map_err(|e| BenchError::Serialization(e.to_string()))?;
        if bytes.len() > HEADER_SIZE {
            return Err(BenchError::Serialization(format!(
                "slot header is {} bytes, limit is {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut block = [0u8; HEADER_SIZE];
        block[..bytes.len()].copy_from_slice(&bytes);
        Ok(block)
    }

    /// Decode a header block read from a slot
    pub fn decode(block: &[u8]) -> Result<Self> {
        let header: SlotHeader =
            bincode::deserialize(block).map_err(|e| BenchError::Serialization(e.to_string()))?;
        if header.magic != SLOT_MAGIC {
            return Err(BenchError::Corruption(format!(
                "bad slot magic {:#010x}",
                header.magic
            )));
        }
        Ok(header)
    }

    /// Whether this header belongs to `key`
    pub fn holds(&self, key: &Key) -> bool {
        self.key[..] == *key.as_bytes()
    }
}

/// On-device size of a slot holding values of `value_size` bytes
pub fn slot_size(value_size: usize) -> u64 {
    let raw = (HEADER_SIZE + value_size) as u64;
    raw.div_ceil(SLOT_ALIGN) * SLOT_ALIGN
}
