//! Value buffers
//!
//! Every put writes a value filled with `SENTINEL`. Reads check the first
//! byte and then clobber it, so a backend that leaves the buffer untouched
//! on the next read cannot pass the check with stale contents.

use bytes::Bytes;

use crate::error::{BenchError, Result};
use crate::workload::Key;

/// Byte every written value is filled with
pub const SENTINEL: u8 = b'b';

/// Build the value shared by all write workers
pub fn make_value(size: usize) -> Bytes {
    Bytes::from(vec![SENTINEL; size])
}

/// Check a buffer filled by `get`
pub fn verify_value(key: &Key, buf: &[u8]) -> Result<()> {
    match buf.first() {
        Some(&SENTINEL) => Ok(()),
        Some(&found) => Err(BenchError::ContentMismatch {
            key: key.to_string(),
            found,
        }),
        None => Err(BenchError::ShortRead {
            expected: 1,
            actual: 0,
        }),
    }
}

/// Reset the checked position to a non-sentinel value
pub fn reset_checked(buf: &mut [u8]) {
    if let Some(first) = buf.first_mut() {
        *first = 0;
    }
}

