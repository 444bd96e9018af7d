//! Benchmark keys
//!
//! A key is the first 16 characters of a random UUID in hyphenated form.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::{BenchError, Result};

/// Length of every key in bytes (all keys are ASCII)
pub const KEY_LEN: usize = 16;

/// A fixed-length benchmark key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    /// Wrap an existing identifier, rejecting anything not exactly `KEY_LEN` ASCII bytes
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() != KEY_LEN || !text.is_ascii() {
            return Err(BenchError::InvalidKey(format!(
                "key must be {} ASCII characters, got {:?}",
                KEY_LEN, text
            )));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces unique keys from the OS random source
///
/// Each worker owns its own generator. Uniqueness across workers comes from
/// the size of the UUID space, not from coordination.
#[derive(Debug, Default)]
pub struct KeyGenerator {
    rng: OsRng,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next key
    ///
    /// Fails only if the OS random source fails, which ends the run.
    pub fn next_key(&mut self) -> Result<Key> {
        let mut bytes = [0u8; 16];
        self.rng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| BenchError::Generation(e.to_string()))?;

        let id: Uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
        let mut text = id.hyphenated().to_string();
        text.truncate(KEY_LEN);
        Ok(Key(text))
    }
}
