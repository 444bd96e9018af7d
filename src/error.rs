//! Error types for kvbench
//!
//! Every error is fatal to a benchmark run: a measurement containing a failed
//! or corrupted operation is discarded rather than reported.

use thiserror::Error;

use crate::driver::Phase;

/// Result type alias using BenchError
pub type Result<T> = std::result::Result<T, BenchError>;

/// Unified error type for kvbench operations
#[derive(Debug, Error)]
pub enum BenchError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    // -------------------------------------------------------------------------
    // Verification Errors
    // -------------------------------------------------------------------------
    #[error("value mismatch for key {key}: found byte {found:#04x}")]
    ContentMismatch { key: String, found: u8 },

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Workload Errors
    // -------------------------------------------------------------------------
    #[error("Key generation failed: {0}")]
    Generation(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("{phase} failed for key {key}: {source}")]
    Operation {
        phase: Phase,
        key: String,
        #[source]
        source: Box<BenchError>,
    },

    #[error("Worker failed: {0}")]
    Worker(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Device full: all {capacity} slots in use")]
    DeviceFull { capacity: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BenchError {
    /// Attach the failing phase and key to a backend error
    pub fn during(self, phase: Phase, key: impl Into<String>) -> Self {
        BenchError::Operation {
            phase,
            key: key.into(),
            source: Box::new(self),
        }
    }
}
