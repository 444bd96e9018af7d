//! Configuration for a benchmark run
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BenchError, Result};

/// Configuration for one benchmark run
#[derive(Debug, Clone)]
pub struct BenchConfig {
    // -------------------------------------------------------------------------
    // Target Configuration
    // -------------------------------------------------------------------------
    /// Directory (file backend) or device path (device backend)
    pub target: PathBuf,

    /// Open files with O_SYNC so every put reaches stable storage
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Workload Configuration
    // -------------------------------------------------------------------------
    /// Nominal duration of each time-bounded phase
    pub duration: Duration,

    /// Size of every value in bytes
    pub value_size: usize,

    /// Number of concurrent workers per phase
    pub workers: usize,

    /// How the read phase terminates
    pub read_mode: ReadMode,
}

/// Termination policy for the read phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Read every written key exactly once
    SinglePass,

    /// Cycle over the written keys until the nominal duration elapses
    Timed,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::new(),
            sync_writes: true,
            duration: Duration::from_secs(10),
            value_size: 2 * 1024 * 1024, // 2 MiB
            workers: 1,
            read_mode: ReadMode::SinglePass,
        }
    }
}

impl BenchConfig {
    /// Create a new config builder
    pub fn builder() -> BenchConfigBuilder {
        BenchConfigBuilder::default()
    }

    /// Reject configurations that cannot produce a measurement
    pub fn validate(&self) -> Result<()> {
        if self.target.as_os_str().is_empty() {
            return Err(BenchError::Config("path not specified".to_string()));
        }
        if self.workers == 0 {
            return Err(BenchError::Config("worker count must be at least 1".to_string()));
        }
        // Write and timed-read rates divide by the nominal duration
        if self.duration.is_zero() {
            return Err(BenchError::Config("duration must be greater than zero".to_string()));
        }
        if self.value_size == 0 {
            return Err(BenchError::Config("value size must be at least 1 byte".to_string()));
        }
        Ok(())
    }
}

/// Builder for BenchConfig
#[derive(Default)]
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    /// Set the target path
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.target = path.into();
        self
    }

    /// Set whether writes are opened with O_SYNC
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the nominal phase duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    /// Set the value size (in bytes)
    pub fn value_size(mut self, size: usize) -> Self {
        self.config.value_size = size;
        self
    }

    /// Set the number of workers per phase
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set how the read phase terminates
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.config.read_mode = mode;
        self
    }

    /// Finish building the config (not validated; see `BenchConfig::validate`)
    pub fn build(self) -> BenchConfig {
        self.config
    }
}
