//! Driver Module
//!
//! Sequences the write, read and delete phases against one backend.
//!
//! ## Flow
//! ```text
//!   write (N workers, nominal duration)
//!     │  per-worker key lists
//!     ▼
//!   read  (N workers, one pass or nominal duration)
//!     │  same key lists
//!     ▼
//!   delete (N workers, every key once)
//! ```
//! Each arrow is a full barrier: every worker of a phase has reported and
//! been joined before the next phase starts.

mod phase;
mod signal;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::{BenchConfig, ReadMode};
use crate::error::Result;
use crate::report::{mean_elapsed, total_keys, BenchmarkReport, PhaseReport};
use crate::storage::StorageBackend;
use crate::workload::{make_value, Key};

pub use phase::{DeleteOutcome, PhaseRunner, ReadOutcome, WriteOutcome};
pub use signal::{PhaseSignals, StopSignal};

/// One of the three benchmark phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Write,
    Read,
    Delete,
}

impl Phase {
    /// Operation name used in rate lines ("puts", "gets", "deletes")
    pub fn op_name(&self) -> &'static str {
        match self {
            Phase::Write => "puts",
            Phase::Read => "gets",
            Phase::Delete => "deletes",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Write => "write",
            Phase::Read => "read",
            Phase::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Runs a full benchmark against a backend
pub struct BenchmarkDriver<'a> {
    backend: &'a dyn StorageBackend,
    config: BenchConfig,
}

impl<'a> BenchmarkDriver<'a> {
    /// Create a driver, rejecting unusable configs up front
    pub fn new(backend: &'a dyn StorageBackend, config: BenchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Run write → read → delete and aggregate the results
    pub fn run(&self) -> Result<BenchmarkReport> {
        let (key_sets, write) = self.run_write_phase()?;
        let read = self.run_read_phase(&key_sets)?;
        let delete = self.run_delete_phase(&key_sets)?;

        Ok(BenchmarkReport {
            workers: self.config.workers,
            value_size: self.config.value_size,
            total_keys: total_keys(&key_sets),
            write,
            read,
            delete,
        })
    }

    /// Write phase; returns the key list of each worker in worker order
    ///
    /// The rate divisor is the nominal duration, not the measured one, so a
    /// worker slow to observe the stop signal does not inflate the rate.
    pub fn run_write_phase(&self) -> Result<(Vec<Vec<Key>>, PhaseReport)> {
        let nominal = self.config.duration;
        tracing::info!(
            "Write phase: {} workers, {:?}, {} byte values",
            self.config.workers,
            nominal,
            self.config.value_size
        );

        let value = make_value(self.config.value_size);
        let outcomes = self.runner().write(&value, nominal)?;
        if let Some(longest) = outcomes.iter().map(|o| o.elapsed).max() {
            // Workers only see the stop signal after their in-flight put returns
            tracing::debug!("Write phase: slowest worker stopped after {:?}", longest);
        }
        let key_sets: Vec<Vec<Key>> = outcomes.into_iter().map(|o| o.keys).collect();

        let report = PhaseReport::over_window(
            Phase::Write,
            total_keys(&key_sets),
            self.config.value_size,
            nominal,
        );
        tracing::info!("Write phase done: {}", report);
        Ok((key_sets, report))
    }

    /// Read phase over the key lists produced by the write phase
    pub fn run_read_phase(&self, key_sets: &[Vec<Key>]) -> Result<PhaseReport> {
        let mode = self.config.read_mode;
        tracing::info!("Read phase: {} keys, {:?}", total_keys(key_sets), mode);

        let outcomes = self.runner().read(
            key_sets,
            self.config.value_size,
            mode,
            self.config.duration,
        )?;
        let reads = outcomes.iter().map(|o| o.reads).sum();
        let window = match mode {
            ReadMode::Timed => self.config.duration,
            ReadMode::SinglePass => {
                mean_elapsed(&outcomes.iter().map(|o| o.elapsed).collect::<Vec<Duration>>())
            }
        };

        let report = PhaseReport::over_window(Phase::Read, reads, self.config.value_size, window);
        tracing::info!("Read phase done: {}", report);
        Ok(report)
    }

    /// Delete phase; the divisor is the mean per-worker elapsed time
    pub fn run_delete_phase(&self, key_sets: &[Vec<Key>]) -> Result<PhaseReport> {
        tracing::info!("Delete phase: {} keys", total_keys(key_sets));

        let outcomes = self.runner().delete(key_sets)?;
        let deletes = outcomes.iter().map(|o| o.deletes).sum();
        let window = mean_elapsed(&outcomes.iter().map(|o| o.elapsed).collect::<Vec<Duration>>());

        let report =
            PhaseReport::over_window(Phase::Delete, deletes, self.config.value_size, window);
        tracing::info!("Delete phase done: {}", report);
        Ok(report)
    }

    fn runner(&self) -> PhaseRunner<'a> {
        PhaseRunner::new(self.backend, self.config.workers)
    }
}
