//! Result aggregation
//!
//! Turns per-worker outcomes into per-phase rates and bandwidth.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::driver::Phase;
use crate::workload::Key;

const MIB: f64 = (1 << 20) as f64;

/// Aggregate figures for one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,

    /// Operations completed across all workers
    pub operations: u64,

    /// Bytes moved (operations × value size)
    pub bytes: u64,

    /// Divisor used for the rates
    #[serde(rename = "window_secs", serialize_with = "as_secs_f64")]
    pub window: Duration,

    pub ops_per_sec: f64,
    pub bytes_per_sec: f64,
}

impl PhaseReport {
    /// Compute rates for `operations` of `value_size` bytes over `window`
    ///
    /// A zero window (nothing to do) reports zero rates rather than infinity.
    pub fn over_window(phase: Phase, operations: u64, value_size: usize, window: Duration) -> Self {
        let bytes = operations * value_size as u64;
        let secs = window.as_secs_f64();
        let (ops_per_sec, bytes_per_sec) = if secs > 0.0 {
            (operations as f64 / secs, bytes as f64 / secs)
        } else {
            (0.0, 0.0)
        };

        Self {
            phase,
            operations,
            bytes,
            window,
            ops_per_sec,
            bytes_per_sec,
        }
    }

    pub fn mib_per_sec(&self) -> f64 {
        self.bytes_per_sec / MIB
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/sec {:.2} ({:.2} MiB/s over {:.3}s)",
            self.phase.op_name(),
            self.ops_per_sec,
            self.mib_per_sec(),
            self.window.as_secs_f64()
        )
    }
}

/// Aggregate figures for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub workers: usize,
    pub value_size: usize,
    pub total_keys: u64,
    pub write: PhaseReport,
    pub read: PhaseReport,
    pub delete: PhaseReport,
}

impl BenchmarkReport {
    /// Phase reports in execution order
    fn phases(&self) -> [&PhaseReport; 3] {
        [&self.write, &self.read, &self.delete]
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "number of keys {}", self.total_keys)?;
        for phase in self.phases() {
            writeln!(f, "{}", phase)?;
        }
        Ok(())
    }
}

/// Total keys across all worker key lists
pub fn total_keys(key_sets: &[Vec<Key>]) -> u64 {
    key_sets.iter().map(|keys| keys.len() as u64).sum()
}

/// Mean of per-worker elapsed times (zero for no workers)
pub fn mean_elapsed(elapsed: &[Duration]) -> Duration {
    if elapsed.is_empty() {
        return Duration::ZERO;
    }
    let total: Duration = elapsed.iter().sum();
    let count = u32::try_from(elapsed.len()).unwrap_or(u32::MAX);
    total / count
}

fn as_secs_f64<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
