//! # kvbench
//!
//! A throughput benchmark for key-value storage backends with:
//! - N concurrent workers per phase
//! - Time-bounded write and read phases, fixed-key-set read and delete phases
//! - Read-back verification of every value
//! - Per-phase operation rate and bandwidth
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     BenchmarkDriver                          │
//! │             (write → read → delete, full barrier)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      PhaseRunner                             │
//! │     (N scoped threads, stop signal, result channel)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ KeyGenerator│          │StorageBackend│
//!   │   (UUID)    │          │ (file / dev) │
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod workload;
pub mod storage;
pub mod driver;
pub mod report;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BenchError, Result};
pub use config::{BenchConfig, ReadMode};
pub use driver::{BenchmarkDriver, Phase};
pub use report::{BenchmarkReport, PhaseReport};
pub use storage::{open_backend, BackendKind, StorageBackend};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvbench
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
