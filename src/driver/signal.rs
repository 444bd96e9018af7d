//! Cooperative cancellation
//!
//! Workers poll these flags between backend calls. Nothing interrupts a call
//! already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot broadcast flag shared by every worker of a phase
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal; later calls are no-ops
    pub fn fire(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Non-blocking check
    pub fn is_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The two signals a phase's workers watch
///
/// - `stop`: nominal duration elapsed (time-bounded phases only)
/// - `abort`: another worker hit a fatal error (all phases)
#[derive(Debug, Clone, Default)]
pub struct PhaseSignals {
    pub stop: StopSignal,
    pub abort: StopSignal,
}

impl PhaseSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Should a time-bounded loop exit
    pub fn should_stop(&self) -> bool {
        self.stop.is_fired() || self.abort.is_fired()
    }

    /// Should a fixed-key-set loop bail out early
    pub fn aborted(&self) -> bool {
        self.abort.is_fired()
    }
}
