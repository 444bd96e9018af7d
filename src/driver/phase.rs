//! Phase Runner
//!
//! Runs one phase across N worker threads and collects exactly N results.
//!
//! ## Barrier
//! `run` returns only after every worker has reported and been joined, so
//! the next phase never overlaps with operations from this one.

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver};
use crossbeam::select;

use crate::config::ReadMode;
use crate::error::{BenchError, Result};
use crate::storage::StorageBackend;
use crate::workload::{reset_checked, verify_value, Key, KeyGenerator};

use super::signal::PhaseSignals;
use super::Phase;

/// Keys produced by one write worker
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub keys: Vec<Key>,
    pub elapsed: Duration,
}

/// Verified reads completed by one read worker
#[derive(Debug, Clone)]
pub struct ReadOutcome {
    pub reads: u64,
    pub elapsed: Duration,
}

/// Deletes issued by one delete worker
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub deletes: u64,
    pub elapsed: Duration,
}

/// Spawns and joins the workers of a single phase
pub struct PhaseRunner<'a> {
    backend: &'a dyn StorageBackend,
    workers: usize,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(backend: &'a dyn StorageBackend, workers: usize) -> Self {
        Self { backend, workers }
    }

    /// Run `workers` write loops until `nominal` elapses
    pub fn write(&self, value: &Bytes, nominal: Duration) -> Result<Vec<WriteOutcome>> {
        self.run(Phase::Write, Some(nominal), |id, signals| {
            write_worker(id, self.backend, value.clone(), signals)
        })
    }

    /// Read back each worker's keys
    ///
    /// `key_sets[i]` is read by worker `i`. In `Timed` mode the workers cycle
    /// until `nominal` elapses; in `SinglePass` mode `nominal` is ignored.
    pub fn read(
        &self,
        key_sets: &[Vec<Key>],
        value_size: usize,
        mode: ReadMode,
        nominal: Duration,
    ) -> Result<Vec<ReadOutcome>> {
        let deadline = match mode {
            ReadMode::SinglePass => None,
            ReadMode::Timed => Some(nominal),
        };
        self.run(Phase::Read, deadline, |id, signals| {
            let keys = key_sets.get(id).map(Vec::as_slice).unwrap_or(&[]);
            match mode {
                ReadMode::SinglePass => read_pass_worker(id, self.backend, keys, value_size, signals),
                ReadMode::Timed => read_timed_worker(id, self.backend, keys, value_size, signals),
            }
        })
    }

    /// Delete every key of every worker once
    pub fn delete(&self, key_sets: &[Vec<Key>]) -> Result<Vec<DeleteOutcome>> {
        self.run(Phase::Delete, None, |id, signals| {
            let keys = key_sets.get(id).map(Vec::as_slice).unwrap_or(&[]);
            delete_worker(id, self.backend, keys, signals)
        })
    }

    /// Spawn the workers, fire `stop` after `nominal`, and drain one result per worker
    fn run<T, F>(&self, phase: Phase, nominal: Option<Duration>, work: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize, &PhaseSignals) -> Result<T> + Sync,
    {
        let signals = PhaseSignals::new();
        let (tx, rx) = channel::bounded(self.workers);

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.workers);
            for id in 0..self.workers {
                let tx = tx.clone();
                let work = &work;
                let signals = &signals;
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", phase, id))
                    .spawn_scoped(scope, move || {
                        // A panicking worker never reports; stop the rest of the phase
                        scopeguard::defer_on_unwind! { signals.abort.fire(); }

                        let result = work(id, signals);
                        if result.is_err() {
                            signals.abort.fire();
                        }
                        // The driver keeps the receiver until every worker has reported
                        let _ = tx.send((id, result));
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        signals.abort.fire();
                        return Err(e.into());
                    }
                }
            }
            drop(tx);

            let collected = self.collect(phase, rx, nominal, &signals);

            for handle in handles {
                if handle.join().is_err() {
                    tracing::error!("{} worker panicked", phase);
                }
            }
            collected
        })
    }

    fn collect<T>(
        &self,
        phase: Phase,
        rx: Receiver<(usize, Result<T>)>,
        nominal: Option<Duration>,
        signals: &PhaseSignals,
    ) -> Result<Vec<T>> {
        // `after` delivers exactly once; `never` stands in for fixed-key-set phases
        let timer = match nominal {
            Some(duration) => channel::after(duration),
            None => channel::never(),
        };

        let mut outcomes: Vec<Option<T>> = (0..self.workers).map(|_| None).collect();
        let mut failure: Option<BenchError> = None;
        let mut received = 0;

        while received < self.workers {
            select! {
                recv(rx) -> msg => match msg {
                    Ok((id, Ok(outcome))) => {
                        outcomes[id] = Some(outcome);
                        received += 1;
                    }
                    Ok((id, Err(e))) => {
                        received += 1;
                        tracing::error!("{} worker {} failed: {}", phase, id, e);
                        signals.abort.fire();
                        if failure.is_none() {
                            failure = Some(e);
                        }
                    }
                    Err(_) => {
                        signals.abort.fire();
                        return Err(failure.unwrap_or_else(|| {
                            BenchError::Worker(format!(
                                "{} worker exited without reporting ({} of {} reported)",
                                phase, received, self.workers
                            ))
                        }));
                    }
                },
                recv(timer) -> _ => {
                    tracing::debug!("{} phase: nominal duration elapsed, stopping workers", phase);
                    signals.stop.fire();
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }
        Ok(outcomes.into_iter().flatten().collect())
    }
}

// =============================================================================
// Worker Loops
// =============================================================================

fn write_worker(
    id: usize,
    backend: &dyn StorageBackend,
    value: Bytes,
    signals: &PhaseSignals,
) -> Result<WriteOutcome> {
    tracing::debug!("write worker {} starting", id);
    let start = Instant::now();
    let mut generator = KeyGenerator::new();
    let mut keys = Vec::new();

    loop {
        let key = generator.next_key()?;
        backend
            .put(&key, &value)
            .map_err(|e| e.during(Phase::Write, key.as_str()))?;
        keys.push(key);

        if signals.should_stop() {
            break;
        }
    }

    let elapsed = start.elapsed();
    tracing::debug!("write worker {} wrote {} keys in {:?}", id, keys.len(), elapsed);
    Ok(WriteOutcome { keys, elapsed })
}

fn read_one(backend: &dyn StorageBackend, key: &Key, buf: &mut [u8]) -> Result<()> {
    backend
        .get(key, buf)
        .map_err(|e| e.during(Phase::Read, key.as_str()))?;
    verify_value(key, buf)?;
    reset_checked(buf);
    Ok(())
}

fn read_pass_worker(
    id: usize,
    backend: &dyn StorageBackend,
    keys: &[Key],
    value_size: usize,
    signals: &PhaseSignals,
) -> Result<ReadOutcome> {
    let start = Instant::now();
    let mut buf = vec![0u8; value_size];
    let mut reads = 0;

    for key in keys {
        if signals.aborted() {
            break;
        }
        read_one(backend, key, &mut buf)?;
        reads += 1;
    }

    let elapsed = start.elapsed();
    tracing::debug!("read worker {} verified {} keys in {:?}", id, reads, elapsed);
    Ok(ReadOutcome { reads, elapsed })
}

fn read_timed_worker(
    id: usize,
    backend: &dyn StorageBackend,
    keys: &[Key],
    value_size: usize,
    signals: &PhaseSignals,
) -> Result<ReadOutcome> {
    let start = Instant::now();
    let mut buf = vec![0u8; value_size];
    let mut reads = 0;

    if keys.is_empty() {
        tracing::debug!("read worker {} has no keys", id);
        return Ok(ReadOutcome {
            reads,
            elapsed: start.elapsed(),
        });
    }

    for key in keys.iter().cycle() {
        read_one(backend, key, &mut buf)?;
        reads += 1;

        if signals.should_stop() {
            break;
        }
    }

    let elapsed = start.elapsed();
    tracing::debug!("read worker {} completed {} reads in {:?}", id, reads, elapsed);
    Ok(ReadOutcome { reads, elapsed })
}

fn delete_worker(
    id: usize,
    backend: &dyn StorageBackend,
    keys: &[Key],
    signals: &PhaseSignals,
) -> Result<DeleteOutcome> {
    let start = Instant::now();
    let mut deletes = 0;

    for key in keys {
        if signals.aborted() {
            break;
        }
        backend
            .delete(key)
            .map_err(|e| e.during(Phase::Delete, key.as_str()))?;
        deletes += 1;
    }

    let elapsed = start.elapsed();
    tracing::debug!("delete worker {} removed {} keys in {:?}", id, deletes, elapsed);
    Ok(DeleteOutcome { deletes, elapsed })
}
