//! Sequential and parallel trials.
//!
//! A trial builds one backend, optionally pre-populates it outside the timed
//! window, runs a fixed number of operations and returns a [`TrialReport`].
//! Construction and pre-population are never timed.

use crate::backend::{BackendConfig, BackendKind, CacheBackend, HashFunction};
use crate::error::{Error, Result};
use crate::telemetry::{TrialCounters, TrialTally};
use crate::workload::{self, MAX_WORKER_ID};

use rand::seq::index;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

/// Operation mix of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Writes only
    Set,
    /// Reads of a pre-populated backend
    Get,
    /// Writes followed by reads, both timed
    SetThenGet,
}

impl Operation {
    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "set",
            Operation::Get => "get",
            Operation::SetThenGet => "set_then_get",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How operations are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Concurrency {
    /// One thread
    Sequential,
    /// Several scoped worker threads sharing one backend
    Parallel {
        /// Worker count
        workers: usize,
    },
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Sequential => f.write_str("sequential"),
            Concurrency::Parallel { workers } => write!(f, "parallel({workers})"),
        }
    }
}

/// Measurements of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Backend driven
    pub backend: BackendKind,
    /// Hash function the backend used
    pub hasher: HashFunction,
    /// Operation mix
    pub operation: Operation,
    /// Scheduling mode
    pub concurrency: Concurrency,
    /// Operations inside the timed window
    pub operations: u64,
    /// Wall time of the timed window
    pub elapsed: Duration,
    /// Read and write outcomes
    pub tally: TrialTally,
}

impl TrialReport {
    /// Mean nanoseconds per operation.
    pub fn ns_per_op(&self) -> f64 {
        if self.operations == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.operations as f64
    }

    /// Operations per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.operations as f64 / secs
        } else {
            0.0
        }
    }
}

/// Write records `0..count` into `backend`, counting failures.
pub fn populate<B: CacheBackend>(
    backend: &B,
    count: u64,
    value_size: usize,
    counters: &TrialCounters,
) -> Result<()> {
    for i in 0..count {
        let record = workload::generate(i, value_size)?;
        counters.record_set(&backend.set(record.key, record.value));
    }
    Ok(())
}

fn read_range<B: CacheBackend>(backend: &B, count: u64, counters: &TrialCounters) {
    for i in 0..count {
        let result = backend.get(&workload::key(i));
        counters.record_get(&result);
        black_box(result.ok());
    }
}

fn warn_on_set_errors(kind: BackendKind, tally: &TrialTally) {
    if tally.set_errors > 0 {
        tracing::warn!(
            backend = %kind,
            set_errors = tally.set_errors,
            "backend rejected writes during the trial"
        );
    }
}

/// Run `ops` operations on one thread.
pub fn run_sequential<B: CacheBackend>(
    config: &BackendConfig,
    operation: Operation,
    ops: u64,
    value_size: usize,
) -> Result<TrialReport> {
    workload::expected_value(0, value_size)?;
    let backend = B::construct(config)?;
    let counters = TrialCounters::new();

    if operation == Operation::Get {
        populate(&backend, ops, value_size, &counters)?;
    }

    let start = Instant::now();
    match operation {
        Operation::Set => populate(&backend, ops, value_size, &counters)?,
        Operation::Get => read_range(&backend, ops, &counters),
        Operation::SetThenGet => {
            populate(&backend, ops, value_size, &counters)?;
            read_range(&backend, ops, &counters);
        }
    }
    let elapsed = start.elapsed();

    let tally = counters.snapshot();
    warn_on_set_errors(B::KIND, &tally);

    let operations = match operation {
        Operation::SetThenGet => ops.saturating_mul(2),
        _ => ops,
    };

    Ok(TrialReport {
        backend: B::KIND,
        hasher: backend.hash_function(),
        operation,
        concurrency: Concurrency::Sequential,
        operations,
        elapsed,
        tally,
    })
}

/// Draw `workers` distinct random worker ids.
pub fn worker_ids(workers: usize) -> Result<Vec<u32>> {
    let space = MAX_WORKER_ID as usize + 1;
    if workers > space {
        return Err(Error::config_key(
            format!("at most {space} workers are supported"),
            "workers",
        ));
    }
    let mut rng = rand::thread_rng();
    Ok(index::sample(&mut rng, space, workers)
        .into_vec()
        .into_iter()
        .map(|id| id as u32)
        .collect())
}

/// Split `ops` across `workers`, remainder to the first workers.
pub fn split_ops(ops: u64, workers: usize) -> Vec<u64> {
    let workers = workers.max(1) as u64;
    let base = ops / workers;
    let extra = ops % workers;
    (0..workers)
        .map(|w| base + u64::from(w < extra))
        .collect()
}

/// Per-worker write body: `ops` sets of keys unique to `worker_id`.
pub fn set_worker<B: CacheBackend>(
    backend: &B,
    worker_id: u32,
    ops: u64,
    value_size: usize,
    counters: &TrialCounters,
) -> Result<()> {
    for counter in 0..ops {
        let record = workload::parallel_generate(worker_id, counter, value_size)?;
        counters.record_set(&backend.set(record.key, record.value));
    }
    Ok(())
}

/// Per-worker read body: `ops` gets over the shared key space `0..keyspace`.
pub fn get_worker<B: CacheBackend>(
    backend: &B,
    ops: u64,
    keyspace: u64,
    counters: &TrialCounters,
) {
    let keyspace = keyspace.max(1);
    for counter in 0..ops {
        let result = backend.get(&workload::key(counter % keyspace));
        counters.record_get(&result);
        black_box(result.ok());
    }
}

/// Per-worker read-back of the keys [`set_worker`] wrote for `worker_id`.
pub fn read_back_worker<B: CacheBackend>(
    backend: &B,
    worker_id: u32,
    ops: u64,
    counters: &TrialCounters,
) {
    for counter in 0..ops {
        let result = backend.get(&workload::parallel_key(worker_id, counter));
        counters.record_get(&result);
        black_box(result.ok());
    }
}

/// Run the timed part of a parallel trial against an existing backend.
///
/// All workers are joined before the clock stops. Returns the elapsed time.
pub fn drive_parallel<B: CacheBackend + Sync>(
    backend: &B,
    operation: Operation,
    workers: usize,
    ops: u64,
    value_size: usize,
    counters: &TrialCounters,
) -> Result<Duration> {
    let shares = split_ops(ops, workers);
    let ids = worker_ids(shares.len())?;

    let start = Instant::now();
    let results: Vec<Result<()>> = thread::scope(|scope| {
        let handles: Vec<_> = shares
            .iter()
            .zip(&ids)
            .map(|(&share, &worker_id)| {
                scope.spawn(move || match operation {
                    Operation::Set => set_worker(backend, worker_id, share, value_size, counters),
                    Operation::Get => {
                        get_worker(backend, share, ops, counters);
                        Ok(())
                    }
                    Operation::SetThenGet => {
                        set_worker(backend, worker_id, share, value_size, counters)?;
                        read_back_worker(backend, worker_id, share, counters);
                        Ok(())
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::internal("trial worker panicked")))
            })
            .collect()
    });
    let elapsed = start.elapsed();

    results.into_iter().collect::<Result<Vec<()>>>()?;
    Ok(elapsed)
}

/// Run `ops` operations split across `workers` threads sharing one backend.
pub fn run_parallel<B: CacheBackend + Sync>(
    config: &BackendConfig,
    operation: Operation,
    workers: usize,
    ops: u64,
    value_size: usize,
) -> Result<TrialReport> {
    workload::expected_value(0, value_size)?;
    let workers = workers.max(1);
    let backend = B::construct(config)?;
    let counters = TrialCounters::new();

    if operation == Operation::Get {
        populate(&backend, ops, value_size, &counters)?;
    }

    let elapsed = drive_parallel(&backend, operation, workers, ops, value_size, &counters)?;

    let tally = counters.snapshot();
    warn_on_set_errors(B::KIND, &tally);

    let operations = match operation {
        Operation::SetThenGet => ops.saturating_mul(2),
        _ => ops,
    };

    Ok(TrialReport {
        backend: B::KIND,
        hasher: backend.hash_function(),
        operation,
        concurrency: Concurrency::Parallel { workers },
        operations,
        elapsed,
        tally,
    })
}

/// Run a trial chosen at runtime.
///
/// Parallel trials on a backend that is not `Sync` return
/// [`Error::NotConcurrent`].
pub fn run_trial(
    kind: BackendKind,
    config: &BackendConfig,
    operation: Operation,
    concurrency: Concurrency,
    ops: u64,
    value_size: usize,
) -> Result<TrialReport> {
    match concurrency {
        Concurrency::Sequential => crate::with_backend!(kind, config.hasher, B => {
            run_sequential::<B>(config, operation, ops, value_size)
        }),
        Concurrency::Parallel { workers } => {
            crate::with_concurrent_backend!(kind, config.hasher, B => {
                run_parallel::<B>(config, operation, workers, ops, value_size)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ArenaCache, ConcurrentMap, NativeMap, ShardedTtlCache, XxHashBuilder};
    use crate::check;
    use std::collections::hash_map::RandomState;

    #[test]
    fn test_split_ops() {
        assert_eq!(split_ops(10, 3), vec![4, 3, 3]);
        assert_eq!(split_ops(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_ops(5, 0), vec![5]);
        assert_eq!(split_ops(12, 4).iter().sum::<u64>(), 12);
    }

    #[test]
    fn test_worker_ids_are_distinct() {
        let mut ids = worker_ids(64).unwrap();
        assert!(ids.iter().all(|id| *id <= MAX_WORKER_ID));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 64);
        assert!(worker_ids(10_001).is_err());
    }

    #[test]
    fn test_sequential_get_hits_everything() {
        let config = BackendConfig::new(1_000);
        let report = run_sequential::<NativeMap<RandomState>>(&config, Operation::Get, 1_000, 100)
            .unwrap();

        assert_eq!(report.operations, 1_000);
        assert_eq!(report.tally.hits, 1_000);
        assert_eq!(report.tally.misses, 0);
        assert_eq!(report.concurrency, Concurrency::Sequential);
    }

    #[test]
    fn test_sequential_set_then_get() {
        let config = BackendConfig::new(500)
            .with_shards(4)
            .with_hasher(HashFunction::XxHash);
        let report = run_sequential::<ShardedTtlCache<XxHashBuilder>>(
            &config,
            Operation::SetThenGet,
            500,
            100,
        )
        .unwrap();

        assert_eq!(report.operations, 1_000);
        assert_eq!(report.tally.hits, 500);
        assert_eq!(report.hasher, HashFunction::XxHash);
    }

    #[test]
    fn test_sequential_rejects_short_values() {
        let config = BackendConfig::new(10);
        let err = run_sequential::<NativeMap<RandomState>>(&config, Operation::Set, 10, 3)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValueSize { .. }));
    }

    #[test]
    fn test_parallel_get_reads_shared_keyspace() {
        let config = BackendConfig::new(2_000);
        let report =
            run_parallel::<ConcurrentMap<RandomState>>(&config, Operation::Get, 4, 2_000, 64)
                .unwrap();

        assert_eq!(report.tally.hits, 2_000);
        assert_eq!(report.concurrency, Concurrency::Parallel { workers: 4 });
    }

    fn sets_survive_read_back<B: CacheBackend + Sync>() {
        const WORKERS: usize = 8;
        const PER_WORKER: u64 = 500;
        const VALUE_SIZE: usize = 64;

        let config = BackendConfig::new(WORKERS as u64 * PER_WORKER).with_shards(8);
        let backend = B::construct(&config).unwrap();
        let counters = TrialCounters::new();
        let ids = worker_ids(WORKERS).unwrap();

        thread::scope(|scope| {
            for &id in &ids {
                let backend = &backend;
                let counters = &counters;
                scope.spawn(move || {
                    set_worker(backend, id, PER_WORKER, VALUE_SIZE, counters).unwrap();
                });
            }
        });
        assert_eq!(counters.snapshot().set_errors, 0, "{}", B::KIND);

        for &id in &ids {
            for counter in 0..PER_WORKER {
                let actual = backend.get(&workload::parallel_key(id, counter));
                let outcome = check::check_parallel(&actual, id, counter, VALUE_SIZE);
                assert!(outcome.is_match(), "{} worker {} key {}", B::KIND, id, counter);
            }
        }
    }

    #[test]
    fn test_parallel_sets_survive_read_back() {
        sets_survive_read_back::<ConcurrentMap<RandomState>>();
        sets_survive_read_back::<ConcurrentMap<XxHashBuilder>>();
        sets_survive_read_back::<ShardedTtlCache<RandomState>>();
        sets_survive_read_back::<ShardedTtlCache<XxHashBuilder>>();
        sets_survive_read_back::<ArenaCache<RandomState>>();
        sets_survive_read_back::<ArenaCache<XxHashBuilder>>();
    }

    #[test]
    fn test_run_trial_dispatch() {
        let config = BackendConfig::new(256);
        let report = run_trial(
            BackendKind::Arena,
            &config,
            Operation::Set,
            Concurrency::Parallel { workers: 2 },
            256,
            100,
        )
        .unwrap();
        assert_eq!(report.backend, BackendKind::Arena);
        assert_eq!(report.tally.set_errors, 0);

        let err = run_trial(
            BackendKind::NativeMap,
            &config,
            Operation::Set,
            Concurrency::Parallel { workers: 2 },
            256,
            100,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotConcurrent { .. }));
    }

    #[test]
    fn test_construction_error_propagates() {
        let config = BackendConfig::new(10).with_shards(3);
        let result = run_sequential::<ConcurrentMap<RandomState>>(&config, Operation::Set, 10, 100);
        assert!(matches!(result, Err(Error::Construction { .. })));

        let config = BackendConfig::new(10);
        assert!(
            run_sequential::<ArenaCache<RandomState>>(&config, Operation::Set, 10, 100).is_ok()
        );
    }
}
