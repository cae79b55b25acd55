//! Cache Operation Benchmark Adapter
//!
//! Runs timed set or get trials against one backend and reports per-sample
//! statistics. Each sample builds a fresh backend; construction and get
//! pre-population are excluded from the timings.

use super::{BenchTarget, DurationCategory};
use crate::benchmarks::BenchmarkResult;
use async_trait::async_trait;
use cachebench::backend::{BackendConfig, BackendKind, HashFunction};
use cachebench::config::DEFAULT_VALUE_SIZE;
use cachebench::core::{run_trial, Concurrency, Operation, TrialReport};
use serde_json::{json, Value};
use std::error::Error;

/// Operations per sample.
pub const OPS_PER_SAMPLE: u64 = 100_000;

/// Samples per target.
pub const SAMPLES: usize = 5;

/// Adapter for one backend/operation/concurrency/hasher combination.
pub struct CacheOpAdapter {
    id: String,
    description: String,
    kind: BackendKind,
    hasher: HashFunction,
    operation: Operation,
    concurrency: Concurrency,
    ops: u64,
    value_size: usize,
    samples: usize,
}

impl CacheOpAdapter {
    /// Create an adapter with the default sample size.
    pub fn new(
        kind: BackendKind,
        hasher: HashFunction,
        operation: Operation,
        concurrency: Concurrency,
    ) -> Self {
        let mut id = format!("{}_{}", kind, operation);
        if matches!(concurrency, Concurrency::Parallel { .. }) {
            id.push_str("_parallel");
        }
        if hasher != HashFunction::Default {
            id.push('_');
            id.push_str(hasher.as_str());
        }

        let description = format!(
            "{} {} on {} ({} hasher)",
            concurrency, operation, kind, hasher
        );

        Self {
            id,
            description,
            kind,
            hasher,
            operation,
            concurrency,
            ops: OPS_PER_SAMPLE,
            value_size: DEFAULT_VALUE_SIZE,
            samples: SAMPLES,
        }
    }

    /// Override the operations per sample and the sample count.
    pub fn with_size(mut self, ops: u64, samples: usize) -> Self {
        self.ops = ops;
        self.samples = samples.max(1);
        self
    }

    fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.ops).with_hasher(self.hasher)
    }
}

/// Summary statistics over per-sample durations in milliseconds.
pub(crate) fn duration_stats(durations: &mut [f64]) -> Value {
    if durations.is_empty() {
        return json!({});
    }
    durations.sort_by(|a, b| a.total_cmp(b));
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    let p95_index = ((durations.len() as f64 * 0.95) as usize).min(durations.len() - 1);

    json!({
        "mean_ms": mean,
        "median_ms": durations[durations.len() / 2],
        "min_ms": durations[0],
        "max_ms": durations[durations.len() - 1],
        "p95_ms": durations[p95_index],
    })
}

fn metrics(adapter: &CacheOpAdapter, reports: &[TrialReport]) -> Value {
    let mut durations: Vec<f64> = reports
        .iter()
        .map(|r| r.elapsed.as_secs_f64() * 1000.0)
        .collect();
    let total_ms: f64 = durations.iter().sum();
    let operations: u64 = reports.iter().map(|r| r.operations).sum();
    let hits: u64 = reports.iter().map(|r| r.tally.hits).sum();
    let misses: u64 = reports.iter().map(|r| r.tally.misses).sum();
    let set_errors: u64 = reports.iter().map(|r| r.tally.set_errors).sum();
    let get_errors: u64 = reports.iter().map(|r| r.tally.get_errors).sum();

    let throughput = if total_ms > 0.0 {
        operations as f64 / (total_ms / 1000.0)
    } else {
        0.0
    };
    let ns_per_op = if operations > 0 {
        total_ms * 1_000_000.0 / operations as f64
    } else {
        0.0
    };

    let mut metrics = json!({
        "success": true,
        "backend": adapter.kind.as_str(),
        "hasher": adapter.hasher.as_str(),
        "operation": adapter.operation.as_str(),
        "concurrency": adapter.concurrency,
        "samples": reports.len(),
        "ops_per_sample": adapter.ops,
        "value_size": adapter.value_size,
        "duration_ms": total_ms,
        "ns_per_op": ns_per_op,
        "throughput": throughput,
        "hits": hits,
        "misses": misses,
        "set_errors": set_errors,
        "get_errors": get_errors,
    });

    if let (Value::Object(target), Value::Object(stats)) =
        (&mut metrics, duration_stats(&mut durations))
    {
        target.extend(stats);
    }
    metrics
}

#[async_trait]
impl BenchTarget for CacheOpAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn duration_category(&self) -> DurationCategory {
        DurationCategory::Fast
    }

    async fn run(&self) -> Result<BenchmarkResult, Box<dyn Error + Send + Sync>> {
        let config = self.backend_config();
        let (kind, operation, concurrency) = (self.kind, self.operation, self.concurrency);
        let (ops, value_size, samples) = (self.ops, self.value_size, self.samples);

        // Trials are CPU-bound and spawn their own threads.
        let reports = tokio::task::spawn_blocking(move || {
            (0..samples)
                .map(|_| run_trial(kind, &config, operation, concurrency, ops, value_size))
                .collect::<cachebench::Result<Vec<_>>>()
        })
        .await??;

        Ok(BenchmarkResult::new(self.id(), metrics(self, &reports)))
    }
}
