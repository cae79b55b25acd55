//! Benchmarks module
//!
//! Contains the benchmark infrastructure:
//! - `BenchmarkResult` struct
//! - `run_all_benchmarks()` entrypoint
//! - Markdown report generation
//! - Result files

pub mod io;
pub mod markdown;
pub mod result;

pub use result::BenchmarkResult;

use crate::adapters::{all_targets, BenchTarget};

/// Run every registered target and collect the results.
///
/// A target that fails yields a failed result instead of stopping the run.
///
/// # Example
///
/// ```rust,no_run
/// use cachebench_suite::benchmarks::run_all_benchmarks;
///
/// #[tokio::main]
/// async fn main() {
///     let results = run_all_benchmarks().await;
///     for result in results {
///         println!("Target: {}, Metrics: {}", result.target_id, result.metrics);
///     }
/// }
/// ```
pub async fn run_all_benchmarks() -> Vec<BenchmarkResult> {
    run_targets(&all_targets()).await
}

/// Run `targets` in order.
pub async fn run_targets(targets: &[Box<dyn BenchTarget>]) -> Vec<BenchmarkResult> {
    let mut results = Vec::with_capacity(targets.len());

    tracing::info!("Running {} benchmark targets", targets.len());

    for target in targets {
        let target_id = target.id();
        tracing::info!(target = target_id, "running benchmark");

        match target.run().await {
            Ok(result) => {
                tracing::info!(
                    target = target_id,
                    duration_ms = result.duration_ms().unwrap_or_default(),
                    "benchmark completed"
                );
                results.push(result);
            }
            Err(e) => {
                tracing::error!(target = target_id, error = %e, "benchmark failed");
                results.push(BenchmarkResult::failed(target_id, e.to_string()));
            }
        }
    }

    tracing::info!("Completed {} benchmarks", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CacheOpAdapter, PauseCycleAdapter};
    use cachebench::backend::{BackendKind, HashFunction};
    use cachebench::core::{Concurrency, Operation};

    #[tokio::test]
    async fn test_failed_target_does_not_stop_run() {
        let targets: Vec<Box<dyn BenchTarget>> = vec![
            Box::new(
                CacheOpAdapter::new(
                    BackendKind::NativeMap,
                    HashFunction::Default,
                    Operation::Set,
                    Concurrency::Parallel { workers: 2 },
                )
                .with_size(10, 1),
            ),
            Box::new(PauseCycleAdapter::new(BackendKind::NativeMap).with_size(100, 1)),
        ];

        let results = run_targets(&targets).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].is_success());
        assert!(results[1].is_success());
    }
}
