//! Adapters Module
//!
//! Contains the canonical `BenchTarget` trait and adapter implementations
//! for cache operations and reclamation pauses.
//!
//! This module provides:
//! - `BenchTarget` trait with `id()` and `run()` methods
//! - `all_targets()` registry returning `Vec<Box<dyn BenchTarget>>`
//! - One target per backend, operation, concurrency and hasher combination

pub mod cache_ops;
pub mod gc_overhead;

use crate::benchmarks::BenchmarkResult;
use async_trait::async_trait;
use cachebench::backend::{BackendKind, HashFunction};
use cachebench::core::{Concurrency, Operation};
use std::error::Error;

pub use cache_ops::CacheOpAdapter;
pub use gc_overhead::PauseCycleAdapter;

/// Canonical benchmark target trait.
///
/// All benchmark adapters must implement this trait to be registered
/// in the benchmark suite.
///
/// # Example
///
/// ```rust
/// use cachebench_suite::adapters::BenchTarget;
/// use cachebench_suite::benchmarks::BenchmarkResult;
/// use async_trait::async_trait;
///
/// struct MyBenchmark;
///
/// #[async_trait]
/// impl BenchTarget for MyBenchmark {
///     fn id(&self) -> &str {
///         "my_benchmark"
///     }
///
///     async fn run(&self) -> Result<BenchmarkResult, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(BenchmarkResult::new("my_benchmark", serde_json::json!({"duration_ms": 10.0})))
///     }
/// }
/// ```
#[async_trait]
pub trait BenchTarget: Send + Sync {
    /// Returns the unique identifier for this benchmark target.
    ///
    /// The ID should be valid as a filename and unique across all targets.
    fn id(&self) -> &str;

    /// Execute the benchmark and return results.
    ///
    /// # Errors
    ///
    /// Returns an error if the benchmark cannot be executed.
    async fn run(&self) -> Result<BenchmarkResult, Box<dyn Error + Send + Sync>>;

    /// Optional: Get a human-readable description of this benchmark.
    fn description(&self) -> &str {
        "No description provided"
    }

    /// Optional: Get the expected duration category.
    fn duration_category(&self) -> DurationCategory {
        DurationCategory::Medium
    }
}

/// Duration category for benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationCategory {
    /// Fast benchmarks (< 1 second)
    Fast,
    /// Medium benchmarks (1-10 seconds)
    Medium,
    /// Slow benchmarks (> 10 seconds)
    Slow,
}

/// Worker count for parallel targets.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Registry of all benchmark targets.
///
/// Sequential set and get for every backend and hasher, parallel set and
/// get for the backends that can be shared, and one pause target per
/// backend.
///
/// # Example
///
/// ```rust
/// use cachebench_suite::adapters::all_targets;
///
/// let targets = all_targets();
/// println!("Found {} benchmark targets", targets.len());
/// for target in &targets {
///     println!("  - {}: {}", target.id(), target.description());
/// }
/// ```
pub fn all_targets() -> Vec<Box<dyn BenchTarget>> {
    let workers = default_workers();
    let mut targets: Vec<Box<dyn BenchTarget>> = Vec::new();

    for kind in BackendKind::ALL {
        for hasher in HashFunction::ALL {
            for operation in [Operation::Set, Operation::Get] {
                targets.push(Box::new(CacheOpAdapter::new(
                    kind,
                    hasher,
                    operation,
                    Concurrency::Sequential,
                )));
                if kind.is_concurrent() {
                    targets.push(Box::new(CacheOpAdapter::new(
                        kind,
                        hasher,
                        operation,
                        Concurrency::Parallel { workers },
                    )));
                }
            }
        }
    }

    for kind in BackendKind::ALL {
        targets.push(Box::new(PauseCycleAdapter::new(kind)));
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_targets_not_empty() {
        let targets = all_targets();
        assert!(!targets.is_empty(), "Should have at least one benchmark target");
    }

    #[test]
    fn test_unique_ids() {
        let targets = all_targets();
        let mut ids: Vec<&str> = targets.iter().map(|t| t.id()).collect();
        ids.sort();
        let original_len = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), original_len, "All target IDs should be unique");
    }

    #[test]
    fn test_target_matrix() {
        let targets = all_targets();
        let ids: Vec<&str> = targets.iter().map(|t| t.id()).collect();

        // 4 backends x 2 hashers x 2 ops sequential, 3 backends parallel, 4 pause
        assert_eq!(ids.len(), 16 + 12 + 4);
        assert!(ids.contains(&"native_map_set"));
        assert!(ids.contains(&"sharded_ttl_get_xxhash"));
        assert!(ids.contains(&"concurrent_map_set_parallel"));
        assert!(ids.contains(&"pause_arena"));
        assert!(!ids.contains(&"native_map_set_parallel"));
    }
}
