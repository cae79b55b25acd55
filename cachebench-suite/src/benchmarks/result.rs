//! Benchmark Result Definition
//!
//! One `BenchmarkResult` per target: the target id, a free-form JSON metrics
//! object and the UTC time the target finished.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of running one benchmark target.
///
/// Cache operation targets report `ns_per_op`, `throughput`, `hits`,
/// `misses`, `set_errors`, `get_errors` and per-sample timing statistics;
/// pause targets report `duration_ms` (total pause), `collections` and
/// `check_failures`. Failed targets carry `success: false` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Unique identifier for the benchmark target
    pub target_id: String,

    /// JSON object containing benchmark metrics
    pub metrics: Value,

    /// UTC timestamp when the benchmark was executed
    pub timestamp: DateTime<Utc>,
}

impl BenchmarkResult {
    /// Create a new benchmark result with the current timestamp.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cachebench_suite::benchmarks::result::BenchmarkResult;
    /// use serde_json::json;
    ///
    /// let result = BenchmarkResult::new(
    ///     "sharded_ttl_set",
    ///     json!({
    ///         "duration_ms": 42.5,
    ///         "ns_per_op": 85.0,
    ///         "throughput": 11764705.9
    ///     })
    /// );
    /// assert!(result.is_success());
    /// ```
    pub fn new(target_id: impl Into<String>, metrics: Value) -> Self {
        Self::with_timestamp(target_id, metrics, Utc::now())
    }

    /// Create a benchmark result with a specific timestamp.
    pub fn with_timestamp(
        target_id: impl Into<String>,
        metrics: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            metrics,
            timestamp,
        }
    }

    /// Create a failed benchmark result.
    pub fn failed(target_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(
            target_id,
            serde_json::json!({
                "success": false,
                "error": error.into()
            }),
        )
    }

    /// Whether the target succeeded; results without a `success` field count
    /// as successful.
    pub fn is_success(&self) -> bool {
        self.metrics
            .get("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(|v| v.as_f64())
    }

    /// Total measured time in milliseconds.
    pub fn duration_ms(&self) -> Option<f64> {
        self.number("duration_ms")
    }

    /// Operations per second.
    pub fn throughput(&self) -> Option<f64> {
        self.number("throughput")
    }

    /// Mean nanoseconds per operation.
    pub fn ns_per_op(&self) -> Option<f64> {
        self.number("ns_per_op")
    }
}
