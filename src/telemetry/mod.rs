//! Logging setup and per-trial counters.
//!
//! Report lines go to stdout; everything logged through `tracing` goes to
//! stderr so the two never interleave in a captured report.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `level` is one of trace/debug/info/warn/error (anything else means info);
/// `RUST_LOG` directives are layered on top.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| Error::internal(format!("Failed to set logging subscriber: {}", e)))
}

/// Outcome counters shared by the workers of one trial.
#[derive(Debug, Default)]
pub struct TrialCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    set_errors: AtomicU64,
    get_errors: AtomicU64,
}

impl TrialCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a `set`.
    pub fn record_set<T>(&self, result: &Result<T>) {
        if result.is_err() {
            self.set_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the outcome of a `get`.
    pub fn record_get(&self, result: &Result<Option<Vec<u8>>>) {
        let counter = match result {
            Ok(Some(_)) => &self.hits,
            Ok(None) => &self.misses,
            Err(_) => &self.get_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values.
    pub fn snapshot(&self) -> TrialTally {
        TrialTally {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            set_errors: self.set_errors.load(Ordering::Relaxed),
            get_errors: self.get_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`TrialCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialTally {
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Failed writes
    pub set_errors: u64,
    /// Failed reads
    pub get_errors: u64,
}

impl TrialTally {
    /// Hit rate percentage over all reads that did not fail.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let counters = TrialCounters::new();

        counters.record_set(&Ok(()));
        counters.record_set::<()>(&Err(Error::set("arena", "k", "full")));
        counters.record_get(&Ok(Some(vec![1])));
        counters.record_get(&Ok(Some(vec![2])));
        counters.record_get(&Ok(None));
        counters.record_get(&Err(Error::get("arena", "k", "broken")));

        let tally = counters.snapshot();
        assert_eq!(tally.hits, 2);
        assert_eq!(tally.misses, 1);
        assert_eq!(tally.set_errors, 1);
        assert_eq!(tally.get_errors, 1);
        assert!((tally.hit_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_hit_rate() {
        assert_eq!(TrialTally::default().hit_rate(), 0.0);
    }
}
