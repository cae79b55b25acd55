//! Reclamation Pause Benchmark Adapter
//!
//! Runs back-to-back population cycles of one backend and samples the
//! reclaimer after every cycle, so each sample covers exactly one discarded
//! backend.

use super::cache_ops::duration_stats;
use super::{BenchTarget, DurationCategory};
use crate::benchmarks::BenchmarkResult;
use async_trait::async_trait;
use cachebench::backend::{BackendConfig, BackendKind};
use cachebench::config::{DEFAULT_GROWTH_PERCENT, DEFAULT_VALUE_SIZE};
use cachebench::core::run_cycle;
use cachebench::{PauseSampler, Reclaimer};
use serde_json::json;
use std::error::Error;

/// Entries per population cycle.
pub const ENTRIES: u64 = 200_000;

/// Cycles per target.
pub const CYCLES: u32 = 5;

/// Adapter measuring the pause caused by discarding a populated backend.
pub struct PauseCycleAdapter {
    id: String,
    kind: BackendKind,
    entries: u64,
    cycles: u32,
}

impl PauseCycleAdapter {
    /// Create an adapter with the default cycle size.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            id: format!("pause_{}", kind),
            kind,
            entries: ENTRIES,
            cycles: CYCLES,
        }
    }

    /// Override entries per cycle and cycle count.
    pub fn with_size(mut self, entries: u64, cycles: u32) -> Self {
        self.entries = entries;
        self.cycles = cycles.max(1);
        self
    }
}

#[async_trait]
impl BenchTarget for PauseCycleAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "Reclamation pause per discarded, fully populated backend"
    }

    fn duration_category(&self) -> DurationCategory {
        DurationCategory::Slow
    }

    async fn run(&self) -> Result<BenchmarkResult, Box<dyn Error + Send + Sync>> {
        let (kind, entries, cycles) = (self.kind, self.entries, self.cycles);

        let metrics = tokio::task::spawn_blocking(move || -> cachebench::Result<_> {
            let config = BackendConfig::new(entries);
            let reclaimer = Reclaimer::new(DEFAULT_GROWTH_PERCENT);
            let mut sampler = PauseSampler::new(&reclaimer);
            sampler.sample()?;

            let mut pauses = Vec::with_capacity(cycles as usize);
            let mut populate_ms = 0.0;
            let mut mismatches = 0u32;
            let mut set_errors = 0u64;
            let mut collections = 0u64;

            for _ in 0..cycles {
                let outcome = run_cycle(kind, &config, entries, DEFAULT_VALUE_SIZE, &reclaimer)?;
                let sample = sampler.sample()?;

                populate_ms += outcome.elapsed.as_secs_f64() * 1000.0;
                mismatches += u32::from(!outcome.check.is_match());
                set_errors += outcome.set_errors;
                collections += sample.collections;
                pauses.push(sample.pause.as_secs_f64() * 1000.0);
            }

            let total_pause_ms: f64 = pauses.iter().sum();
            let mut metrics = json!({
                "success": mismatches == 0,
                "backend": kind.as_str(),
                "entries": entries,
                "cycles": cycles,
                "collections": collections,
                "duration_ms": total_pause_ms,
                "populate_ms": populate_ms,
                "check_failures": mismatches,
                "set_errors": set_errors,
            });
            if let (Some(target), serde_json::Value::Object(stats)) =
                (metrics.as_object_mut(), duration_stats(&mut pauses))
            {
                target.extend(stats);
            }
            Ok(metrics)
        })
        .await??;

        Ok(BenchmarkResult::new(self.id(), metrics))
    }
}
