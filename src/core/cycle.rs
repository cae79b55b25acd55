//! Population cycles for the pause driver.
//!
//! A cycle builds a fresh backend, fills it, verifies the first record and
//! hands the whole backend to the [`Reclaimer`]. Running cycles back to back
//! is what produces reclaimable garbage between pause samples.

use crate::backend::{BackendConfig, BackendKind, CacheBackend};
use crate::check::{self, CheckOutcome};
use crate::error::Result;
use crate::reclaim::Reclaimer;
use crate::telemetry::TrialCounters;
use crate::workload;

use std::time::{Duration, Instant};

use super::trial::populate;

/// Index whose value is read back at the end of every cycle.
pub const CHECKED_INDEX: u64 = 1;

/// What one population cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Backend that was populated
    pub backend: BackendKind,
    /// Entries written
    pub entries: u64,
    /// Writes the backend rejected
    pub set_errors: u64,
    /// Read-back of [`CHECKED_INDEX`]
    pub check: CheckOutcome,
    /// Time spent populating, construction excluded
    pub elapsed: Duration,
}

/// Rough heap footprint of a populated backend, for the reclaimer trigger.
pub fn approx_footprint(entries: u64, value_size: usize) -> u64 {
    let key_len = workload::key(0).len() as u64;
    entries.saturating_mul(key_len + value_size as u64)
}

/// Construct `B`, write `0..entries`, check index 1 and dispose of the
/// backend through `reclaimer`.
pub fn population_cycle<B>(
    config: &BackendConfig,
    entries: u64,
    value_size: usize,
    reclaimer: &Reclaimer,
) -> Result<CycleOutcome>
where
    B: CacheBackend + Send + 'static,
{
    workload::expected_value(0, value_size)?;
    let backend = B::construct(config)?;
    let counters = TrialCounters::new();

    let start = Instant::now();
    populate(&backend, entries, value_size, &counters)?;
    let elapsed = start.elapsed();

    let outcome = check::check(
        &backend.get(&workload::key(CHECKED_INDEX)),
        CHECKED_INDEX,
        value_size,
    );

    let set_errors = counters.snapshot().set_errors;
    if set_errors > 0 {
        tracing::warn!(backend = %B::KIND, set_errors, "backend rejected writes during population");
    }
    tracing::debug!(
        backend = %B::KIND,
        entries,
        elapsed_ms = elapsed.as_millis() as u64,
        "population cycle finished"
    );

    reclaimer.dispose(backend, approx_footprint(entries, value_size));

    Ok(CycleOutcome {
        backend: B::KIND,
        entries,
        set_errors,
        check: outcome,
        elapsed,
    })
}

/// [`population_cycle`] for a backend chosen at runtime.
pub fn run_cycle(
    kind: BackendKind,
    config: &BackendConfig,
    entries: u64,
    value_size: usize,
    reclaimer: &Reclaimer,
) -> Result<CycleOutcome> {
    crate::with_backend!(kind, config.hasher, B => {
        population_cycle::<B>(config, entries, value_size, reclaimer)
    })
}
