//! Pause sampling between trial windows.

use super::{RuntimeStats, StatsSource};
use crate::error::Result;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether the sampler has a baseline to diff against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// No successful sample yet; the next delta is the cumulative total
    BaselineUnknown,
    /// The last successful read is kept as the baseline
    BaselineKnown,
}

/// What happened between two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSample {
    /// Pause time accrued since the previous sample
    pub pause: Duration,
    /// Collection cycles since the previous sample
    pub collections: u64,
    /// Bytes allocated since the previous sample, when heap stats exist
    pub allocated_bytes: Option<u64>,
    /// Live heap at this sample, when heap stats exist
    pub live_bytes: Option<u64>,
}

/// Turns cumulative runtime counters into per-window deltas.
///
/// Owned by the trial coordinator and only used from its thread, after all
/// workers of a trial have joined.
pub struct PauseSampler<'a> {
    source: &'a dyn StatsSource,
    previous: Option<RuntimeStats>,
}

impl<'a> PauseSampler<'a> {
    /// Create a sampler with no baseline.
    pub fn new(source: &'a dyn StatsSource) -> Self {
        Self {
            source,
            previous: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SamplerState {
        if self.previous.is_some() {
            SamplerState::BaselineKnown
        } else {
            SamplerState::BaselineUnknown
        }
    }

    /// Force a collection, read the counters and return the delta since the
    /// previous successful sample.
    ///
    /// A failed read is returned as is and leaves the baseline untouched.
    pub fn sample(&mut self) -> Result<PauseSample> {
        self.source.collect();
        let current = self.source.read()?;
        let previous = self.previous.unwrap_or_default();

        let allocated_bytes = current.heap.map(|heap| {
            let before = previous.heap.map(|h| h.allocated_bytes).unwrap_or(0);
            heap.allocated_bytes.saturating_sub(before)
        });

        let sample = PauseSample {
            pause: current.pause_total.saturating_sub(previous.pause_total),
            collections: current.collections.saturating_sub(previous.collections),
            allocated_bytes,
            live_bytes: current.heap.map(|heap| heap.live_bytes),
        };

        self.previous = Some(current);
        Ok(sample)
    }
}
