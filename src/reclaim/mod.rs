//! Deferred reclamation and pause accounting.
//!
//! Discarded backends are handed to a [`Reclaimer`] instead of being dropped
//! where they fall out of scope. The reclaimer frees them in collection
//! cycles, either when forced or when pending garbage outgrows the live heap
//! by the configured percentage, and keeps a cumulative total of the time the
//! calling thread spent inside those cycles.

pub mod alloc;
pub mod sampler;

use crate::error::Result;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub use alloc::CountingAllocator;
pub use sampler::{PauseSample, PauseSampler, SamplerState};

/// Heap floor used when the live heap is unknown or tiny.
pub const MIN_HEAP_BYTES: u64 = 4 * 1024 * 1024;

/// Heap counters from the [`CountingAllocator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapStats {
    /// Bytes handed out since process start
    pub allocated_bytes: u64,
    /// Bytes returned since process start
    pub freed_bytes: u64,
    /// Bytes currently held
    pub live_bytes: u64,
    /// Allocation calls since process start
    pub allocations: u64,
}

/// Cumulative runtime statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    /// Total time spent in collection cycles
    pub pause_total: Duration,
    /// Completed collection cycles
    pub collections: u64,
    /// Heap counters, when available
    pub heap: Option<HeapStats>,
}

/// Something the pause sampler can force a collection on and read from.
pub trait StatsSource {
    /// Run a collection cycle now.
    fn collect(&self);

    /// Read cumulative statistics.
    ///
    /// Implementations return an error rather than zeroed statistics when
    /// they cannot report.
    fn read(&self) -> Result<RuntimeStats>;
}

struct Garbage {
    _value: Box<dyn Any + Send>,
    bytes: u64,
}

/// Owner of discarded values until a collection cycle frees them.
pub struct Reclaimer {
    pending: Mutex<Vec<Garbage>>,
    pending_bytes: AtomicU64,
    growth_percent: u32,
    pause_total_ns: AtomicU64,
    collections: AtomicU64,
    reclaimed_bytes: AtomicU64,
    live_at_last_collect: AtomicU64,
}

impl Reclaimer {
    /// Create a reclaimer that collects once pending garbage exceeds
    /// `growth_percent` percent of the live heap.
    pub fn new(growth_percent: u32) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            pending_bytes: AtomicU64::new(0),
            growth_percent: growth_percent.max(1),
            pause_total_ns: AtomicU64::new(0),
            collections: AtomicU64::new(0),
            reclaimed_bytes: AtomicU64::new(0),
            live_at_last_collect: AtomicU64::new(0),
        }
    }

    /// Hand `value` over for reclamation.
    ///
    /// `approx_bytes` is the caller's estimate of what dropping `value`
    /// frees; it only drives the automatic collection trigger.
    pub fn dispose<T: Send + 'static>(&self, value: T, approx_bytes: u64) {
        self.pending.lock().push(Garbage {
            _value: Box::new(value),
            bytes: approx_bytes,
        });
        let pending = self.pending_bytes.fetch_add(approx_bytes, Ordering::Relaxed) + approx_bytes;

        if pending > self.trigger_bytes() {
            tracing::trace!(pending, trigger = self.trigger_bytes(), "automatic collection");
            self.collect_now();
        }
    }

    /// Pending garbage size that triggers an automatic collection.
    pub fn trigger_bytes(&self) -> u64 {
        let live = self
            .live_at_last_collect
            .load(Ordering::Relaxed)
            .max(MIN_HEAP_BYTES);
        live.saturating_mul(u64::from(self.growth_percent)) / 100
    }

    /// Number of values waiting for a collection.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Bytes freed by all collections so far, by the callers' estimates.
    pub fn reclaimed_bytes(&self) -> u64 {
        self.reclaimed_bytes.load(Ordering::Relaxed)
    }

    fn collect_now(&self) {
        let garbage = std::mem::take(&mut *self.pending.lock());
        let bytes: u64 = garbage.iter().map(|g| g.bytes).sum();
        self.pending_bytes.fetch_sub(bytes, Ordering::Relaxed);

        let start = Instant::now();
        let freed = garbage.len();
        drop(garbage);
        let pause = start.elapsed();

        self.pause_total_ns.fetch_add(pause.as_nanos() as u64, Ordering::Relaxed);
        self.collections.fetch_add(1, Ordering::Relaxed);
        self.reclaimed_bytes.fetch_add(bytes, Ordering::Relaxed);
        if let Some(heap) = alloc::heap_stats() {
            self.live_at_last_collect.store(heap.live_bytes, Ordering::Relaxed);
        }

        tracing::debug!(
            freed,
            bytes,
            pause_us = pause.as_micros() as u64,
            "collection cycle finished"
        );
    }
}

impl Default for Reclaimer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_GROWTH_PERCENT)
    }
}

impl StatsSource for Reclaimer {
    fn collect(&self) {
        self.collect_now();
    }

    fn read(&self) -> Result<RuntimeStats> {
        Ok(RuntimeStats {
            pause_total: Duration::from_nanos(self.pause_total_ns.load(Ordering::Relaxed)),
            collections: self.collections.load(Ordering::Relaxed),
            heap: alloc::heap_stats(),
        })
    }
}
