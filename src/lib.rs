//! # cachebench
//!
//! Throughput, latency and reclamation-pause benchmarks for in-memory
//! key/value caches.
//!
//! The crate drives four backends through one capability trait:
//!
//! - **sharded_ttl**: `moka` segmented cache with a lifetime window
//! - **native_map**: `std::collections::HashMap` (single-threaded only)
//! - **concurrent_map**: `dashmap` sharded map
//! - **arena**: `quick_cache` bounded cache with a byte budget
//!
//! Workloads are deterministic, so every read can be checked against the
//! generator. Discarded backends go to a [`Reclaimer`] whose collection
//! cycles are timed; the [`PauseSampler`] turns its cumulative counters into
//! per-phase pauses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cachebench::backend::{BackendConfig, BackendKind};
//! use cachebench::core::{run_trial, Concurrency, Operation};
//!
//! fn main() -> cachebench::Result<()> {
//!     let config = BackendConfig::new(100_000);
//!     let report = run_trial(
//!         BackendKind::ConcurrentMap,
//!         &config,
//!         Operation::Set,
//!         Concurrency::Parallel { workers: 4 },
//!         100_000,
//!         100,
//!     )?;
//!     println!("{:.1} ns/op", report.ns_per_op());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod backend;
pub mod check;
pub mod config;
pub mod core;
pub mod error;
pub mod reclaim;
pub mod report;
pub mod telemetry;
pub mod workload;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendKind, CacheBackend, HashFunction};
pub use check::CheckOutcome;
pub use config::Config;
pub use error::{Error, Result};
pub use reclaim::{PauseSample, PauseSampler, Reclaimer, StatsSource};
pub use report::Report;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
