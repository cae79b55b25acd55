//! cachebench benchmark suite
//!
//! Benchmark targets over the cachebench backends, plus the criterion
//! benches under `benches/`.
//!
//! This crate provides:
//! - `BenchmarkResult` struct with standardized fields
//! - `BenchTarget` trait for benchmark adapters
//! - `run_all_benchmarks()` entrypoint returning `Vec<BenchmarkResult>`
//! - JSON and markdown result files

pub mod adapters;
pub mod benchmarks;

pub use adapters::{all_targets, BenchTarget};
pub use benchmarks::{run_all_benchmarks, BenchmarkResult};
