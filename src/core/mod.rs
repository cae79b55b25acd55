//! Trial execution: timed trials and population cycles.

pub mod cycle;
pub mod trial;

pub use cycle::{population_cycle, run_cycle, CycleOutcome, CHECKED_INDEX};
pub use trial::{
    drive_parallel, get_worker, populate, run_parallel, run_sequential, run_trial, set_worker,
    Concurrency, Operation, TrialReport,
};
