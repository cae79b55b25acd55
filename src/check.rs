//! Read-back verification.
//!
//! A benchmark run reports a bad read and keeps going; tests that need a
//! hard failure assert on [`CheckOutcome::is_match`].

use crate::error::Result;
use crate::workload;

/// Result of comparing a read against the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The read returned exactly the generated value
    Match,
    /// The read returned different bytes
    Mismatch {
        /// What the backend returned
        actual: Vec<u8>,
    },
    /// The key was not found (absent or evicted)
    Missing,
    /// The backend reported an error; values were not compared
    Failed {
        /// Error text
        error: String,
    },
    /// The expected value could not be generated
    InvalidExpectation {
        /// Error text
        error: String,
    },
}

impl CheckOutcome {
    /// Whether the read matched.
    pub fn is_match(&self) -> bool {
        matches!(self, CheckOutcome::Match)
    }

    /// One-line diagnostic, `None` on a match.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            CheckOutcome::Match => None,
            CheckOutcome::Mismatch { actual } => Some(format!(
                "Wrong first element:  {}",
                String::from_utf8_lossy(actual)
            )),
            CheckOutcome::Missing => Some("Missing first element".to_string()),
            CheckOutcome::Failed { error } => Some(format!("Error in get:  {error}")),
            CheckOutcome::InvalidExpectation { error } => {
                Some(format!("Cannot check first element:  {error}"))
            }
        }
    }
}

/// Compare a backend read of `index` against the generated value.
pub fn check(actual: &Result<Option<Vec<u8>>>, index: u64, value_size: usize) -> CheckOutcome {
    let outcome = match actual {
        Err(error) => CheckOutcome::Failed {
            error: error.to_string(),
        },
        Ok(None) => CheckOutcome::Missing,
        Ok(Some(value)) => match workload::expected_value(index, value_size) {
            Ok(expected) if expected == *value => CheckOutcome::Match,
            Ok(_) => CheckOutcome::Mismatch {
                actual: value.clone(),
            },
            Err(error) => CheckOutcome::InvalidExpectation {
                error: error.to_string(),
            },
        },
    };

    if let Some(diagnostic) = outcome.diagnostic() {
        tracing::warn!(index, "{}", diagnostic);
    }
    outcome
}

/// Verify the value of a parallel record against its embedded checksum.
pub fn check_parallel(
    actual: &Result<Option<Vec<u8>>>,
    worker_id: u32,
    counter: u64,
    value_size: usize,
) -> CheckOutcome {
    check(
        actual,
        workload::parallel_checksum(worker_id, counter),
        value_size,
    )
}
