//! Error types for the benchmark harness.
//!
//! Every failure a measurement can hit is a variant here, so callers can tell
//! a backend error apart from a miss and a skipped trial apart from a failed
//! one.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested value is too short to carry the index suffix
    #[error("Value size {value_size} is smaller than the {min} byte index suffix")]
    InvalidValueSize {
        /// Requested value size
        value_size: usize,
        /// Minimum accepted size
        min: usize,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Detailed error message
        message: String,
        /// Configuration key that caused the error
        key: Option<String>,
    },

    /// A backend rejected its configuration
    #[error("Failed to construct {backend}: {message}")]
    Construction {
        /// Backend name
        backend: String,
        /// Detailed error message
        message: String,
    },

    /// A backend failed to store an entry
    #[error("Set on {backend} failed for {key}: {message}")]
    Set {
        /// Backend name
        backend: String,
        /// Key being stored
        key: String,
        /// Detailed error message
        message: String,
    },

    /// A backend failed to read an entry (distinct from a miss)
    #[error("Get on {backend} failed for {key}: {message}")]
    Get {
        /// Backend name
        backend: String,
        /// Key being read
        key: String,
        /// Detailed error message
        message: String,
    },

    /// The backend is not safe to drive from several workers
    #[error("{backend} is not safe for concurrent access")]
    NotConcurrent {
        /// Backend name
        backend: String,
    },

    /// Runtime statistics could not be read
    #[error("Runtime statistics unavailable: {message}")]
    StatsUnavailable {
        /// Detailed error message
        message: String,
    },

    /// Configuration source error
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (unexpected condition)
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error naming the offending key.
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a construction error.
    pub fn construction(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Construction {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a set error.
    pub fn set(
        backend: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Set {
            backend: backend.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a get error.
    pub fn get(
        backend: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Get {
            backend: backend.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a not-concurrent error.
    pub fn not_concurrent(backend: impl Into<String>) -> Self {
        Error::NotConcurrent {
            backend: backend.into(),
        }
    }

    /// Create a statistics-unavailable error.
    pub fn stats_unavailable(message: impl Into<String>) -> Self {
        Error::StatsUnavailable {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Whether the error only invalidates the current measurement.
    ///
    /// Nothing in the harness is retried; a measurement-scoped error means
    /// the run moves on to the next trial.
    pub fn is_measurement_scoped(&self) -> bool {
        matches!(
            self,
            Error::Construction { .. }
                | Error::Set { .. }
                | Error::Get { .. }
                | Error::NotConcurrent { .. }
                | Error::StatsUnavailable { .. }
        )
    }

    /// Get the error category for reports.
    pub fn category(&self) -> &'static str {
        match self {
            Error::InvalidValueSize { .. } => "value_size",
            Error::Config { .. } => "config",
            Error::Construction { .. } => "construction",
            Error::Set { .. } => "set",
            Error::Get { .. } => "get",
            Error::NotConcurrent { .. } => "not_concurrent",
            Error::StatsUnavailable { .. } => "stats",
            Error::ConfigSource(_) => "config",
            Error::Io(_) => "io",
            Error::Internal { .. } => "internal",
        }
    }
}
