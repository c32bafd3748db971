//! Error types for subjet

use thiserror::Error;

/// subjet error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Configuration or input validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Event whose particle collections cannot be processed (skipped by the event loop)
    #[error("Malformed event (run {run_number}, event {ev_id}): {reason}")]
    MalformedEvent {
        /// Run number of the offending event.
        run_number: i64,
        /// Event id of the offending event.
        ev_id: i64,
        /// What was wrong with it.
        reason: String,
    },

    /// A jet carries more constituents than the zero-padding length allows.
    #[error("jet has {count} constituents, zero-padding length is {n_max}")]
    ConstituentOverflow {
        /// Constituent count of the offending jet.
        count: usize,
        /// Configured maximum.
        n_max: usize,
    },

    /// Append to an accumulation key that was not declared at configuration time.
    #[error("unknown accumulation key: {0}")]
    UnknownKey(String),

    /// Columnar store (Parquet / Arrow) error
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// Whether the event loop may skip the event and continue.
    pub fn is_per_event(&self) -> bool {
        matches!(self, Error::MalformedEvent { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
