//! Error types for Airgraph
//!
//! Configuration and schema errors are raised before any store interaction;
//! store errors abort the running phase. Validation mismatches are not errors,
//! they are reported through [`crate::validate::QueryReport`].

use thiserror::Error;

/// Errors that can occur while loading or verifying the airline graph
#[derive(Error, Debug)]
pub enum AirgraphError {
    /// Configuration file absent or unreadable
    #[error("Configuration not found: {path}")]
    ConfigMissing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration present but unusable (missing key, bad URI, bad option)
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Tabular input file absent
    #[error("CSV file not found at {0}")]
    InputMissing(String),

    /// One or more required input columns absent
    #[error("Missing columns: {missing:?} (available columns: {available:?})")]
    SchemaMismatch {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// A row whose value cannot be normalized
    #[error("Invalid record at line {line}, field '{field}': {reason}")]
    InvalidRecord {
        line: u64,
        field: String,
        reason: String,
    },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A merge, constraint or query operation failed inside the store
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AirgraphError {
    /// Whether the error was raised before the store was touched.
    pub fn is_pre_write(&self) -> bool {
        matches!(
            self,
            AirgraphError::ConfigMissing { .. }
                | AirgraphError::ConfigInvalid(_)
                | AirgraphError::InputMissing(_)
                | AirgraphError::SchemaMismatch { .. }
                | AirgraphError::InvalidRecord { .. }
                | AirgraphError::Csv(_)
        )
    }
}

pub type AirgraphResult<T> = Result<T, AirgraphError>;
