//! Error types for the Virtual Twins engine
//!
//! Every failure carries a human-readable message that names the column,
//! partition or setting at fault.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Virtual Twins error types
#[derive(Error, Debug)]
pub enum Error {
    /// Outcome/intervention column missing, configuration absent, or invalid engine settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No dataset available (nothing uploaded, or zero rows)
    #[error("No dataset available: upload a dataset before running an analysis")]
    EmptyDataset,

    /// A model fit cannot proceed (degenerate split, non-numeric target, missing values)
    #[error("Training error: {0}")]
    Training(String),

    /// Tabular input could not be parsed
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a missing-column configuration error
    pub(crate) fn missing_column(role: &str, name: &str) -> Self {
        Self::Configuration(format!("{role} column '{name}' not found in dataset"))
    }
}
