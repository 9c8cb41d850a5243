//! Unified error handling for trajectory refinement.
//!
//! Every stage either completes and returns a full trajectory or fails
//! with one of these variants. Nothing is retried inside the crate.

use thiserror::Error;

/// Errors produced by the refinement pipeline.
#[derive(Debug, Error)]
pub enum RefineError {
    /// A required column is absent from the input table.
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    /// A latitude/longitude pair outside the valid domain reached geodesic math.
    #[error("invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Time interpolation over a zero-length segment starting at `index`.
    #[error("zero-length segment at index {index}; time ratio undefined")]
    DegenerateSegment { index: usize },

    /// The road network provider failed to answer a query.
    #[error("road network adapter failed: {0}")]
    AdapterFailure(String),

    /// A `Time` cell could not be parsed with the configured format.
    #[error("row {row}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { row: usize, value: String },

    /// A numeric cell could not be parsed.
    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
    },

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RefineError>;

/// Convenience conversions from `Option` to [`RefineError`].
pub trait OptionExt<T> {
    /// Convert `None` into [`RefineError::MissingColumn`].
    fn ok_or_missing_column(self, column: &str) -> Result<T>;

    /// Convert `None` into [`RefineError::AdapterFailure`].
    fn ok_or_adapter_failure(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_column(self, column: &str) -> Result<T> {
        self.ok_or_else(|| RefineError::MissingColumn {
            column: column.to_string(),
        })
    }

    fn ok_or_adapter_failure(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| RefineError::AdapterFailure(message.into()))
    }
}
