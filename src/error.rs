//! Error types for the channel capacity estimator

use thiserror::Error;

/// Result type alias for estimator operations
pub type Result<T> = std::result::Result<T, CapacityError>;

/// Main error type for the estimator
#[derive(Error, Debug)]
pub enum CapacityError {
    #[error("No data loaded")]
    NoDataLoaded,

    #[error("Neighborhoods are stale: compute them for the loaded dataset first")]
    StaleNeighborhoods,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    #[error("Neighbor count k = {k} requires more than k points per label, but label {label} has {population}")]
    NeighborhoodTooLarge {
        k: usize,
        label: String,
        population: usize,
    },

    #[error("Estimator numerically degenerate: {0}")]
    NumericalDegeneracy(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CapacityError {
    pub(crate) fn invalid_parameter(
        name: &str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        CapacityError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by calling an operation out of order
    pub fn is_precondition(&self) -> bool {
        matches!(self, CapacityError::NoDataLoaded | CapacityError::StaleNeighborhoods)
    }
}

impl From<polars::error::PolarsError> for CapacityError {
    fn from(err: polars::error::PolarsError) -> Self {
        CapacityError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CapacityError {
    fn from(err: serde_json::Error) -> Self {
        CapacityError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CapacityError {
    fn from(err: ndarray::ShapeError) -> Self {
        CapacityError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
