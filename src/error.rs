//! Error types for the prediction pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Coarse failure class, used by the HTTP layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request body could not be turned into a record set
    BadInput,
    /// The record set does not fit the schema the preprocessor expects
    Schema,
    /// The pipeline itself failed or is inconsistent
    Internal,
}

/// Main error type for loading and running the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("columns are missing: {{{}}}", format_column_set(.0))]
    MissingColumns(Vec<String>),

    #[error("Column '{column}' has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Found unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PipelineError {
    /// Failure class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::InvalidPayload(_) => ErrorCategory::BadInput,
            PipelineError::MissingColumns(_)
            | PipelineError::TypeMismatch { .. }
            | PipelineError::UnknownCategory { .. }
            | PipelineError::InvalidInput(_)
            | PipelineError::DataError(_) => ErrorCategory::Schema,
            PipelineError::ShapeError { .. }
            | PipelineError::InferenceError(_)
            | PipelineError::ArtifactError(_)
            | PipelineError::ConfigError(_)
            | PipelineError::IoError(_)
            | PipelineError::SerializationError(_) => ErrorCategory::Internal,
        }
    }
}

fn format_column_set(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
