//! Custom error types for data loading and preprocessing.
//!
//! This module provides the error hierarchy used by every stage of the
//! processing crate, built with `thiserror`. Higher layers wrap
//! [`ProcessingError`] instead of flattening it, so the stable
//! [`error_code`](ProcessingError::error_code) survives up to the CLI.

use thiserror::Error;

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input data violates a precondition of the stage.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The dataset has no rows (or too few for the operation).
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Matrix dimensions differ from what the stage was fitted on.
    #[error("Shape mismatch in {stage}: expected {expected} columns, found {found}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        found: usize,
    },

    /// A stage was used before `fit` was called.
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for the error kind.
    ///
    /// Context wrappers report the code of the error they wrap.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::EmptyDataset(_) => "EMPTY_DATASET",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::NotFitted(_) => "NOT_FITTED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::ColumnNotFound("id".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::NotFitted("StandardScaler").error_code(),
            "NOT_FITTED"
        );
    }

    #[test]
    fn test_shape_mismatch_message() {
        let error = ProcessingError::ShapeMismatch {
            stage: "SimpleImputer",
            expected: 3,
            found: 2,
        };
        let message = error.to_string();
        assert!(message.contains("SimpleImputer"));
        assert!(message.contains("expected 3"));
    }

    #[test]
    fn test_with_context() {
        let error = ProcessingError::ColumnNotFound("id".to_string())
            .with_context("Loading raw/X_train.csv");
        assert!(error.to_string().contains("raw/X_train.csv"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Keeps the inner code
    }

    #[test]
    fn test_result_ext_on_io_result() {
        let result: Result<()> = Err(ProcessingError::EmptyDataset("X_train".to_string()));
        let wrapped = result.context("Filtering outliers").unwrap_err();
        assert!(matches!(wrapped, ProcessingError::WithContext { .. }));
        assert_eq!(wrapped.error_code(), "EMPTY_DATASET");
    }
}
