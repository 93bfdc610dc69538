//! Error types for the gridfit-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, LearningError>`.
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Descriptive**: each variant names the stage or parameter that failed
//! - **Layered**: data-side failures keep their [`ProcessingError`] intact
//!
//! # Example
//!
//! ```no_run
//! use gridfit_learning::{LearningError, SearchConfig};
//!
//! fn configure() -> Result<(), LearningError> {
//!     // Errors are automatically propagated with ?
//!     let config = SearchConfig::builder().cv_folds(5).build()?;
//!     Ok(())
//! }
//! ```

use gridfit_processing::ProcessingError;
use thiserror::Error;

/// The main error type for gridfit-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration provided to the search or experiment.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A grid key or value that no pipeline stage accepts.
    ///
    /// Grids are resolved before any model is fitted, so this error is
    /// raised up front rather than from inside a worker.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The dotted parameter path, e.g. `estimation__max_depth`.
        name: String,
        reason: String,
    },

    /// Invalid data provided for training or prediction.
    ///
    /// Common causes:
    /// - Features and labels differ in row count
    /// - Fewer rows than cross-validation folds
    /// - Non-finite labels
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The regressor was used before it was fitted.
    #[error("Model has not been fitted")]
    NotFitted,

    /// Training failed for a single pipeline.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// Every (candidate, fold) fit failed; carries the first failure.
    #[error("All {total} fits failed; first error: {first}")]
    AllFitsFailed {
        total: usize,
        first: Box<LearningError>,
    },

    /// Loading, filtering or preprocessing failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// I/O error during config or report file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization of configs or reports failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LearningError {
    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::NotFitted => "NOT_FITTED",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::AllFitsFailed { .. } => "ALL_FITS_FAILED",
            Self::Processing(e) => e.error_code(),
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_errors_keep_their_code() {
        let err: LearningError = ProcessingError::ColumnNotFound("f3".to_string()).into();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert_eq!(err.to_string(), "Column 'f3' not found in dataset");
    }

    #[test]
    fn test_all_fits_failed_message() {
        let err = LearningError::AllFitsFailed {
            total: 45,
            first: Box::new(LearningError::TrainingFailed("boom".to_string())),
        };
        assert_eq!(err.error_code(), "ALL_FITS_FAILED");
        assert!(err.to_string().contains("45"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = LearningError::invalid_parameter("estimation__depth", "unknown parameter");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'estimation__depth': unknown parameter"
        );
    }
}
