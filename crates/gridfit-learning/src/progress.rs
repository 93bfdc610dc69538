//! Progress reporting types for experiments and grid search.
//!
//! This module defines [`ExperimentStage`], [`ProgressUpdate`], and the
//! [`ProgressCallback`] type alias.
//!
//! # Overview
//!
//! Progress reporting allows you to monitor a run as it happens:
//! - Track which stage of the experiment is currently executing
//! - Get overall grid search progress (0.0 to 1.0)
//! - Track how many (candidate, fold) fits have finished
//!
//! # Example
//!
//! ```
//! use gridfit_learning::{ProgressCallback, ProgressUpdate};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|update: ProgressUpdate| {
//!     if let Some((done, total)) = update.fits_completed {
//!         println!("[{}] {}/{} fits", update.stage, done, total);
//!     }
//! });
//! ```

use std::fmt;
use std::sync::Arc;

/// The current stage of an experiment.
///
/// Stages run in order:
///
/// 1. [`Loading`](Self::Loading) - Reading the input files
/// 2. [`OutlierDetection`](Self::OutlierDetection) - Filtering the training set
/// 3. [`Sampling`](Self::Sampling) - Debug downsampling (optional)
/// 4. [`GridSearch`](Self::GridSearch) - Cross-validating every candidate
/// 5. [`Refit`](Self::Refit) - Fitting the best pipeline on all training rows
/// 6. [`Predicting`](Self::Predicting) - Predicting and writing the test set
/// 7. [`Complete`](Self::Complete) - Finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ExperimentStage {
    #[default]
    Loading,
    OutlierDetection,
    Sampling,
    GridSearch,
    Refit,
    Predicting,
    Complete,
}

impl ExperimentStage {
    /// Returns the snake_case name of the stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridfit_learning::ExperimentStage;
    ///
    /// assert_eq!(ExperimentStage::GridSearch.as_str(), "grid_search");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStage::Loading => "loading",
            ExperimentStage::OutlierDetection => "outlier_detection",
            ExperimentStage::Sampling => "sampling",
            ExperimentStage::GridSearch => "grid_search",
            ExperimentStage::Refit => "refit",
            ExperimentStage::Predicting => "predicting",
            ExperimentStage::Complete => "complete",
        }
    }
}

impl fmt::Display for ExperimentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A progress update sent to the progress callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    /// The current stage.
    pub stage: ExperimentStage,

    /// Progress of the current stage from 0.0 to 1.0.
    pub progress: f64,

    /// Human-readable status message.
    pub message: String,

    /// Finished and total fits: `(completed, total)`.
    ///
    /// Only populated during [`GridSearch`](ExperimentStage::GridSearch).
    /// Fits finish in any order, so the counter is the only ordering guarantee.
    pub fits_completed: Option<(usize, usize)>,
}

impl ProgressUpdate {
    /// An update announcing the start of `stage`.
    pub fn stage(stage: ExperimentStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: 0.0,
            message: message.into(),
            fits_completed: None,
        }
    }
}

/// Type alias for a progress callback function.
///
/// Callbacks must be thread-safe (`Send + Sync`): during grid search they
/// are called from rayon worker threads.
///
/// # Note
///
/// The callback should execute quickly to avoid blocking the workers.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_as_str() {
        assert_eq!(ExperimentStage::Loading.as_str(), "loading");
        assert_eq!(ExperimentStage::OutlierDetection.as_str(), "outlier_detection");
        assert_eq!(ExperimentStage::Refit.to_string(), "refit");
    }

    #[test]
    fn test_stage_update() {
        let update = ProgressUpdate::stage(ExperimentStage::Sampling, "Sampling");
        assert_eq!(update.stage, ExperimentStage::Sampling);
        assert_eq!(update.progress, 0.0);
        assert!(update.fits_completed.is_none());
    }

    #[test]
    fn test_progress_update_default() {
        let update = ProgressUpdate::default();
        assert_eq!(update.stage, ExperimentStage::Loading);
        assert!(update.message.is_empty());
    }
}
