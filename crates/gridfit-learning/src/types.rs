//! Common types used throughout the gridfit-learning crate.
//!
//! This module defines the serializable results returned by grid search and
//! by a complete experiment run.
//!
//! # Overview
//!
//! - [`CandidateResult`]: Cross-validation scores of one grid point
//! - [`ExperimentReport`]: Everything a run measured, written as JSON by the CLI
//!
//! Scores that could not be computed are `NaN` and serialize as `null`.

use crate::grid::ParamSet;
use chrono::{DateTime, Utc};
use gridfit_processing::{MissingValueReport, OutlierSummary, SampleSummary};
use serde::Serialize;
use std::path::PathBuf;

/// Cross-validation result of a single grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    /// The grid point, as given in the grid.
    pub params: ParamSet,

    /// R² on each held-out fold, in fold order. `NaN` for a failed fit.
    pub fold_scores: Vec<f64>,

    /// Mean of `fold_scores`; `NaN` if any fold failed.
    pub mean_test_score: f64,

    /// Population standard deviation of `fold_scores`.
    pub std_test_score: f64,

    /// 1 for the best mean score. Equal scores share the lowest rank; `NaN`
    /// scores rank after every valid one.
    pub rank_test_score: usize,
}

impl CandidateResult {
    /// Console line `mean (+/-2*std) for {params}`.
    pub fn summary_line(&self) -> String {
        format!(
            "{:.3} (+/-{:.3}) for {}",
            self.mean_test_score,
            self.std_test_score * 2.0,
            self.params
        )
    }
}

/// Summary of a complete experiment run.
///
/// Produced by [`Experiment::run()`](crate::Experiment::run).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct ExperimentReport {
    /// When the run finished.
    pub timestamp: DateTime<Utc>,

    /// Wall-clock time of the run in seconds.
    pub elapsed_seconds: f64,

    /// Shape of `sample.csv`.
    pub sample_shape: (usize, usize),

    /// Training feature shape before outlier removal (identifier excluded).
    pub train_shape_before_outliers: (usize, usize),

    pub outliers: OutlierSummary,

    /// Present when the debug sampler ran.
    pub sampling: Option<SampleSummary>,

    /// Shape of the training features handed to grid search.
    pub training_shape: (usize, usize),

    pub test_shape: (usize, usize),

    /// Missing values of the test features, least missing first.
    pub test_missing: MissingValueReport,

    pub n_splits: usize,

    /// One entry per grid point, in grid order.
    pub candidates: Vec<CandidateResult>,

    pub best_index: usize,
    pub best_score: f64,
    pub best_params: ParamSet,

    /// `(stage, implementation)` of the refitted pipeline.
    pub best_pipeline: Vec<(String, String)>,

    pub output_path: PathBuf,
    pub n_predictions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(mean: f64, std: f64) -> CandidateResult {
        let mut params = ParamSet::new();
        params.insert("impute__strategy", "mean");
        params.insert("scale", "robust");
        CandidateResult {
            params,
            fold_scores: vec![mean; 5],
            mean_test_score: mean,
            std_test_score: std,
            rank_test_score: 1,
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            candidate(0.81234, 0.0251).summary_line(),
            "0.812 (+/-0.050) for {impute__strategy: mean, scale: robust}"
        );
    }

    #[test]
    fn test_nan_scores_serialize_as_null() {
        let json = serde_json::to_value(candidate(f64::NAN, f64::NAN)).unwrap();
        assert!(json["mean_test_score"].is_null());
        assert_eq!(json["params"]["scale"], "robust");
    }
}
