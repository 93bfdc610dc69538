//! Outlier removal for the training set.
//!
//! [`OutlierFilter`] scores the training features with a
//! [`LocalOutlierFactor`] and drops the flagged rows from both the features
//! and the labels. The mask is applied by position: identifiers of the two
//! tables are compared and a mismatch is only reported, never corrected.

mod lof;

pub use lof::{AUTO_THRESHOLD, LocalOutlierFactor, LofResult};

use crate::config::OutlierConfig;
use crate::error::{ProcessingError, Result};
use crate::types::IndexedFrame;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Row counts before and after outlier removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub outliers_removed: usize,
    pub threshold: f64,
    pub n_neighbors: usize,
}

/// Training features and labels after outlier removal.
#[derive(Debug, Clone)]
pub struct FilteredTraining {
    pub features: IndexedFrame,
    pub labels: IndexedFrame,
    pub summary: OutlierSummary,
}

/// Removes density outliers from a training set.
#[derive(Debug, Clone, Default)]
pub struct OutlierFilter {
    config: OutlierConfig,
}

impl OutlierFilter {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Keep-mask for the rows of `features`, one entry per row.
    pub fn mask(&self, features: &IndexedFrame) -> Result<LofResult> {
        let matrix = features.to_matrix()?;
        LocalOutlierFactor::new(self.config.clone()).fit_predict(&matrix)
    }

    /// Drop outlier rows from `features` and the same positions from `labels`.
    pub fn apply(&self, features: &IndexedFrame, labels: &IndexedFrame) -> Result<FilteredTraining> {
        if features.height() != labels.height() {
            return Err(ProcessingError::InvalidData(format!(
                "features have {} rows but labels have {}",
                features.height(),
                labels.height()
            )));
        }
        if !features.same_ids(labels) {
            warn!("Feature and label identifiers differ; rows are aligned by position");
        }

        let result = self.mask(features)?;
        let features = features.filter(&result.keep_mask)?;
        let labels = labels.filter(&result.keep_mask)?;

        let summary = OutlierSummary {
            rows_before: result.keep_mask.len(),
            rows_after: features.height(),
            outliers_removed: result.n_outliers(),
            threshold: result.threshold,
            n_neighbors: result.n_neighbors,
        };
        info!(
            "Removed {} outliers ({} -> {} rows)",
            summary.outliers_removed, summary.rows_before, summary.rows_after
        );

        Ok(FilteredTraining {
            features,
            labels,
            summary,
        })
    }
}
