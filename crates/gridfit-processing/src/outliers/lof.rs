//! Local Outlier Factor scoring.

use crate::config::{Contamination, OutlierConfig};
use crate::error::{ProcessingError, Result};
use crate::utils::{nan_euclidean, quantile_sorted, sort_floats};
use ndarray::Array2;
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// LOF above which a row is an outlier under [`Contamination::Auto`].
pub const AUTO_THRESHOLD: f64 = 1.5;

/// Added to the mean reachability distance so duplicate points keep a finite density.
const DENSITY_EPSILON: f64 = 1e-10;

/// Density-based outlier detector over the rows of a matrix.
#[derive(Debug, Clone)]
pub struct LocalOutlierFactor {
    config: OutlierConfig,
}

/// Scores and decisions of one LOF pass.
#[derive(Debug, Clone)]
pub struct LofResult {
    /// LOF per row; values near 1 are inliers.
    pub scores: Vec<f64>,
    /// Score above which rows were flagged.
    pub threshold: f64,
    /// `true` for rows to keep.
    pub keep_mask: Vec<bool>,
    /// Neighbour count actually used after clamping.
    pub n_neighbors: usize,
}

impl LofResult {
    pub fn n_outliers(&self) -> usize {
        self.keep_mask.iter().filter(|keep| !**keep).count()
    }
}

impl LocalOutlierFactor {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    /// Score every row of `x` against the other rows and decide which rows to keep.
    pub fn fit_predict(&self, x: &Array2<f64>) -> Result<LofResult> {
        self.config.validate()?;

        let n = x.nrows();
        if n < 2 {
            return Err(ProcessingError::EmptyDataset(format!(
                "Local Outlier Factor needs at least 2 rows, got {}",
                n
            )));
        }
        let k = self.config.n_neighbors.min(n - 1);
        if k < self.config.n_neighbors {
            debug!(
                "n_neighbors ({}) clamped to {} for {} rows",
                self.config.n_neighbors, k, n
            );
        }

        let neighbors = nearest_neighbors(x, k);
        let k_distances: Vec<f64> = neighbors
            .iter()
            .map(|row| row.last().map(|&(_, d)| d).unwrap_or(0.0))
            .collect();

        let densities: Vec<f64> = neighbors
            .par_iter()
            .map(|row| {
                let reach: f64 = row
                    .iter()
                    .map(|&(j, d)| k_distances[j].max(d))
                    .sum::<f64>()
                    / row.len() as f64;
                1.0 / (reach + DENSITY_EPSILON)
            })
            .collect();

        let scores: Vec<f64> = neighbors
            .par_iter()
            .zip(densities.par_iter())
            .map(|(row, &density)| {
                let neighbor_density: f64 =
                    row.iter().map(|&(j, _)| densities[j]).sum::<f64>() / row.len() as f64;
                neighbor_density / density
            })
            .collect();

        let threshold = self.threshold(&scores);
        // NaN scores compare false and are kept
        let keep_mask: Vec<bool> = scores.iter().map(|&s| !(s > threshold)).collect();

        Ok(LofResult {
            scores,
            threshold,
            keep_mask,
            n_neighbors: k,
        })
    }

    fn threshold(&self, scores: &[f64]) -> f64 {
        match self.config.contamination {
            Contamination::Auto => AUTO_THRESHOLD,
            Contamination::Fixed(fraction) => {
                let mut finite: Vec<f64> = scores.iter().copied().filter(|s| !s.is_nan()).collect();
                sort_floats(&mut finite);
                quantile_sorted(&finite, 1.0 - fraction).unwrap_or(f64::INFINITY)
            }
        }
    }
}

/// The `k` nearest other rows of every row, ascending by distance.
///
/// Ties are broken by row index so the result is deterministic.
fn nearest_neighbors(x: &Array2<f64>, k: usize) -> Vec<Vec<(usize, f64)>> {
    (0..x.nrows())
        .into_par_iter()
        .map(|i| {
            let point = x.row(i);
            let mut distances: Vec<(usize, f64)> = x
                .rows()
                .into_iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, other)| (j, nan_euclidean(point, other)))
                .collect();
            distances.sort_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            distances.truncate(k);
            distances
        })
        .collect()
}
