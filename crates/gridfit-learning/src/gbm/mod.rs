//! XGBoost-style gradient boosting for regression.
//!
//! Key properties:
//! - Squared-error loss with second-order statistics (gradient `pred - y`, hessian 1)
//! - Regularized leaf weights: `w* = -T(G, alpha) / (H + lambda)`
//! - Splits require a gain above `gamma` and a hessian sum of at least
//!   `min_child_weight` on both sides
//! - Missing values (`NaN`) are routed to the right child, in training and prediction

mod params;
mod tree;

pub use params::GbmParams;

use crate::error::{LearningError, Result};
use crate::model::Regressor;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::debug;
use tree::{Node, TreeBuilder, presort};

/// Gradient-boosted regression trees.
#[derive(Debug, Clone, Default)]
pub struct GradientBoostingRegressor {
    params: GbmParams,
    fitted: Option<Ensemble>,
}

#[derive(Debug, Clone)]
struct Ensemble {
    base_score: f64,
    n_features: usize,
    trees: Vec<Node>,
}

impl Ensemble {
    fn predict_row(&self, row: ndarray::ArrayView1<'_, f64>, learning_rate: f64) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + learning_rate * tree.predict(row))
    }
}

impl GradientBoostingRegressor {
    pub fn new(params: GbmParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Number of fitted trees (0 before `fit`).
    pub fn n_trees(&self) -> usize {
        self.fitted.as_ref().map_or(0, |e| e.trees.len())
    }
}

impl Regressor for GradientBoostingRegressor {
    fn name(&self) -> &'static str {
        "GradientBoostingRegressor"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.params.validate()?;

        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(LearningError::InvalidData(
                "cannot fit on zero rows".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(LearningError::InvalidData(format!(
                "x has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(LearningError::InvalidData(
                "targets must be finite".to_string(),
            ));
        }

        let base_score = y.mean().unwrap_or(0.0);
        let mut preds = vec![base_score; n_samples];
        let hess = vec![1.0; n_samples];
        let sorted = presort(x);
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let grad: Vec<f64> = preds.iter().zip(y.iter()).map(|(p, t)| p - t).collect();

            let tree = TreeBuilder {
                x,
                grad: &grad,
                hess: &hess,
                params: &self.params,
            }
            .build(sorted.clone());

            preds
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, p)| *p += self.params.learning_rate * tree.predict(x.row(i)));
            trees.push(tree);
        }

        debug!(
            "Fitted {} trees on {} rows x {} features",
            trees.len(),
            n_samples,
            x.ncols()
        );
        self.fitted = Some(Ensemble {
            base_score,
            n_features: x.ncols(),
            trees,
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let ensemble = self.fitted.as_ref().ok_or(LearningError::NotFitted)?;
        if x.ncols() != ensemble.n_features {
            return Err(LearningError::InvalidData(format!(
                "model was fitted on {} features but got {}",
                ensemble.n_features,
                x.ncols()
            )));
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| ensemble.predict_row(x.row(i), self.params.learning_rate))
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;

    fn regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((50, 2), (0..100).map(|i| i as f64 * 0.1).collect())
            .unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| r[0] * 2.0 + r[1] * 0.5 + 1.0)
            .collect();
        (x, y)
    }

    #[test]
    fn test_fits_training_data() {
        let (x, y) = regression_data();
        let mut model = GradientBoostingRegressor::new(GbmParams {
            n_estimators: 50,
            max_depth: 4,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_trees(), 50);

        let r2 = r2_score(&y, &model.predict(&x).unwrap());
        assert!(r2 > 0.9, "R² = {}", r2);
    }

    #[test]
    fn test_handles_missing_values() {
        let (mut x, y) = regression_data();
        for i in (0..50).step_by(7) {
            x[[i, 1]] = f64::NAN;
        }
        let mut model = GradientBoostingRegressor::default();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 50);
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_constant_target() {
        let (x, _) = regression_data();
        let y = Array1::from_elem(50, 3.0);
        let mut model = GradientBoostingRegressor::default();
        model.fit(&x, &y).unwrap();
        assert!(model.predict(&x).unwrap().iter().all(|p| *p == 3.0));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = GradientBoostingRegressor::default();
        let err = model.predict(&Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(err, LearningError::NotFitted));
    }

    #[test]
    fn test_feature_count_checked() {
        let (x, y) = regression_data();
        let mut model = GradientBoostingRegressor::new(GbmParams {
            n_estimators: 2,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        assert!(model.predict(&Array2::zeros((1, 3))).is_err());
    }

    #[test]
    fn test_rejects_bad_targets() {
        let (x, mut y) = regression_data();
        y[3] = f64::NAN;
        let err = GradientBoostingRegressor::default().fit(&x, &y).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }
}
