//! Three-stage regression pipeline: scale, impute, estimate.
//!
//! This module provides [`PipelineParams`], the serializable description of a
//! pipeline, and [`Pipeline`], the fitted object built from it.
//!
//! # Overview
//!
//! The stages run in order:
//!
//! 1. **scale** - a [`ScalerKind`] (passthrough, normalizer, standard, robust)
//! 2. **impute** - a [`SimpleImputer`](gridfit_processing::SimpleImputer) with an
//!    [`ImputeStrategy`]
//! 3. **estimation** - a [`GradientBoostingRegressor`] with [`GbmParams`]
//!
//! Fitting stage `i + 1` consumes the fitted output of stage `i`.
//!
//! # Parameter Paths
//!
//! Grid points address stages with dotted paths, `stage__parameter`:
//!
//! | Path | Value |
//! |------|-------|
//! | `scale` | scaler name |
//! | `impute__strategy` | `mean`, `median` or `most_frequent` |
//! | `estimation__<field>` | any [`GbmParams`] field |
//!
//! # Example
//!
//! ```rust,ignore
//! use gridfit_learning::{ParamSet, Pipeline, PipelineParams};
//!
//! let mut point = ParamSet::new();
//! point.insert("scale", "robust");
//! point.insert("estimation__max_depth", 4);
//!
//! let params = PipelineParams::default().with_params(&point)?;
//! let mut pipeline = Pipeline::new(params);
//! pipeline.fit(&x_train, &y_train)?;
//! let predictions = pipeline.predict(&x_test)?;
//! ```

use crate::error::{LearningError, Result};
use crate::gbm::{GbmParams, GradientBoostingRegressor};
use crate::grid::{ParamSet, ParamValue};
use crate::model::Regressor;
use gridfit_processing::Transformer;
use gridfit_processing::config::{ImputeStrategy, ScalerKind};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Serializable configuration of every pipeline stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub scale: ScalerKind,
    pub impute: ImputeStrategy,
    pub estimation: GbmParams,
}

impl PipelineParams {
    /// Return a copy with every path of `point` applied.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidParameter`] for an unknown path, a value
    /// of the wrong type, or a value outside the parameter's range.
    pub fn with_params(&self, point: &ParamSet) -> Result<Self> {
        let mut params = self.clone();
        for (path, value) in point.iter() {
            params.set(path, value)?;
        }
        params.estimation.validate()?;
        Ok(params)
    }

    fn set(&mut self, path: &str, value: &ParamValue) -> Result<()> {
        match path.split_once("__") {
            None if path == "scale" => {
                self.scale = parse_str(path, value)?;
            }
            Some(("impute", "strategy")) => {
                self.impute = parse_str(path, value)?;
            }
            Some(("estimation", field)) => {
                let estimation = &mut self.estimation;
                match field {
                    "n_estimators" => estimation.n_estimators = integer(path, value)?,
                    "max_depth" => estimation.max_depth = integer(path, value)?,
                    "learning_rate" => estimation.learning_rate = number(path, value)?,
                    "gamma" => estimation.gamma = number(path, value)?,
                    "min_child_weight" => estimation.min_child_weight = number(path, value)?,
                    "reg_lambda" => estimation.reg_lambda = number(path, value)?,
                    "reg_alpha" => estimation.reg_alpha = number(path, value)?,
                    _ => return Err(LearningError::invalid_parameter(path, "unknown parameter")),
                }
            }
            _ => return Err(LearningError::invalid_parameter(path, "unknown parameter")),
        }
        Ok(())
    }
}

fn parse_str<T>(path: &str, value: &ParamValue) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .as_str()
        .ok_or_else(|| LearningError::invalid_parameter(path, format!("expected a name, got {}", value)))?
        .parse()
        .map_err(|e: String| LearningError::invalid_parameter(path, e))
}

fn integer(path: &str, value: &ParamValue) -> Result<usize> {
    value.as_usize().ok_or_else(|| {
        LearningError::invalid_parameter(path, format!("expected a non-negative integer, got {}", value))
    })
}

fn number(path: &str, value: &ParamValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| LearningError::invalid_parameter(path, format!("expected a number, got {}", value)))
}

/// A scale -> impute -> estimation pipeline.
#[derive(Debug)]
pub struct Pipeline {
    params: PipelineParams,
    scaler: Box<dyn Transformer>,
    imputer: Box<dyn Transformer>,
    estimator: Box<dyn Regressor>,
}

impl Pipeline {
    /// Build unfitted stages for `params`.
    pub fn new(params: PipelineParams) -> Self {
        Self {
            scaler: params.scale.build(),
            imputer: params.impute.build(),
            estimator: Box::new(GradientBoostingRegressor::new(params.estimation.clone())),
            params,
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// `(stage, implementation)` pairs in execution order.
    pub fn steps(&self) -> [(&'static str, &'static str); 3] {
        [
            ("scale", self.scaler.name()),
            ("impute", self.imputer.name()),
            ("estimation", self.estimator.name()),
        ]
    }

    /// Fit every stage in order on `x` and targets `y`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(LearningError::InvalidData(format!(
                "x has {} rows but y has {} values",
                x.nrows(),
                y.len()
            )));
        }

        let scaled = self.scaler.fit_transform(x)?;
        let imputed = self.imputer.fit_transform(&scaled)?;
        debug!(
            "Fitting {} on {} rows x {} features",
            self.estimator.name(),
            imputed.nrows(),
            imputed.ncols()
        );
        self.estimator.fit(&imputed, y)
    }

    /// Transform `x` through the fitted preprocessing stages and predict.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(x)?;
        let imputed = self.imputer.transform(&scaled)?;
        self.estimator.predict(&imputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::r2_score;
    use pretty_assertions::assert_eq;

    fn point(entries: &[(&str, ParamValue)]) -> ParamSet {
        let mut set = ParamSet::new();
        for (k, v) in entries {
            set.insert(*k, v.clone());
        }
        set
    }

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((60, 3), |(i, j)| {
            if (i + j) % 11 == 0 {
                f64::NAN
            } else {
                ((i * (j + 2)) % 17) as f64
            }
        });
        let y = Array1::from_shape_fn(60, |i| (i % 17) as f64 * 1.5);
        (x, y)
    }

    #[test]
    fn test_with_params_applies_paths() {
        let params = PipelineParams::default()
            .with_params(&point(&[
                ("scale", "robust".into()),
                ("impute__strategy", "most_frequent".into()),
                ("estimation__max_depth", 3.into()),
                ("estimation__gamma", 0.into()),
                ("estimation__learning_rate", 0.1.into()),
            ]))
            .unwrap();

        assert_eq!(params.scale, ScalerKind::Robust);
        assert_eq!(params.impute, ImputeStrategy::MostFrequent);
        assert_eq!(params.estimation.max_depth, 3);
        assert_eq!(params.estimation.gamma, 0.0);
        assert_eq!(params.estimation.learning_rate, 0.1);
    }

    #[test]
    fn test_unknown_paths_rejected() {
        for path in ["scaler", "impute__fill", "estimation__depth", "model__max_depth"] {
            let err = PipelineParams::default()
                .with_params(&point(&[(path, 1.into())]))
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_PARAMETER", "{}", path);
        }
    }

    #[test]
    fn test_wrong_value_types_rejected() {
        let bad = [
            ("scale", ParamValue::Int(1)),
            ("scale", "minmax".into()),
            ("estimation__max_depth", 2.5.into()),
            ("estimation__gamma", "high".into()),
            ("estimation__n_estimators", 0.into()),
        ];
        for (path, value) in bad {
            assert!(
                PipelineParams::default()
                    .with_params(&point(&[(path, value)]))
                    .is_err(),
                "{} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_steps_follow_params() {
        let pipeline = Pipeline::new(PipelineParams {
            scale: ScalerKind::Standard,
            ..Default::default()
        });
        assert_eq!(
            pipeline.steps(),
            [
                ("scale", "StandardScaler"),
                ("impute", "SimpleImputer"),
                ("estimation", "GradientBoostingRegressor"),
            ]
        );
    }

    #[test]
    fn test_fit_predict_with_missing_values() {
        let (x, y) = data();
        for scale in ScalerKind::ALL {
            let mut pipeline = Pipeline::new(PipelineParams {
                scale,
                ..Default::default()
            });
            pipeline.fit(&x, &y).unwrap();
            let predictions = pipeline.predict(&x).unwrap();
            assert_eq!(predictions.len(), 60);
            assert!(predictions.iter().all(|p| p.is_finite()));
            assert!(r2_score(&y, &predictions) > 0.5, "{}", scale);
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = data();
        let pipeline = Pipeline::new(PipelineParams {
            scale: ScalerKind::Standard,
            ..Default::default()
        });
        assert_eq!(pipeline.predict(&x).unwrap_err().error_code(), "NOT_FITTED");
    }

    #[test]
    fn test_params_json() {
        let json = r#"{ "scale": "robust", "impute": "median", "estimation": { "max_depth": 4 } }"#;
        let params: PipelineParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.scale, ScalerKind::Robust);
        assert_eq!(params.impute, ImputeStrategy::Median);
        assert_eq!(params.estimation.max_depth, 4);
        assert_eq!(params.estimation.n_estimators, 100);
    }
}
