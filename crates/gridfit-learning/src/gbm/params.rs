//! Hyperparameters of the gradient-boosted regressor.

use crate::error::{LearningError, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`GradientBoostingRegressor`](super::GradientBoostingRegressor).
///
/// Defaults follow XGBoost's regressor defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbmParams {
    /// Number of boosting rounds (default: 100).
    pub n_estimators: usize,

    /// Shrinkage applied to every tree's output (default: 0.3).
    pub learning_rate: f64,

    /// Maximum tree depth (default: 6).
    pub max_depth: usize,

    /// Minimum loss reduction required to split a node (default: 0).
    pub gamma: f64,

    /// Minimum hessian sum in each child (default: 1).
    ///
    /// With squared error every row has hessian 1, so this is a minimum row count.
    pub min_child_weight: f64,

    /// L2 regularization on leaf weights (default: 1).
    pub reg_lambda: f64,

    /// L1 regularization on leaf weights (default: 0).
    pub reg_alpha: f64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            gamma: 0.0,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
        }
    }
}

impl GbmParams {
    /// Check every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidParameter`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", "must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid("learning_rate", "must be a positive number"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "must be at least 1"));
        }
        for (name, value) in [
            ("gamma", self.gamma),
            ("min_child_weight", self.min_child_weight),
            ("reg_lambda", self.reg_lambda),
            ("reg_alpha", self.reg_alpha),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(name, "must be a non-negative number"));
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> LearningError {
    LearningError::invalid_parameter(&format!("estimation__{}", name), reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = GbmParams::default();
        assert_eq!(params.n_estimators, 100);
        assert_eq!(params.learning_rate, 0.3);
        assert_eq!(params.max_depth, 6);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            GbmParams { n_estimators: 0, ..Default::default() },
            GbmParams { learning_rate: 0.0, ..Default::default() },
            GbmParams { max_depth: 0, ..Default::default() },
            GbmParams { gamma: -1.0, ..Default::default() },
            GbmParams { reg_lambda: f64::NAN, ..Default::default() },
        ];
        for params in cases {
            let err = params.validate().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_PARAMETER");
        }
    }

    #[test]
    fn test_partial_json() {
        let params: GbmParams = serde_json::from_str(r#"{ "max_depth": 3 }"#).unwrap();
        assert_eq!(params.max_depth, 3);
        assert_eq!(params.n_estimators, 100);
    }
}
