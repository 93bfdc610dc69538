//! Statistical imputation: fill missing values with a per-column statistic.

use crate::config::ImputeStrategy;
use crate::error::{ProcessingError, Result};
use crate::transform::{Transformer, check_columns, check_non_empty};
use crate::utils::{mean, median, mode, observed};
use ndarray::{Array2, Axis};
use tracing::debug;

/// Fills `NaN` entries column by column with the mean, median or most
/// frequent observed value.
///
/// Columns without a single observed value at fit time have no statistic;
/// they are dropped from the output of every later `transform`.
#[derive(Debug, Clone)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
    fitted: Option<FittedStatistics>,
}

#[derive(Debug, Clone)]
struct FittedStatistics {
    n_features_in: usize,
    /// Indices of the input columns kept in the output.
    kept: Vec<usize>,
    /// Fill value for each kept column.
    statistics: Vec<f64>,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fitted: None,
        }
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }

    /// Fill values of the kept columns, once fitted.
    pub fn statistics(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.statistics.as_slice())
    }

    /// Input column indices that survive imputation, once fitted.
    pub fn kept_columns(&self) -> Option<&[usize]> {
        self.fitted.as_ref().map(|f| f.kept.as_slice())
    }

    fn statistic(&self, values: &[f64]) -> Option<f64> {
        match self.strategy {
            ImputeStrategy::Mean => mean(values),
            ImputeStrategy::Median => median(values),
            ImputeStrategy::MostFrequent => mode(values),
        }
    }
}

impl Default for SimpleImputer {
    fn default() -> Self {
        Self::new(ImputeStrategy::default())
    }
}

impl Transformer for SimpleImputer {
    fn name(&self) -> &'static str {
        "SimpleImputer"
    }

    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        check_non_empty(self.name(), x)?;

        let mut kept = Vec::with_capacity(x.ncols());
        let mut statistics = Vec::with_capacity(x.ncols());
        for (idx, column) in x.axis_iter(Axis(1)).enumerate() {
            match self.statistic(&observed(column)) {
                Some(value) => {
                    kept.push(idx);
                    statistics.push(value);
                }
                None => debug!("Column {} has no observed values; dropping it", idx),
            }
        }

        self.fitted = Some(FittedStatistics {
            n_features_in: x.ncols(),
            kept,
            statistics,
        });
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or(ProcessingError::NotFitted("SimpleImputer"))?;
        check_columns(self.name(), x, fitted.n_features_in)?;

        let mut out = x.select(Axis(1), &fitted.kept);
        for (mut column, &fill) in out.axis_iter_mut(Axis(1)).zip(fitted.statistics.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(out)
    }
}
