//! Imputation module for handling missing values.
//!
//! Provides [`SimpleImputer`], which fills missing values with the mean,
//! median or most frequent value of each column.

mod statistical;

pub use statistical::SimpleImputer;

use crate::config::ImputeStrategy;
use crate::transform::Transformer;

impl ImputeStrategy {
    /// Create an unfitted imputer using this strategy.
    pub fn build(&self) -> Box<dyn Transformer> {
        Box::new(SimpleImputer::new(*self))
    }
}
