//! K-fold cross-validation splits.

use crate::error::{LearningError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A single train/validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splitter.
///
/// Without shuffling, folds are contiguous blocks of rows and the first
/// `n_samples % n_splits` folds hold one extra row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for KFold {
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: false,
            seed: 42,
        }
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            ..Self::default()
        }
    }

    /// Shuffle rows with `seed` before cutting folds.
    #[must_use]
    pub fn shuffled(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    /// Generate the folds for `n_samples` rows.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if `n_splits < 2`, and
    /// [`LearningError::InvalidData`] if there are fewer rows than folds.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(LearningError::InvalidConfig(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if n_samples < self.n_splits {
            return Err(LearningError::InvalidData(format!(
                "cannot split {} rows into {} folds",
                n_samples, self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for index in 0..self.n_splits {
            let size = if index < remainder { base + 1 } else { base };
            let end = start + size;
            let test = indices[start..end].to_vec();
            let train = indices[..start]
                .iter()
                .chain(indices[end..].iter())
                .copied()
                .collect();
            folds.push(Fold { index, train, test });
            start = end;
        }
        Ok(folds)
    }
}
