//! Shuffled train/test splitting and the debug downsampler.

use crate::error::{ProcessingError, Result};
use crate::types::IndexedFrame;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fraction held out by the debug downsampler; the remaining ~1% is kept.
pub const DEBUG_TEST_SIZE: f64 = 0.99;

/// Row positions of a shuffled split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Row counts of a downsampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub test_size: f64,
}

/// Shuffle `0..n_samples` and split it so the test part holds
/// `ceil(test_size * n_samples)` rows.
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ProcessingError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 {
        return Err(ProcessingError::EmptyDataset(format!(
            "test_size {} leaves no training rows out of {}",
            test_size, n_samples
        )));
    }

    let mut positions: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    positions.shuffle(&mut rng);

    let test = positions.split_off(n_train);
    Ok(SplitIndices {
        train: positions,
        test,
    })
}

/// Split features and labels with the same shuffled positions.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
pub fn train_test_split(
    features: &IndexedFrame,
    labels: &IndexedFrame,
    test_size: f64,
    seed: u64,
) -> Result<(IndexedFrame, IndexedFrame, IndexedFrame, IndexedFrame)> {
    if features.height() != labels.height() {
        return Err(ProcessingError::InvalidData(format!(
            "features have {} rows but labels have {}",
            features.height(),
            labels.height()
        )));
    }

    let split = split_indices(features.height(), test_size, seed)?;
    Ok((
        features.take(&split.train)?,
        features.take(&split.test)?,
        labels.take(&split.train)?,
        labels.take(&split.test)?,
    ))
}

/// Keep the training part of a [`DEBUG_TEST_SIZE`] split.
pub fn debug_sample(
    features: &IndexedFrame,
    labels: &IndexedFrame,
    seed: u64,
) -> Result<(IndexedFrame, IndexedFrame, SampleSummary)> {
    let rows_before = features.height();
    let (x_train, _, y_train, _) = train_test_split(features, labels, DEBUG_TEST_SIZE, seed)?;

    let summary = SampleSummary {
        rows_before,
        rows_after: x_train.height(),
        test_size: DEBUG_TEST_SIZE,
    };
    info!(
        "Debug sampling kept {} of {} rows",
        summary.rows_after, summary.rows_before
    );
    Ok((x_train, y_train, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn tables(n: usize) -> (IndexedFrame, IndexedFrame) {
        let ids: Vec<i64> = (0..n as i64).collect();
        let values: Vec<f64> = (0..n).map(|v| v as f64).collect();
        let x = df!["id" => ids.clone(), "a" => values.clone()].unwrap();
        let y = df!["id" => ids, "y" => values].unwrap();
        (
            IndexedFrame::from_dataframe(x, "id").unwrap(),
            IndexedFrame::from_dataframe(y, "id").unwrap(),
        )
    }

    #[test]
    fn test_split_sizes() {
        let split = split_indices(1000, DEBUG_TEST_SIZE, 42).unwrap();
        assert_eq!(split.train.len(), 10);
        assert_eq!(split.test.len(), 990);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(split_indices(50, 0.5, 7).unwrap(), split_indices(50, 0.5, 7).unwrap());
    }

    #[test]
    fn test_split_too_small() {
        // ceil(0.99 * 50) = 50 leaves nothing to train on
        let err = split_indices(50, DEBUG_TEST_SIZE, 1).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
        assert!(split_indices(10, 1.5, 1).is_err());
    }

    #[test]
    fn test_debug_sample_keeps_rows_aligned() {
        let (x, y) = tables(500);
        let (xs, ys, summary) = debug_sample(&x, &y, 42).unwrap();
        assert_eq!(summary.rows_after, 5);
        assert_eq!(xs.height(), 5);
        assert!(xs.same_ids(&ys));
        assert_eq!(xs.to_matrix().unwrap().column(0).to_vec(), ys.to_vector().unwrap().to_vec());
    }
}
