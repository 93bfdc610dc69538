//! Prediction output.

use crate::error::{ProcessingError, Result, ResultExt};
use crate::io::reader::INDEX_COLUMN;
use ndarray::Array1;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Name of the prediction column in the output file.
pub const PREDICTION_COLUMN: &str = "y";

/// Build the prediction table: the test identifiers as `id` and one `y` column.
pub fn predictions_frame(ids: &Column, predictions: &Array1<f64>) -> Result<DataFrame> {
    if ids.len() != predictions.len() {
        return Err(ProcessingError::InvalidData(format!(
            "{} identifiers but {} predictions",
            ids.len(),
            predictions.len()
        )));
    }

    let mut ids = ids.clone();
    ids.rename(INDEX_COLUMN.into());
    let values = Column::from(Series::new(PREDICTION_COLUMN.into(), predictions.to_vec()));

    Ok(DataFrame::new(vec![ids, values])?)
}

/// Write predictions as an uncompressed CSV with columns `id,y`.
pub fn write_predictions(path: impl AsRef<Path>, ids: &Column, predictions: &Array1<f64>) -> Result<()> {
    let path = path.as_ref();
    let mut df = predictions_frame(ids, predictions)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)
        .map_err(ProcessingError::from)
        .context(path.display().to_string())?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)
        .context(path.display().to_string())?;

    info!("Predictions written to {}", path.display());
    Ok(())
}
