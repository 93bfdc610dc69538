//! File input and output.

mod reader;
mod writer;

pub use reader::{DataFiles, ExperimentData, INDEX_COLUMN, read_csv, read_indexed_csv};
pub use writer::{PREDICTION_COLUMN, predictions_frame, write_predictions};
