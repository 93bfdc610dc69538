//! CSV loading.

use crate::error::{ProcessingError, Result, ResultExt};
use crate::types::IndexedFrame;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the identifier column in every input file.
pub const INDEX_COLUMN: &str = "id";

/// File names of the experiment inputs, relative to a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub sample: PathBuf,
    pub x_train: PathBuf,
    pub y_train: PathBuf,
    pub x_test: PathBuf,
}

impl DataFiles {
    /// The standard layout: `sample.csv`, `X_train.csv`, `y_train.csv`, `X_test.csv`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            sample: dir.join("sample.csv"),
            x_train: dir.join("X_train.csv"),
            y_train: dir.join("y_train.csv"),
            x_test: dir.join("X_test.csv"),
        }
    }
}

/// Everything the experiment reads from disk.
#[derive(Debug, Clone)]
pub struct ExperimentData {
    /// Shape of `sample.csv`; the file is otherwise unused.
    pub sample_shape: (usize, usize),
    pub x_train: IndexedFrame,
    pub y_train: IndexedFrame,
    pub x_test: IndexedFrame,
}

impl ExperimentData {
    /// Load and validate all input files.
    ///
    /// Fails when a file is missing or malformed, when features and labels
    /// differ in row count, or when a label is missing or non-finite.
    pub fn load(files: &DataFiles) -> Result<Self> {
        let sample = read_csv(&files.sample)?;
        info!("Sample data shape: {:?}", sample.shape());

        let x_test = read_indexed_csv(&files.x_test, INDEX_COLUMN)?;
        let x_train = read_indexed_csv(&files.x_train, INDEX_COLUMN)?;
        let y_train = read_indexed_csv(&files.y_train, INDEX_COLUMN)?;

        if x_train.height() != y_train.height() {
            return Err(ProcessingError::InvalidData(format!(
                "X_train has {} rows but y_train has {}",
                x_train.height(),
                y_train.height()
            )));
        }
        if !x_train.same_ids(&y_train) {
            warn!("X_train and y_train identifiers differ; rows are aligned by position");
        }
        if let Some(row) = y_train
            .to_vector()?
            .iter()
            .position(|v| !v.is_finite())
        {
            return Err(ProcessingError::InvalidData(format!(
                "label at row {} is missing or not finite",
                row
            )))
            .context(files.y_train.display().to_string());
        }

        Ok(Self {
            sample_shape: sample.shape(),
            x_train,
            y_train,
            x_test,
        })
    }
}

/// Read a CSV file and split off its identifier column.
pub fn read_indexed_csv(path: impl AsRef<Path>, index_col: &str) -> Result<IndexedFrame> {
    let path = path.as_ref();
    let df = read_csv(path)?;
    IndexedFrame::from_dataframe(df, index_col).context(path.display().to_string())
}

/// Read a CSV file with a header row.
///
/// Falls back to a pre-cleaned copy of the content (collapsed doubled quotes,
/// blank lines removed) if the standard reader rejects the file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let context = path.display().to_string();

    if !path.exists() {
        return Err(ProcessingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        )))
        .context(context);
    }

    let standard = CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish());

    match standard {
        Ok(df) => {
            debug!("Loaded {} with shape {:?}", context, df.shape());
            Ok(df)
        }
        Err(e) => {
            debug!("Standard loading of {} failed: {}", context, e);
            let content = std::fs::read_to_string(path)
                .map_err(ProcessingError::from)
                .context(context.clone())?;
            CsvReadOptions::default()
                .with_infer_schema_length(None)
                .with_has_header(true)
                .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
                .finish()
                .context(context)
        }
    }
}

fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn write_inputs(dir: &TempDir, labels: &str) {
        write(dir, "sample.csv", "id,y\n0,0.0\n1,0.0\n");
        write(dir, "X_train.csv", "id,a,b\n0,1.0,2.0\n1,,3.0\n2,4.0,5.0\n");
        write(dir, "y_train.csv", labels);
        write(dir, "X_test.csv", "id,b,a\n10,1.0,2.0\n11,3.0,\n");
    }

    #[test]
    fn test_load_experiment_data() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "id,y\n0,1.5\n1,2.5\n2,3.5\n");

        let data = ExperimentData::load(&DataFiles::in_dir(dir.path())).unwrap();
        assert_eq!(data.sample_shape, (2, 2));
        assert_eq!(data.x_train.shape(), (3, 2));
        assert_eq!(data.x_test.column_names(), vec!["b".to_string(), "a".to_string()]);
        assert!(data.x_train.to_matrix().unwrap()[[1, 0]].is_nan());
    }

    #[test]
    fn test_row_count_mismatch() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "id,y\n0,1.5\n1,2.5\n");
        let err = ExperimentData::load(&DataFiles::in_dir(dir.path())).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[test]
    fn test_missing_label_rejected() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "id,y\n0,1.5\n1,\n2,3.5\n");
        let err = ExperimentData::load(&DataFiles::in_dir(dir.path())).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
        assert!(err.to_string().contains("y_train.csv"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let err = read_csv(dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn test_missing_index_column() {
        let dir = TempDir::new().unwrap();
        write(&dir, "t.csv", "a,b\n1,2\n");
        let err = read_indexed_csv(dir.path().join("t.csv"), INDEX_COLUMN).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_clean_csv_content() {
        assert_eq!(clean_csv_content("a,b\n\n\"\"x\"\",1\n"), "a,b\n\"x\",1");
    }
}
