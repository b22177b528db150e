//! CSV file reading.

use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Maximum file size for CSV loading (500 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Rows scanned by Polars to infer column types.
pub const SCHEMA_INFERENCE_ROWS: usize = 100;

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<u64> {
    check_file_size_with_limit(path, MAX_CSV_FILE_SIZE)
}

/// Check file size against a custom limit, returning the size in bytes.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::read(path, e))?;

    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }

    Ok(metadata.len())
}

/// Validate DataFrame shape after loading.
///
/// Rejects frames without rows or with blank column names, and warns about
/// wide datasets (>500 columns).
pub fn validate_dataframe_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyDataFrame {
            path: path.to_path_buf(),
        });
    }

    if df.width() > 500 {
        tracing::warn!(
            path = %path.display(),
            columns = df.width(),
            "Dataset has more than 500 columns - may impact performance"
        );
    }

    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Reads a CSV file with a single header row into a Polars DataFrame.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    let parse_error = |e: PolarsError| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(SCHEMA_INFERENCE_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)?;

    validate_dataframe_shape(&df, path)?;
    Ok(df)
}
