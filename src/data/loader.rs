//! CSV Data Loader Module
//! Reads raw CSV files into Polars DataFrames. Every column is read as a
//! string; typing is the cleaner's job.

use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] PolarsError),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file with a header row. All columns come back as `String`.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::FileNotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(LoaderError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        // Polars rejects zero-byte input; treat it as an empty table
        if metadata.len() == 0 {
            log::warn!("{} is empty", path.display());
            return Ok(DataFrame::empty());
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Get list of column names.
    pub fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get sorted distinct non-null values from a column.
    pub fn unique_values(df: &DataFrame, column: &str) -> Vec<String> {
        let Ok(col) = df.column(column) else {
            return Vec::new();
        };
        let Ok(series) = col.as_materialized_series().cast(&DataType::String) else {
            return Vec::new();
        };
        series
            .str()
            .map(|ca| {
                ca.into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }
}
