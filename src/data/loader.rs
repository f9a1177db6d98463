//! CSV Data Loader Module
//! Handles CSV file loading using Polars.

use polars::prelude::*;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::{DataProcessor, EarthquakeRecord};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to open {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(String),
    #[error("Invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: &'static str,
        row: usize,
        reason: String,
    },
    #[error("Failed to parse date '{value}': {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl LoaderError {
    /// True for schema and value problems, as opposed to I/O or date errors.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            LoaderError::CsvError(_)
                | LoaderError::MissingColumn(_)
                | LoaderError::InvalidValue { .. }
        )
    }
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
        }
    }

    /// Read `file_path` and convert every row into an [`EarthquakeRecord`].
    pub fn read_records(file_path: &Path) -> Result<Vec<EarthquakeRecord>, LoaderError> {
        let mut loader = Self::new();
        loader.load_csv(file_path)?;
        debug!(
            path = ?loader.get_file_path(),
            rows = loader.get_row_count(),
            columns = ?loader.get_columns(),
            "converting rows"
        );

        match loader.get_dataframe() {
            Some(df) => DataProcessor::to_records(df),
            None => Ok(Vec::new()),
        }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        // Open first so a missing input is FileAccess rather than a Polars error
        File::open(file_path).map_err(|source| LoaderError::FileAccess {
            path: file_path.to_path_buf(),
            source,
        })?;
        self.file_path = Some(file_path.to_path_buf());

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        debug!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "parsed CSV"
        );

        Ok(&*self.df.insert(df))
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}
