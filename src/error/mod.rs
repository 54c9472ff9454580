//! Error handling for the visit matcher.
//!
//! Every variant names the table (usually the file it was read from) and the
//! column involved, so a failed batch run points at the offending input.

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for matching and merging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error opening, reading or writing a file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// An expected column is absent from an input table
    #[error("Schema mismatch in {table}: required column '{column}' not found")]
    MissingColumn {
        /// Table (file) name
        table: String,
        /// Missing column
        column: String,
    },

    /// A date field failed to parse
    #[error("Malformed date in {table}, column '{column}', row {row}: '{value}'")]
    MalformedDate {
        /// Table (file) name
        table: String,
        /// Date column
        column: String,
        /// Zero-based data row
        row: usize,
        /// Raw cell content
        value: String,
    },

    /// A non-date field held a value that cannot be interpreted
    #[error("Invalid value in {table}, column '{column}', row {row}: '{value}'")]
    InvalidValue {
        /// Table (file) name
        table: String,
        /// Column holding the value
        column: String,
        /// Zero-based data row
        row: usize,
        /// Raw cell content
        value: String,
    },

    /// Configuration that cannot produce a valid run
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Missing column in the given table
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Result type for matcher operations
pub type Result<T> = std::result::Result<T, Error>;
