//! Column validation and date handling for the input tables.

pub mod dates;

use arrow::datatypes::Schema;

use crate::error::{Error, Result};

pub use dates::{DateFormatConfig, days_between, parse_date_string};

/// Check that every required column is present in a schema
///
/// Runs before any row is touched so a schema mismatch aborts the run
/// instead of failing partway through a batch.
pub fn require_columns<S: AsRef<str>>(schema: &Schema, table: &str, columns: &[S]) -> Result<()> {
    for column in columns {
        let column = column.as_ref();
        if schema.index_of(column).is_err() {
            return Err(Error::missing_column(table, column));
        }
    }
    Ok(())
}
