//! A named, string-typed table.
//!
//! Both inputs are carried as a single Arrow `RecordBatch` whose columns are
//! all `Utf8`, so cell values reach the output exactly as they were read.
//! The name (usually the source file name) is attached to every error.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};
use crate::schema::require_columns;

/// Record batch plus the name it is reported under
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    /// Wrap a record batch
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Build a table from string columns, `None` cells becoming nulls
    pub fn from_columns<N, C>(name: impl Into<String>, columns: Vec<(N, Vec<Option<C>>)>) -> Result<Self>
    where
        N: Into<String>,
        C: AsRef<str>,
    {
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

        for (column, values) in columns {
            fields.push(Field::new(column.into(), DataType::Utf8, true));
            let cells: Vec<Option<&str>> = values
                .iter()
                .map(|v| v.as_ref().map(|s| s.as_ref()))
                .collect();
            arrays.push(Arc::new(StringArray::from(cells)));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self::new(name, batch))
    }

    /// Name used in error messages
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Schema of the underlying batch
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Number of data rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the table has a column with this name
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.batch.schema().index_of(column).is_ok()
    }

    /// Fail with a schema mismatch unless every column is present
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<()> {
        require_columns(&self.batch.schema(), &self.name, columns)
    }

    /// Get a column as a string array
    pub fn string_column(&self, column: &str) -> Result<&StringArray> {
        let idx = self
            .batch
            .schema()
            .index_of(column)
            .map_err(|_| Error::missing_column(&self.name, column))?;

        self.batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Column '{column}' in {} is not a string column",
                    self.name
                ))
            })
    }
}

/// Cell text, with nulls and blank cells both read as missing
#[must_use]
pub fn cell(array: &StringArray, row: usize) -> Option<&str> {
    if array.is_null(row) {
        return None;
    }
    let value = array.value(row).trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_and_cells() {
        let table = Table::from_columns(
            "visits",
            vec![
                ("RID", vec![Some("7"), Some(" 8 ")]),
                ("VISCODE", vec![Some("bl"), None]),
                ("NOTE", vec![Some(""), Some("x")]),
            ],
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert!(table.has_column("VISCODE"));
        assert!(!table.has_column("EXAMDATE"));

        let rid = table.string_column("RID").unwrap();
        assert_eq!(cell(rid, 1), Some("8"));

        let code = table.string_column("VISCODE").unwrap();
        assert_eq!(cell(code, 1), None);

        let note = table.string_column("NOTE").unwrap();
        assert_eq!(cell(note, 0), None);
    }

    #[test]
    fn test_missing_column_names_table() {
        let table = Table::from_columns("df_clinical.csv", vec![("RID", vec![Some("1")])]).unwrap();
        let err = table.string_column("EXAMDATE").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref table, ref column }
            if table == "df_clinical.csv" && column == "EXAMDATE"));
        assert!(table.require_columns(&["RID", "EXAMDATE"]).is_err());
    }
}
