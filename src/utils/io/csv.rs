//! CSV reading and writing
//!
//! Input tables are read with every column typed as `Utf8`: the header
//! decides the column names, and values are carried verbatim so that the
//! merged output reproduces the input text.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::config::{DEFAULT_BATCH_SIZE, get_batch_size};
use crate::error::{Error, Result};
use crate::utils::logging::log_table_loaded;

use super::table_name;

/// Read a CSV file with a header row into a single string-typed batch
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();

    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;

    // Only the header is needed; every column is read as text
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(0))?;
    file.rewind().map_err(|e| Error::io(path, e))?;

    let fields = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect_vec();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(true)
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build(file)?;

    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    let batch = concat_batches(&schema, &batches)?;

    log_table_loaded(&table_name(path), &batch, start.elapsed());
    Ok(batch)
}

/// Write a batch as CSV with a header row; nulls become empty fields
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    Ok(())
}
