//! Parquet file operations
//!
//! Parquet inputs are accepted wherever a CSV table is; their columns are
//! cast to `Utf8` so the rest of the pipeline sees the same shape.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::ArrayRef;
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::{DEFAULT_BATCH_SIZE, get_batch_size};
use crate::error::{Error, Result};
use crate::utils::logging::log_table_loaded;

use super::table_name;

/// Read a parquet file into a single string-typed batch
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let file_schema = Arc::clone(builder.schema());
    let reader = builder
        .with_batch_size(get_batch_size().unwrap_or(DEFAULT_BATCH_SIZE))
        .build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;
    let batch = concat_batches(&file_schema, &batches)?;
    let batch = stringify_batch(&batch)?;

    log_table_loaded(&table_name(path), &batch, start.elapsed());
    Ok(batch)
}

/// Cast every column of a batch to `Utf8`
pub fn stringify_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();

    let columns = batch
        .columns()
        .iter()
        .map(|column| cast(column, &DataType::Utf8))
        .collect::<std::result::Result<Vec<ArrayRef>, ArrowError>>()?;

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Write a batch to a parquet file
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
