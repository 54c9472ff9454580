//! Table input and output
//!
//! Tables are read and written as CSV unless the path ends in `.parquet`.
//! Output files are written under a temporary name and renamed into place,
//! so a failed run never leaves a truncated table behind.

pub mod csv;
pub mod naming;
pub mod parquet;

use std::path::{Path, PathBuf};

use crate::config::TableFormat;
use crate::error::{Error, Result};
use crate::table::Table;

pub use naming::{loss_rate_file_name, output_file_name};

/// Read a table, naming it after its file for error messages
pub fn read_table(path: &Path) -> Result<Table> {
    let batch = match TableFormat::from_path(path) {
        TableFormat::Csv => csv::read_csv(path)?,
        TableFormat::Parquet => parquet::read_parquet(path)?,
    };

    Ok(Table::new(table_name(path), batch))
}

/// File name of a table path, or the whole path when it has none
pub(crate) fn table_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Write a table in the format its extension names
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let partial = partial_path(path);

    let written = match TableFormat::from_path(path) {
        TableFormat::Csv => csv::write_csv(table.batch(), &partial),
        TableFormat::Parquet => parquet::write_parquet(table.batch(), &partial),
    };

    if let Err(e) = written {
        // Best effort; the write error is the one worth reporting
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, path).map_err(|e| Error::io(path, e))?;
    log::info!("Wrote {} rows to {}", table.num_rows(), path.display());
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
