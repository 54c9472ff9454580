//! Log lines for the tables a run reads and the datasets it processes

use std::path::Path;
use std::time::Duration;

use arrow::record_batch::RecordBatch;

/// Announce which input table is about to be read
pub fn log_table_read(role: &str, path: &Path) {
    log::info!("Reading {role} from {}", path.display());
}

/// Report the shape of a table once it is in memory
pub fn log_table_loaded(table: &str, batch: &RecordBatch, elapsed: Duration) {
    log::info!("{} in {elapsed:?}", table_shape(table, batch));
}

/// Warn about a dataset whose output is written but degenerate
pub fn log_dataset_warning(dataset: &str, message: &str) {
    log::warn!("{dataset}: {message}");
}

fn table_shape(table: &str, batch: &RecordBatch) -> String {
    let rows = batch.num_rows();
    let columns = batch.num_columns();
    format!(
        "Loaded {table}: {rows} {} x {columns} {}",
        if rows == 1 { "row" } else { "rows" },
        if columns == 1 { "column" } else { "columns" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_table_shape() {
        let table = Table::from_columns(
            "df_GM.csv",
            vec![("RID", vec![Some("7"), Some("9")]), ("DATE", vec![None, None])],
        )
        .unwrap();
        assert_eq!(
            table_shape(table.name(), table.batch()),
            "Loaded df_GM.csv: 2 rows x 2 columns"
        );

        let single = Table::from_columns("df_clinical.csv", vec![("RID", vec![Some("7")])]).unwrap();
        assert_eq!(
            table_shape(single.name(), single.batch()),
            "Loaded df_clinical.csv: 1 row x 1 column"
        );
    }
}
