//! Output file names.

use chrono::NaiveDate;

use crate::config::TableFormat;

/// `<prefix>_<dataset>_<YYYY-MM-DD>.<ext>`, e.g. `merged_GM_2023-08-28.csv`
#[must_use]
pub fn output_file_name(
    prefix: &str,
    dataset: &str,
    run_date: NaiveDate,
    format: TableFormat,
) -> String {
    format!(
        "{prefix}_{dataset}_{}.{}",
        run_date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// `average_<dataset>_loss_<strength>_with_timepoints.<ext>`
#[must_use]
pub fn loss_rate_file_name(dataset: &str, field_strength: f64, format: TableFormat) -> String {
    format!(
        "average_{dataset}_loss_{field_strength:.1}_with_timepoints.{}",
        format.extension()
    )
}
