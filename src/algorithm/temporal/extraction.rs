//! Typed extraction of observations and visits from string tables
//!
//! Every date is parsed here, before any matching happens; a single bad
//! date aborts the run with the table, column and row that held it.

use arrow::array::StringArray;
use chrono::NaiveDate;

use crate::config::ColumnNames;
use crate::error::{Error, Result};
use crate::schema::{DateFormatConfig, parse_date_string};
use crate::table::{Table, cell};

use super::types::{Observation, SubjectId, Visit};

/// Columns the imaging table must provide
#[must_use]
pub fn observation_columns(columns: &ColumnNames) -> [&str; 4] {
    [
        columns.subject_id.as_str(),
        columns.observation_date.as_str(),
        columns.field_strength.as_str(),
        columns.is_average.as_str(),
    ]
}

/// Columns the clinical table must provide
#[must_use]
pub fn visit_columns(columns: &ColumnNames) -> [&str; 3] {
    [
        columns.subject_id.as_str(),
        columns.visit_date.as_str(),
        columns.visit_code.as_str(),
    ]
}

/// Extract every imaging row as an observation
pub fn extract_observations(
    table: &Table,
    columns: &ColumnNames,
    date_config: &DateFormatConfig,
) -> Result<Vec<Observation>> {
    table.require_columns(&observation_columns(columns))?;

    let subjects = table.string_column(&columns.subject_id)?;
    let dates = table.string_column(&columns.observation_date)?;
    let strengths = table.string_column(&columns.field_strength)?;
    let averages = table.string_column(&columns.is_average)?;

    (0..table.num_rows())
        .map(|row| {
            Ok(Observation {
                row,
                subject: required_subject(table, subjects, &columns.subject_id, row)?,
                scan_date: required_date(table, dates, &columns.observation_date, row, date_config)?,
                field_strength: field_strength(table, strengths, &columns.field_strength, row)?,
                is_average: flag(table, averages, &columns.is_average, row)?,
            })
        })
        .collect()
}

/// Extract every clinical row as a visit
pub fn extract_visits(
    table: &Table,
    columns: &ColumnNames,
    date_config: &DateFormatConfig,
) -> Result<Vec<Visit>> {
    table.require_columns(&visit_columns(columns))?;

    let subjects = table.string_column(&columns.subject_id)?;
    let dates = table.string_column(&columns.visit_date)?;
    let codes = table.string_column(&columns.visit_code)?;

    (0..table.num_rows())
        .map(|row| {
            Ok(Visit {
                row,
                subject: required_subject(table, subjects, &columns.subject_id, row)?,
                visit_date: required_date(table, dates, &columns.visit_date, row, date_config)?,
                visit_code: cell(codes, row).map(ToString::to_string),
            })
        })
        .collect()
}

pub(crate) fn required_subject(
    table: &Table,
    array: &StringArray,
    column: &str,
    row: usize,
) -> Result<SubjectId> {
    cell(array, row)
        .map(ToString::to_string)
        .ok_or_else(|| invalid_value(table, column, row, ""))
}

/// Parse a date cell; empty cells are malformed too since they cannot be compared
pub(crate) fn required_date(
    table: &Table,
    array: &StringArray,
    column: &str,
    row: usize,
    date_config: &DateFormatConfig,
) -> Result<NaiveDate> {
    let raw = cell(array, row).unwrap_or_default();
    parse_date_string(raw, date_config).ok_or_else(|| Error::MalformedDate {
        table: table.name().to_string(),
        column: column.to_string(),
        row,
        value: raw.to_string(),
    })
}

/// Parse a field strength such as `3`, `1.5` or `3T`; empty cells are `None`
pub(crate) fn field_strength(
    table: &Table,
    array: &StringArray,
    column: &str,
    row: usize,
) -> Result<Option<f64>> {
    let Some(raw) = cell(array, row) else {
        return Ok(None);
    };

    let numeric = raw.trim_end_matches(['T', 't']).trim();
    match numeric.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Ok(None),
        Err(_) => Err(invalid_value(table, column, row, raw)),
    }
}

/// Parse a boolean flag cell; empty cells are `false`
pub(crate) fn flag(table: &Table, array: &StringArray, column: &str, row: usize) -> Result<bool> {
    let Some(raw) = cell(array, row) else {
        return Ok(false);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err(invalid_value(table, column, row, raw)),
    }
}

fn invalid_value(table: &Table, column: &str, row: usize, value: &str) -> Error {
    Error::InvalidValue {
        table: table.name().to_string(),
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imaging(rows: Vec<[Option<&str>; 4]>) -> Table {
        let mut columns: Vec<(&str, Vec<Option<&str>>)> = vec![
            ("RID", Vec::new()),
            ("DATE", Vec::new()),
            ("FIELD", Vec::new()),
            ("isAvg", Vec::new()),
        ];
        for row in rows {
            for (i, value) in row.into_iter().enumerate() {
                columns[i].1.push(value);
            }
        }
        Table::from_columns("df_GM.csv", columns).unwrap()
    }

    #[test]
    fn test_extract_observations() {
        let table = imaging(vec![
            [Some("7"), Some("2020-01-10"), Some("1.5"), Some("FALSE")],
            [Some(" 7 "), Some("01/10/2020"), Some("3T"), Some("True")],
            [Some("8"), Some("2021-02-01"), None, None],
        ]);

        let observations =
            extract_observations(&table, &ColumnNames::default(), &DateFormatConfig::default())
                .unwrap();

        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].subject, "7");
        assert_eq!(observations[1].subject, "7");
        assert_eq!(observations[0].scan_date, observations[1].scan_date);
        assert_eq!(observations[1].field_strength, Some(3.0));
        assert!(observations[1].is_average);
        assert_eq!(observations[2].field_strength, None);
        assert!(!observations[2].is_average);
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let table = imaging(vec![
            [Some("7"), Some("2020-01-10"), Some("3.0"), Some("FALSE")],
            [Some("7"), Some("not a date"), Some("3.0"), Some("FALSE")],
        ]);

        let err = extract_observations(&table, &ColumnNames::default(), &DateFormatConfig::default())
            .unwrap_err();
        match err {
            Error::MalformedDate { table, column, row, value } => {
                assert_eq!(table, "df_GM.csv");
                assert_eq!(column, "DATE");
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_date_is_malformed() {
        let table = imaging(vec![[Some("7"), None, Some("3.0"), Some("FALSE")]]);
        let err = extract_observations(&table, &ColumnNames::default(), &DateFormatConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::MalformedDate { row: 0, .. }));
    }

    #[test]
    fn test_bad_flag_and_strength() {
        let table = imaging(vec![[Some("7"), Some("2020-01-10"), Some("3.0"), Some("maybe")]]);
        let err = extract_observations(&table, &ColumnNames::default(), &DateFormatConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "isAvg"));

        let table = imaging(vec![[Some("7"), Some("2020-01-10"), Some("high"), Some("0")]]);
        let err = extract_observations(&table, &ColumnNames::default(), &DateFormatConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref column, .. } if column == "FIELD"));
    }

    #[test]
    fn test_extract_visits_requires_columns() {
        let table = Table::from_columns(
            "df_clinical.csv",
            vec![("RID", vec![Some("7")]), ("EXAMDATE", vec![Some("2020-01-12")])],
        )
        .unwrap();

        let err = extract_visits(&table, &ColumnNames::default(), &DateFormatConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "VISCODE"));
    }
}
