#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use visit_matcher::Table;
use visit_matcher::table::cell;

/// Imaging columns used by the synthetic datasets
pub const IMAGING_COLUMNS: [&str; 7] = ["names", "RID", "DATE", "FIELD", "isAvg", "SCAN", "L_Hippo"];

/// Clinical columns used by the synthetic visit tables
pub const CLINICAL_COLUMNS: [&str; 5] = ["RID", "VISCODE", "EXAMDATE", "DX_bl", "AGE"];

/// Row-wise builder for string tables; empty strings become nulls
pub struct TableBuilder {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        assert_eq!(values.len(), self.columns.len(), "row width");
        self.rows.push(values.iter().map(ToString::to_string).collect());
        self
    }

    pub fn build(self) -> Table {
        let columns: Vec<(String, Vec<Option<String>>)> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = self
                    .rows
                    .iter()
                    .map(|row| Some(row[idx].clone()).filter(|v| !v.is_empty()))
                    .collect();
                (name.clone(), values)
            })
            .collect();
        Table::from_columns(self.name, columns).unwrap()
    }

    /// Same rows rendered as CSV text with a header
    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join(","));
            out.push('\n');
        }
        out
    }
}

/// Imaging rows for subject 7 as in the worked example, plus subject 12 without visits
pub fn rid7_imaging() -> TableBuilder {
    TableBuilder::new("df_GM.csv", &IMAGING_COLUMNS)
        .row(&["s1", "7", "2020-01-10", "1.5", "FALSE", "S100", "3.1"])
        .row(&["s2", "7", "2020-01-10", "3.0", "FALSE", "S101", "3.2"])
        .row(&["s3", "7", "2021-02-01", "3.0", "FALSE", "S102", "3.0"])
        .row(&["s4", "7", "2021-02-01", "3.0", "TRUE", "S103", "3.05"])
        .row(&["s5", "12", "2020-05-05", "3.0", "FALSE", "S104", "2.9"])
}

/// Visits for subjects 7 and 8
pub fn rid7_clinical() -> TableBuilder {
    TableBuilder::new("df_clinical.csv", &CLINICAL_COLUMNS)
        .row(&["7", "bl", "2020-01-12", "CN", "70.1"])
        .row(&["7", "m12", "2021-01-28", "CN", "71.1"])
        .row(&["8", "bl", "2019-01-01", "AD", "80.4"])
}

/// All cells of a column, blank cells as `None`
pub fn column_values(table: &Table, column: &str) -> Vec<Option<String>> {
    let array = table.string_column(column).unwrap();
    (0..table.num_rows())
        .map(|row| cell(array, row).map(ToString::to_string))
        .collect()
}

/// Convenience for comparing against literal rows
pub fn cells(values: &[&str]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| Some(v.to_string()).filter(|v| !v.is_empty()))
        .collect()
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_iso(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

/// Write a file into a test directory and return its path
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Small deterministic generator for synthetic tables
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_below(&mut self, bound: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) % bound
    }
}
