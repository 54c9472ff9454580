//! Configuration shared by the matcher, the loss-rate pass and the binaries.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Default number of rows per record batch when reading CSV files
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Datasets processed when no names are given on the command line
pub const DEFAULT_DATASETS: [&str; 4] = ["GM", "WM", "CSF", "Thick"];

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var("CSV_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Helper function to get the dataset input format from environment
#[must_use]
pub fn get_input_format() -> Option<TableFormat> {
    std::env::var("DATASET_FORMAT")
        .ok()
        .and_then(|s| TableFormat::from_extension(s.trim()))
}

/// Names of the columns the matcher reads from the two input tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    /// Subject key present in both tables
    pub subject_id: String,
    /// Acquisition date in the imaging table
    pub observation_date: String,
    /// Name the acquisition date is emitted under
    pub scan_date: String,
    /// Scanner field strength in the imaging table
    pub field_strength: String,
    /// Average-of-sessions flag in the imaging table
    pub is_average: String,
    /// Evaluation date in the clinical table
    pub visit_date: String,
    /// Visit code in the clinical table
    pub visit_code: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            subject_id: "RID".to_string(),
            observation_date: "DATE".to_string(),
            scan_date: "SCAN_DATE".to_string(),
            field_strength: "FIELD".to_string(),
            is_average: "isAvg".to_string(),
            visit_date: "EXAMDATE".to_string(),
            visit_code: "VISCODE".to_string(),
        }
    }
}

/// On-disk table encoding, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// Comma separated values with a header row
    #[default]
    Csv,
    /// Apache Parquet
    Parquet,
}

impl TableFormat {
    /// Detect the format of a path from its extension
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Self::Parquet,
            _ => Self::Csv,
        }
    }

    /// Parse a format name such as `csv` or `parquet`
    #[must_use]
    pub fn from_extension(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if name.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }

    /// File extension without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Where the binaries find their inputs and put their outputs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the dataset tables and the clinical table
    pub data_dir: PathBuf,
    /// Directory receiving the outputs
    pub output_dir: PathBuf,
    /// Clinical visit table, relative to `data_dir`
    pub clinical_file: String,
    /// Dataset names, each read from `df_<name>.<ext>`
    pub datasets: Vec<String>,
    /// Encoding of the dataset tables, which sets `<ext>`
    pub input_format: TableFormat,
    /// Date stamped into output file names
    pub run_date: NaiveDate,
    /// Encoding of the written tables
    pub output_format: TableFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            clinical_file: "df_clinical.csv".to_string(),
            datasets: DEFAULT_DATASETS.iter().map(ToString::to_string).collect(),
            input_format: TableFormat::Csv,
            run_date: chrono::Local::now().date_naive(),
            output_format: TableFormat::Csv,
        }
    }
}

impl PipelineConfig {
    /// Path of the clinical visit table
    #[must_use]
    pub fn clinical_path(&self) -> PathBuf {
        self.data_dir.join(&self.clinical_file)
    }

    /// Path of the imaging table for a dataset
    #[must_use]
    pub fn dataset_path(&self, dataset: &str) -> PathBuf {
        self.data_dir
            .join(format!("df_{dataset}.{}", self.input_format.extension()))
    }

    /// Replace the dataset list when any names were given
    #[must_use]
    pub fn with_datasets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if !names.is_empty() {
            self.datasets = names;
        }
        self
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Data Directory: {}", self.data_dir.display())?;
        writeln!(f, "  Output Directory: {}", self.output_dir.display())?;
        writeln!(f, "  Clinical Table: {}", self.clinical_file)?;
        writeln!(f, "  Datasets: {}", self.datasets.join(", "))?;
        writeln!(f, "  Input Format: {}", self.input_format.extension())?;
        writeln!(f, "  Run Date: {}", self.run_date)?;
        write!(f, "  Output Format: {}", self.output_format.extension())
    }
}
