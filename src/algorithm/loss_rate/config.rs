//! Configuration for the longitudinal loss-rate pass

use std::fmt;

use crate::config::ColumnNames;
use crate::schema::DateFormatConfig;

/// Dataset holding cortical thickness, which is never volume-normalised
pub const THICKNESS_DATASET: &str = "Thick";

/// Days in an average year, used to turn timepoint distances into years
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Settings for computing annualised loss rates of one dataset
#[derive(Debug, Clone)]
pub struct LossRateConfig {
    /// Input column names shared with the matcher
    pub columns: ColumnNames,
    /// Only scans at this field strength are used
    pub field_strength: f64,
    /// Divide every measurement by this column before computing rates
    pub normalize_by: Option<String>,
    /// Columns that are neither measurements nor carried through
    pub exclude_columns: Vec<String>,
    /// Columns copied from each subject's first timepoint, when present
    pub carry_columns: Vec<String>,
    /// Date parsing for scan and visit dates
    pub date_format_config: DateFormatConfig,
    /// Days per year for the annualisation
    pub days_per_year: f64,
    /// Output column with the distance between the timepoints in years
    pub distance_column: String,
    /// Output column and visit prefix for the first timepoint
    pub first_timepoint: String,
    /// Output column and visit prefix for the last timepoint
    pub last_timepoint: String,
}

impl Default for LossRateConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            field_strength: 3.0,
            normalize_by: None,
            exclude_columns: vec!["names".to_string()],
            carry_columns: vec!["TBI".to_string()],
            date_format_config: DateFormatConfig::default(),
            days_per_year: DAYS_PER_YEAR,
            distance_column: "Timepoint_Distance".to_string(),
            first_timepoint: "timepoint_1".to_string(),
            last_timepoint: "timepoint_2".to_string(),
        }
    }
}

impl LossRateConfig {
    /// Settings for a named dataset at a field strength
    ///
    /// Volumetric datasets are normalised by total intracranial volume and
    /// drop the volume bookkeeping columns; thickness is used as measured.
    #[must_use]
    pub fn for_dataset(dataset: &str, field_strength: f64) -> Self {
        let mut config = Self {
            field_strength,
            ..Self::default()
        };

        if dataset != THICKNESS_DATASET {
            config.normalize_by = Some("TIV".to_string());
            config.exclude_columns.push("TIVnames".to_string());
        }
        config
    }
}

impl fmt::Display for LossRateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Loss Rate Configuration:")?;
        writeln!(f, "  Field Strength: {:.1}T", self.field_strength)?;
        writeln!(
            f,
            "  Normalised By: {}",
            self.normalize_by.as_deref().unwrap_or("none")
        )?;
        writeln!(f, "  Excluded Columns: {}", self.exclude_columns.join(", "))?;
        write!(f, "  Days Per Year: {}", self.days_per_year)
    }
}
