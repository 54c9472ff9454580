//! Type definitions for the temporal matcher

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;

use crate::table::Table;

/// Opaque subject key (`RID`), trimmed of surrounding whitespace
pub type SubjectId = String;

/// One imaging row
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Row in the imaging table
    pub row: usize,
    /// Subject the scan belongs to
    pub subject: SubjectId,
    /// Acquisition date
    pub scan_date: NaiveDate,
    /// Scanner field strength in tesla, when recorded
    pub field_strength: Option<f64>,
    /// Synthesized average-of-sessions row
    pub is_average: bool,
}

/// One clinical visit row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Row in the clinical table
    pub row: usize,
    /// Subject the visit belongs to
    pub subject: SubjectId,
    /// Evaluation date
    pub visit_date: NaiveDate,
    /// Visit code such as `bl` or `m12`
    pub visit_code: Option<String>,
}

/// The visit chosen for one retained observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitMatch {
    /// Row of the observation in the imaging table
    pub observation_row: usize,
    /// Subject of the observation
    pub subject: SubjectId,
    /// Scan date of the observation
    pub scan_date: NaiveDate,
    /// Row of the matched visit in the clinical table
    pub visit_row: Option<usize>,
    /// Date of the matched visit
    pub visit_date: Option<NaiveDate>,
    /// Code of the matched visit
    pub visit_code: Option<String>,
    /// Absolute distance between scan and visit in days
    pub distance_days: Option<i64>,
}

impl VisitMatch {
    /// Whether a visit was found for the observation's subject
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.visit_row.is_some()
    }
}

/// Counters describing one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Rows in the imaging table
    pub observation_rows: usize,
    /// Rows in the clinical table
    pub visit_rows: usize,
    /// Average-of-sessions rows removed
    pub average_rows_dropped: usize,
    /// Lower field strength duplicates removed
    pub duplicate_rows_dropped: usize,
    /// Output rows with a matched visit
    pub matched: usize,
    /// Output rows for subjects without visits
    pub unmatched: usize,
    /// Time taken for the merge
    pub elapsed: Duration,
}

impl MergeStats {
    /// Number of merged rows
    #[must_use]
    pub const fn output_rows(&self) -> usize {
        self.matched + self.unmatched
    }
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imaging rows ({} averages, {} duplicates dropped) x {} visits -> {} rows ({} matched, {} without visits) in {:.2?}",
            self.observation_rows,
            self.average_rows_dropped,
            self.duplicate_rows_dropped,
            self.visit_rows,
            self.output_rows(),
            self.matched,
            self.unmatched,
            self.elapsed
        )
    }
}

/// Result of a merge
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// The merged table with canonical column order
    pub merged: Table,
    /// One entry per output row, in output order
    pub matches: Vec<VisitMatch>,
    /// Run counters
    pub stats: MergeStats,
}
