//! Per-subject visit index for nearest-date lookups

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::ColumnNames;
use crate::error::Result;
use crate::schema::{DateFormatConfig, days_between};
use crate::table::Table;

use super::extraction::extract_visits;
use super::types::Visit;

/// Most subjects have a handful of visits; larger groups spill to the heap
type VisitGroup = SmallVec<[usize; 16]>;

/// Visits grouped once by subject, each group sorted by visit date
///
/// Grouping is O(|visits|) and replaces a linear scan of the whole visit
/// table per observation. Within a group, visits with equal dates stay in
/// input order.
#[derive(Debug, Clone, Default)]
pub struct VisitIndex {
    visits: Vec<Visit>,
    groups: FxHashMap<String, VisitGroup>,
}

impl VisitIndex {
    /// Build the index from extracted visits
    #[must_use]
    pub fn new(visits: Vec<Visit>) -> Self {
        let mut groups: FxHashMap<String, VisitGroup> = FxHashMap::default();
        for (idx, visit) in visits.iter().enumerate() {
            groups.entry(visit.subject.clone()).or_default().push(idx);
        }

        for group in groups.values_mut() {
            // Stable, so equal dates keep input order
            group.sort_by_key(|&idx| visits[idx].visit_date);
        }

        Self { visits, groups }
    }

    /// Extract the visits of a clinical table and index them
    pub fn from_table(
        table: &Table,
        columns: &ColumnNames,
        date_config: &DateFormatConfig,
    ) -> Result<Self> {
        Ok(Self::new(extract_visits(table, columns, date_config)?))
    }

    /// Total number of visits
    #[must_use]
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Whether the index holds no visits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Number of distinct subjects with at least one visit
    #[must_use]
    pub fn subject_count(&self) -> usize {
        self.groups.len()
    }

    /// Visits of one subject in date order
    pub fn visits_for<'a>(&'a self, subject: &str) -> impl Iterator<Item = &'a Visit> + 'a {
        self.groups
            .get(subject)
            .into_iter()
            .flat_map(|group| group.iter().map(|&idx| &self.visits[idx]))
    }

    /// The subject's visit closest in time to `date`
    ///
    /// Returns `None` when the subject has no visits. When two visits are
    /// equally far away the earlier visit wins; visits sharing a date
    /// resolve to the earliest input row.
    #[must_use]
    pub fn nearest(&self, subject: &str, date: NaiveDate) -> Option<&Visit> {
        let group = self.groups.get(subject)?;
        let date_at = |pos: usize| self.visits[group[pos]].visit_date;

        // First visit on or after the date
        let split = group.partition_point(|&idx| self.visits[idx].visit_date < date);
        let after = (split < group.len()).then(|| &self.visits[group[split]]);

        // Earliest row of the latest date strictly before
        let before = split.checked_sub(1).map(|last| {
            let day = date_at(last);
            let first = group.partition_point(|&idx| self.visits[idx].visit_date < day);
            &self.visits[group[first]]
        });

        match (before, after) {
            (Some(b), Some(a)) => {
                if days_between(a.visit_date, date) < days_between(b.visit_date, date) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (b, a) => b.or(a),
        }
    }
}
