//! Nearest-visit matching and merging of imaging and clinical tables
//!
//! Each retained imaging row is paired with the clinical visit of the same
//! subject whose date is closest to the scan date, and the two rows are
//! joined into one output row. Subjects without visits keep their rows with
//! empty clinical fields.

use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::schema::days_between;
use crate::table::Table;

use super::config::MatcherConfig;
use super::extraction::{extract_observations, observation_columns, visit_columns};
use super::layout::OutputLayout;
use super::preparation::{deduplicate, filter_averages};
use super::types::{MergeResult, MergeStats, Observation, VisitMatch};
use super::visits::VisitIndex;

/// Matcher pairing imaging rows with their nearest clinical visit
#[derive(Debug, Clone, Default)]
pub struct TemporalMatcher {
    config: MatcherConfig,
}

impl TemporalMatcher {
    /// Create a new matcher with the given configuration
    #[must_use]
    pub const fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// The matcher's configuration
    #[must_use]
    pub const fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Merge an imaging table with a clinical visit table
    ///
    /// # Arguments
    ///
    /// * `observations` - Imaging rows, one per subject, date and field strength
    /// * `visits` - Clinical visit rows
    ///
    /// # Returns
    ///
    /// The merged table with one row per imaging row left after average
    /// removal and deduplication, in input order, plus the chosen matches
    pub fn perform_merge(&self, observations: &Table, visits: &Table) -> Result<MergeResult> {
        let start_time = Instant::now();

        // Schema checks first, so a bad input fails before any row is parsed
        let columns = &self.config.columns;
        observations.require_columns(&observation_columns(columns))?;
        visits.require_columns(&visit_columns(columns))?;
        let layout = OutputLayout::plan(observations, visits, &self.config)?;

        let date_config = &self.config.date_format_config;
        let extracted = extract_observations(observations, columns, date_config)?;
        let visit_index = VisitIndex::from_table(visits, columns, date_config)?;

        let without_averages = filter_averages(&extracted);
        let retained = deduplicate(&without_averages);

        info!(
            "Matching {} scans from {} against {} visits of {} subjects from {}",
            retained.len(),
            observations.name(),
            visit_index.len(),
            visit_index.subject_count(),
            visits.name()
        );

        let matches = self.match_observations(&retained, &visit_index);
        let batch = layout.assemble(observations.batch(), visits.batch(), &matches)?;

        let matched = matches.iter().filter(|m| m.is_matched()).count();
        let stats = MergeStats {
            observation_rows: observations.num_rows(),
            visit_rows: visits.num_rows(),
            average_rows_dropped: extracted.len() - without_averages.len(),
            duplicate_rows_dropped: without_averages.len() - retained.len(),
            matched,
            unmatched: matches.len() - matched,
            elapsed: start_time.elapsed(),
        };

        if stats.unmatched > 0 {
            let subjects: FxHashSet<&str> = matches
                .iter()
                .filter(|m| !m.is_matched())
                .map(|m| m.subject.as_str())
                .collect();
            warn!(
                "{} scans of {} subjects have no clinical visits; their clinical fields are empty",
                stats.unmatched,
                subjects.len()
            );
        }
        info!("Merge complete: {stats}");

        Ok(MergeResult {
            merged: Table::new(format!("merged {}", observations.name()), batch),
            matches,
            stats,
        })
    }

    /// Find the nearest visit for every observation, in observation order
    #[must_use]
    pub fn match_observations(
        &self,
        observations: &[Observation],
        visits: &VisitIndex,
    ) -> Vec<VisitMatch> {
        let use_parallel =
            self.config.use_parallel && observations.len() >= self.config.parallel_threshold;

        if use_parallel {
            debug!(
                "Matching {} scans in parallel on {} threads",
                observations.len(),
                rayon::current_num_threads()
            );
            // Indexed collect keeps input order
            observations
                .par_iter()
                .map(|obs| nearest_match(obs, visits))
                .collect()
        } else {
            observations
                .iter()
                .map(|obs| nearest_match(obs, visits))
                .collect()
        }
    }
}

/// Match a single observation against the visit index
#[must_use]
pub fn nearest_match(observation: &Observation, visits: &VisitIndex) -> VisitMatch {
    let visit = visits.nearest(&observation.subject, observation.scan_date);

    VisitMatch {
        observation_row: observation.row,
        subject: observation.subject.clone(),
        scan_date: observation.scan_date,
        visit_row: visit.map(|v| v.row),
        visit_date: visit.map(|v| v.visit_date),
        visit_code: visit.and_then(|v| v.visit_code.clone()),
        distance_days: visit.map(|v| days_between(v.visit_date, observation.scan_date)),
    }
}
