//! Output column layout and assembly of the merged batch
//!
//! The layout is planned from the two input schemas alone, before any row
//! is read, so every schema problem surfaces before processing starts.

use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::table::Table;

use super::config::MatcherConfig;
use super::types::VisitMatch;

/// Which input table a column is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Column index in the imaging table
    Observation(usize),
    /// Column index in the clinical table
    Visit(usize),
}

/// One column of the merged table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Name in the merged table
    pub name: String,
    /// Where its values come from
    pub source: ColumnSource,
}

/// Ordered columns of the merged table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    columns: Vec<OutputColumn>,
}

impl OutputLayout {
    /// Plan the merged columns
    ///
    /// The subject key comes from the imaging table and the clinical copy is
    /// dropped. The imaging date is renamed to the scan date column. Other
    /// names present in both tables get the configured suffixes; the subject,
    /// scan date and visit date columns never do. Lead columns come first,
    /// then the rest of the imaging columns, then the rest of the clinical
    /// columns, each in input order.
    pub fn plan(observations: &Table, visits: &Table, config: &MatcherConfig) -> Result<Self> {
        let names = &config.columns;
        if names.scan_date == names.visit_date {
            return Err(Error::Validation(format!(
                "Scan date and visit date cannot share the name '{}'",
                names.scan_date
            )));
        }

        let obs_schema = observations.schema();
        let visit_schema = visits.schema();
        let obs_subject = obs_schema
            .index_of(&names.subject_id)
            .map_err(|_| Error::missing_column(observations.name(), &names.subject_id))?;
        let obs_date = obs_schema
            .index_of(&names.observation_date)
            .map_err(|_| Error::missing_column(observations.name(), &names.observation_date))?;
        let visit_subject = visit_schema
            .index_of(&names.subject_id)
            .map_err(|_| Error::missing_column(visits.name(), &names.subject_id))?;
        let visit_date = visit_schema
            .index_of(&names.visit_date)
            .map_err(|_| Error::missing_column(visits.name(), &names.visit_date))?;

        let mut obs_columns: Vec<(String, usize, bool)> = obs_schema
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                if idx == obs_date {
                    (names.scan_date.clone(), idx, true)
                } else {
                    (field.name().clone(), idx, idx == obs_subject)
                }
            })
            .collect();

        let mut visit_columns: Vec<(String, usize, bool)> = visit_schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != visit_subject)
            .map(|(idx, field)| (field.name().clone(), idx, idx == visit_date))
            .collect();

        let obs_names: FxHashSet<String> = obs_columns.iter().map(|c| c.0.clone()).collect();
        let visit_names: FxHashSet<String> = visit_columns.iter().map(|c| c.0.clone()).collect();

        for (name, _, protected) in &mut obs_columns {
            if !*protected && visit_names.contains(name.as_str()) {
                name.push_str(&config.observation_suffix);
            }
        }
        for (name, _, protected) in &mut visit_columns {
            if !*protected && obs_names.contains(name.as_str()) {
                name.push_str(&config.visit_suffix);
            }
        }

        let all: Vec<OutputColumn> = obs_columns
            .into_iter()
            .map(|(name, idx, _)| OutputColumn {
                name,
                source: ColumnSource::Observation(idx),
            })
            .chain(visit_columns.into_iter().map(|(name, idx, _)| OutputColumn {
                name,
                source: ColumnSource::Visit(idx),
            }))
            .collect();

        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        for (pos, column) in all.iter().enumerate() {
            if positions.insert(column.name.as_str(), pos).is_some() {
                return Err(Error::Validation(format!(
                    "Merging {} with {} would produce the column '{}' twice",
                    observations.name(),
                    visits.name(),
                    column.name
                )));
            }
        }

        let leads = [
            names.subject_id.as_str(),
            names.visit_date.as_str(),
            names.scan_date.as_str(),
            names.field_strength.as_str(),
        ]
        .into_iter()
        .chain(config.priority_columns.iter().map(String::as_str));

        let mut order: Vec<usize> = Vec::with_capacity(all.len());
        for lead in leads {
            let pos = *positions.get(lead).ok_or_else(|| {
                Error::missing_column(format!("{} / {}", observations.name(), visits.name()), lead)
            })?;
            if !order.contains(&pos) {
                order.push(pos);
            }
        }
        let placed: FxHashSet<usize> = order.iter().copied().collect();
        order.extend((0..all.len()).filter(|pos| !placed.contains(pos)));

        let mut slots: Vec<Option<OutputColumn>> = all.into_iter().map(Some).collect();
        let columns = order
            .into_iter()
            .filter_map(|pos| slots[pos].take())
            .collect();

        Ok(Self { columns })
    }

    /// Planned columns in output order
    #[must_use]
    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    /// Output column names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Gather the merged batch: one row per match, clinical cells null when unmatched
    pub fn assemble(
        &self,
        observations: &RecordBatch,
        visits: &RecordBatch,
        matches: &[VisitMatch],
    ) -> Result<RecordBatch> {
        let obs_indices = matches
            .iter()
            .map(|m| to_index(m.observation_row))
            .collect::<Result<Vec<u32>>>()?;
        let visit_indices = matches
            .iter()
            .map(|m| m.visit_row.map(to_index).transpose())
            .collect::<Result<Vec<Option<u32>>>>()?;

        let obs_indices = UInt32Array::from(obs_indices);
        let visit_indices = UInt32Array::from(visit_indices);

        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let (source, indices) = match column.source {
                ColumnSource::Observation(idx) => (observations.column(idx), &obs_indices),
                ColumnSource::Visit(idx) => (visits.column(idx), &visit_indices),
            };
            fields.push(Field::new(&column.name, source.data_type().clone(), true));
            arrays.push(take(source.as_ref(), indices, None)?);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

pub(crate) fn to_index(row: usize) -> Result<u32> {
    u32::try_from(row)
        .map_err(|_| Error::Validation(format!("Row {row} exceeds the supported table size")))
}
