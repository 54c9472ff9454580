//! Annualised loss rates between each subject's first and last scan

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algorithm::temporal::VisitIndex;
use crate::algorithm::temporal::extraction::{field_strength, flag, required_date, required_subject};
use crate::algorithm::temporal::layout::to_index;
use crate::error::Result;
use crate::table::{Table, cell};

use super::config::LossRateConfig;

/// Field strengths within this distance count as equal
const STRENGTH_TOLERANCE: f64 = 1e-6;

/// Scans of one subject as `(scan date, row)` pairs
#[derive(Debug)]
struct SubjectScans {
    subject: String,
    scans: Vec<(NaiveDate, usize)>,
}

impl SubjectScans {
    /// Earliest date, earliest row among equal dates
    fn first(&self) -> Option<(NaiveDate, usize)> {
        self.scans.iter().min().copied()
    }

    /// Latest date, latest row among equal dates
    fn last(&self) -> Option<(NaiveDate, usize)> {
        self.scans.iter().max().copied()
    }
}

/// Percentage lost per year between two measurements
///
/// `None` when the initial value is zero or no time passed.
#[must_use]
pub fn loss_rate(initial: f64, last: f64, years: f64) -> Option<f64> {
    if initial == 0.0 || years == 0.0 {
        return None;
    }
    Some(((initial - last) / initial) * 100.0 / years)
}

/// Compute per-subject loss rates for one dataset
///
/// Average rows are dropped, then only scans at the configured field
/// strength are kept. Subjects appear in the order of their first kept
/// scan. Each timepoint is paired with the subject's nearest clinical visit,
/// whose columns are appended with the timepoint name as prefix.
pub fn compute_loss_rates(
    dataset: &Table,
    visits: &Table,
    visit_index: &VisitIndex,
    config: &LossRateConfig,
) -> Result<Table> {
    let start_time = Instant::now();
    let names = &config.columns;

    let mut required = vec![
        names.subject_id.as_str(),
        names.observation_date.as_str(),
        names.field_strength.as_str(),
    ];
    if let Some(column) = config.normalize_by.as_deref() {
        required.push(column);
    }
    dataset.require_columns(&required)?;

    let subjects = dataset.string_column(&names.subject_id)?;
    let dates = dataset.string_column(&names.observation_date)?;
    let strengths = dataset.string_column(&names.field_strength)?;
    let averages = if dataset.has_column(&names.is_average) {
        Some(dataset.string_column(&names.is_average)?)
    } else {
        None
    };
    let normalizer = config
        .normalize_by
        .as_deref()
        .map(|column| dataset.string_column(column))
        .transpose()?;

    let mut groups: Vec<SubjectScans> = Vec::new();
    let mut positions: FxHashMap<String, usize> = FxHashMap::default();
    let mut scans_used = 0;

    for row in 0..dataset.num_rows() {
        let subject = required_subject(dataset, subjects, &names.subject_id, row)?;
        let date = required_date(
            dataset,
            dates,
            &names.observation_date,
            row,
            &config.date_format_config,
        )?;
        let strength = field_strength(dataset, strengths, &names.field_strength, row)?;
        let is_average = match averages {
            Some(array) => flag(dataset, array, &names.is_average, row)?,
            None => false,
        };

        let at_strength =
            strength.is_some_and(|s| (s - config.field_strength).abs() < STRENGTH_TOLERANCE);
        if is_average || !at_strength {
            continue;
        }

        let pos = *positions.entry(subject.clone()).or_insert_with(|| {
            groups.push(SubjectScans {
                subject,
                scans: Vec::new(),
            });
            groups.len() - 1
        });
        groups[pos].scans.push((date, row));
        scans_used += 1;
    }

    let mut timepoints = Vec::with_capacity(groups.len());
    for group in &groups {
        if let (Some(first), Some(last)) = (group.first(), group.last()) {
            timepoints.push((group.subject.as_str(), first, last));
        }
    }

    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    fields.push(Field::new(&names.subject_id, DataType::Utf8, true));
    arrays.push(Arc::new(StringArray::from_iter_values(
        timepoints.iter().map(|(subject, _, _)| *subject),
    )));

    let first_rows = timepoints
        .iter()
        .map(|(_, (_, row), _)| to_index(*row))
        .collect::<Result<Vec<u32>>>()?;
    let first_rows = UInt32Array::from(first_rows);
    let schema = dataset.schema();
    for column in &config.carry_columns {
        if let Ok(idx) = schema.index_of(column) {
            fields.push(Field::new(column, DataType::Utf8, true));
            arrays.push(take(dataset.batch().column(idx).as_ref(), &first_rows, None)?);
        }
    }

    let years: Vec<f64> = timepoints
        .iter()
        .map(|(_, (first, _), (last, _))| {
            (*last - *first).num_days() as f64 / config.days_per_year
        })
        .collect();

    let measures = measurement_columns(dataset, config);
    debug!(
        "Computing loss rates for {} measurement columns of {}",
        measures.len(),
        dataset.name()
    );
    for column in &measures {
        let values = dataset.string_column(column)?;
        let rates: Vec<Option<f64>> = timepoints
            .iter()
            .zip(&years)
            .map(|((_, (_, first), (_, last)), &years)| {
                let initial = measurement(values, normalizer, *first)?;
                let last = measurement(values, normalizer, *last)?;
                loss_rate(initial, last, years)
            })
            .collect();
        fields.push(Field::new(column, DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(rates)));
    }

    fields.push(Field::new(&config.distance_column, DataType::Float64, true));
    arrays.push(Arc::new(Float64Array::from(years)));

    for (name, pick_last) in [(&config.first_timepoint, false), (&config.last_timepoint, true)] {
        fields.push(Field::new(name, DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from_iter_values(timepoints.iter().map(
            |(_, first, last)| {
                let (date, _) = if pick_last { last } else { first };
                date.format("%Y-%m-%d").to_string()
            },
        ))));
    }

    for (prefix, pick_last) in [(&config.first_timepoint, false), (&config.last_timepoint, true)] {
        let indices = timepoints
            .iter()
            .map(|(subject, first, last)| {
                let (date, _) = if pick_last { last } else { first };
                visit_index
                    .nearest(subject, *date)
                    .map(|visit| to_index(visit.row))
                    .transpose()
            })
            .collect::<Result<Vec<Option<u32>>>>()?;
        let indices = UInt32Array::from(indices);

        let visit_schema = visits.schema();
        for (idx, field) in visit_schema.fields().iter().enumerate() {
            fields.push(Field::new(
                format!("{prefix}_{}", field.name()),
                field.data_type().clone(),
                true,
            ));
            arrays.push(take(visits.batch().column(idx).as_ref(), &indices, None)?);
        }
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;

    info!(
        "Computed loss rates for {} subjects from {} scans of {} at {:.1}T in {:?}",
        timepoints.len(),
        scans_used,
        dataset.name(),
        config.field_strength,
        start_time.elapsed()
    );

    Ok(Table::new(format!("loss rates {}", dataset.name()), batch))
}

/// Dataset columns that hold measurements, in input order
fn measurement_columns(dataset: &Table, config: &LossRateConfig) -> Vec<String> {
    let names = &config.columns;
    let mut excluded: FxHashSet<&str> = [
        names.subject_id.as_str(),
        names.observation_date.as_str(),
        names.field_strength.as_str(),
        names.is_average.as_str(),
    ]
    .into_iter()
    .collect();
    excluded.extend(config.exclude_columns.iter().map(String::as_str));
    excluded.extend(config.carry_columns.iter().map(String::as_str));
    excluded.extend(config.normalize_by.as_deref());

    dataset
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .filter(|name| !excluded.contains(name.as_str()))
        .collect()
}

/// Numeric value of a cell, optionally divided by the normalising column
fn measurement(values: &StringArray, normalizer: Option<&StringArray>, row: usize) -> Option<f64> {
    let value = numeric(values, row)?;
    match normalizer {
        Some(volumes) => {
            let volume = numeric(volumes, row)?;
            (volume != 0.0).then(|| value / volume)
        }
        None => Some(value),
    }
}

fn numeric(array: &StringArray, row: usize) -> Option<f64> {
    cell(array, row)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
