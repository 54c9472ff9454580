//! Dataset-level runs used by the binaries
//!
//! The clinical table is read once per run and passed to every dataset, so
//! datasets never share any other state.

use std::path::{Path, PathBuf};
use log::{debug, info};

use crate::algorithm::loss_rate::{LossRateConfig, compute_loss_rates};
use crate::algorithm::temporal::{MatcherConfig, MergeStats, TemporalMatcher, VisitIndex};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::utils::io::{loss_rate_file_name, output_file_name, read_table, write_table};
use crate::utils::logging::{
    create_group_progress_bar, create_main_progress_bar, finish_progress_bar, log_dataset_warning,
    log_table_read,
};

/// Field strengths the loss-rate run covers by default
pub const DEFAULT_FIELD_STRENGTHS: [f64; 2] = [1.5, 3.0];

/// A table written by a run
#[derive(Debug, Clone)]
pub struct DatasetOutput {
    /// Dataset the table was computed from
    pub dataset: String,
    /// Field strength, for loss-rate tables
    pub field_strength: Option<f64>,
    /// Where the table was written
    pub path: PathBuf,
    /// Number of data rows written
    pub rows: usize,
    /// Merge counters, for merged tables
    pub stats: Option<MergeStats>,
}

/// Read the clinical visit table named by the configuration
pub fn load_clinical(config: &PipelineConfig) -> Result<Table> {
    let path = config.clinical_path();
    log_table_read("clinical visit table", &path);
    read_table(&path)
}

/// Read the imaging table of one dataset
pub fn load_dataset(dataset: &str, config: &PipelineConfig) -> Result<Table> {
    let path = config.dataset_path(dataset);
    log_table_read(&format!("{dataset} imaging table"), &path);
    read_table(&path)
}

/// Merge one dataset with the clinical table and write `merged_<dataset>_<date>`
pub fn merge_dataset(
    dataset: &str,
    clinical: &Table,
    matcher: &TemporalMatcher,
    config: &PipelineConfig,
) -> Result<DatasetOutput> {
    let imaging = load_dataset(dataset, config)?;
    let result = matcher.perform_merge(&imaging, clinical)?;

    let path = config.output_dir.join(output_file_name(
        "merged",
        dataset,
        config.run_date,
        config.output_format,
    ));
    write_table(&result.merged, &path)?;

    Ok(DatasetOutput {
        dataset: dataset.to_string(),
        field_strength: None,
        rows: result.merged.num_rows(),
        path,
        stats: Some(result.stats),
    })
}

/// Merge every configured dataset, stopping at the first failure
pub fn run_merge(config: &PipelineConfig, matcher_config: MatcherConfig) -> Result<Vec<DatasetOutput>> {
    ensure_output_dir(&config.output_dir)?;
    let clinical = load_clinical(config)?;
    let matcher = TemporalMatcher::new(matcher_config);
    debug!("{}", matcher.config());

    let pb = create_main_progress_bar(config.datasets.len() as u64, Some("Merging datasets"));
    let mut outputs = Vec::with_capacity(config.datasets.len());

    for dataset in &config.datasets {
        pb.set_message(format!("Merging {dataset}"));
        let output = merge_dataset(dataset, &clinical, &matcher, config)?;
        info!("{dataset}: {} rows written to {}", output.rows, output.path.display());
        outputs.push(output);
        pb.inc(1);
    }

    finish_progress_bar(&pb, Some("Merging complete"));
    Ok(outputs)
}

/// Compute loss rates of every configured dataset at each field strength
pub fn run_loss_rates(config: &PipelineConfig, field_strengths: &[f64]) -> Result<Vec<DatasetOutput>> {
    ensure_output_dir(&config.output_dir)?;
    let clinical = load_clinical(config)?;

    let defaults = LossRateConfig::default();
    let visit_index = VisitIndex::from_table(&clinical, &defaults.columns, &defaults.date_format_config)?;

    let pb = create_main_progress_bar(config.datasets.len() as u64, Some("Computing loss rates"));
    let mut outputs = Vec::with_capacity(config.datasets.len() * field_strengths.len());

    for dataset in &config.datasets {
        pb.set_message(format!("Loss rates for {dataset}"));
        let table = load_dataset(dataset, config)?;

        let strengths_pb = create_group_progress_bar(field_strengths.len() as u64, Some(dataset.as_str()));
        for &strength in field_strengths {
            let loss_config = LossRateConfig::for_dataset(dataset, strength);
            let rates = compute_loss_rates(&table, &clinical, &visit_index, &loss_config)?;
            if rates.num_rows() == 0 {
                log_dataset_warning(
                    dataset,
                    &format!("no {strength:.1}T scans, writing an empty loss-rate table"),
                );
            }

            let path = config
                .output_dir
                .join(loss_rate_file_name(dataset, strength, config.output_format));
            write_table(&rates, &path)?;

            outputs.push(DatasetOutput {
                dataset: dataset.clone(),
                field_strength: Some(strength),
                rows: rates.num_rows(),
                path,
                stats: None,
            });
            strengths_pb.inc(1);
        }
        strengths_pb.finish_and_clear();
        pb.inc(1);
    }

    finish_progress_bar(&pb, Some("Loss rates complete"));
    Ok(outputs)
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
