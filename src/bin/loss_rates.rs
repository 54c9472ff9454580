//! Annualised loss rates per subject for each dataset and field strength
//!
//! Reads `df_<dataset>.csv` (or `.parquet` with `DATASET_FORMAT=parquet`)
//! and the ADNIMERGE clinical table from the working directory and writes
//! `average_<dataset>_loss_<strength>_with_timepoints.csv`.

use std::time::Instant;

use anyhow::Context;
use log::info;
use visit_matcher::PipelineConfig;
use visit_matcher::config::get_input_format;
use visit_matcher::pipeline::{DEFAULT_FIELD_STRENGTHS, run_loss_rates};

/// Clinical table the loss-rate timepoints are annotated from
const CLINICAL_FILE: &str = "ADNIMERGE_03Aug2023.csv";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig {
        clinical_file: CLINICAL_FILE.to_string(),
        input_format: get_input_format().unwrap_or_default(),
        ..PipelineConfig::default()
    }
    .with_datasets(std::env::args().skip(1));
    info!("{config}");

    let start = Instant::now();
    let outputs = run_loss_rates(&config, &DEFAULT_FIELD_STRENGTHS)
        .context("Failed to compute loss rates")?;

    for output in &outputs {
        info!(
            "{} at {:.1}T: {} subjects written to {}",
            output.dataset,
            output.field_strength.unwrap_or_default(),
            output.rows,
            output.path.display()
        );
    }
    info!("Wrote {} tables in {:?}", outputs.len(), start.elapsed());
    Ok(())
}
