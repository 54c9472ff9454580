use std::time::Instant;

use anyhow::Context;
use log::info;
use visit_matcher::config::get_input_format;
use visit_matcher::{MatcherConfig, PipelineConfig, run_merge};

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Dataset names on the command line replace the default list
    let config = PipelineConfig {
        input_format: get_input_format().unwrap_or_default(),
        ..PipelineConfig::default()
    }
    .with_datasets(std::env::args().skip(1));
    info!("{config}");

    let start = Instant::now();
    let outputs = run_merge(&config, MatcherConfig::default())
        .with_context(|| format!("Failed to merge datasets from {}", config.data_dir.display()))?;

    for output in &outputs {
        if let Some(stats) = &output.stats {
            info!("{}: {stats}", output.dataset);
        }
    }
    info!(
        "Merged {} datasets in {:?}",
        outputs.len(),
        start.elapsed()
    );
    Ok(())
}
