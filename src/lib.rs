//! Nearest-visit matching of longitudinal imaging data with clinical visits.
//!
//! Imaging tables (one row per subject, scan date and field strength) are
//! merged with a clinical visit table by pairing every scan with the same
//! subject's closest visit. A second pass computes annualised loss rates
//! between each subject's first and last scan.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod utils;

// Re-export the most common types for easier use
pub use algorithm::loss_rate::{LossRateConfig, compute_loss_rates};
pub use algorithm::temporal::{
    MatcherConfig, MergeResult, MergeStats, TemporalMatcher, VisitIndex, VisitMatch,
};
pub use config::{ColumnNames, PipelineConfig, TableFormat};
pub use error::{Error, Result};
pub use pipeline::{DatasetOutput, run_loss_rates, run_merge};
pub use table::Table;

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Table I/O
pub use utils::io::{read_table, write_table};
