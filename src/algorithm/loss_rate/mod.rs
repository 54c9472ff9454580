//! Longitudinal loss rates
//!
//! For every subject the first and last scan at one field strength are
//! compared and the change is expressed as percent lost per year. Each
//! timepoint is annotated with the subject's nearest clinical visit.

pub mod calculation;
pub mod config;

pub use calculation::{compute_loss_rates, loss_rate};
pub use config::{DAYS_PER_YEAR, LossRateConfig, THICKNESS_DATASET};
