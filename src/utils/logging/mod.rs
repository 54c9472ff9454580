//! Logging and progress reporting
//!
//! Library code logs through the `log` facade; the binaries install
//! `env_logger` and drive the progress bars.

pub mod log;
pub mod progress;

pub use log::{log_dataset_warning, log_table_loaded, log_table_read};
pub use progress::{create_main_progress_bar, create_group_progress_bar, finish_progress_bar};
