//! Progress bars for the dataset loops in the binaries.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a main progress bar
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// Default style for a nested progress bar
pub const DEFAULT_GROUP_TEMPLATE: &str =
    "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

fn styled_bar(length: u64, template: &str, description: Option<&str>) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let pb = ProgressBar::new(length);
    pb.set_style(style);
    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }
    pb
}

/// Create a main progress bar with a standardized style
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    styled_bar(length, DEFAULT_MAIN_TEMPLATE, description)
}

/// Create a secondary progress bar, e.g. field strengths within a dataset
#[must_use]
pub fn create_group_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    styled_bar(length, DEFAULT_GROUP_TEMPLATE, description)
}

/// Finish a progress bar with an optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    match message {
        Some(msg) => pb.finish_with_message(msg.to_string()),
        None => pb.finish(),
    }
}
