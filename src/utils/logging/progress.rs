//! Progress reporting utilities for long-running operations
//!
//! Ingestion stages report per-file progress with the indicatif crate when
//! progress output is enabled.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a stage progress bar
pub const DEFAULT_STAGE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Create a progress bar for one ingestion stage
///
/// # Arguments
/// * `length` - Number of source files in the stage
/// * `stage` - Stage name displayed as the message
/// * `visible` - Whether to draw the bar; a hidden bar still counts
///
/// # Returns
/// A configured `ProgressBar`
#[must_use]
pub fn create_stage_progress_bar(length: u64, stage: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(length);
    let style = ProgressStyle::default_bar()
        .template(DEFAULT_STAGE_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(stage.to_string());
    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
