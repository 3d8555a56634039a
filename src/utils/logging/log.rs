//! Logging helpers for ingestion runs
//!
//! Stage progress, source discovery and rejected rows are logged through
//! these functions so every run reads the same way in the log.

use std::fmt::Display;
use std::path::Path;

use crate::error::RowFailure;

/// Log the start of a region run
///
/// # Arguments
/// * `region` - Region code
/// * `region_root` - Directory holding the region's stage directories
pub fn log_region_start(region: &str, region_root: &Path) {
    log::info!("Ingesting region '{}' from {}", region, region_root.display());
}

/// Log the start of one pipeline stage as `[Stage i/n] name`
pub fn log_stage_start(step: usize, total: usize, stage: impl Display) {
    log::info!("[Stage {step}/{total}] {stage}");
}

/// Log a finished stage with its report line
pub fn log_stage_complete(report: impl Display) {
    log::info!("Completed {report}");
}

/// Log how many sources a stage directory holds
///
/// An empty directory is logged as a warning since the stage then writes
/// nothing.
///
/// # Arguments
/// * `dir` - The stage directory
/// * `extension` - Source extension that was matched
/// * `count` - Number of sources found
pub fn log_sources_found(dir: &Path, extension: &str, count: usize) {
    if count == 0 {
        log::warn!("No .{} sources in {}", extension, dir.display());
    } else {
        log::info!("Found {} .{} sources in {}", count, extension, dir.display());
    }
}

/// Log a warning with an optional related path
pub fn log_warning(message: &str, path: Option<&Path>) {
    if let Some(path) = path {
        log::warn!("{}: {}", message, path.display());
    } else {
        log::warn!("{message}");
    }
}

/// Log every collected row failure at warn level
pub fn log_row_failures(stage: &str, failures: &[RowFailure]) {
    if failures.is_empty() {
        return;
    }
    log::warn!("{stage}: {} records rejected", failures.len());
    for failure in failures {
        log::warn!("  {failure}");
    }
}
