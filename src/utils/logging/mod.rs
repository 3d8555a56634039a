//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging and progress tracking during
//! ingestion runs.

pub mod log;
pub mod progress;

// Re-export commonly used functions for convenience
pub use log::{
    log_region_start, log_row_failures, log_sources_found, log_stage_complete, log_stage_start,
    log_warning,
};
pub use progress::{create_stage_progress_bar, finish_progress_bar};
