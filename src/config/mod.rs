//! Configuration for ingestion runs and quote resolution.

use std::fmt;
use std::time::Duration;

/// Plan ids of known-bad template rows that are never published
pub const DEFAULT_EXCLUDED_PLAN_IDS: [&str; 4] = [
    "88806MA0020005",
    "88806MA0040005",
    "88806MA0020051",
    "18076MA0010001",
];

/// Directory names of each ingestion stage below a region root
#[derive(Debug, Clone)]
pub struct StageDirs {
    /// County/zip workbooks
    pub counties: String,
    /// Rating area workbooks
    pub rating_areas: String,
    /// Actuarial factor workbooks
    pub factors: String,
    /// Service area workbooks
    pub service_areas: String,
    /// QHP plan and benefit templates (XML)
    pub plans: String,
    /// Supplemental plan metadata workbooks
    pub metadata: String,
    /// Rate templates (XML)
    pub rates: String,
}

impl Default for StageDirs {
    fn default() -> Self {
        Self {
            counties: "counties".to_string(),
            rating_areas: "rating_areas".to_string(),
            factors: "factors".to_string(),
            service_areas: "service_areas".to_string(),
            plans: "plans".to_string(),
            metadata: "metadata".to_string(),
            rates: "rates".to_string(),
        }
    }
}

/// Configuration for an ingestion run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Parse the files of a stage in parallel before committing them
    pub parallel_files: bool,
    /// Number of rayon worker threads used for parallel parsing
    pub worker_threads: usize,
    /// Draw a progress bar per stage
    pub show_progress: bool,
    /// Plan ids dropped before persistence
    pub excluded_plan_ids: Vec<String>,
    /// Stage directory names
    pub stage_dirs: StageDirs,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            parallel_files: true,
            worker_threads: num_cpus::get(),
            show_progress: false,
            excluded_plan_ids: DEFAULT_EXCLUDED_PLAN_IDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            stage_dirs: StageDirs::default(),
        }
    }
}

impl IngestConfig {
    /// Whether a plan id is on the exclusion list
    #[must_use]
    pub fn is_excluded(&self, plan_id: &str) -> bool {
        self.excluded_plan_ids.iter().any(|id| id == plan_id)
    }
}

impl fmt::Display for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingest Configuration:")?;
        writeln!(f, "  Parallel Files: {}", self.parallel_files)?;
        writeln!(f, "  Worker Threads: {}", self.worker_threads)?;
        writeln!(f, "  Show Progress: {}", self.show_progress)?;
        writeln!(f, "  Excluded Plans: {}", self.excluded_plan_ids.len())?;
        Ok(())
    }
}

/// Configuration for quote resolution
#[derive(Debug, Clone, Default)]
pub struct QuoteConfig {
    /// Age after which the factor cache reports itself stale
    pub factor_cache_ttl: Option<Duration>,
}

impl fmt::Display for QuoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quote Configuration:")?;
        match self.factor_cache_ttl {
            Some(ttl) => writeln!(f, "  Factor Cache TTL: {ttl:?}"),
            None => writeln!(f, "  Factor Cache TTL: none"),
        }
    }
}
