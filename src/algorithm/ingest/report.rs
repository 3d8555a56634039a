//! Stage and run reports of an ingestion

use std::fmt;
use std::time::Duration;

use crate::error::RowFailure;

/// The six ingestion stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// County/zip records
    CountyZips,
    /// Rating areas
    RatingAreas,
    /// Actuarial factor tables
    Factors,
    /// Service areas
    ServiceAreas,
    /// Products from plan and benefit templates
    Plans,
    /// Premium tables from rate templates
    Rates,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Self; 6] = [
        Self::CountyZips,
        Self::RatingAreas,
        Self::Factors,
        Self::ServiceAreas,
        Self::Plans,
        Self::Rates,
    ];

    /// Stage name used in logs and errors
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CountyZips => "county zips",
            Self::RatingAreas => "rating areas",
            Self::Factors => "actuarial factors",
            Self::ServiceAreas => "service areas",
            Self::Plans => "plans",
            Self::Rates => "rates",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one stage
#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    /// Source files processed
    pub files: usize,
    /// Records created, merged or updated
    pub written: usize,
    /// Inputs that changed nothing or were intentionally skipped
    pub skipped: usize,
    /// Rows, variances or files that failed
    pub failures: Vec<RowFailure>,
    pub elapsed: Duration,
}

impl StageReport {
    /// Empty report for a stage
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            files: 0,
            written: 0,
            skipped: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} files, {} written, {} skipped, {} failed in {:?}",
            self.stage,
            self.files,
            self.written,
            self.skipped,
            self.failures.len(),
            self.elapsed
        )
    }
}

/// Outcome of a whole region ingestion
#[derive(Debug)]
pub struct IngestSummary {
    pub region: String,
    /// One report per stage, in execution order
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl IngestSummary {
    /// Report of a stage
    #[must_use]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }

    /// Records written across all stages
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.stages.iter().map(|report| report.written).sum()
    }

    /// Every collected failure, in stage order
    pub fn failures(&self) -> impl Iterator<Item = &RowFailure> {
        self.stages.iter().flat_map(|report| report.failures.iter())
    }

    /// Whether every record of every stage was accepted
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingestion Summary for {}:", self.region)?;
        for report in &self.stages {
            writeln!(f, "  {report}")?;
        }
        writeln!(f, "  Total written: {}", self.total_written())?;
        writeln!(f, "  Total failures: {}", self.failures().count())?;
        write!(f, "  Elapsed: {:?}", self.elapsed)
    }
}
