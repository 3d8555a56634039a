//! Builders that turn parsed template documents into catalog products
//!
//! * [`plan`] creates and updates products from plan and benefit templates
//! * [`rate`] replaces the premium tables of products from rate templates

pub mod plan;
pub mod rate;

use std::fmt;

use crate::error::{ParseError, RowFailure};

pub use plan::PlanBuilder;
pub use rate::build_rates;

/// Outcome of a builder run
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Records created
    pub created: usize,
    /// Existing records updated in place
    pub updated: usize,
    /// Inputs intentionally skipped (base rows, denylisted plans)
    pub skipped: usize,
    /// Inputs that failed
    pub failures: Vec<RowFailure>,
}

impl BuildReport {
    /// Records created or updated
    #[must_use]
    pub fn written(&self) -> usize {
        self.created + self.updated
    }

    /// Record parse failures of a source document
    pub fn add_parse_failures(&mut self, source: &str, failures: &[ParseError]) {
        self.failures.extend(
            failures
                .iter()
                .map(|e| RowFailure::new(source, e.path.clone(), e.clone().into())),
        );
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created,
            self.updated,
            self.skipped,
            self.failures.len()
        )
    }
}
