//! Workbook loaders
//!
//! Each loader is split into a pure parse step, which reads a workbook into
//! typed rows, and a commit step, which applies the rows to the catalog.
//! Parse steps of different files can run in parallel; commit steps run
//! sequentially in file order.
//!
//! Malformed rows never abort a file. They are reported as
//! [`RowFailure`]s next to the rows that did parse.

pub mod county_zip;
pub mod factors;
pub mod metadata;
pub mod rating_area;
pub mod service_area;

use std::fmt;

use crate::error::{CatalogError, ParseError, RowFailure};
use crate::reader::{Sheet, Workbook};

pub use county_zip::{CountyZipRow, commit_county_zips, parse_county_zips};
pub use factors::{commit_factors, parse_factors};
pub use metadata::{MetadataIndex, PlanMetadata, PlanMetadataMaps, parse_plan_metadata};
pub use rating_area::{RatingAreaRow, commit_rating_areas, parse_rating_areas};
pub use service_area::{ServiceAreaRow, commit_service_areas, parse_county_field, parse_service_areas};

/// Rows parsed from one source file
#[derive(Debug)]
pub struct Parsed<T> {
    /// File the rows came from
    pub source: String,
    /// Rows that parsed
    pub rows: Vec<T>,
    /// Rows that did not
    pub failures: Vec<RowFailure>,
}

impl<T> Parsed<T> {
    /// Create an empty result for a source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record a parse failure at a location
    pub fn fail(&mut self, location: impl Into<String>, error: impl Into<CatalogError>) {
        self.failures
            .push(RowFailure::new(self.source.clone(), location, error.into()));
    }
}

/// Outcome of committing rows to the catalog
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Records created or merged
    pub written: usize,
    /// Rows that changed nothing (already present)
    pub skipped: usize,
    /// Rows that failed to parse or commit
    pub failures: Vec<RowFailure>,
}

impl LoadReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} unchanged, {} failed",
            self.written,
            self.skipped,
            self.failures.len()
        )
    }
}

/// Look up a sheet that must exist
pub(crate) fn required_sheet<'a>(
    workbook: &'a dyn Workbook,
    name: &str,
) -> Result<&'a dyn Sheet, ParseError> {
    workbook
        .sheet(name)
        .ok_or_else(|| ParseError::new(name, format!("sheet '{name}' is missing")))
}

/// Location string of a data row
pub(crate) fn row_location(sheet: &dyn Sheet, row: usize) -> String {
    format!("{}!R{}", sheet.name(), row + 1)
}

/// Whether every cell of a row is blank
pub(crate) fn is_blank_row(sheet: &dyn Sheet, row: usize) -> bool {
    (0..sheet.width()).all(|col| sheet.text(row, col).is_empty())
}

/// Parse a plan year cell
pub(crate) fn parse_year(sheet: &dyn Sheet, row: usize, col: usize) -> Result<i32, ParseError> {
    let raw = sheet.text(row, col);
    let value = raw.strip_suffix(".0").unwrap_or(&raw);
    value
        .parse::<i32>()
        .ok()
        .filter(|year| (1900..=2999).contains(year))
        .ok_or_else(|| ParseError::new(sheet.coordinate(row, col), format!("invalid plan year '{raw}'")))
}
