//! Error handling for the plan catalog.
//!
//! Errors fall into two families. Record-level errors (parse failures,
//! validation failures, factor misses, premium period conflicts) are
//! recoverable and are usually collected as [`RowFailure`]s next to whatever
//! succeeded. Infrastructure errors (IO, parquet, arrow) halt the stage that
//! raised them.

pub mod util;

use std::fmt;
use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use serde::{Deserialize, Serialize};

use crate::models::factor::FactorKind;
use crate::utils::dates::DateRange;

/// A malformed source fragment
///
/// The path is either an XML element path (`root/child[2]/leaf`) or a sheet
/// coordinate (`sheet!R12C3`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Parse error at {path}: {message}")]
pub struct ParseError {
    /// Location of the offending fragment
    pub path: String,
    /// What was wrong with it
    pub message: String,
}

impl ParseError {
    /// Create a parse error for a fragment path
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Specialized error type for the plan catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reading or writing parquet workbooks
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error converting arrow arrays
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error reading or writing a JSON snapshot
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed source fragment
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Business invariant violated
    #[error("Validation error: {0}")]
    Validation(String),

    /// No actuarial factor record for an issuer and year
    #[error("No {factor} actuarial factor for issuer {issuer_hios_id} in {year}")]
    LookupMiss {
        factor: FactorKind,
        issuer_hios_id: String,
        year: i32,
    },

    /// Premium table period collides with a table already on the product
    #[error("Premium period {attempted} for product {hios_id} overlaps existing period {existing}")]
    Overlap {
        hios_id: String,
        existing: DateRange,
        attempted: DateRange,
    },

    /// Premium table period is outside the product's application period
    #[error(
        "Premium period {period} for product {hios_id} is outside application period {application_period}"
    )]
    InvalidPeriod {
        hios_id: String,
        period: DateRange,
        application_period: DateRange,
    },

    /// An ingestion stage failed and the pipeline stopped
    #[error("Ingestion stage '{stage}' failed: {source}")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: Box<CatalogError>,
    },

    /// Anything else, usually IO wrapped with context
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CatalogError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error was caused by the submitted data rather than the
    /// infrastructure (a 4xx rather than a 5xx at an API boundary)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Parse(_)
            | Self::Validation(_)
            | Self::LookupMiss { .. }
            | Self::Overlap { .. }
            | Self::InvalidPeriod { .. } => true,
            Self::StageFailed { source, .. } => source.is_client_error(),
            Self::Io(_) | Self::Parquet(_) | Self::Arrow(_) | Self::Json(_) | Self::Other(_) => false,
        }
    }
}

/// Result type for plan catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// A per-record failure collected during ingestion
#[derive(Debug)]
pub struct RowFailure {
    /// File or document the record came from
    pub source: String,
    /// Row, plan id or element path inside the source
    pub location: String,
    /// What went wrong
    pub error: CatalogError,
}

impl RowFailure {
    /// Create a row failure
    pub fn new(source: impl Into<String>, location: impl Into<String>, error: CatalogError) -> Self {
        Self {
            source: source.into(),
            location: location.into(),
            error,
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.source, self.location, self.error)
    }
}
