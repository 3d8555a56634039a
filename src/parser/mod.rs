//! Document parser tree
//!
//! Each node type parses one kind of XML fragment into a typed record. A
//! parent node parses its own scalar fields through the sanitizer and
//! delegates nested fragments to child node parsers, so the records mirror
//! the template structure. Parsing never performs IO and never returns a
//! partial record: a malformed fragment yields a [`ParseError`] carrying its
//! path.
//!
//! Repeated children whose failure should not sink their parent (cost-share
//! variances of a plan, plans of a package, items of a rate group) are
//! parsed independently and their failures are collected on the parent.

pub mod benefit;
pub mod header;
pub mod package;
pub mod plan;
pub mod rate;

use serde::Serialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::reader::Fragment;

pub use benefit::Benefit;
pub use header::PackageHeader;
pub use package::{PackageRecord, QhpDocument};
pub use plan::{CostShareVariance, Moop, PlanAttributes, PlanDeductible, PlanRecord, ServiceVisit, Sbc};
pub use rate::{RateGroup, RateHeader, RateItem, normalize_age_label, parse_rate_groups};

/// A parser for one fragment type
pub trait NodeParser: Sized + Serialize {
    /// Element name of the fragment this node parses
    const ELEMENT: &'static str;

    /// Parse a fragment into a record
    fn parse(fragment: &Fragment<'_>) -> Result<Self, ParseError>;

    /// Normalized map form of the record, child records nested by name
    fn to_record(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Parse every `item` under `list`, splitting successes from failures
pub(crate) fn parse_items<T: NodeParser>(
    fragment: &Fragment<'_>,
    list: &str,
) -> (Vec<T>, Vec<ParseError>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();
    for item in fragment.items(list, T::ELEMENT) {
        match T::parse(&item) {
            Ok(record) => records.push(record),
            Err(e) => failures.push(e),
        }
    }
    (records, failures)
}

/// Parse every `item` under `list`, failing on the first malformed one
pub(crate) fn parse_all<T: NodeParser>(
    fragment: &Fragment<'_>,
    list: &str,
) -> Result<Vec<T>, ParseError> {
    fragment
        .items(list, T::ELEMENT)
        .iter()
        .map(T::parse)
        .collect()
}
