//! Actuarial rating factors
//!
//! Each issuer publishes, per year, one table per factor kind mapping a
//! factor key (group size, participation percentage, SIC code or composite
//! tier) to a premium multiplier. Keys are normalized before lookup and a
//! table miss falls back to the record's default value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::traits::CatalogRecord;
use crate::models::types::RecordId;

/// Kinds of actuarial factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// Employer group size
    GroupSize,
    /// Percentage of eligible employees enrolling
    ParticipationRate,
    /// Standard industrial classification code of the employer
    SicCode,
    /// Composite rating tier
    CompositeTier,
}

impl FactorKind {
    /// All kinds, in ingestion order
    pub const ALL: [Self; 4] = [
        Self::GroupSize,
        Self::ParticipationRate,
        Self::SicCode,
        Self::CompositeTier,
    ];

    /// Name of the workbook sheet holding this factor kind
    #[must_use]
    pub const fn sheet_name(self) -> &'static str {
        match self {
            Self::GroupSize => "GroupSize",
            Self::ParticipationRate => "ParticipationRate",
            Self::SicCode => "SicCode",
            Self::CompositeTier => "CompositeTier",
        }
    }

    /// Whether a missing record defaults to 1.0 instead of failing
    ///
    /// Only composite tiers fall back. The asymmetry is kept deliberately
    /// until the intended behaviour for the other kinds is settled.
    #[must_use]
    pub const fn defaults_when_missing(self) -> bool {
        matches!(self, Self::CompositeTier)
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GroupSize => "group size",
            Self::ParticipationRate => "participation rate",
            Self::SicCode => "SIC code",
            Self::CompositeTier => "composite tier",
        };
        f.write_str(name)
    }
}

/// A lookup input, tagged with the factor kind it is meant for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactorInput<'a> {
    /// Number of employees in the group
    GroupSize(i64),
    /// Participation as a percentage on a 0-100 scale
    ParticipationRate(f64),
    /// SIC code, used verbatim
    SicCode(&'a str),
    /// Free-text composite tier name
    CompositeTier(&'a str),
}

impl FactorInput<'_> {
    /// Kind of factor this input looks up
    #[must_use]
    pub const fn kind(&self) -> FactorKind {
        match self {
            Self::GroupSize(_) => FactorKind::GroupSize,
            Self::ParticipationRate(_) => FactorKind::ParticipationRate,
            Self::SicCode(_) => FactorKind::SicCode,
            Self::CompositeTier(_) => FactorKind::CompositeTier,
        }
    }
}

/// Internal key of a composite tier name
///
/// Unknown names are lower-cased and passed through, so they simply miss
/// the table and take the default value.
#[must_use]
pub fn composite_tier_key(name: &str) -> String {
    let compact: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let key = match compact.as_str() {
        "employee" | "employeeonly" | "employee_only" => "employee_only",
        "employee+spouse" | "employeeandspouse" | "employee_and_spouse" => "employee_and_spouse",
        "employee+dependent(s)"
        | "employee+dependents"
        | "employee+dependent"
        | "employeeanddependents"
        | "employee_and_one_or_more_dependents" => "employee_and_one_or_more_dependents",
        "family" => "family",
        _ => return name.trim().to_lowercase(),
    };
    key.to_string()
}

/// Canonical form of an integer-valued factor key (`"5.0"` becomes `"5"`)
#[must_use]
pub fn integer_key(raw: &str) -> Option<i64> {
    let value = raw.trim().parse::<f64>().ok()?;
    (value.fract() == 0.0).then_some(value as i64)
}

/// One issuer's factor table for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuarialFactor {
    /// Store identifier
    pub id: RecordId,
    /// Factor kind
    pub kind: FactorKind,
    /// Issuer the table belongs to
    pub issuer_hios_id: String,
    /// Year the table applies to
    pub active_year: i32,
    /// Value returned on a table miss
    pub default_factor_value: f64,
    /// Clamp ceiling for group size keys
    pub max_integer_factor_key: Option<i64>,
    /// Factor key to value
    pub entries: BTreeMap<String, f64>,
}

impl ActuarialFactor {
    /// Create an unsaved factor table
    pub fn new(
        kind: FactorKind,
        issuer_hios_id: impl Into<String>,
        active_year: i32,
        default_factor_value: f64,
        max_integer_factor_key: Option<i64>,
        entries: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            id: RecordId::default(),
            kind,
            issuer_hios_id: issuer_hios_id.into(),
            active_year,
            default_factor_value,
            max_integer_factor_key,
            entries,
        }
    }

    /// Whether all scalar fields and entries equal another table's
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.issuer_hios_id == other.issuer_hios_id
            && self.active_year == other.active_year
            && self.default_factor_value == other.default_factor_value
            && self.max_integer_factor_key == other.max_integer_factor_key
            && self.entries == other.entries
    }

    /// Transform a lookup input into this table's key space
    #[must_use]
    pub fn table_key(&self, input: &FactorInput<'_>) -> String {
        table_key(input, self.max_integer_factor_key)
    }

    /// Value for an input, falling back to the default on a table miss
    #[must_use]
    pub fn value_for(&self, input: &FactorInput<'_>) -> f64 {
        self.entries
            .get(&self.table_key(input))
            .copied()
            .unwrap_or(self.default_factor_value)
    }

    /// Denormalized copy for storing on products
    #[must_use]
    pub fn snapshot(&self) -> FactorSnapshot {
        FactorSnapshot {
            kind: self.kind,
            active_year: self.active_year,
            default_factor_value: self.default_factor_value,
            max_integer_factor_key: self.max_integer_factor_key,
            entries: self.entries.clone(),
        }
    }
}

impl CatalogRecord for ActuarialFactor {
    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Per-kind key transform
///
/// * group size: clamped to `1..=max_integer_factor_key`
/// * participation rate: rounded to the nearest integer, floored at 1
/// * SIC code: verbatim
/// * composite tier: tier name translated to the internal key
#[must_use]
pub fn table_key(input: &FactorInput<'_>, max_integer_factor_key: Option<i64>) -> String {
    match *input {
        FactorInput::GroupSize(size) => {
            let ceiling = max_integer_factor_key.unwrap_or(i64::MAX).max(1);
            size.clamp(1, ceiling).to_string()
        }
        FactorInput::ParticipationRate(rate) => {
            let rounded = if rate.is_finite() { rate.round() as i64 } else { 1 };
            rounded.max(1).to_string()
        }
        FactorInput::SicCode(code) => code.trim().to_string(),
        FactorInput::CompositeTier(name) => composite_tier_key(name),
    }
}

/// A factor table copied onto a product at build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSnapshot {
    /// Factor kind
    pub kind: FactorKind,
    /// Year the table applies to
    pub active_year: i32,
    /// Value returned on a table miss
    pub default_factor_value: f64,
    /// Clamp ceiling for group size keys
    pub max_integer_factor_key: Option<i64>,
    /// Factor key to value
    pub entries: BTreeMap<String, f64>,
}
