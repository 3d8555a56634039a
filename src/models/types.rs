//! Common domain type definitions
//!
//! This module contains the identifiers and small enums shared by the
//! catalog models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a catalog record
///
/// Identifiers increase in creation order, so the smallest id of a set of
/// records is the one created first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Market a product is sold in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitMarketKind {
    /// Small business health options program
    Shop,
    /// Individual market
    Individual,
    /// Federal employees health benefits
    Fehb,
    /// Medicaid
    Medicaid,
    /// Medicare
    Medicare,
}

impl BenefitMarketKind {
    /// Derive the market from a template's market coverage text
    ///
    /// Anything mentioning SHOP is a SHOP product, everything else is sold
    /// on the individual market.
    #[must_use]
    pub fn from_market_coverage(text: &str) -> Self {
        if text.to_lowercase().contains("shop") {
            Self::Shop
        } else {
            Self::Individual
        }
    }
}

impl From<&str> for BenefitMarketKind {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "shop" | "aca_shop" => Self::Shop,
            "fehb" => Self::Fehb,
            "medicaid" => Self::Medicaid,
            "medicare" => Self::Medicare,
            _ => Self::Individual,
        }
    }
}

impl fmt::Display for BenefitMarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shop => "shop",
            Self::Individual => "individual",
            Self::Fehb => "fehb",
            Self::Medicaid => "medicaid",
            Self::Medicare => "medicare",
        };
        f.write_str(name)
    }
}

/// Coverage kind of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Medical coverage
    Health,
    /// Stand-alone dental coverage
    Dental,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Health => f.write_str("health"),
            Self::Dental => f.write_str("dental"),
        }
    }
}

/// Inclusive age range a product has premiums for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    /// Youngest rated age
    pub min: u32,
    /// Oldest rated age
    pub max: u32,
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 0, max: 65 }
    }
}

impl AgeRange {
    /// Whether an age is inside the range
    #[must_use]
    pub fn contains(&self, age: u32) -> bool {
        self.min <= age && age <= self.max
    }
}

/// An applicant address used for geographic resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// County name
    pub county: String,
    /// Five digit zip code
    pub zip: String,
    /// Two letter state code
    pub state: String,
}

impl Address {
    /// Create an address
    pub fn new(county: impl Into<String>, zip: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            county: county.into(),
            zip: zip.into(),
            state: state.into(),
        }
    }
}
