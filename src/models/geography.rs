//! Geographic records: county/zip triples and the rating and service areas
//! built from them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::traits::CatalogRecord;
use crate::error::{CatalogError, Result};
use crate::models::types::{Address, RecordId};

/// A county, zip code and state triple
///
/// The triple is the identity; a `CountyZip` is created once and never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyZip {
    /// Store identifier
    pub id: RecordId,
    /// County name as published
    pub county_name: String,
    /// Five digit zip code
    pub zip: String,
    /// Two letter state code
    pub state: String,
}

impl CountyZip {
    /// Create an unsaved county/zip record
    pub fn new(county_name: impl Into<String>, zip: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id: RecordId::default(),
            county_name: county_name.into(),
            zip: zip.into(),
            state: state.into().to_uppercase(),
        }
    }

    /// Whether this record is the identity triple given
    #[must_use]
    pub fn is(&self, county_name: &str, zip: &str, state: &str) -> bool {
        self.county_name.eq_ignore_ascii_case(county_name)
            && self.zip == zip
            && self.state.eq_ignore_ascii_case(state)
    }

    /// Whether this record matches an address
    #[must_use]
    pub fn matches_address(&self, address: &Address) -> bool {
        self.is(&address.county, &address.zip, &address.state)
    }
}

impl CatalogRecord for CountyZip {
    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}

/// Which kind of geography an area describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    /// Geography used to set base premium rates
    Rating,
    /// Geography where an issuer's product is offered
    Service,
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rating => f.write_str("rating area"),
            Self::Service => f.write_str("service area"),
        }
    }
}

/// A rating or service area for one year
///
/// Identity is `(active_year, code)` within an [`AreaKind`]. Locations are
/// given either as county/zip records or as whole states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    /// Store identifier
    pub id: RecordId,
    /// Rating or service area
    pub kind: AreaKind,
    /// Year the area applies to
    pub active_year: i32,
    /// Exchange- or issuer-assigned code
    pub code: String,
    /// Issuer-provided title (service areas)
    pub title: Option<String>,
    /// Issuer that defined the area (service areas)
    pub issuer_hios_id: Option<String>,
    /// County/zip records inside the area
    pub county_zip_ids: BTreeSet<RecordId>,
    /// States covered entirely
    pub covered_states: BTreeSet<String>,
}

impl Area {
    /// Create an unsaved area, rejecting areas without any location
    pub fn new(
        kind: AreaKind,
        active_year: i32,
        code: impl Into<String>,
        county_zip_ids: BTreeSet<RecordId>,
        covered_states: BTreeSet<String>,
    ) -> Result<Self> {
        let area = Self {
            id: RecordId::default(),
            kind,
            active_year,
            code: code.into(),
            title: None,
            issuer_hios_id: None,
            county_zip_ids,
            covered_states,
        };
        area.validate()?;
        Ok(area)
    }

    /// Check the at-least-one-location invariant
    pub fn validate(&self) -> Result<()> {
        if self.county_zip_ids.is_empty() && self.covered_states.is_empty() {
            return Err(CatalogError::validation(format!(
                "{} {} ({}) must specify county/zip locations or covered states",
                self.kind, self.code, self.active_year
            )));
        }
        Ok(())
    }

    /// Whether the area includes any of the county/zip records or the state
    #[must_use]
    pub fn covers(&self, county_zip_ids: &BTreeSet<RecordId>, state: &str) -> bool {
        !self.county_zip_ids.is_disjoint(county_zip_ids)
            || self
                .covered_states
                .iter()
                .any(|covered| covered.eq_ignore_ascii_case(state))
    }

    /// Trailing area number of the code (`R-MA003` is 3)
    #[must_use]
    pub fn area_number(&self) -> Option<u32> {
        let digits: String = self
            .code
            .chars()
            .rev()
            .take_while(char::is_ascii_digit)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }
}

impl CatalogRecord for Area {
    fn id(&self) -> RecordId {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }
}
