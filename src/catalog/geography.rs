//! Geographic catalog operations
//!
//! County/zip records are created once per identity triple. Rating and
//! service areas are merged by identity: re-ingesting an area unions its
//! locations instead of replacing them, so no previously recorded zip is
//! ever lost.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::catalog::Catalog;
use crate::common::traits::{LookupCollection, RecordCollection};
use crate::error::{CatalogError, Result};
use crate::models::{Address, Area, AreaKind, CountyZip, RecordId};

impl Catalog {
    /// Find or create the county/zip record for an identity triple
    pub fn upsert_county_zip(&mut self, county_name: &str, zip: &str, state: &str) -> RecordId {
        if let Some(existing) = self
            .county_zips
            .find_first(|record| record.is(county_name, zip, state))
        {
            return existing.id;
        }
        self.county_zips
            .insert(CountyZip::new(county_name, zip, state))
    }

    /// County/zip ids matching an address exactly
    #[must_use]
    pub fn county_zip_ids_for(&self, address: &Address) -> BTreeSet<RecordId> {
        self.county_zips
            .ids_where(|record| record.matches_address(address))
            .into_iter()
            .collect()
    }

    /// County/zip ids of a county, optionally restricted to some zips
    ///
    /// An empty `zips` slice selects the whole county.
    #[must_use]
    pub fn county_zip_ids_in_county(
        &self,
        county_name: &str,
        state: &str,
        zips: &[String],
    ) -> BTreeSet<RecordId> {
        self.county_zips
            .ids_where(|record| {
                record.county_name.eq_ignore_ascii_case(county_name)
                    && record.state.eq_ignore_ascii_case(state)
                    && (zips.is_empty() || zips.iter().any(|zip| *zip == record.zip))
            })
            .into_iter()
            .collect()
    }

    /// Find an area by `(year, code)` and union locations into it, or create it
    ///
    /// Fails with a validation error when the merged area would have no
    /// location at all.
    pub fn merge_area(
        &mut self,
        kind: AreaKind,
        active_year: i32,
        code: &str,
        county_zip_ids: BTreeSet<RecordId>,
        covered_states: BTreeSet<String>,
    ) -> Result<RecordId> {
        self.merge_scoped_area(kind, active_year, code, None, county_zip_ids, covered_states)
    }

    /// Merge a service area, scoped to the issuer that defined it
    ///
    /// Issuers reuse service area codes, so a service area's identity is
    /// `(year, issuer, code)`.
    pub fn merge_service_area(
        &mut self,
        active_year: i32,
        issuer_hios_id: &str,
        code: &str,
        title: Option<&str>,
        county_zip_ids: BTreeSet<RecordId>,
        covered_states: BTreeSet<String>,
    ) -> Result<RecordId> {
        let id = self.merge_scoped_area(
            AreaKind::Service,
            active_year,
            code,
            Some(issuer_hios_id),
            county_zip_ids,
            covered_states,
        )?;
        if let (Some(title), Some(area)) = (title, self.service_areas.get_mut(id)) {
            area.title = Some(title.to_string());
        }
        Ok(id)
    }

    fn merge_scoped_area(
        &mut self,
        kind: AreaKind,
        active_year: i32,
        code: &str,
        issuer_hios_id: Option<&str>,
        county_zip_ids: BTreeSet<RecordId>,
        covered_states: BTreeSet<String>,
    ) -> Result<RecordId> {
        let areas = self.areas_mut(kind);
        let existing = areas
            .find_first(|area| {
                area.active_year == active_year
                    && area.code == code
                    && area.issuer_hios_id.as_deref() == issuer_hios_id
            })
            .map(|area| area.id);

        match existing {
            Some(id) => {
                let area = areas.get_mut(id).ok_or_else(|| {
                    CatalogError::validation(format!("{kind} {id} vanished during merge"))
                })?;
                area.county_zip_ids.extend(county_zip_ids);
                area.covered_states.extend(covered_states);
                area.validate()?;
                Ok(id)
            }
            None => {
                let mut area = Area::new(kind, active_year, code, county_zip_ids, covered_states)?;
                area.issuer_hios_id = issuer_hios_id.map(str::to_string);
                Ok(areas.insert(area))
            }
        }
    }

    /// Rating area of an address on a date
    ///
    /// When several areas match, the one created first (smallest id) wins.
    #[must_use]
    pub fn resolve_rating_area(&self, address: &Address, date: NaiveDate) -> Option<&Area> {
        let ids = self.county_zip_ids_for(address);
        let year = date.year();
        let mut matches = self
            .rating_areas
            .find(|area| area.active_year == year && area.covers(&ids, &address.state));
        if matches.len() > 1 {
            log::debug!(
                "{} rating areas match {} {} {} in {year}; using {}",
                matches.len(),
                address.county,
                address.zip,
                address.state,
                matches[0].code
            );
        }
        if matches.is_empty() {
            None
        } else {
            Some(matches.swap_remove(0))
        }
    }

    /// All service areas covering an address on a date, in id order
    #[must_use]
    pub fn resolve_service_areas(&self, address: &Address, date: NaiveDate) -> Vec<&Area> {
        let ids = self.county_zip_ids_for(address);
        let year = date.year();
        self.service_areas
            .find(|area| area.active_year == year && area.covers(&ids, &address.state))
    }

    /// Rating area labels of a year, for resolving rate template labels
    #[must_use]
    pub fn rating_area_index(&self, active_year: i32) -> RatingAreaIndex {
        let mut index = RatingAreaIndex::default();
        for area in self.rating_areas.find(|area| area.active_year == active_year) {
            index
                .by_code
                .entry(area.code.to_uppercase())
                .or_insert(area.id);
            let Some(number) = area.area_number() else {
                continue;
            };
            index.by_number.entry(number).or_insert(area.id);
            for state in self.area_states(area) {
                index.by_state_number.entry((state, number)).or_insert(area.id);
            }
        }
        index
    }

    /// States an area lies in, from its county/zip records and covered states
    #[must_use]
    pub fn area_states(&self, area: &Area) -> BTreeSet<String> {
        area.county_zip_ids
            .iter()
            .filter_map(|id| self.county_zips.get(*id))
            .map(|county_zip| county_zip.state.to_uppercase())
            .chain(area.covered_states.iter().map(|state| state.to_uppercase()))
            .collect()
    }

    /// Service area ids of a year keyed by `(issuer, code)`
    #[must_use]
    pub fn service_area_index(&self, active_year: i32) -> HashMap<(String, String), RecordId> {
        self.service_areas
            .create_lookup(|area| {
                (
                    area.active_year,
                    area.issuer_hios_id.clone().unwrap_or_default(),
                    area.code.to_uppercase(),
                )
            })
            .into_iter()
            .filter(|((year, _, _), _)| *year == active_year)
            .map(|((_, issuer, code), id)| ((issuer, code), id))
            .collect()
    }
}

/// Rating area ids of one year, addressable by code or display label
///
/// Display labels (`Rating Area 1`) only carry a number, which repeats
/// across states. They resolve within a state when one is given.
#[derive(Debug, Clone, Default)]
pub struct RatingAreaIndex {
    by_code: HashMap<String, RecordId>,
    by_state_number: HashMap<(String, u32), RecordId>,
    by_number: HashMap<u32, RecordId>,
}

impl RatingAreaIndex {
    /// Resolve `R-MA001` style codes and `Rating Area 1` style labels
    ///
    /// Without a state, a display label resolves to the first area created
    /// with that number in any state.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<RecordId> {
        self.resolve_in(label, None)
    }

    /// Resolve a label, restricting display labels to one state
    #[must_use]
    pub fn resolve_in(&self, label: &str, state: Option<&str>) -> Option<RecordId> {
        let label = label.trim();
        if let Some(id) = self.by_code.get(&label.to_uppercase()) {
            return Some(*id);
        }
        let lower = label.to_lowercase();
        let number = lower.strip_prefix("rating area")?.trim().parse::<u32>().ok()?;
        match state {
            Some(state) => self
                .by_state_number
                .get(&(state.trim().to_uppercase(), number))
                .copied(),
            None => self.by_number.get(&number).copied(),
        }
    }

    /// Whether the index holds no areas
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
