//! Service area workbook loader
//!
//! A row either covers the issuer's whole state or names one county in the
//! `County Name - STCCC` form (county name, state abbreviation, county code),
//! optionally restricted to a list of zips when the county is only partially
//! covered.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::error::{ParseError, RowFailure};
use crate::loader::{LoadReport, Parsed, is_blank_row, parse_year, required_sheet, row_location};
use crate::reader::{HeaderIndex, Workbook};
use crate::utils::sanitize::{normalize_zip, parse_flag, split_list};

/// Sheet holding service area rows
pub const SHEET: &str = "service_areas";

/// Where a service area row applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// Every location in the state
    EntireState { state: String },
    /// One county, optionally restricted to some zips
    County {
        county_name: String,
        state: String,
        zips: Vec<String>,
    },
}

/// One service area row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAreaRow {
    pub location: String,
    pub active_year: i32,
    pub issuer_hios_id: String,
    pub code: String,
    pub title: Option<String>,
    pub coverage: Coverage,
}

/// Split `Hampden - MA013` into county name, state and county code
#[must_use]
pub fn parse_county_field(raw: &str) -> Option<(String, String, String)> {
    let (county, suffix) = raw.rsplit_once('-')?;
    let county = county.trim();
    let suffix = suffix.trim();
    if county.is_empty() || suffix.len() < 3 || !suffix.is_char_boundary(2) {
        return None;
    }
    let (state, code) = suffix.split_at(2);
    if !state.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((county.to_string(), state.to_uppercase(), code.to_string()))
}

/// Read the service area rows of a workbook
pub fn parse_service_areas(
    workbook: &dyn Workbook,
    source: &str,
) -> Result<Parsed<ServiceAreaRow>, ParseError> {
    let sheet = required_sheet(workbook, SHEET)?;
    let header = HeaderIndex::read(sheet, 0);
    let year_col = header.require(&["Plan Year", "Year"])?;
    let issuer_col = header.require(&["HIOS Issuer ID", "Issuer ID"])?;
    let code_col = header.require(&["Service Area ID"])?;
    let name_col = header.column("Service Area Name");
    let entire_col = header.require(&["Entire State"])?;
    let county_col = header.require(&["County Name", "County"])?;
    let partial_col = header.column("Partial County");
    let zips_col = header.column_any(&["Zip Codes", "Zip Code", "Service Area Zip Code(s)"]);
    let state_col = header.column("State Code");

    let mut parsed = Parsed::new(source);
    for row in 1..sheet.row_count() {
        if is_blank_row(sheet, row) {
            continue;
        }
        let location = row_location(sheet, row);
        let active_year = match parse_year(sheet, row, year_col) {
            Ok(year) => year,
            Err(e) => {
                parsed.fail(location, e);
                continue;
            }
        };
        let issuer_hios_id = sheet.text(row, issuer_col);
        let code = sheet.text(row, code_col);
        if issuer_hios_id.is_empty() || code.is_empty() {
            let col = if code.is_empty() { code_col } else { issuer_col };
            parsed.fail(
                location,
                ParseError::new(sheet.coordinate(row, col), "required value is missing"),
            );
            continue;
        }

        let county_field = sheet.text(row, county_col);
        let county = parse_county_field(&county_field);
        let coverage = if parse_flag(sheet.cell(row, entire_col)) {
            let state = state_col
                .map(|col| sheet.text(row, col).to_uppercase())
                .filter(|state| !state.is_empty())
                .or_else(|| county.as_ref().map(|(_, state, _)| state.clone()));
            match state {
                Some(state) => Coverage::EntireState { state },
                None => {
                    parsed.fail(
                        location,
                        ParseError::new(
                            sheet.coordinate(row, entire_col),
                            "entire-state row does not name a state",
                        ),
                    );
                    continue;
                }
            }
        } else {
            let Some((county_name, state, _)) = county else {
                parsed.fail(
                    location,
                    ParseError::new(
                        sheet.coordinate(row, county_col),
                        format!("unrecognized county '{county_field}'"),
                    ),
                );
                continue;
            };
            let partial = partial_col.is_some_and(|col| parse_flag(sheet.cell(row, col)));
            let zips = match zips_col {
                Some(col) if partial => split_list(sheet.cell(row, col))
                    .iter()
                    .map(|zip| normalize_zip(Some(zip)))
                    .collect(),
                _ => Vec::new(),
            };
            Coverage::County {
                county_name,
                state,
                zips,
            }
        };

        parsed.rows.push(ServiceAreaRow {
            location,
            active_year,
            issuer_hios_id,
            code,
            title: name_col.and_then(|col| {
                let title = sheet.text(row, col);
                (!title.is_empty()).then_some(title)
            }),
            coverage,
        });
    }
    Ok(parsed)
}

/// Merge each row's locations into its service area
///
/// Rows whose county resolves to no known county/zip record fail with a
/// validation error when the area has no other location.
pub fn commit_service_areas(catalog: &mut Catalog, parsed: Parsed<ServiceAreaRow>) -> LoadReport {
    let Parsed {
        source,
        rows,
        failures,
    } = parsed;
    let mut report = LoadReport {
        failures,
        ..LoadReport::default()
    };

    for row in rows {
        let (county_zip_ids, states) = match &row.coverage {
            Coverage::EntireState { state } => (BTreeSet::new(), BTreeSet::from([state.clone()])),
            Coverage::County {
                county_name,
                state,
                zips,
            } => {
                let ids = catalog.county_zip_ids_in_county(county_name, state, zips);
                if ids.is_empty() {
                    log::debug!("{}: no county/zip records for {county_name}, {state}", row.location);
                }
                (ids, BTreeSet::new())
            }
        };
        match catalog.merge_service_area(
            row.active_year,
            &row.issuer_hios_id,
            &row.code,
            row.title.as_deref(),
            county_zip_ids,
            states,
        ) {
            Ok(_) => report.written += 1,
            Err(e) => report
                .failures
                .push(RowFailure::new(source.clone(), row.location, e)),
        }
    }
    report
}
