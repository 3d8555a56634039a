//! Rating area workbook loader
//!
//! Rows name a county/zip (or only a state, for state-wide areas) and the
//! rating area it belongs to. Rows of one area are grouped and merged into
//! the catalog in one step.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::Catalog;
use crate::error::{ParseError, RowFailure};
use crate::loader::{LoadReport, Parsed, is_blank_row, parse_year, required_sheet, row_location};
use crate::models::{AreaKind, RecordId};
use crate::reader::{HeaderIndex, Workbook};
use crate::utils::sanitize::normalize_zip;

/// Sheet holding rating area rows
pub const SHEET: &str = "rating_areas";

/// One rating area row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingAreaRow {
    pub location: String,
    pub active_year: i32,
    /// Blank together with `zip` for state-wide rows
    pub county_name: String,
    pub zip: String,
    pub state: String,
    pub code: String,
}

impl RatingAreaRow {
    /// Whether the row covers the whole state
    #[must_use]
    pub fn is_state_wide(&self) -> bool {
        self.county_name.is_empty() && self.zip.is_empty()
    }
}

/// Read the rating area rows of a workbook
pub fn parse_rating_areas(
    workbook: &dyn Workbook,
    source: &str,
) -> Result<Parsed<RatingAreaRow>, ParseError> {
    let sheet = required_sheet(workbook, SHEET)?;
    let header = HeaderIndex::read(sheet, 0);
    let year_col = header.require(&["Plan Year", "Year"])?;
    let county_col = header.require(&["County Name", "County"])?;
    let zip_col = header.require(&["Zip Code", "Zip"])?;
    let state_col = header.require(&["State"])?;
    let code_col = header.require(&["Rating Area ID", "Rating Area"])?;

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
        let record = RatingAreaRow {
            location,
            active_year,
            county_name: sheet.text(row, county_col),
            zip: normalize_zip(sheet.cell(row, zip_col)),
            state: sheet.text(row, state_col).to_uppercase(),
            code: sheet.text(row, code_col),
        };
        if record.code.is_empty() || record.state.is_empty() {
            let col = if record.code.is_empty() { code_col } else { state_col };
            parsed.fail(
                record.location,
                ParseError::new(sheet.coordinate(row, col), "required value is missing"),
            );
            continue;
        }
        if record.county_name.is_empty() != record.zip.is_empty() {
            parsed.fail(
                record.location,
                ParseError::new(
                    sheet.coordinate(row, county_col),
                    "county and zip must both be given or both be blank",
                ),
            );
            continue;
        }
        parsed.rows.push(record);
    }
    Ok(parsed)
}

/// Create missing county/zip records and merge every area of the file
pub fn commit_rating_areas(catalog: &mut Catalog, parsed: Parsed<RatingAreaRow>) -> LoadReport {
    let Parsed {
        source,
        rows,
        failures,
    } = parsed;
    let mut report = LoadReport {
        failures,
        ..LoadReport::default()
    };

    let mut areas: BTreeMap<(i32, String), (BTreeSet<RecordId>, BTreeSet<String>)> = BTreeMap::new();
    for row in &rows {
        let (county_zip_ids, states) = areas
            .entry((row.active_year, row.code.clone()))
            .or_default();
        if row.is_state_wide() {
            states.insert(row.state.clone());
        } else {
            county_zip_ids.insert(catalog.upsert_county_zip(&row.county_name, &row.zip, &row.state));
        }
    }

    for ((active_year, code), (county_zip_ids, states)) in areas {
        match catalog.merge_area(AreaKind::Rating, active_year, &code, county_zip_ids, states) {
            Ok(_) => report.written += 1,
            Err(e) => report
                .failures
                .push(RowFailure::new(source.clone(), format!("{code} ({active_year})"), e)),
        }
    }
    report
}
