//! County/zip workbook loader

use crate::catalog::Catalog;
use crate::error::ParseError;
use crate::loader::{LoadReport, Parsed, is_blank_row, required_sheet, row_location};
use crate::reader::{HeaderIndex, Workbook};
use crate::utils::sanitize::normalize_zip;

/// Sheet holding county/zip rows
pub const SHEET: &str = "counties";

/// One county/zip row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyZipRow {
    pub location: String,
    pub county_name: String,
    pub zip: String,
    pub state: String,
}

/// Read the county/zip rows of a workbook
pub fn parse_county_zips(
    workbook: &dyn Workbook,
    source: &str,
) -> Result<Parsed<CountyZipRow>, ParseError> {
    let sheet = required_sheet(workbook, SHEET)?;
    let header = HeaderIndex::read(sheet, 0);
    let county_col = header.require(&["County Name", "County"])?;
    let zip_col = header.require(&["Zip Code", "Zip"])?;
    let state_col = header.require(&["State"])?;

    let mut parsed = Parsed::new(source);
    for row in 1..sheet.row_count() {
        if is_blank_row(sheet, row) {
            continue;
        }
        let location = row_location(sheet, row);
        let county_name = sheet.text(row, county_col);
        let zip = normalize_zip(sheet.cell(row, zip_col));
        let state = sheet.text(row, state_col);

        if let Some((col, _)) = [(county_col, &county_name), (zip_col, &zip), (state_col, &state)]
            .into_iter()
            .find(|(_, value)| value.is_empty())
        {
            parsed.fail(
                location,
                ParseError::new(sheet.coordinate(row, col), "required value is missing"),
            );
            continue;
        }

        parsed.rows.push(CountyZipRow {
            location,
            county_name,
            zip,
            state,
        });
    }
    Ok(parsed)
}

/// Find or create a county/zip record per row
pub fn commit_county_zips(catalog: &mut Catalog, parsed: Parsed<CountyZipRow>) -> LoadReport {
    let before = catalog.stats().county_zips;
    let rows = parsed.rows.len();
    for row in &parsed.rows {
        catalog.upsert_county_zip(&row.county_name, &row.zip, &row.state);
    }
    let written = catalog.stats().county_zips - before;
    LoadReport {
        written,
        skipped: rows - written,
        failures: parsed.failures,
    }
}
