//! Actuarial factor workbook loader
//!
//! One sheet per factor kind, laid out as
//!
//! ```text
//! row 0    Factor Key | <issuer id> | <issuer id> | ...
//! row 1    Plan Year  | <year>
//! row 2    Default    | <default>   | <default>   | ...
//! row 3..  <key>      | <value>     | <value>     | ...
//! ```
//!
//! Issuer columns whose header is not a positive integer are ignored.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::error::ParseError;
use crate::loader::{LoadReport, Parsed, parse_year};
use crate::models::factor::{composite_tier_key, integer_key};
use crate::models::{ActuarialFactor, FactorKind};
use crate::reader::{Sheet, Workbook};
use crate::utils::sanitize::parse_number;

const ISSUER_ROW: usize = 0;
const YEAR_ROW: usize = 1;
const DEFAULT_ROW: usize = 2;
const FIRST_DATA_ROW: usize = 3;
const KEY_COL: usize = 0;

/// Default used when an issuer column leaves the default cell blank
const FALLBACK_DEFAULT: f64 = 1.0;

/// Read every factor sheet of a workbook into factor tables
///
/// A workbook does not need to carry every kind; missing sheets are logged
/// and skipped.
pub fn parse_factors(workbook: &dyn Workbook, source: &str) -> Parsed<ActuarialFactor> {
    let mut parsed = Parsed::new(source);
    for kind in FactorKind::ALL {
        let Some(sheet) = workbook.sheet(kind.sheet_name()) else {
            log::debug!("{source}: no {} sheet", kind.sheet_name());
            continue;
        };
        if let Err(e) = parse_sheet(sheet, kind, &mut parsed) {
            parsed.fail(sheet.name().to_string(), e);
        }
    }
    parsed
}

fn parse_sheet(
    sheet: &dyn Sheet,
    kind: FactorKind,
    parsed: &mut Parsed<ActuarialFactor>,
) -> Result<(), ParseError> {
    let issuer_cols: Vec<(usize, String)> = (KEY_COL + 1..sheet.width())
        .filter_map(|col| {
            let header = sheet.text(ISSUER_ROW, col);
            let id = integer_key(&header).filter(|id| *id > 0)?;
            Some((col, id.to_string()))
        })
        .collect();
    if issuer_cols.is_empty() {
        return Err(ParseError::new(
            sheet.coordinate(ISSUER_ROW, KEY_COL + 1),
            "no issuer columns",
        ));
    }

    let year_col = (KEY_COL + 1..sheet.width())
        .find(|col| !sheet.text(YEAR_ROW, *col).is_empty())
        .unwrap_or(KEY_COL + 1);
    let active_year = parse_year(sheet, YEAR_ROW, year_col)?;

    // Keys are shared by every issuer column
    let mut keys: Vec<(usize, String)> = Vec::new();
    for row in FIRST_DATA_ROW..sheet.row_count() {
        let raw = sheet.text(row, KEY_COL);
        if raw.is_empty() {
            continue;
        }
        match normalize_key(kind, &raw) {
            Some(key) => keys.push((row, key)),
            None => parsed.fail(
                sheet.coordinate(row, KEY_COL),
                ParseError::new(
                    sheet.coordinate(row, KEY_COL),
                    format!("invalid {kind} key '{raw}'"),
                ),
            ),
        }
    }
    let max_integer_factor_key = match kind {
        FactorKind::GroupSize => keys.iter().filter_map(|(_, key)| key.parse::<i64>().ok()).max(),
        _ => None,
    };

    for (col, issuer_hios_id) in issuer_cols {
        let default_factor_value =
            parse_number(sheet.cell(DEFAULT_ROW, col)).unwrap_or(FALLBACK_DEFAULT);
        let mut entries = BTreeMap::new();
        for (row, key) in &keys {
            let raw = sheet.text(*row, col);
            if raw.is_empty() {
                continue;
            }
            match parse_number(Some(&raw)) {
                Some(value) => {
                    entries.insert(key.clone(), value);
                }
                None => parsed.fail(
                    sheet.coordinate(*row, col),
                    ParseError::new(sheet.coordinate(*row, col), format!("invalid factor '{raw}'")),
                ),
            }
        }
        parsed.rows.push(ActuarialFactor::new(
            kind,
            issuer_hios_id,
            active_year,
            default_factor_value,
            max_integer_factor_key,
            entries,
        ));
    }
    Ok(())
}

fn normalize_key(kind: FactorKind, raw: &str) -> Option<String> {
    match kind {
        FactorKind::GroupSize | FactorKind::ParticipationRate => {
            integer_key(raw).map(|key| key.to_string())
        }
        FactorKind::SicCode => Some(raw.strip_suffix(".0").unwrap_or(raw).to_string()),
        FactorKind::CompositeTier => Some(composite_tier_key(raw)),
    }
}

/// Store each factor table unless an identical one exists
pub fn commit_factors(catalog: &mut Catalog, parsed: Parsed<ActuarialFactor>) -> LoadReport {
    let mut report = LoadReport {
        failures: parsed.failures,
        ..LoadReport::default()
    };
    for factor in parsed.rows {
        if catalog.upsert_factor(factor).1 {
            report.written += 1;
        } else {
            report.skipped += 1;
        }
    }
    report
}
