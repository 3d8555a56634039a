//! Supplemental plan metadata loader
//!
//! Metadata workbooks carry what the plan templates do not: package kinds,
//! HSA eligibility, standard-plan flags and URLs. Rows are keyed by base
//! plan id and year, with one sheet per product kind.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::loader::{Parsed, is_blank_row, parse_year, row_location};
use crate::models::ProductKind;
use crate::reader::{HeaderIndex, Sheet, Workbook};
use crate::utils::sanitize::{clean_opt, parse_flag, split_list};

/// Metadata rows keyed by `(hios base id, year)`
pub type MetadataIndex = FxHashMap<(String, i32), PlanMetadata>;

/// Metadata of one plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanMetadata {
    pub hios_base_id: String,
    pub active_year: i32,
    pub product_package_kinds: BTreeSet<String>,
    pub hsa_eligible: Option<bool>,
    pub is_standard_plan: Option<bool>,
    pub network_information: Option<String>,
    pub provider_directory_url: Option<String>,
    pub rx_formulary_url: Option<String>,
}

/// Health and dental metadata lookups
#[derive(Debug, Clone, Default)]
pub struct PlanMetadataMaps {
    pub health: MetadataIndex,
    pub dental: MetadataIndex,
}

impl PlanMetadataMaps {
    /// Metadata of a plan
    #[must_use]
    pub fn get(&self, kind: ProductKind, hios_base_id: &str, active_year: i32) -> Option<&PlanMetadata> {
        let index = match kind {
            ProductKind::Health => &self.health,
            ProductKind::Dental => &self.dental,
        };
        index.get(&(hios_base_id.to_string(), active_year))
    }

    /// Add every row of a parse result; later rows replace earlier ones
    pub fn extend(&mut self, kind: ProductKind, rows: Vec<PlanMetadata>) {
        let index = match kind {
            ProductKind::Health => &mut self.health,
            ProductKind::Dental => &mut self.dental,
        };
        for row in rows {
            index.insert((row.hios_base_id.clone(), row.active_year), row);
        }
    }

    /// Total number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.health.len() + self.dental.len()
    }

    /// Whether no metadata was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read the `health` and `dental` sheets of a metadata workbook
pub fn parse_plan_metadata(
    workbook: &dyn Workbook,
    source: &str,
) -> Result<Vec<(ProductKind, Parsed<PlanMetadata>)>, ParseError> {
    let mut results = Vec::new();
    for (kind, name) in [(ProductKind::Health, "health"), (ProductKind::Dental, "dental")] {
        if let Some(sheet) = workbook.sheet(name) {
            results.push((kind, parse_sheet(sheet, source)?));
        }
    }
    if results.is_empty() {
        return Err(ParseError::new(source, "workbook has neither a health nor a dental sheet"));
    }
    Ok(results)
}

fn parse_sheet(sheet: &dyn Sheet, source: &str) -> Result<Parsed<PlanMetadata>, ParseError> {
    let header = HeaderIndex::read(sheet, 0);
    let id_col = header.require(&["HIOS Plan ID", "Plan ID"])?;
    let year_col = header.require(&["Plan Year", "Year"])?;
    let kinds_col = header.column("Product Package Kinds");
    let hsa_col = header.column("HSA Eligible");
    let standard_col = header.column("Standard Plan");
    let network_col = header.column("Network Information");
    let directory_col = header.column("Provider Directory URL");
    let formulary_col = header.column("Rx Formulary URL");

    let optional = |row: usize, col: Option<usize>| col.and_then(|col| clean_opt(sheet.cell(row, col)));
    let flag = |row: usize, col: Option<usize>| {
        col.and_then(|col| sheet.cell(row, col))
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_flag(Some(raw)))
    };

    let mut parsed = Parsed::new(source);
    for row in 1..sheet.row_count() {
        if is_blank_row(sheet, row) {
            continue;
        }
        let location = row_location(sheet, row);
        let plan_id = sheet.text(row, id_col);
        let hios_base_id = plan_id.split('-').next().unwrap_or_default().to_string();
        if hios_base_id.is_empty() {
            parsed.fail(
                location,
                ParseError::new(sheet.coordinate(row, id_col), "required value is missing"),
            );
            continue;
        }
        let active_year = match parse_year(sheet, row, year_col) {
            Ok(year) => year,
            Err(e) => {
                parsed.fail(location, e);
                continue;
            }
        };
        parsed.rows.push(PlanMetadata {
            hios_base_id,
            active_year,
            product_package_kinds: kinds_col
                .map(|col| {
                    split_list(sheet.cell(row, col))
                        .into_iter()
                        .map(|kind| kind.to_lowercase().replace(' ', "_"))
                        .collect()
                })
                .unwrap_or_default(),
            hsa_eligible: flag(row, hsa_col),
            is_standard_plan: flag(row, standard_col),
            network_information: optional(row, network_col),
            provider_directory_url: optional(row, directory_col),
            rx_formulary_url: optional(row, formulary_col),
        });
    }
    Ok(parsed)
}
